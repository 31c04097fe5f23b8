#![allow(non_snake_case)]

//! Single-value bulletproof proving that a Pedersen commitment opens to a
//! value in `[0, 2^64)`.
//!
//! The verifier checks the full protocol: the polynomial identity binding
//! `t(x)` to `T_1`, `T_2` and the commitment, and the closing equation of
//! the inner-product argument over the folded generators.

use curve25519_dalek::{ristretto::RistrettoPoint, scalar::Scalar, traits::IsIdentity};
use rand::rngs::OsRng;
use rand_core::{CryptoRng, RngCore};
use tracing::debug;

use crate::algebra::{
    add, add_scalar, ensure_nonzero, hadamard, inner_product, multiscalar_mul, powers,
    read_point, read_scalar, scale, sum_of_powers, vartime_multiscalar_mul,
};
use crate::errors::{CryptoError, Result};
use crate::generators::{BULLETPROOF_GENS, G, H, RANGE_PROOF_BITS};
use crate::inner_product::InnerProductProof;
use crate::pedersen::PedersenCommitment;
use crate::transcript::Transcript;
use crate::utils::random_nonzero_scalar;

/// `log2(64)`
pub const INNER_PRODUCT_ROUNDS: usize = 6;

/// `A, S, T_1, T_2 || taux, mu, t_x || 6·(L, R) || a, b`
pub const RANGE_PROOF_SIZE: usize = 4 * 32 + 3 * 32 + INNER_PRODUCT_ROUNDS * 64 + 2 * 32;

const RANGE_PROOF_MIN_SIZE: usize = 7 * 32 + 2 * 32;

const TRANSCRIPT_LABEL: &[u8] = b"confidential-range-proof";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RangeProof {
    /// Commitment to the bits of the value
    pub A: RistrettoPoint,
    /// Commitment to the blinding vectors
    pub S: RistrettoPoint,
    /// Commitment to the `t_1` coefficient of `t(x)`
    pub T_1: RistrettoPoint,
    /// Commitment to the `t_2` coefficient of `t(x)`
    pub T_2: RistrettoPoint,
    /// Blinding factor for the synthetic commitment to `t(x)`
    pub taux: Scalar,
    /// Blinding factor for the vector commitments `A` and `S`
    pub mu: Scalar,
    /// Evaluation of `t(x)` at the challenge `x`
    pub t_x: Scalar,
    pub ipp_proof: InnerProductProof,
}

fn transcript_for(commitment: &RistrettoPoint) -> Result<Transcript> {
    let mut transcript = Transcript::new(TRANSCRIPT_LABEL);
    transcript.range_proof_domain_separator(RANGE_PROOF_BITS as u64);
    transcript.validate_and_append_point(b"V", commitment)?;
    Ok(transcript)
}

/// `H'_i = y^{-i}·H_i`
fn twisted_h_vec(y: &Scalar) -> Vec<RistrettoPoint> {
    powers(&y.invert(), RANGE_PROOF_BITS)
        .iter()
        .zip(&BULLETPROOF_GENS.h_vec)
        .map(|(y_inv_i, h_i)| y_inv_i * h_i)
        .collect()
}

/// `δ(y, z) = (z − z²)·<1, y^n> − z³·<1, 2^n>`
fn delta(y: &Scalar, z: &Scalar) -> Scalar {
    let z_sq = z * z;
    let z_cube = z_sq * z;
    (z - z_sq) * sum_of_powers(y, RANGE_PROOF_BITS)
        - z_cube * sum_of_powers(&Scalar::from(2u64), RANGE_PROOF_BITS)
}

fn random_vec<R: RngCore + CryptoRng>(rng: &mut R, n: usize) -> Vec<Scalar> {
    (0..n).map(|_| random_nonzero_scalar(rng)).collect()
}

/// Pedersen vector commitment `blinding·H + <l, G_vec> + <r, H_vec>`.
fn vector_commit(blinding: &Scalar, l: &[Scalar], r: &[Scalar]) -> Result<RistrettoPoint> {
    let scalars: Vec<Scalar> = [*blinding]
        .into_iter()
        .chain(l.iter().copied())
        .chain(r.iter().copied())
        .collect();
    let points: Vec<RistrettoPoint> = [*H]
        .into_iter()
        .chain(BULLETPROOF_GENS.g_vec.iter().copied())
        .chain(BULLETPROOF_GENS.h_vec.iter().copied())
        .collect();
    multiscalar_mul(&scalars, &points)
}

impl RangeProof {
    /// Proves that `commitment` opens to `value` in `[0, 2^64)`.
    ///
    /// Fails with [`CryptoError::RangeViolation`] when `value` does not fit in
    /// a `u64` (negative or `>= 2^64`), with [`CryptoError::InvalidRandomness`]
    /// for a zero blinding factor and with [`CryptoError::InvalidCommitment`]
    /// when the commitment does not open to `(value, blinding)`.
    pub fn new<V: TryInto<u64>>(
        value: V,
        commitment: &PedersenCommitment,
        blinding: &Scalar,
    ) -> Result<Self> {
        Self::new_with_rng(value, commitment, blinding, &mut OsRng)
    }

    pub fn new_with_rng<V: TryInto<u64>, R: RngCore + CryptoRng>(
        value: V,
        commitment: &PedersenCommitment,
        blinding: &Scalar,
        rng: &mut R,
    ) -> Result<Self> {
        let v: u64 = value.try_into().map_err(|_| CryptoError::RangeViolation)?;
        ensure_nonzero(blinding)?;
        if !commitment.verify(v, blinding) {
            return Err(CryptoError::InvalidCommitment);
        }

        let n = RANGE_PROOF_BITS;
        let mut transcript = transcript_for(&commitment.point)?;

        // bit decomposition: a_L ∈ {0,1}^n, a_R = a_L − 1
        let a_L: Vec<Scalar> = (0..n).map(|i| Scalar::from((v >> i) & 1)).collect();
        let a_R = add_scalar(&a_L, &-Scalar::ONE);

        let alpha = random_nonzero_scalar(rng);
        let A = vector_commit(&alpha, &a_L, &a_R)?;

        let s_L = random_vec(rng, n);
        let s_R = random_vec(rng, n);
        let rho = random_nonzero_scalar(rng);
        let S = vector_commit(&rho, &s_L, &s_R)?;

        transcript.append_point(b"A", &A);
        transcript.append_point(b"S", &S);

        let y = transcript.challenge_scalar(b"y");
        let z = transcript.challenge_scalar(b"z");
        let z_sq = z * z;

        let y_n = powers(&y, n);
        let two_n = powers(&Scalar::from(2u64), n);

        // l(x) = l_0 + l_1·x, r(x) = r_0 + r_1·x
        let l_0 = add_scalar(&a_L, &-z);
        let l_1 = s_L;
        let r_0 = add(
            &hadamard(&y_n, &add_scalar(&a_R, &z))?,
            &scale(&two_n, &z_sq),
        )?;
        let r_1 = hadamard(&y_n, &s_R)?;

        let t_1 = inner_product(&l_0, &r_1)? + inner_product(&l_1, &r_0)?;
        let t_2 = inner_product(&l_1, &r_1)?;

        let tau_1 = random_nonzero_scalar(rng);
        let tau_2 = random_nonzero_scalar(rng);
        let T_1 = t_1 * G + tau_1 * *H;
        let T_2 = t_2 * G + tau_2 * *H;

        transcript.append_point(b"T_1", &T_1);
        transcript.append_point(b"T_2", &T_2);

        let x = transcript.challenge_scalar(b"x");

        let l = add(&l_0, &scale(&l_1, &x))?;
        let r = add(&r_0, &scale(&r_1, &x))?;
        let t_x = inner_product(&l, &r)?;

        let taux = tau_2 * x * x + tau_1 * x + z_sq * blinding;
        let mu = alpha + rho * x;

        transcript.append_scalar(b"t_x", &t_x);
        transcript.append_scalar(b"taux", &taux);
        transcript.append_scalar(b"mu", &mu);

        let w = transcript.challenge_scalar(b"w");
        let Q = w * G;

        let ipp_proof = InnerProductProof::create(
            &mut transcript,
            &Q,
            BULLETPROOF_GENS.g_vec.clone(),
            twisted_h_vec(&y),
            l,
            r,
        )?;

        Ok(Self {
            A,
            S,
            T_1,
            T_2,
            taux,
            mu,
            t_x,
            ipp_proof,
        })
    }

    /// Returns whether the proof is valid for `commitment`. Never panics on
    /// malformed proofs; the failure reason is logged at debug level.
    pub fn verify(&self, commitment: &PedersenCommitment) -> bool {
        match self.check(commitment) {
            Ok(()) => true,
            Err(err) => {
                debug!(%err, "range proof rejected");
                false
            }
        }
    }

    /// Parses and verifies a serialized proof in one step.
    pub fn verify_bytes(proof: &[u8], commitment: &PedersenCommitment) -> bool {
        match Self::from_bytes(proof) {
            Ok(proof) => proof.verify(commitment),
            Err(err) => {
                debug!(%err, "range proof failed to parse");
                false
            }
        }
    }

    pub fn check(&self, commitment: &PedersenCommitment) -> Result<()> {
        let n = RANGE_PROOF_BITS;

        if self.ipp_proof.L_vec.len() != INNER_PRODUCT_ROUNDS
            || self.ipp_proof.R_vec.len() != INNER_PRODUCT_ROUNDS
        {
            return Err(CryptoError::MalformedProof(format!(
                "expected {} inner-product rounds, got {}",
                INNER_PRODUCT_ROUNDS,
                self.ipp_proof.L_vec.len()
            )));
        }

        let V = commitment.point;
        let mut transcript = transcript_for(&V)?;

        transcript.validate_and_append_point(b"A", &self.A)?;
        transcript.validate_and_append_point(b"S", &self.S)?;

        let y = transcript.challenge_scalar(b"y");
        let z = transcript.challenge_scalar(b"z");
        let z_sq = z * z;

        transcript.validate_and_append_point(b"T_1", &self.T_1)?;
        transcript.validate_and_append_point(b"T_2", &self.T_2)?;

        let x = transcript.challenge_scalar(b"x");

        transcript.append_scalar(b"t_x", &self.t_x);
        transcript.append_scalar(b"taux", &self.taux);
        transcript.append_scalar(b"mu", &self.mu);

        let w = transcript.challenge_scalar(b"w");
        let Q = w * G;

        // t_x·G + taux·H == z²·V + δ(y,z)·G + x·T_1 + x²·T_2
        let polynomial_check = vartime_multiscalar_mul(
            &[
                self.t_x - delta(&y, &z),
                self.taux,
                -z_sq,
                -x,
                -(x * x),
            ],
            &[G, *H, V, self.T_1, self.T_2],
        )?;
        if !polynomial_check.is_identity() {
            return Err(CryptoError::VerificationFailed("range polynomial identity"));
        }

        // P = A + x·S − z·<1, G> + <z·y^n + z²·2^n, H'> − mu·H + t_x·Q
        let y_n = powers(&y, n);
        let two_n = powers(&Scalar::from(2u64), n);
        let h_coefficients = add(&scale(&y_n, &z), &scale(&two_n, &z_sq))?;
        let h_prime = twisted_h_vec(&y);

        let mut scalars = vec![Scalar::ONE, x, -self.mu, self.t_x];
        let mut points = vec![self.A, self.S, *H, Q];
        scalars.extend(std::iter::repeat(-z).take(n));
        points.extend(BULLETPROOF_GENS.g_vec.iter().copied());
        scalars.extend(h_coefficients);
        points.extend(h_prime.iter().copied());
        let P = vartime_multiscalar_mul(&scalars, &points)?;

        self.ipp_proof.verify(
            &mut transcript,
            &Q,
            &P,
            BULLETPROOF_GENS.g_vec.clone(),
            h_prime,
        )
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(RANGE_PROOF_SIZE);
        buf.extend_from_slice(self.A.compress().as_bytes());
        buf.extend_from_slice(self.S.compress().as_bytes());
        buf.extend_from_slice(self.T_1.compress().as_bytes());
        buf.extend_from_slice(self.T_2.compress().as_bytes());
        buf.extend_from_slice(self.taux.as_bytes());
        buf.extend_from_slice(self.mu.as_bytes());
        buf.extend_from_slice(self.t_x.as_bytes());
        buf.extend_from_slice(&self.ipp_proof.to_bytes());
        buf
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < RANGE_PROOF_MIN_SIZE {
            return Err(CryptoError::MalformedProof(format!(
                "range proof needs at least {} bytes, got {}",
                RANGE_PROOF_MIN_SIZE,
                bytes.len()
            )));
        }

        let mut offset = 0;
        let A = read_point(bytes, &mut offset)?;
        let S = read_point(bytes, &mut offset)?;
        let T_1 = read_point(bytes, &mut offset)?;
        let T_2 = read_point(bytes, &mut offset)?;
        let taux = read_scalar(bytes, &mut offset)?;
        let mu = read_scalar(bytes, &mut offset)?;
        let t_x = read_scalar(bytes, &mut offset)?;
        let ipp_proof = InnerProductProof::from_bytes(&bytes[offset..])?;

        Ok(Self {
            A,
            S,
            T_1,
            T_2,
            taux,
            mu,
            t_x,
            ipp_proof,
        })
    }
}
