#![allow(non_snake_case)]

//! Logarithmic-size inner-product argument.
//!
//! Proves knowledge of vectors `a`, `b` such that
//! `P = <a, G> + <b, H> + <a, b>·Q` for public generators `G`, `H`, `Q`.
//! Each round halves the vectors and publishes one `(L, R)` pair, so a
//! length-`n` statement yields `log2(n)` pairs and two terminal scalars.

use curve25519_dalek::{ristretto::RistrettoPoint, scalar::Scalar};

use crate::algebra::{inner_product, multiscalar_mul, read_point, read_scalar};
use crate::errors::{CryptoError, Result};
use crate::transcript::Transcript;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InnerProductProof {
    pub L_vec: Vec<RistrettoPoint>,
    pub R_vec: Vec<RistrettoPoint>,
    pub a: Scalar,
    pub b: Scalar,
}

fn fold_scalars(lo: &[Scalar], hi: &[Scalar], x_lo: &Scalar, x_hi: &Scalar) -> Vec<Scalar> {
    lo.iter()
        .zip(hi)
        .map(|(l, h)| l * x_lo + h * x_hi)
        .collect()
}

fn fold_points(
    lo: &[RistrettoPoint],
    hi: &[RistrettoPoint],
    x_lo: &Scalar,
    x_hi: &Scalar,
) -> Vec<RistrettoPoint> {
    lo.iter()
        .zip(hi)
        .map(|(l, h)| x_lo * l + x_hi * h)
        .collect()
}

fn check_shape(n: usize, lengths: &[usize]) -> Result<()> {
    for len in lengths {
        if *len != n {
            return Err(CryptoError::LengthMismatch(n, *len));
        }
    }
    if n == 0 || !n.is_power_of_two() {
        return Err(CryptoError::MalformedProof(format!(
            "inner-product length {} is not a power of two",
            n
        )));
    }
    Ok(())
}

impl InnerProductProof {
    /// Runs the prover side of the halving protocol.
    ///
    /// The caller is responsible for having bound `P` to the transcript; this
    /// function only absorbs the domain separator and the per-round `L`, `R`.
    pub fn create(
        transcript: &mut Transcript,
        Q: &RistrettoPoint,
        mut G: Vec<RistrettoPoint>,
        mut H: Vec<RistrettoPoint>,
        mut a: Vec<Scalar>,
        mut b: Vec<Scalar>,
    ) -> Result<Self> {
        let mut n = a.len();
        check_shape(n, &[b.len(), G.len(), H.len()])?;

        transcript.inner_product_proof_domain_separator(n as u64);

        let rounds = n.trailing_zeros() as usize;
        let mut L_vec = Vec::with_capacity(rounds);
        let mut R_vec = Vec::with_capacity(rounds);

        while n != 1 {
            n /= 2;
            let (a_L, a_R) = a.split_at(n);
            let (b_L, b_R) = b.split_at(n);
            let (G_L, G_R) = G.split_at(n);
            let (H_L, H_R) = H.split_at(n);

            let c_L = inner_product(a_L, b_R)?;
            let c_R = inner_product(a_R, b_L)?;

            let L_scalars: Vec<Scalar> = a_L.iter().chain(b_R).copied().chain([c_L]).collect();
            let L_points: Vec<RistrettoPoint> =
                G_R.iter().chain(H_L).copied().chain([*Q]).collect();
            let L = multiscalar_mul(&L_scalars, &L_points)?;

            let R_scalars: Vec<Scalar> = a_R.iter().chain(b_L).copied().chain([c_R]).collect();
            let R_points: Vec<RistrettoPoint> =
                G_L.iter().chain(H_R).copied().chain([*Q]).collect();
            let R = multiscalar_mul(&R_scalars, &R_points)?;

            transcript.append_point(b"L", &L);
            transcript.append_point(b"R", &R);

            let u = transcript.challenge_scalar(b"u");
            let u_inv = u.invert();

            let a_next = fold_scalars(a_L, a_R, &u, &u_inv);
            let b_next = fold_scalars(b_L, b_R, &u_inv, &u);
            let G_next = fold_points(G_L, G_R, &u_inv, &u);
            let H_next = fold_points(H_L, H_R, &u, &u_inv);

            a = a_next;
            b = b_next;
            G = G_next;
            H = H_next;

            L_vec.push(L);
            R_vec.push(R);
        }

        Ok(Self {
            L_vec,
            R_vec,
            a: a[0],
            b: b[0],
        })
    }

    /// Replays the folding from the public `L`/`R` values and checks
    /// `P + Σ(u²·L + u⁻²·R) == a·G' + b·H' + a·b·Q`.
    pub fn verify(
        &self,
        transcript: &mut Transcript,
        Q: &RistrettoPoint,
        P: &RistrettoPoint,
        mut G: Vec<RistrettoPoint>,
        mut H: Vec<RistrettoPoint>,
    ) -> Result<()> {
        let mut n = G.len();
        check_shape(n, &[H.len()])?;

        let rounds = n.trailing_zeros() as usize;
        if self.L_vec.len() != rounds || self.R_vec.len() != rounds {
            return Err(CryptoError::MalformedProof(format!(
                "expected {} inner-product rounds, got {}",
                rounds,
                self.L_vec.len()
            )));
        }

        transcript.inner_product_proof_domain_separator(n as u64);

        let mut P = *P;
        for (L, R) in self.L_vec.iter().zip(&self.R_vec) {
            transcript.validate_and_append_point(b"L", L)?;
            transcript.validate_and_append_point(b"R", R)?;

            let u = transcript.challenge_scalar(b"u");
            let u_inv = u.invert();
            let u_sq = u * u;
            let u_inv_sq = u_inv * u_inv;

            P += u_sq * L + u_inv_sq * R;

            n /= 2;
            let (G_L, G_R) = G.split_at(n);
            let (H_L, H_R) = H.split_at(n);
            let G_next = fold_points(G_L, G_R, &u_inv, &u);
            let H_next = fold_points(H_L, H_R, &u, &u_inv);
            G = G_next;
            H = H_next;
        }

        let expected = self.a * G[0] + self.b * H[0] + (self.a * self.b) * Q;
        if P == expected {
            Ok(())
        } else {
            Err(CryptoError::VerificationFailed("inner-product relation"))
        }
    }

    pub fn serialized_size(&self) -> usize {
        (self.L_vec.len() * 2 + 2) * 32
    }

    /// `L_0 || R_0 || ... || L_{k-1} || R_{k-1} || a || b`
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.serialized_size());
        for (L, R) in self.L_vec.iter().zip(&self.R_vec) {
            buf.extend_from_slice(L.compress().as_bytes());
            buf.extend_from_slice(R.compress().as_bytes());
        }
        buf.extend_from_slice(self.a.as_bytes());
        buf.extend_from_slice(self.b.as_bytes());
        buf
    }

    /// The round count is derived from the buffer length.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let len = bytes.len();
        if len < 64 || len % 64 != 0 {
            return Err(CryptoError::MalformedProof(format!(
                "inner-product proof length {} is not 64·(k + 1)",
                len
            )));
        }
        let rounds = (len - 64) / 64;
        if rounds >= 32 {
            return Err(CryptoError::MalformedProof(format!(
                "{} inner-product rounds exceeds the supported maximum",
                rounds
            )));
        }

        let mut offset = 0;
        let mut L_vec = Vec::with_capacity(rounds);
        let mut R_vec = Vec::with_capacity(rounds);
        for _ in 0..rounds {
            L_vec.push(read_point(bytes, &mut offset)?);
            R_vec.push(read_point(bytes, &mut offset)?);
        }
        let a = read_scalar(bytes, &mut offset)?;
        let b = read_scalar(bytes, &mut offset)?;

        Ok(Self { L_vec, R_vec, a, b })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generators::{hash_to_point, BulletproofGens};
    use crate::utils::random_nonzero_scalar;
    use rand::rngs::OsRng;

    fn random_vec(n: usize) -> Vec<Scalar> {
        (0..n).map(|_| random_nonzero_scalar(&mut OsRng)).collect()
    }

    fn statement(n: usize) -> (Vec<RistrettoPoint>, Vec<RistrettoPoint>, RistrettoPoint) {
        let gens = BulletproofGens::new(n);
        (gens.g_vec, gens.h_vec, hash_to_point(b"ipp-test-Q", 0))
    }

    fn commit(
        G: &[RistrettoPoint],
        H: &[RistrettoPoint],
        Q: &RistrettoPoint,
        a: &[Scalar],
        b: &[Scalar],
    ) -> RistrettoPoint {
        let c = inner_product(a, b).unwrap();
        multiscalar_mul(a, G).unwrap() + multiscalar_mul(b, H).unwrap() + c * Q
    }

    #[test]
    fn test_inner_product_proof_sizes() {
        for n in [1usize, 2, 8, 64] {
            let (G, H, Q) = statement(n);
            let a = random_vec(n);
            let b = random_vec(n);
            let P = commit(&G, &H, &Q, &a, &b);

            let mut prover = Transcript::new(b"ipp-test");
            let proof =
                InnerProductProof::create(&mut prover, &Q, G.clone(), H.clone(), a, b).unwrap();
            assert_eq!(proof.L_vec.len(), n.trailing_zeros() as usize);

            let mut verifier = Transcript::new(b"ipp-test");
            assert!(
                proof.verify(&mut verifier, &Q, &P, G, H).is_ok(),
                "Failed for length {}",
                n
            );
        }
    }

    #[test]
    fn test_wrong_commitment_rejected() {
        let n = 16;
        let (G, H, Q) = statement(n);
        let a = random_vec(n);
        let b = random_vec(n);
        let P = commit(&G, &H, &Q, &a, &b);

        let mut prover = Transcript::new(b"ipp-test");
        let proof = InnerProductProof::create(&mut prover, &Q, G.clone(), H.clone(), a, b).unwrap();

        let mut verifier = Transcript::new(b"ipp-test");
        assert!(proof.verify(&mut verifier, &Q, &(P + Q), G, H).is_err());
    }

    #[test]
    fn test_transcript_mismatch_rejected() {
        let n = 8;
        let (G, H, Q) = statement(n);
        let a = random_vec(n);
        let b = random_vec(n);
        let P = commit(&G, &H, &Q, &a, &b);

        let mut prover = Transcript::new(b"ipp-test");
        let proof = InnerProductProof::create(&mut prover, &Q, G.clone(), H.clone(), a, b).unwrap();

        let mut verifier = Transcript::new(b"other-domain");
        assert!(proof.verify(&mut verifier, &Q, &P, G, H).is_err());
    }

    #[test]
    fn test_round_count_checked() {
        let n = 8;
        let (G, H, Q) = statement(n);
        let a = random_vec(n);
        let b = random_vec(n);
        let P = commit(&G, &H, &Q, &a, &b);

        let mut prover = Transcript::new(b"ipp-test");
        let mut proof =
            InnerProductProof::create(&mut prover, &Q, G.clone(), H.clone(), a, b).unwrap();
        proof.L_vec.pop();
        proof.R_vec.pop();

        let mut verifier = Transcript::new(b"ipp-test");
        assert!(matches!(
            proof.verify(&mut verifier, &Q, &P, G, H),
            Err(CryptoError::MalformedProof(_))
        ));
    }

    #[test]
    fn test_non_power_of_two_rejected() {
        let (G, H, Q) = statement(3);
        let mut transcript = Transcript::new(b"ipp-test");
        let result = InnerProductProof::create(&mut transcript, &Q, G, H, random_vec(3), random_vec(3));
        assert!(result.is_err());
    }

    #[test]
    fn test_serialization() {
        let n = 8;
        let (G, H, Q) = statement(n);
        let a = random_vec(n);
        let b = random_vec(n);

        let mut prover = Transcript::new(b"ipp-test");
        let proof = InnerProductProof::create(&mut prover, &Q, G, H, a, b).unwrap();

        let bytes = proof.to_bytes();
        assert_eq!(bytes.len(), proof.serialized_size());
        assert_eq!(bytes.len(), (3 * 2 + 2) * 32);
        assert_eq!(InnerProductProof::from_bytes(&bytes).unwrap(), proof);

        assert!(InnerProductProof::from_bytes(&bytes[..bytes.len() - 1]).is_err());
        assert!(InnerProductProof::from_bytes(&bytes[..32]).is_err());
    }
}
