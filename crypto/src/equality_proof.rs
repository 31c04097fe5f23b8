#![allow(non_snake_case)]

//! Conservation proof tying a transfer to the source balance.
//!
//! The verifier derives the new source ciphertext homomorphically,
//! `E = C_o − C_d` and `D_n = D_o − D_t`, and the prover shows knowledge of
//! `(x, s, r)` such that
//!
//! ```text
//! E   = x·G + s·D_n     (E decrypts to x under the source key)
//! C_n = x·G + r·H       (C_n commits to the same x)
//! ```
//!
//! Since `C_d` is the exact commitment sent to the destination, the value
//! left in the source after subtracting it is the value committed in `C_n`.
//!
//! The secret `s` is bound to the source key through `s·P_s = H`. The prover
//! commits `Y_2 = y_s·P_s` into the transcript and the verifier recomputes it
//! as `z_s·P_s − c·H`, so a proof made under any other scalar fails the
//! challenge check. Without that binding `D_n` could be chosen to fit an
//! arbitrary `x`.

use curve25519_dalek::{ristretto::RistrettoPoint, scalar::Scalar, traits::IsIdentity};
use rand_core::{CryptoRng, RngCore};

use crate::algebra::{ensure_nonzero, read_point, read_scalar, vartime_multiscalar_mul};
use crate::elgamal::{DecryptHandle, ElGamalCiphertext, ElGamalKeypair, ElGamalPubkey};
use crate::errors::{CryptoError, Result};
use crate::generators::{G, H};
use crate::pedersen::PedersenCommitment;
use crate::transcript::Transcript;
use crate::utils::random_nonzero_scalar;

pub const EQUALITY_PROOF_SIZE: usize = 192;

/// Public inputs shared by prover and verifier.
#[derive(Clone, Copy, Debug)]
pub struct EqualityStatement<'a> {
    pub source_pubkey: &'a ElGamalPubkey,
    pub source_ciphertext: &'a ElGamalCiphertext,
    pub destination_ciphertext: &'a ElGamalCiphertext,
    pub transfer_handle: &'a DecryptHandle,
    pub new_source_commitment: &'a PedersenCommitment,
}

impl EqualityStatement<'_> {
    /// `(E, D_n)`
    fn new_source_ciphertext(&self) -> (RistrettoPoint, RistrettoPoint) {
        let E = self.source_ciphertext.commitment.point
            - self.destination_ciphertext.commitment.point;
        let D_n = self.source_ciphertext.handle.0 - self.transfer_handle.0;
        (E, D_n)
    }

    fn append_to(&self, transcript: &mut Transcript) -> Result<()> {
        transcript.equality_proof_domain_separator();
        transcript.validate_and_append_point(b"source-pubkey", self.source_pubkey.get_point())?;
        // An empty account holds the identity ciphertext.
        transcript.append_point(b"source-commitment", &self.source_ciphertext.commitment.point);
        transcript.append_point(b"source-handle", &self.source_ciphertext.handle.0);
        transcript.validate_and_append_point(
            b"destination-commitment",
            &self.destination_ciphertext.commitment.point,
        )?;
        transcript
            .validate_and_append_point(b"destination-handle", &self.destination_ciphertext.handle.0)?;
        transcript.validate_and_append_point(b"transfer-handle", &self.transfer_handle.0)?;
        transcript
            .validate_and_append_point(b"new-source-commitment", &self.new_source_commitment.point)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EqualityProof {
    pub Y_0: RistrettoPoint,
    pub Y_1: RistrettoPoint,
    pub c: Scalar,
    pub z_x: Scalar,
    pub z_s: Scalar,
    pub z_r: Scalar,
}

impl EqualityProof {
    /// `remaining` and `new_opening` open `statement.new_source_commitment`.
    pub fn new_with_rng<R: RngCore + CryptoRng>(
        source_keypair: &ElGamalKeypair,
        statement: &EqualityStatement<'_>,
        remaining: u64,
        new_opening: &Scalar,
        transcript: &mut Transcript,
        rng: &mut R,
    ) -> Result<Self> {
        ensure_nonzero(new_opening)?;
        statement.append_to(transcript)?;

        let x = Scalar::from(remaining);
        let s = source_keypair.secret.get_scalar();
        let (_, D_n) = statement.new_source_ciphertext();

        let y_x = random_nonzero_scalar(rng);
        let y_s = random_nonzero_scalar(rng);
        let y_r = random_nonzero_scalar(rng);

        let Y_0 = y_x * G + y_s * D_n;
        let Y_1 = y_x * G + y_r * *H;
        let Y_2 = y_s * statement.source_pubkey.get_point();

        transcript.append_point(b"Y_0", &Y_0);
        transcript.append_point(b"Y_1", &Y_1);
        transcript.append_point(b"Y_2", &Y_2);

        let c = transcript.challenge_scalar(b"c");

        let z_x = c * x + y_x;
        let z_s = c * s + y_s;
        let z_r = c * new_opening + y_r;

        transcript.append_scalar(b"z_x", &z_x);
        transcript.append_scalar(b"z_s", &z_s);
        transcript.append_scalar(b"z_r", &z_r);
        transcript.challenge_scalar(b"w");

        Ok(Self {
            Y_0,
            Y_1,
            c,
            z_x,
            z_s,
            z_r,
        })
    }

    pub fn verify(&self, statement: &EqualityStatement<'_>, transcript: &mut Transcript) -> Result<()> {
        statement.append_to(transcript)?;
        let (E, D_n) = statement.new_source_ciphertext();

        transcript.validate_and_append_point(b"Y_0", &self.Y_0)?;
        transcript.validate_and_append_point(b"Y_1", &self.Y_1)?;

        let Y_2 = self.z_s * statement.source_pubkey.get_point() - self.c * *H;
        transcript.append_point(b"Y_2", &Y_2);

        let c = transcript.challenge_scalar(b"c");
        if c != self.c {
            return Err(CryptoError::VerificationFailed("equality challenge mismatch"));
        }

        transcript.append_scalar(b"z_x", &self.z_x);
        transcript.append_scalar(b"z_s", &self.z_s);
        transcript.append_scalar(b"z_r", &self.z_r);
        let w = transcript.challenge_scalar(b"w");

        // z_x·G + z_s·D_n − c·E − Y_0 + w·(z_x·G + z_r·H − c·C_n − Y_1) == 0
        let check = vartime_multiscalar_mul(
            &[
                self.z_x + w * self.z_x,
                self.z_s,
                -c,
                -Scalar::ONE,
                w * self.z_r,
                -w * c,
                -w,
            ],
            &[
                G,
                D_n,
                E,
                self.Y_0,
                *H,
                statement.new_source_commitment.point,
                self.Y_1,
            ],
        )?;

        if check.is_identity() {
            Ok(())
        } else {
            Err(CryptoError::VerificationFailed("balance conservation"))
        }
    }

    pub fn to_bytes(&self) -> [u8; EQUALITY_PROOF_SIZE] {
        let mut buf = [0u8; EQUALITY_PROOF_SIZE];
        buf[..32].copy_from_slice(self.Y_0.compress().as_bytes());
        buf[32..64].copy_from_slice(self.Y_1.compress().as_bytes());
        buf[64..96].copy_from_slice(self.c.as_bytes());
        buf[96..128].copy_from_slice(self.z_x.as_bytes());
        buf[128..160].copy_from_slice(self.z_s.as_bytes());
        buf[160..192].copy_from_slice(self.z_r.as_bytes());
        buf
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != EQUALITY_PROOF_SIZE {
            return Err(CryptoError::MalformedProof(format!(
                "equality proof must be {} bytes, got {}",
                EQUALITY_PROOF_SIZE,
                bytes.len()
            )));
        }

        let mut offset = 0;
        Ok(Self {
            Y_0: read_point(bytes, &mut offset)?,
            Y_1: read_point(bytes, &mut offset)?,
            c: read_scalar(bytes, &mut offset)?,
            z_x: read_scalar(bytes, &mut offset)?,
            z_s: read_scalar(bytes, &mut offset)?,
            z_r: read_scalar(bytes, &mut offset)?,
        })
    }
}
