#![allow(non_snake_case)]

//! Validity proof for a commitment carrying decrypt handles under two keys.
//!
//! Given keys `P_d`, `P_s` and a grouped ciphertext `(C, D_d, D_s)`, the
//! prover shows knowledge of `(x, r)` with
//!
//! ```text
//! C   = x·G + r·H
//! D_d = r·P_d
//! D_s = r·P_s
//! ```
//!
//! so both handles open the same commitment under their respective keys.

use curve25519_dalek::{ristretto::RistrettoPoint, scalar::Scalar, traits::IsIdentity};
use rand_core::{CryptoRng, RngCore};

use crate::algebra::{ensure_nonzero, read_point, read_scalar, vartime_multiscalar_mul};
use crate::elgamal::{DecryptHandle, ElGamalPubkey};
use crate::errors::{CryptoError, Result};
use crate::generators::{G, H};
use crate::pedersen::PedersenCommitment;
use crate::transcript::Transcript;
use crate::utils::random_nonzero_scalar;

pub const GROUPED_VALIDITY_PROOF_SIZE: usize = 160;

/// Public inputs of a two-handle validity proof.
#[derive(Clone, Copy, Debug)]
pub struct GroupedCiphertext<'a> {
    pub destination_pubkey: &'a ElGamalPubkey,
    pub source_pubkey: &'a ElGamalPubkey,
    pub commitment: &'a PedersenCommitment,
    pub destination_handle: &'a DecryptHandle,
    pub source_handle: &'a DecryptHandle,
}

impl GroupedCiphertext<'_> {
    fn append_to(&self, transcript: &mut Transcript) -> Result<()> {
        transcript.grouped_validity_proof_domain_separator(2);
        transcript
            .validate_and_append_point(b"destination-pubkey", self.destination_pubkey.get_point())?;
        transcript.validate_and_append_point(b"source-pubkey", self.source_pubkey.get_point())?;
        transcript.validate_and_append_point(b"commitment", &self.commitment.point)?;
        transcript
            .validate_and_append_point(b"destination-handle", self.destination_handle.get_point())?;
        transcript.validate_and_append_point(b"source-handle", self.source_handle.get_point())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GroupedValidityProof {
    pub Y_0: RistrettoPoint,
    pub Y_1: RistrettoPoint,
    pub Y_2: RistrettoPoint,
    pub z_r: Scalar,
    pub z_x: Scalar,
}

impl GroupedValidityProof {
    pub fn new_with_rng<R: RngCore + CryptoRng>(
        statement: &GroupedCiphertext<'_>,
        amount: u64,
        opening: &Scalar,
        transcript: &mut Transcript,
        rng: &mut R,
    ) -> Result<Self> {
        ensure_nonzero(opening)?;
        statement.append_to(transcript)?;

        let x = Scalar::from(amount);
        let P_d = statement.destination_pubkey.get_point();
        let P_s = statement.source_pubkey.get_point();

        let y_r = random_nonzero_scalar(rng);
        let y_x = random_nonzero_scalar(rng);

        let Y_0 = y_r * *H + y_x * G;
        let Y_1 = y_r * P_d;
        let Y_2 = y_r * P_s;

        transcript.append_point(b"Y_0", &Y_0);
        transcript.append_point(b"Y_1", &Y_1);
        transcript.append_point(b"Y_2", &Y_2);

        let c = transcript.challenge_scalar(b"c");

        let z_r = c * opening + y_r;
        let z_x = c * x + y_x;

        transcript.append_scalar(b"z_r", &z_r);
        transcript.append_scalar(b"z_x", &z_x);
        transcript.challenge_scalar(b"w");

        Ok(Self {
            Y_0,
            Y_1,
            Y_2,
            z_r,
            z_x,
        })
    }

    pub fn verify(&self, statement: &GroupedCiphertext<'_>, transcript: &mut Transcript) -> Result<()> {
        statement.append_to(transcript)?;

        transcript.validate_and_append_point(b"Y_0", &self.Y_0)?;
        transcript.validate_and_append_point(b"Y_1", &self.Y_1)?;
        transcript.validate_and_append_point(b"Y_2", &self.Y_2)?;

        let c = transcript.challenge_scalar(b"c");

        transcript.append_scalar(b"z_r", &self.z_r);
        transcript.append_scalar(b"z_x", &self.z_x);
        let w = transcript.challenge_scalar(b"w");
        let ww = w * w;

        // z_r·H + z_x·G − c·C − Y_0
        //   + w·(z_r·P_d − c·D_d − Y_1)
        //   + w²·(z_r·P_s − c·D_s − Y_2) == 0
        let check = vartime_multiscalar_mul(
            &[
                self.z_r,
                self.z_x,
                -c,
                -Scalar::ONE,
                w * self.z_r,
                -w * c,
                -w,
                ww * self.z_r,
                -ww * c,
                -ww,
            ],
            &[
                *H,
                G,
                statement.commitment.point,
                self.Y_0,
                *statement.destination_pubkey.get_point(),
                statement.destination_handle.0,
                self.Y_1,
                *statement.source_pubkey.get_point(),
                statement.source_handle.0,
                self.Y_2,
            ],
        )?;

        if check.is_identity() {
            Ok(())
        } else {
            Err(CryptoError::VerificationFailed("grouped ciphertext validity"))
        }
    }

    pub fn to_bytes(&self) -> [u8; GROUPED_VALIDITY_PROOF_SIZE] {
        let mut buf = [0u8; GROUPED_VALIDITY_PROOF_SIZE];
        buf[..32].copy_from_slice(self.Y_0.compress().as_bytes());
        buf[32..64].copy_from_slice(self.Y_1.compress().as_bytes());
        buf[64..96].copy_from_slice(self.Y_2.compress().as_bytes());
        buf[96..128].copy_from_slice(self.z_r.as_bytes());
        buf[128..160].copy_from_slice(self.z_x.as_bytes());
        buf
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != GROUPED_VALIDITY_PROOF_SIZE {
            return Err(CryptoError::MalformedProof(format!(
                "grouped validity proof must be {} bytes, got {}",
                GROUPED_VALIDITY_PROOF_SIZE,
                bytes.len()
            )));
        }

        let mut offset = 0;
        Ok(Self {
            Y_0: read_point(bytes, &mut offset)?,
            Y_1: read_point(bytes, &mut offset)?,
            Y_2: read_point(bytes, &mut offset)?,
            z_r: read_scalar(bytes, &mut offset)?,
            z_x: read_scalar(bytes, &mut offset)?,
        })
    }
}
