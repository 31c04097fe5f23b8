#![allow(non_snake_case)]

//! Sigma proof that a twisted ElGamal ciphertext is well formed.
//!
//! Given a public key `P` and ciphertext `(C, D)`, the prover shows knowledge
//! of `(x, r)` with `C = x·G + r·H` and `D = r·P`.

use curve25519_dalek::{ristretto::RistrettoPoint, scalar::Scalar, traits::IsIdentity};
use rand_core::{CryptoRng, RngCore};

use crate::algebra::{ensure_nonzero, read_point, read_scalar, vartime_multiscalar_mul};
use crate::elgamal::{ElGamalCiphertext, ElGamalPubkey};
use crate::errors::{CryptoError, Result};
use crate::generators::{G, H};
use crate::transcript::Transcript;
use crate::utils::random_nonzero_scalar;

pub const VALIDITY_PROOF_SIZE: usize = 128;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ValidityProof {
    pub Y_0: RistrettoPoint,
    pub Y_1: RistrettoPoint,
    pub z_r: Scalar,
    pub z_x: Scalar,
}

fn append_statement(
    transcript: &mut Transcript,
    pubkey: &ElGamalPubkey,
    ciphertext: &ElGamalCiphertext,
) -> Result<()> {
    transcript.validity_proof_domain_separator();
    transcript.validate_and_append_point(b"pubkey", pubkey.get_point())?;
    transcript.validate_and_append_point(b"commitment", &ciphertext.commitment.point)?;
    transcript.validate_and_append_point(b"handle", ciphertext.handle.get_point())
}

impl ValidityProof {
    /// Proves that `ciphertext` encrypts `amount` under `pubkey` with the
    /// given `opening`.
    pub fn new_with_rng<R: RngCore + CryptoRng>(
        pubkey: &ElGamalPubkey,
        ciphertext: &ElGamalCiphertext,
        amount: u64,
        opening: &Scalar,
        transcript: &mut Transcript,
        rng: &mut R,
    ) -> Result<Self> {
        ensure_nonzero(opening)?;
        append_statement(transcript, pubkey, ciphertext)?;

        let x = Scalar::from(amount);
        let P = pubkey.get_point();

        let y_r = random_nonzero_scalar(rng);
        let y_x = random_nonzero_scalar(rng);

        let Y_0 = y_r * *H + y_x * G;
        let Y_1 = y_r * P;

        transcript.append_point(b"Y_0", &Y_0);
        transcript.append_point(b"Y_1", &Y_1);

        let c = transcript.challenge_scalar(b"c");

        let z_r = c * opening + y_r;
        let z_x = c * x + y_x;

        transcript.append_scalar(b"z_r", &z_r);
        transcript.append_scalar(b"z_x", &z_x);
        transcript.challenge_scalar(b"w");

        Ok(Self { Y_0, Y_1, z_r, z_x })
    }

    pub fn verify(
        &self,
        pubkey: &ElGamalPubkey,
        ciphertext: &ElGamalCiphertext,
        transcript: &mut Transcript,
    ) -> Result<()> {
        append_statement(transcript, pubkey, ciphertext)?;

        transcript.validate_and_append_point(b"Y_0", &self.Y_0)?;
        transcript.validate_and_append_point(b"Y_1", &self.Y_1)?;

        let c = transcript.challenge_scalar(b"c");

        transcript.append_scalar(b"z_r", &self.z_r);
        transcript.append_scalar(b"z_x", &self.z_x);
        let w = transcript.challenge_scalar(b"w");

        // z_r·H + z_x·G − c·C − Y_0 + w·(z_r·P − c·D − Y_1) == 0
        let check = vartime_multiscalar_mul(
            &[self.z_r, self.z_x, -c, -Scalar::ONE, w * self.z_r, -w * c, -w],
            &[
                *H,
                G,
                ciphertext.commitment.point,
                self.Y_0,
                *pubkey.get_point(),
                ciphertext.handle.0,
                self.Y_1,
            ],
        )?;

        if check.is_identity() {
            Ok(())
        } else {
            Err(CryptoError::VerificationFailed("ciphertext validity"))
        }
    }

    pub fn to_bytes(&self) -> [u8; VALIDITY_PROOF_SIZE] {
        let mut buf = [0u8; VALIDITY_PROOF_SIZE];
        buf[..32].copy_from_slice(self.Y_0.compress().as_bytes());
        buf[32..64].copy_from_slice(self.Y_1.compress().as_bytes());
        buf[64..96].copy_from_slice(self.z_r.as_bytes());
        buf[96..128].copy_from_slice(self.z_x.as_bytes());
        buf
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != VALIDITY_PROOF_SIZE {
            return Err(CryptoError::MalformedProof(format!(
                "validity proof must be {} bytes, got {}",
                VALIDITY_PROOF_SIZE,
                bytes.len()
            )));
        }

        let mut offset = 0;
        Ok(Self {
            Y_0: read_point(bytes, &mut offset)?,
            Y_1: read_point(bytes, &mut offset)?,
            z_r: read_scalar(bytes, &mut offset)?,
            z_x: read_scalar(bytes, &mut offset)?,
        })
    }
}
