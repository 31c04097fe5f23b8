//! Composite transfer proof.
//!
//! A transfer of `amount` out of a source account holding `balance` carries
//! the destination ciphertext, the source-side handle of the same encryption
//! randomness, a fresh commitment to the remaining balance, and four
//! sub-proofs:
//!
//! - equality: the remaining balance is exactly `balance − amount`,
//! - validity: the destination ciphertext is well formed and the transfer
//!   handle carries the same randomness under the source key,
//! - range (new source): the remaining balance is in `[0, 2^64)`,
//! - range (amount): the transferred amount is in `[0, 2^64)`.

use curve25519_dalek::scalar::Scalar;
use rand::rngs::OsRng;
use rand_core::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::elgamal::{DecryptHandle, ElGamalCiphertext, ElGamalKeypair, ElGamalPubkey};
use crate::equality_proof::{EqualityProof, EqualityStatement, EQUALITY_PROOF_SIZE};
use crate::errors::{CryptoError, Result};
use crate::pedersen::PedersenCommitment;
use crate::range_proof::{RangeProof, RANGE_PROOF_SIZE};
use crate::transcript::Transcript;
use crate::utils::random_nonzero_scalar;
use crate::grouped_validity_proof::{
    GroupedCiphertext, GroupedValidityProof, GROUPED_VALIDITY_PROOF_SIZE,
};

pub const TRANSFER_PROOF_SIZE: usize =
    64 + 32 + 32 + EQUALITY_PROOF_SIZE + GROUPED_VALIDITY_PROOF_SIZE + 2 * RANGE_PROOF_SIZE;

pub const TRANSFER_CONTEXT_SIZE: usize = 32 + 32 + 64;

const TRANSCRIPT_LABEL: &[u8] = b"confidential-transfer";

/// Everything the sender needs to build a transfer.
#[derive(Debug, Clone)]
pub struct TransferInput {
    pub source_keypair: ElGamalKeypair,
    /// Current source balance, encrypted under the source key
    pub source_ciphertext: ElGamalCiphertext,
    pub balance: u64,
    pub amount: u64,
    pub destination_pubkey: ElGamalPubkey,
}

impl TransferInput {
    pub fn context(&self) -> TransferContext {
        TransferContext {
            source_pubkey: self.source_keypair.public,
            destination_pubkey: self.destination_pubkey,
            source_ciphertext: self.source_ciphertext,
        }
    }
}

/// Public inputs a verifier needs besides the proof itself.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransferContext {
    pub source_pubkey: ElGamalPubkey,
    pub destination_pubkey: ElGamalPubkey,
    pub source_ciphertext: ElGamalCiphertext,
}

impl TransferContext {
    pub fn to_bytes(&self) -> [u8; TRANSFER_CONTEXT_SIZE] {
        let mut buf = [0u8; TRANSFER_CONTEXT_SIZE];
        buf[..32].copy_from_slice(&self.source_pubkey.to_bytes());
        buf[32..64].copy_from_slice(&self.destination_pubkey.to_bytes());
        buf[64..].copy_from_slice(&self.source_ciphertext.to_bytes());
        buf
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != TRANSFER_CONTEXT_SIZE {
            return Err(CryptoError::Deserialization(format!(
                "transfer context must be {} bytes, got {}",
                TRANSFER_CONTEXT_SIZE,
                bytes.len()
            )));
        }
        Ok(Self {
            source_pubkey: ElGamalPubkey::from_bytes(&array_at(bytes, 0))?,
            destination_pubkey: ElGamalPubkey::from_bytes(&array_at(bytes, 32))?,
            source_ciphertext: ElGamalCiphertext::from_bytes(&bytes[64..])?,
        })
    }

    fn transcript(&self) -> Transcript {
        let mut transcript = Transcript::new(TRANSCRIPT_LABEL);
        transcript.transfer_proof_domain_separator();
        transcript.append_message(b"source-pubkey", &self.source_pubkey.to_bytes());
        transcript.append_message(b"destination-pubkey", &self.destination_pubkey.to_bytes());
        transcript.append_message(b"source-ciphertext", &self.source_ciphertext.to_bytes());
        transcript
    }
}

fn array_at(bytes: &[u8], offset: usize) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(&bytes[offset..offset + 32]);
    out
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferProof {
    /// Amount encrypted under the destination key
    pub destination_ciphertext: ElGamalCiphertext,
    /// Same encryption randomness under the source key
    pub transfer_handle: DecryptHandle,
    /// Commitment to `balance − amount`
    pub new_source_commitment: PedersenCommitment,
    pub equality_proof: EqualityProof,
    pub validity_proof: GroupedValidityProof,
    pub new_source_range_proof: RangeProof,
    pub amount_range_proof: RangeProof,
}

impl TransferProof {
    pub fn new(input: &TransferInput) -> Result<Self> {
        Self::new_with_rng(input, &mut OsRng)
    }

    pub fn new_with_rng<R: RngCore + CryptoRng>(input: &TransferInput, rng: &mut R) -> Result<Self> {
        if input.amount > input.balance {
            return Err(CryptoError::InsufficientFunds);
        }
        if !input
            .source_keypair
            .secret
            .decrypt(&input.source_ciphertext)
            .matches(input.balance)
        {
            return Err(CryptoError::BalanceMismatch);
        }

        let opening = random_nonzero_scalar(rng);
        let destination_ciphertext = input.destination_pubkey.encrypt_with(input.amount, &opening)?;
        let transfer_handle = input.source_keypair.public.decrypt_handle(&opening);

        let remaining = input.balance - input.amount;
        let new_opening = random_nonzero_scalar(rng);
        let new_source_commitment = PedersenCommitment::new(remaining, &new_opening);

        let context = input.context();
        let mut transcript = context.transcript();

        let statement = EqualityStatement {
            source_pubkey: &context.source_pubkey,
            source_ciphertext: &context.source_ciphertext,
            destination_ciphertext: &destination_ciphertext,
            transfer_handle: &transfer_handle,
            new_source_commitment: &new_source_commitment,
        };
        let equality_proof = EqualityProof::new_with_rng(
            &input.source_keypair,
            &statement,
            remaining,
            &new_opening,
            &mut transcript,
            rng,
        )?;

        let grouped = GroupedCiphertext {
            destination_pubkey: &context.destination_pubkey,
            source_pubkey: &context.source_pubkey,
            commitment: &destination_ciphertext.commitment,
            destination_handle: &destination_ciphertext.handle,
            source_handle: &transfer_handle,
        };
        let validity_proof = GroupedValidityProof::new_with_rng(
            &grouped,
            input.amount,
            &opening,
            &mut transcript,
            rng,
        )?;

        let new_source_range_proof =
            RangeProof::new_with_rng(remaining, &new_source_commitment, &new_opening, rng)?;
        let amount_range_proof = RangeProof::new_with_rng(
            input.amount,
            &destination_ciphertext.commitment,
            &opening,
            rng,
        )?;

        debug!(size = TRANSFER_PROOF_SIZE, "transfer proof created");

        Ok(Self {
            destination_ciphertext,
            transfer_handle,
            new_source_commitment,
            equality_proof,
            validity_proof,
            new_source_range_proof,
            amount_range_proof,
        })
    }

    /// Returns whether every sub-proof holds for `context`. The failing check
    /// is logged at debug level.
    pub fn verify(&self, context: &TransferContext) -> bool {
        match self.check(context) {
            Ok(()) => true,
            Err(err) => {
                debug!(%err, "transfer proof rejected");
                false
            }
        }
    }

    pub fn check(&self, context: &TransferContext) -> Result<()> {
        let mut transcript = context.transcript();

        let statement = EqualityStatement {
            source_pubkey: &context.source_pubkey,
            source_ciphertext: &context.source_ciphertext,
            destination_ciphertext: &self.destination_ciphertext,
            transfer_handle: &self.transfer_handle,
            new_source_commitment: &self.new_source_commitment,
        };
        self.equality_proof.verify(&statement, &mut transcript)?;

        let grouped = GroupedCiphertext {
            destination_pubkey: &context.destination_pubkey,
            source_pubkey: &context.source_pubkey,
            commitment: &self.destination_ciphertext.commitment,
            destination_handle: &self.destination_ciphertext.handle,
            source_handle: &self.transfer_handle,
        };
        self.validity_proof.verify(&grouped, &mut transcript)?;

        self.new_source_range_proof.check(&self.new_source_commitment)?;
        self.amount_range_proof
            .check(&self.destination_ciphertext.commitment)
    }

    /// The source balance after this transfer, `old − destination`, still
    /// decryptable by the source key.
    pub fn new_source_ciphertext(&self, context: &TransferContext) -> ElGamalCiphertext {
        ElGamalCiphertext {
            commitment: context
                .source_ciphertext
                .commitment
                .sub(&self.destination_ciphertext.commitment),
            handle: DecryptHandle(context.source_ciphertext.handle.0 - self.transfer_handle.0),
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(TRANSFER_PROOF_SIZE);
        buf.extend_from_slice(&self.destination_ciphertext.to_bytes());
        buf.extend_from_slice(&self.transfer_handle.to_bytes());
        buf.extend_from_slice(&self.new_source_commitment.to_bytes());
        buf.extend_from_slice(&self.equality_proof.to_bytes());
        buf.extend_from_slice(&self.validity_proof.to_bytes());
        buf.extend_from_slice(&self.new_source_range_proof.to_bytes());
        buf.extend_from_slice(&self.amount_range_proof.to_bytes());
        buf
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != TRANSFER_PROOF_SIZE {
            return Err(CryptoError::MalformedProof(format!(
                "transfer proof must be {} bytes, got {}",
                TRANSFER_PROOF_SIZE,
                bytes.len()
            )));
        }

        let (ciphertext, rest) = bytes.split_at(64);
        let (handle, rest) = rest.split_at(32);
        let (commitment, rest) = rest.split_at(32);
        let (equality, rest) = rest.split_at(EQUALITY_PROOF_SIZE);
        let (validity, rest) = rest.split_at(GROUPED_VALIDITY_PROOF_SIZE);
        let (new_source_range, amount_range) = rest.split_at(RANGE_PROOF_SIZE);

        Ok(Self {
            destination_ciphertext: ElGamalCiphertext::from_bytes(ciphertext)?,
            transfer_handle: DecryptHandle::from_bytes(&array_at(handle, 0))?,
            new_source_commitment: PedersenCommitment::from_bytes(&array_at(commitment, 0))?,
            equality_proof: EqualityProof::from_bytes(equality)?,
            validity_proof: GroupedValidityProof::from_bytes(validity)?,
            new_source_range_proof: RangeProof::from_bytes(new_source_range)?,
            amount_range_proof: RangeProof::from_bytes(amount_range)?,
        })
    }

    /// Parses and verifies in one step; malformed input is simply invalid.
    pub fn verify_bytes(bytes: &[u8], context: &TransferContext) -> bool {
        match Self::from_bytes(bytes) {
            Ok(proof) => proof.verify(context),
            Err(err) => {
                debug!(%err, "transfer proof failed to parse");
                false
            }
        }
    }
}

/// Encrypts `balance` under `pubkey` with a fresh nonzero opening.
pub fn encrypt_balance<R: RngCore + CryptoRng>(
    pubkey: &ElGamalPubkey,
    balance: u64,
    rng: &mut R,
) -> Result<(ElGamalCiphertext, Scalar)> {
    let opening = random_nonzero_scalar(rng);
    let ciphertext = pubkey.encrypt_with(balance, &opening)?;
    Ok((ciphertext, opening))
}
