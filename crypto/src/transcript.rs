//! SHA-256 Fiat–Shamir transcript.
//!
//! Each appended message is folded into a running 32-byte state as
//! `state = SHA-256(state || len(label) || label || len(msg) || msg)` with
//! little-endian `u64` lengths. Labels and append order are part of the wire
//! protocol: changing either changes every challenge.

use curve25519_dalek::{ristretto::RistrettoPoint, scalar::Scalar, traits::IsIdentity};
use sha2::{Digest, Sha256};

use crate::errors::{CryptoError, Result};

#[derive(Clone, Debug)]
pub struct Transcript {
    state: [u8; 32],
}

impl Transcript {
    pub fn new(domain: &'static [u8]) -> Self {
        let mut transcript = Self { state: [0u8; 32] };
        transcript.append_message(b"dom-sep", domain);
        transcript
    }

    pub fn append_message(&mut self, label: &[u8], message: &[u8]) {
        let mut hasher = Sha256::new();
        hasher.update(self.state);
        hasher.update((label.len() as u64).to_le_bytes());
        hasher.update(label);
        hasher.update((message.len() as u64).to_le_bytes());
        hasher.update(message);
        self.state = hasher.finalize().into();
    }

    pub fn append_u64(&mut self, label: &'static [u8], value: u64) {
        self.append_message(label, &value.to_le_bytes());
    }

    pub fn append_scalar(&mut self, label: &'static [u8], scalar: &Scalar) {
        self.append_message(label, scalar.as_bytes());
    }

    pub fn append_point(&mut self, label: &'static [u8], point: &RistrettoPoint) {
        self.append_message(label, point.compress().as_bytes());
    }

    /// Check that a point is not the identity, then append it to the
    /// transcript. Otherwise, return an error.
    pub fn validate_and_append_point(
        &mut self,
        label: &'static [u8],
        point: &RistrettoPoint,
    ) -> Result<()> {
        if point.is_identity() {
            return Err(CryptoError::InvalidPoint);
        }
        self.append_point(label, point);
        Ok(())
    }

    /// Compute a `label`ed challenge variable.
    pub fn challenge_scalar(&mut self, label: &'static [u8]) -> Scalar {
        self.append_message(label, b"challenge");
        Scalar::from_bytes_mod_order(self.state)
    }

    pub fn range_proof_domain_separator(&mut self, n: u64) {
        self.append_message(b"dom-sep", b"range-proof");
        self.append_u64(b"n", n);
    }

    pub fn inner_product_proof_domain_separator(&mut self, n: u64) {
        self.append_message(b"dom-sep", b"inner-product");
        self.append_u64(b"n", n);
    }

    pub fn validity_proof_domain_separator(&mut self) {
        self.append_message(b"dom-sep", b"validity-proof");
    }

    pub fn grouped_validity_proof_domain_separator(&mut self, handles: u64) {
        self.append_message(b"dom-sep", b"grouped-validity-proof");
        self.append_u64(b"handles", handles);
    }

    pub fn equality_proof_domain_separator(&mut self) {
        self.append_message(b"dom-sep", b"equality-proof");
    }

    pub fn transfer_proof_domain_separator(&mut self) {
        self.append_message(b"dom-sep", b"transfer-proof");
    }
}
