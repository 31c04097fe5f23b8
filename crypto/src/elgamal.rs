//! Twisted ElGamal encryption over Ristretto255.
//!
//! A ciphertext is a Pedersen commitment `v·G + r·H` together with a decrypt
//! handle `r·P`, where the public key is `P = s⁻¹·H`. The owner of `s`
//! recovers `v·G = C − s·D`; the commitment half is usable on its own in range
//! and equality proofs.

use std::collections::HashMap;
use std::fmt;
use std::ops::{Add, Sub};

use curve25519_dalek::{
    ristretto::RistrettoPoint,
    scalar::Scalar,
    traits::{Identity, IsIdentity},
};
use lazy_static::lazy_static;
use rand::rngs::OsRng;
use rand_core::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};

use crate::algebra::{decode_point, decode_scalar, decompress_point, ensure_nonzero};
use crate::errors::{CryptoError, Result};
use crate::generators::{G, H};
use crate::pedersen::PedersenCommitment;
use crate::utils::random_nonzero_scalar;

const TWO16: u64 = 1 << 16;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ElGamalPubkey(RistrettoPoint);

impl ElGamalPubkey {
    pub fn get_point(&self) -> &RistrettoPoint {
        &self.0
    }

    pub fn to_bytes(&self) -> [u8; 32] {
        self.0.compress().to_bytes()
    }

    /// Decodes a counterparty key. Identity keys are rejected since every
    /// handle under them would be the identity.
    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self> {
        Ok(Self(decode_point(bytes)?))
    }

    /// Encrypts with fresh randomness from the OS generator. Returns the
    /// randomness so the caller can prove statements about the ciphertext.
    pub fn encrypt(&self, amount: u64) -> (ElGamalCiphertext, Scalar) {
        let opening = random_nonzero_scalar(&mut OsRng);
        let ciphertext = self.encrypt_unchecked(amount, &opening);
        (ciphertext, opening)
    }

    pub fn encrypt_with(&self, amount: u64, opening: &Scalar) -> Result<ElGamalCiphertext> {
        ensure_nonzero(opening)?;
        Ok(self.encrypt_unchecked(amount, opening))
    }

    fn encrypt_unchecked(&self, amount: u64, opening: &Scalar) -> ElGamalCiphertext {
        ElGamalCiphertext {
            commitment: PedersenCommitment::new(amount, opening),
            handle: self.decrypt_handle(opening),
        }
    }

    pub fn decrypt_handle(&self, opening: &Scalar) -> DecryptHandle {
        DecryptHandle(opening * self.0)
    }
}

impl fmt::Display for ElGamalPubkey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", hex::encode(self.to_bytes()))
    }
}

#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ElGamalSecretKey(Scalar);

impl ElGamalSecretKey {
    pub fn get_scalar(&self) -> &Scalar {
        &self.0
    }

    pub fn decrypt(&self, ciphertext: &ElGamalCiphertext) -> DiscreteLog {
        DiscreteLog {
            target: ciphertext.commitment.point - self.0 * ciphertext.handle.0,
        }
    }

    /// Decrypts amounts below `2^32`, the range the discrete-log solver covers.
    pub fn decrypt_u32(&self, ciphertext: &ElGamalCiphertext) -> Option<u64> {
        self.decrypt(ciphertext).decode_u32()
    }

    pub fn to_bytes(&self) -> [u8; 32] {
        self.0.to_bytes()
    }

    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self> {
        let scalar = decode_scalar(bytes)?;
        ensure_nonzero(&scalar).map_err(|_| CryptoError::InvalidScalar)?;
        Ok(Self(scalar))
    }
}

impl fmt::Debug for ElGamalSecretKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("ElGamalSecretKey(..)")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElGamalKeypair {
    pub public: ElGamalPubkey,
    pub secret: ElGamalSecretKey,
}

impl ElGamalKeypair {
    pub fn new_rand() -> Self {
        Self::new_with_rng(&mut OsRng)
    }

    pub fn new_with_rng<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        let s = random_nonzero_scalar(rng);
        Self::from_scalar(s)
    }

    pub fn from_secret(secret: ElGamalSecretKey) -> Self {
        Self::from_scalar(secret.0)
    }

    fn from_scalar(s: Scalar) -> Self {
        let public = ElGamalPubkey(s.invert() * *H);
        Self {
            public,
            secret: ElGamalSecretKey(s),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DecryptHandle(pub RistrettoPoint);

impl DecryptHandle {
    pub fn get_point(&self) -> &RistrettoPoint {
        &self.0
    }

    pub fn to_bytes(&self) -> [u8; 32] {
        self.0.compress().to_bytes()
    }

    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self> {
        Ok(Self(decode_point(bytes)?))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ElGamalCiphertext {
    pub commitment: PedersenCommitment,
    pub handle: DecryptHandle,
}

impl ElGamalCiphertext {
    pub fn add(&self, other: &Self) -> Self {
        Self {
            commitment: self.commitment.add(&other.commitment),
            handle: DecryptHandle(self.handle.0 + other.handle.0),
        }
    }

    pub fn sub(&self, other: &Self) -> Self {
        Self {
            commitment: self.commitment.sub(&other.commitment),
            handle: DecryptHandle(self.handle.0 - other.handle.0),
        }
    }

    /// Adds a public amount; only the commitment half changes.
    pub fn add_amount(&self, amount: u64) -> Self {
        Self {
            commitment: PedersenCommitment::from(self.commitment.point + Scalar::from(amount) * G),
            handle: self.handle,
        }
    }

    pub fn sub_amount(&self, amount: u64) -> Self {
        Self {
            commitment: PedersenCommitment::from(self.commitment.point - Scalar::from(amount) * G),
            handle: self.handle,
        }
    }

    pub fn to_bytes(&self) -> [u8; 64] {
        let mut bytes = [0u8; 64];
        bytes[..32].copy_from_slice(&self.commitment.to_bytes());
        bytes[32..].copy_from_slice(&self.handle.to_bytes());
        bytes
    }

    /// The identity is accepted in either half, so a zero balance built
    /// homomorphically (`c − c`) round-trips through its all-zero encoding.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != 64 {
            return Err(CryptoError::Deserialization(format!(
                "ciphertext must be 64 bytes, got {}",
                bytes.len()
            )));
        }
        let mut commitment = [0u8; 32];
        let mut handle = [0u8; 32];
        commitment.copy_from_slice(&bytes[..32]);
        handle.copy_from_slice(&bytes[32..]);

        Ok(Self {
            commitment: PedersenCommitment::from(decompress_point(&commitment)?),
            handle: DecryptHandle(decompress_point(&handle)?),
        })
    }
}

impl<'a, 'b> Add<&'b ElGamalCiphertext> for &'a ElGamalCiphertext {
    type Output = ElGamalCiphertext;

    fn add(self, other: &'b ElGamalCiphertext) -> ElGamalCiphertext {
        ElGamalCiphertext::add(self, other)
    }
}

impl<'a, 'b> Sub<&'b ElGamalCiphertext> for &'a ElGamalCiphertext {
    type Output = ElGamalCiphertext;

    fn sub(self, other: &'b ElGamalCiphertext) -> ElGamalCiphertext {
        ElGamalCiphertext::sub(self, other)
    }
}

/// Decrypted point `v·G` awaiting discrete-log recovery of `v`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscreteLog {
    pub target: RistrettoPoint,
}

lazy_static! {
    /// `{ (x_hi · 2^16)·G -> x_hi }` for every 16-bit `x_hi`.
    static ref DECODE_PRECOMPUTATION: HashMap<[u8; 32], u16> = {
        let step = Scalar::from(TWO16) * G;
        let mut table = HashMap::with_capacity(TWO16 as usize);
        let mut point = RistrettoPoint::identity();
        for x_hi in 0..TWO16 {
            table.insert(point.compress().to_bytes(), x_hi as u16);
            point += step;
        }
        table
    };
}

impl DiscreteLog {
    /// Whether the decrypted point is exactly `amount·G`.
    pub fn matches(&self, amount: u64) -> bool {
        self.target == Scalar::from(amount) * G
    }

    /// Baby-step giant-step recovery of amounts below `2^32`.
    pub fn decode_u32(&self) -> Option<u64> {
        if self.target.is_identity() {
            return Some(0);
        }
        let mut point = self.target;
        for x_lo in 0..TWO16 {
            if let Some(x_hi) = DECODE_PRECOMPUTATION.get(point.compress().as_bytes()) {
                return Some(TWO16 * u64::from(*x_hi) + x_lo);
            }
            point -= G;
        }
        None
    }
}
