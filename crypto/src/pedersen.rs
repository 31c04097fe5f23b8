use curve25519_dalek::{ristretto::RistrettoPoint, scalar::Scalar};

use crate::algebra::{decode_point, ensure_nonzero};
use crate::errors::Result;
use crate::generators::{G, H};
use crate::utils::random_nonzero_scalar;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PedersenCommitment {
    pub point: RistrettoPoint,
}

impl PedersenCommitment {
    pub fn new(amount: u64, blinding: &Scalar) -> Self {
        let point = Scalar::from(amount) * G + blinding * *H;

        Self { point }
    }

    /// Like [`PedersenCommitment::new`], but refuses a zero blinding factor.
    pub fn new_checked(amount: u64, blinding: &Scalar) -> Result<Self> {
        ensure_nonzero(blinding)?;
        Ok(Self::new(amount, blinding))
    }

    pub fn verify(&self, amount: u64, blinding: &Scalar) -> bool {
        let expected = Self::new(amount, blinding);
        self.point == expected.point
    }

    /// Decodes a commitment received from the outside. The identity is
    /// rejected because it never arises from a nonzero blinding factor.
    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self> {
        let point = decode_point(bytes)?;
        Ok(Self { point })
    }

    pub fn to_bytes(&self) -> [u8; 32] {
        self.point.compress().to_bytes()
    }

    pub fn add(&self, other: &Self) -> Self {
        Self {
            point: self.point + other.point,
        }
    }

    pub fn sub(&self, other: &Self) -> Self {
        Self {
            point: self.point - other.point,
        }
    }
}

impl From<RistrettoPoint> for PedersenCommitment {
    fn from(point: RistrettoPoint) -> Self {
        Self { point }
    }
}

pub fn get_h_generator() -> RistrettoPoint {
    *H
}

pub fn commit(amount: u64, blinding: &Scalar) -> PedersenCommitment {
    PedersenCommitment::new(amount, blinding)
}

pub fn verify_commitment(commitment: &PedersenCommitment, amount: u64, blinding: &Scalar) -> bool {
    commitment.verify(amount, blinding)
}

pub fn generate_blinding() -> Scalar {
    random_nonzero_scalar(&mut OsRng)
}
