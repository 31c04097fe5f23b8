//! Deterministic generator derivation.
//!
//! Points are found by hashing a domain-separated label, an index and a retry
//! counter with SHA-256 and trying to decode the digest as a compressed
//! Ristretto point. Not every digest is a valid encoding, so the counter is
//! bumped until one decodes to a non-identity point. Any implementation using
//! the same labels derives byte-identical generators.

use curve25519_dalek::{
    constants::RISTRETTO_BASEPOINT_POINT,
    ristretto::{CompressedRistretto, RistrettoPoint},
    traits::IsIdentity,
};
use lazy_static::lazy_static;
use sha2::{Digest, Sha256};

/// Bit-width of every range proof in this crate.
pub const RANGE_PROOF_BITS: usize = 64;

const GENERATOR_DOMAIN: &[u8] = b"CONFIDENTIAL_TRANSFER_GENERATORS_V1";

lazy_static! {
    /// Secondary Pedersen base point `H`.
    pub static ref H: RistrettoPoint = hash_to_point(b"pedersen-H", 0);
    pub static ref BULLETPROOF_GENS: BulletproofGens = BulletproofGens::new(RANGE_PROOF_BITS);
}

/// Primary Pedersen base point `G`.
pub const G: RistrettoPoint = RISTRETTO_BASEPOINT_POINT;

pub fn hash_to_point(label: &[u8], index: u32) -> RistrettoPoint {
    let mut counter: u32 = 0;
    loop {
        let mut hasher = Sha256::new();
        hasher.update(GENERATOR_DOMAIN);
        hasher.update((label.len() as u64).to_le_bytes());
        hasher.update(label);
        hasher.update(index.to_le_bytes());
        hasher.update(counter.to_le_bytes());
        let digest: [u8; 32] = hasher.finalize().into();

        if let Some(point) = CompressedRistretto(digest).decompress() {
            if !point.is_identity() {
                return point;
            }
        }
        counter += 1;
    }
}

/// The two generator vectors consumed by the bulletproof vector commitments.
#[derive(Clone, Debug)]
pub struct BulletproofGens {
    pub g_vec: Vec<RistrettoPoint>,
    pub h_vec: Vec<RistrettoPoint>,
}

impl BulletproofGens {
    pub fn new(capacity: usize) -> Self {
        let g_vec = (0..capacity as u32)
            .map(|i| hash_to_point(b"bp-G", i))
            .collect();
        let h_vec = (0..capacity as u32)
            .map(|i| hash_to_point(b"bp-H", i))
            .collect();

        Self { g_vec, h_vec }
    }

    pub fn capacity(&self) -> usize {
        self.g_vec.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_hash_to_point_deterministic() {
        let p1 = hash_to_point(b"bp-G", 7);
        let p2 = hash_to_point(b"bp-G", 7);

        assert_eq!(p1.compress().to_bytes(), p2.compress().to_bytes());
    }

    #[test]
    fn test_labels_and_indices_separate() {
        assert_ne!(hash_to_point(b"bp-G", 0), hash_to_point(b"bp-H", 0));
        assert_ne!(hash_to_point(b"bp-G", 0), hash_to_point(b"bp-G", 1));
    }

    #[test]
    fn test_h_generator_independence() {
        assert_ne!(G, *H);
        assert!(!H.is_identity());
        assert_eq!(*H, hash_to_point(b"pedersen-H", 0));
    }

    #[test]
    fn test_bulletproof_gens_distinct() {
        let gens = BulletproofGens::new(RANGE_PROOF_BITS);
        assert_eq!(gens.capacity(), 64);
        assert_eq!(gens.h_vec.len(), 64);

        let mut seen = HashSet::new();
        for point in gens.g_vec.iter().chain(gens.h_vec.iter()) {
            assert!(seen.insert(point.compress().to_bytes()));
        }
        assert!(!seen.contains(&H.compress().to_bytes()));
        assert!(!seen.contains(&G.compress().to_bytes()));
    }

    #[test]
    fn test_global_gens_match_fresh_derivation() {
        let fresh = BulletproofGens::new(RANGE_PROOF_BITS);
        assert_eq!(BULLETPROOF_GENS.g_vec, fresh.g_vec);
        assert_eq!(BULLETPROOF_GENS.h_vec, fresh.h_vec);
    }
}
