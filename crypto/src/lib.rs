// Declare modules
pub mod algebra;
pub mod elgamal;
pub mod equality_proof;
pub mod errors;
pub mod generators;
pub mod grouped_validity_proof;
pub mod inner_product;
pub mod pedersen;
pub mod range_proof;
pub mod transcript;
pub mod transfer;
pub mod utils;
pub mod validity_proof;
pub mod zkproof;

// Re-export commonly used items
pub use errors::{CryptoError, Result};

// Pedersen commitment exports
pub use pedersen::{commit, generate_blinding, verify_commitment, PedersenCommitment};

// Generator exports
pub use generators::{BULLETPROOF_GENS, G, H, RANGE_PROOF_BITS};

pub use transcript::Transcript;

pub use zkproof::*;

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn test_module_structure() {
        let keypair = ElGamalKeypair::new_rand();
        let (ciphertext, _) = keypair.public.encrypt(42);
        assert_eq!(keypair.secret.decrypt_u32(&ciphertext), Some(42));
    }
}
