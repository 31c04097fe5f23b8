pub use crate::pedersen::{commit, generate_blinding, verify_commitment, PedersenCommitment};

pub use crate::elgamal::{
    DecryptHandle, ElGamalCiphertext, ElGamalKeypair, ElGamalPubkey, ElGamalSecretKey,
};

pub use crate::range_proof::{RangeProof, RANGE_PROOF_SIZE};

pub use crate::validity_proof::{ValidityProof, VALIDITY_PROOF_SIZE};

pub use crate::grouped_validity_proof::{
    GroupedCiphertext, GroupedValidityProof, GROUPED_VALIDITY_PROOF_SIZE,
};

pub use crate::equality_proof::{EqualityProof, EqualityStatement, EQUALITY_PROOF_SIZE};

pub use crate::transfer::{
    TransferContext, TransferInput, TransferProof, TRANSFER_CONTEXT_SIZE, TRANSFER_PROOF_SIZE,
};

pub use curve25519_dalek::{ristretto::RistrettoPoint, scalar::Scalar};
