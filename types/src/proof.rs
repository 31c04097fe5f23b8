use crate::commitment::{CiphertextData, CommitmentData};
use serde::{Deserialize, Serialize};

/// Serialized proof plus the public values it was produced against.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProofData {
    pub proof: Vec<u8>,
    pub public_inputs: PublicInputs,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PublicInputs {
    pub source_pubkey: [u8; 32],
    pub destination_pubkey: [u8; 32],
    pub source_ciphertext: CiphertextData,
    pub destination_ciphertext: CiphertextData,
    pub new_source_commitment: CommitmentData,
}

impl ProofData {
    pub fn new(proof: Vec<u8>, public_inputs: PublicInputs) -> Self {
        Self {
            proof,
            public_inputs,
        }
    }

    pub fn to_bytes(&self) -> bincode::Result<Vec<u8>> {
        bincode::serialize(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> bincode::Result<Self> {
        bincode::deserialize(bytes)
    }
}
