use crate::proof::ProofData;
use serde::{Deserialize, Serialize};

/// Payload submitted to a ledger-native proof verification program.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VerifyProofInstruction {
    pub program_id: String,
    pub proof_data: ProofData,
}

impl VerifyProofInstruction {
    pub fn new(program_id: impl Into<String>, proof_data: ProofData) -> Self {
        Self {
            program_id: program_id.into(),
            proof_data,
        }
    }

    /// Instruction data: the bincode-encoded proof envelope.
    pub fn data(&self) -> bincode::Result<Vec<u8>> {
        self.proof_data.to_bytes()
    }
}
