pub mod commitment;
pub mod instruction;
pub mod mode;
pub mod proof;

pub use commitment::{CiphertextData, CommitmentData};
pub use instruction::VerifyProofInstruction;
pub use mode::{ParseProofModeError, ProofMode, ProofModeStatus};
pub use proof::{ProofData, PublicInputs};
