use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]

pub enum CryptoError {
    #[error("Value outside the range [0, 2^64)")]
    RangeViolation,

    #[error("Blinding factor or nonce must be a nonzero scalar")]
    InvalidRandomness,

    #[error("Malformed proof: {0}")]
    MalformedProof(String),

    #[error("Identity or undecodable ristretto point")]
    InvalidPoint,

    #[error("Invalid scalar value")]
    InvalidScalar,

    #[error("Vector length mismatch: {0} != {1}")]
    LengthMismatch(usize, usize),

    #[error("Commitment does not open to the given value and blinding")]
    InvalidCommitment,

    #[error("Transfer amount exceeds source balance")]
    InsufficientFunds,

    #[error("Source ciphertext does not decrypt to the claimed balance")]
    BalanceMismatch,

    #[error("Proof verification failed: {0}")]
    VerificationFailed(&'static str),

    #[error("Deserialization error: {0}")]
    Deserialization(String),
}

pub type Result<T> = std::result::Result<T, CryptoError>;
