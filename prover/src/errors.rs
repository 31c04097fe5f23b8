use confidential_crypto::CryptoError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProverError {
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error("Feature gate probe failed: {0}")]
    NetworkUnavailable(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ProverError>;
