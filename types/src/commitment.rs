use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommitmentData {
    pub commitment: [u8; 32],
}

impl CommitmentData {
    pub fn new(commitment: [u8; 32]) -> Self {
        Self { commitment }
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.commitment
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.commitment)
    }
}

impl From<[u8; 32]> for CommitmentData {
    fn from(commitment: [u8; 32]) -> Self {
        Self::new(commitment)
    }
}

/// Wire form of a twisted ElGamal ciphertext: the Pedersen commitment
/// followed by the decryption handle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CiphertextData {
    pub commitment: [u8; 32],
    pub handle: [u8; 32],
}

impl CiphertextData {
    pub fn new(commitment: [u8; 32], handle: [u8; 32]) -> Self {
        Self { commitment, handle }
    }

    pub fn to_bytes(&self) -> [u8; 64] {
        let mut out = [0u8; 64];
        out[..32].copy_from_slice(&self.commitment);
        out[32..].copy_from_slice(&self.handle);
        out
    }

    pub fn commitment_data(&self) -> CommitmentData {
        CommitmentData::new(self.commitment)
    }
}

impl From<[u8; 64]> for CiphertextData {
    fn from(bytes: [u8; 64]) -> Self {
        let mut commitment = [0u8; 32];
        let mut handle = [0u8; 32];
        commitment.copy_from_slice(&bytes[..32]);
        handle.copy_from_slice(&bytes[32..]);
        Self { commitment, handle }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commitment_data() {
        let data = CommitmentData::new([42u8; 32]);
        assert_eq!(data.as_bytes(), &[42u8; 32]);
        assert_eq!(data.to_hex(), "2a".repeat(32));

        let from_array: CommitmentData = [1u8; 32].into();
        assert_eq!(from_array.commitment, [1u8; 32]);
    }

    #[test]
    fn test_ciphertext_data_layout() {
        let mut bytes = [1u8; 64];
        bytes[32..].fill(2);

        let data = CiphertextData::from(bytes);
        assert_eq!(data.commitment, [1u8; 32]);
        assert_eq!(data.handle, [2u8; 32]);
        assert_eq!(data.to_bytes(), bytes);
        assert_eq!(data.commitment_data(), CommitmentData::new([1u8; 32]));
    }
}
