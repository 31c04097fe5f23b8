use curve25519_dalek::scalar::Scalar;
use rand_core::{CryptoRng, RngCore};

use crate::errors::{CryptoError, Result};

/// Samples a uniformly random scalar; zero is resampled.
pub fn random_nonzero_scalar<R: RngCore + CryptoRng>(rng: &mut R) -> Scalar {
    loop {
        let mut bytes = [0u8; 64];
        rng.fill_bytes(&mut bytes);
        let scalar = Scalar::from_bytes_mod_order_wide(&bytes);
        if scalar != Scalar::ZERO {
            return scalar;
        }
    }
}

pub fn from_hex(s: &str) -> Result<Vec<u8>> {
    let s = s.strip_prefix("0x").unwrap_or(s);
    hex::decode(s).map_err(|e| CryptoError::Deserialization(format!("Invalid hex: {}", e)))
}

pub fn to_hex(data: &[u8]) -> String {
    format!("0x{}", hex::encode(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_conversion() {
        let data = vec![0x12, 0x34, 0x56, 0x78];
        let hex = to_hex(&data);
        assert_eq!(hex, "0x12345678");

        let decoded = from_hex(&hex).unwrap();
        assert_eq!(decoded, data);

        let decoded2 = from_hex("12345678").unwrap();
        assert_eq!(decoded2, data);

        assert!(from_hex("0xzz").is_err());
    }

    #[test]
    fn test_random_nonzero_scalar() {
        let mut rng = rand::rngs::OsRng;
        let s1 = random_nonzero_scalar(&mut rng);
        let s2 = random_nonzero_scalar(&mut rng);

        assert_ne!(s1, Scalar::ZERO);
        assert_ne!(s1, s2);
    }
}
