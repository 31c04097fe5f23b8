//! Scalar vector arithmetic and point decoding helpers.
//!
//! Every vector operation requires equal-length inputs and reports
//! [`CryptoError::LengthMismatch`] rather than truncating to the shorter one.

use curve25519_dalek::{
    ristretto::{CompressedRistretto, RistrettoPoint},
    scalar::Scalar,
    traits::{IsIdentity, MultiscalarMul, VartimeMultiscalarMul},
};

use crate::errors::{CryptoError, Result};

fn check_lengths(a: &[Scalar], b: &[Scalar]) -> Result<()> {
    if a.len() != b.len() {
        return Err(CryptoError::LengthMismatch(a.len(), b.len()));
    }
    Ok(())
}

pub fn add(a: &[Scalar], b: &[Scalar]) -> Result<Vec<Scalar>> {
    check_lengths(a, b)?;
    Ok(a.iter().zip(b).map(|(x, y)| x + y).collect())
}

pub fn sub(a: &[Scalar], b: &[Scalar]) -> Result<Vec<Scalar>> {
    check_lengths(a, b)?;
    Ok(a.iter().zip(b).map(|(x, y)| x - y).collect())
}

/// Entry-wise product.
pub fn hadamard(a: &[Scalar], b: &[Scalar]) -> Result<Vec<Scalar>> {
    check_lengths(a, b)?;
    Ok(a.iter().zip(b).map(|(x, y)| x * y).collect())
}

pub fn scale(a: &[Scalar], k: &Scalar) -> Vec<Scalar> {
    a.iter().map(|x| x * k).collect()
}

pub fn add_scalar(a: &[Scalar], k: &Scalar) -> Vec<Scalar> {
    a.iter().map(|x| x + k).collect()
}

pub fn inner_product(a: &[Scalar], b: &[Scalar]) -> Result<Scalar> {
    check_lengths(a, b)?;
    Ok(a.iter().zip(b).map(|(x, y)| x * y).sum())
}

/// `[1, x, x^2, ..., x^(n-1)]`
pub fn powers(x: &Scalar, n: usize) -> Vec<Scalar> {
    let mut out = Vec::with_capacity(n);
    let mut current = Scalar::ONE;
    for _ in 0..n {
        out.push(current);
        current *= x;
    }
    out
}

/// `1 + x + x^2 + ... + x^(n-1)`
pub fn sum_of_powers(x: &Scalar, n: usize) -> Scalar {
    powers(x, n).iter().sum()
}

pub fn multiscalar_mul(scalars: &[Scalar], points: &[RistrettoPoint]) -> Result<RistrettoPoint> {
    if scalars.len() != points.len() {
        return Err(CryptoError::LengthMismatch(scalars.len(), points.len()));
    }
    Ok(RistrettoPoint::multiscalar_mul(scalars, points))
}

/// Variable-time variant for verifiers, which only ever touch public data.
pub fn vartime_multiscalar_mul(
    scalars: &[Scalar],
    points: &[RistrettoPoint],
) -> Result<RistrettoPoint> {
    if scalars.len() != points.len() {
        return Err(CryptoError::LengthMismatch(scalars.len(), points.len()));
    }
    Ok(RistrettoPoint::vartime_multiscalar_mul(scalars, points))
}

/// Decodes a compressed point, rejecting invalid encodings and the identity.
pub fn decode_point(bytes: &[u8; 32]) -> Result<RistrettoPoint> {
    let point = decompress_point(bytes)?;
    ensure_not_identity(&point)?;
    Ok(point)
}

/// Decodes a compressed point; the identity is accepted.
pub fn decompress_point(bytes: &[u8; 32]) -> Result<RistrettoPoint> {
    CompressedRistretto(*bytes)
        .decompress()
        .ok_or(CryptoError::InvalidPoint)
}

pub fn ensure_not_identity(point: &RistrettoPoint) -> Result<()> {
    if point.is_identity() {
        return Err(CryptoError::InvalidPoint);
    }
    Ok(())
}

/// Decodes a scalar that must already be reduced into `[0, n)`.
pub fn decode_scalar(bytes: &[u8; 32]) -> Result<Scalar> {
    Option::<Scalar>::from(Scalar::from_canonical_bytes(*bytes)).ok_or(CryptoError::InvalidScalar)
}

pub fn ensure_nonzero(scalar: &Scalar) -> Result<()> {
    if *scalar == Scalar::ZERO {
        return Err(CryptoError::InvalidRandomness);
    }
    Ok(())
}

/// Reads the next 32-byte field from a fixed-layout proof encoding.
pub(crate) fn read_array(bytes: &[u8], offset: &mut usize) -> Result<[u8; 32]> {
    let end = *offset + 32;
    let slice = bytes
        .get(*offset..end)
        .ok_or_else(|| CryptoError::MalformedProof(format!("truncated at byte {}", offset)))?;
    let mut out = [0u8; 32];
    out.copy_from_slice(slice);
    *offset = end;
    Ok(out)
}

pub(crate) fn read_point(bytes: &[u8], offset: &mut usize) -> Result<RistrettoPoint> {
    decode_point(&read_array(bytes, offset)?)
}

pub(crate) fn read_scalar(bytes: &[u8], offset: &mut usize) -> Result<Scalar> {
    decode_scalar(&read_array(bytes, offset)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use curve25519_dalek::{constants::RISTRETTO_BASEPOINT_POINT, traits::Identity};

    fn scalars(values: &[u64]) -> Vec<Scalar> {
        values.iter().map(|v| Scalar::from(*v)).collect()
    }

    #[test]
    fn test_vector_ops() {
        let a = scalars(&[1, 2, 3]);
        let b = scalars(&[4, 5, 6]);

        assert_eq!(add(&a, &b).unwrap(), scalars(&[5, 7, 9]));
        assert_eq!(sub(&b, &a).unwrap(), scalars(&[3, 3, 3]));
        assert_eq!(hadamard(&a, &b).unwrap(), scalars(&[4, 10, 18]));
        assert_eq!(scale(&a, &Scalar::from(2u64)), scalars(&[2, 4, 6]));
        assert_eq!(add_scalar(&a, &Scalar::ONE), scalars(&[2, 3, 4]));
        assert_eq!(inner_product(&a, &b).unwrap(), Scalar::from(32u64));
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let a = scalars(&[1, 2, 3]);
        let b = scalars(&[1, 2]);

        assert_eq!(add(&a, &b), Err(CryptoError::LengthMismatch(3, 2)));
        assert!(sub(&a, &b).is_err());
        assert!(hadamard(&a, &b).is_err());
        assert!(inner_product(&a, &b).is_err());
        assert!(multiscalar_mul(&a, &[RISTRETTO_BASEPOINT_POINT]).is_err());
    }

    #[test]
    fn test_powers() {
        let two = Scalar::from(2u64);
        assert_eq!(powers(&two, 4), scalars(&[1, 2, 4, 8]));
        assert_eq!(sum_of_powers(&two, 4), Scalar::from(15u64));
        assert!(powers(&two, 0).is_empty());
    }

    #[test]
    fn test_decode_point_rejects_identity() {
        let identity = RistrettoPoint::identity().compress().to_bytes();
        assert_eq!(decode_point(&identity), Err(CryptoError::InvalidPoint));

        let g = RISTRETTO_BASEPOINT_POINT.compress().to_bytes();
        assert_eq!(decode_point(&g).unwrap(), RISTRETTO_BASEPOINT_POINT);

        assert!(decode_point(&[0xffu8; 32]).is_err());
    }

    #[test]
    fn test_decompress_point_accepts_identity() {
        let identity = RistrettoPoint::identity().compress().to_bytes();
        assert_eq!(decompress_point(&identity).unwrap(), RistrettoPoint::identity());
        assert_eq!(decompress_point(&[0xffu8; 32]), Err(CryptoError::InvalidPoint));
    }

    #[test]
    fn test_decode_scalar_rejects_non_canonical() {
        assert!(decode_scalar(&[0xffu8; 32]).is_err());
        assert_eq!(
            decode_scalar(&Scalar::from(7u64).to_bytes()).unwrap(),
            Scalar::from(7u64)
        );
    }

    #[test]
    fn test_ensure_nonzero() {
        assert_eq!(ensure_nonzero(&Scalar::ZERO), Err(CryptoError::InvalidRandomness));
        assert!(ensure_nonzero(&Scalar::ONE).is_ok());
    }
}
