//! secp256k1 Curve Implementation
//!
//! Used by: Ethereum.
//!
//! Keys for this curve come out of the shared SLIP-0010 tree; this module
//! only validates the scalar and computes the public point.

use super::{CurveError, EllipticCurve};
use secp256k1::{PublicKey, Secp256k1, SecretKey};

/// secp256k1 curve implementation
pub struct Secp256k1Curve;

impl EllipticCurve for Secp256k1Curve {
    /// Uncompressed SEC1 point: 0x04 || X || Y
    type PublicKey = [u8; 65];

    fn public_key_from_private(private_key: &[u8]) -> Result<Self::PublicKey, CurveError> {
        if private_key.len() != 32 {
            return Err(CurveError::InvalidPrivateKey(format!(
                "Private key must be 32 bytes, got {}",
                private_key.len()
            )));
        }

        let secp = Secp256k1::signing_only();
        let sk = SecretKey::from_slice(private_key)
            .map_err(|e| CurveError::InvalidPrivateKey(e.to_string()))?;

        let pk = PublicKey::from_secret_key(&secp, &sk);
        Ok(pk.serialize_uncompressed())
    }
}
