//! Curve Support
//!
//! Two curve families back the supported chains:
//!
//! - `ed25519`: Solana keys, and the SLIP-0010 derivation tree used for every chain
//! - `secp256k1`: Ethereum keys
//!
//! Both implement the `EllipticCurve` trait; only ed25519 implements
//! `KeyDerivation`.

pub mod ed25519;
pub mod secp256k1;
pub mod traits;

pub use ed25519::Ed25519Curve;
pub use secp256k1::Secp256k1Curve;
pub use traits::*;

use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Errors that can occur during curve operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum CurveError {
    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),
    #[error("Invalid seed: {0}")]
    InvalidSeed(String),
    #[error("Key derivation failed: {0}")]
    DerivationFailed(String),
}

/// A private key together with its chain code
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct ExtendedKey {
    pub key: [u8; 32],
    pub chain_code: [u8; 32],
}

impl ExtendedKey {
    /// Split a 64-byte HMAC output into key and chain code
    pub(crate) fn from_hmac_output(output: &[u8]) -> Result<Self, CurveError> {
        if output.len() != 64 {
            return Err(CurveError::DerivationFailed(format!(
                "HMAC output must be 64 bytes, got {}",
                output.len()
            )));
        }

        let mut key = [0u8; 32];
        key.copy_from_slice(&output[..32]);
        let mut chain_code = [0u8; 32];
        chain_code.copy_from_slice(&output[32..]);

        Ok(Self { key, chain_code })
    }
}

impl std::fmt::Debug for ExtendedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ExtendedKey([REDACTED])")
    }
}
