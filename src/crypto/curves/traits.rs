//! Elliptic Curve Traits
//!
//! Defines the common interface for the curve implementations.

use super::{CurveError, ExtendedKey};

/// Core trait for elliptic curve operations
pub trait EllipticCurve {
    /// The public key type
    type PublicKey: AsRef<[u8]>;

    /// Derive the public key from a 32-byte private key
    fn public_key_from_private(private_key: &[u8]) -> Result<Self::PublicKey, CurveError>;
}

/// Curves that define an HD derivation tree
pub trait KeyDerivation: EllipticCurve {
    /// Master key and chain code from a BIP-39 seed
    fn master_key(seed: &[u8]) -> Result<ExtendedKey, CurveError>;

    /// Derive one child. `index` excludes the hardened bit.
    fn derive_child(parent: &ExtendedKey, index: u32, hardened: bool)
        -> Result<ExtendedKey, CurveError>;

    /// Walk a path of hardened indices starting at the master key
    fn derive_path(seed: &[u8], indices: &[u32]) -> Result<ExtendedKey, CurveError> {
        let mut current = Self::master_key(seed)?;
        for index in indices {
            current = Self::derive_child(&current, *index, true)?;
        }
        Ok(current)
    }
}
