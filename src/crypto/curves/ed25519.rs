//! Ed25519 Curve Implementation
//!
//! Used by: Solana.
//!
//! Features:
//! - Public key computation (RFC 8032)
//! - SLIP-0010 key derivation (hardened only)

use super::{CurveError, EllipticCurve, ExtendedKey, KeyDerivation};
use ed25519_dalek::SigningKey;
use hmac::{Hmac, Mac};
use sha2::Sha512;

type HmacSha512 = Hmac<Sha512>;

/// HMAC key for the SLIP-0010 ed25519 master node
const MASTER_HMAC_KEY: &[u8] = b"ed25519 seed";

/// Hardened offset for SLIP-0010 derivation
pub const HARDENED: u32 = 0x8000_0000;

/// Ed25519 curve implementation
pub struct Ed25519Curve;

impl EllipticCurve for Ed25519Curve {
    type PublicKey = [u8; 32];

    fn public_key_from_private(private_key: &[u8]) -> Result<Self::PublicKey, CurveError> {
        let sk_bytes: [u8; 32] = private_key.try_into().map_err(|_| {
            CurveError::InvalidPrivateKey(format!(
                "Private key must be 32 bytes, got {}",
                private_key.len()
            ))
        })?;

        let signing_key = SigningKey::from_bytes(&sk_bytes);
        Ok(signing_key.verifying_key().to_bytes())
    }
}

impl KeyDerivation for Ed25519Curve {
    fn master_key(seed: &[u8]) -> Result<ExtendedKey, CurveError> {
        if !(16..=64).contains(&seed.len()) {
            return Err(CurveError::InvalidSeed(format!(
                "Seed must be 16 to 64 bytes, got {}",
                seed.len()
            )));
        }

        let mut mac = HmacSha512::new_from_slice(MASTER_HMAC_KEY)
            .map_err(|e| CurveError::DerivationFailed(e.to_string()))?;
        mac.update(seed);

        ExtendedKey::from_hmac_output(&mac.finalize().into_bytes())
    }

    fn derive_child(
        parent: &ExtendedKey,
        index: u32,
        hardened: bool,
    ) -> Result<ExtendedKey, CurveError> {
        // Ed25519 only supports hardened derivation (SLIP-0010)
        if !hardened {
            return Err(CurveError::DerivationFailed(
                "Ed25519 only supports hardened derivation".into(),
            ));
        }
        if index >= HARDENED {
            return Err(CurveError::DerivationFailed(format!(
                "Index {} already carries the hardened bit",
                index
            )));
        }

        let mut mac = HmacSha512::new_from_slice(&parent.chain_code)
            .map_err(|e| CurveError::DerivationFailed(e.to_string()))?;

        // SLIP-0010: 0x00 || private_key || index
        mac.update(&[0x00]);
        mac.update(&parent.key);
        mac.update(&(index | HARDENED).to_be_bytes());

        ExtendedKey::from_hmac_output(&mac.finalize().into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // SLIP-0010 test vector 1 for ed25519
    const SEED: &str = "000102030405060708090a0b0c0d0e0f";

    #[test]
    fn test_slip10_master_key() {
        let seed = hex::decode(SEED).unwrap();
        let master = Ed25519Curve::master_key(&seed).unwrap();
        assert_eq!(
            hex::encode(master.key),
            "2b4be7f19ee27bbf30c667b642d5f4aa69fd169872f8fc3059c08ebae2eb19e7"
        );
        assert_eq!(
            hex::encode(master.chain_code),
            "90046a93de5380a72b5e45010748567d5ea02bbf6522f979e05c0d8d8ca9fffb"
        );
    }

    #[test]
    fn test_slip10_first_hardened_child() {
        let seed = hex::decode(SEED).unwrap();
        let child = Ed25519Curve::derive_path(&seed, &[0]).unwrap();
        assert_eq!(
            hex::encode(child.key),
            "68e0fe46dfb67e368c75379acec591dad19df3cde26e63b93a8e704f1dade7a3"
        );

        let public = Ed25519Curve::public_key_from_private(&child.key).unwrap();
        assert_eq!(
            hex::encode(public),
            "8c8a13df77a28f3445213a0f432fde644acaa215fc72dcdf300d5efaa85d350c"
        );
    }

    #[test]
    fn test_rejects_non_hardened_and_bad_index() {
        let seed = hex::decode(SEED).unwrap();
        let master = Ed25519Curve::master_key(&seed).unwrap();
        assert!(Ed25519Curve::derive_child(&master, 0, false).is_err());
        assert!(Ed25519Curve::derive_child(&master, HARDENED, true).is_err());
    }

    #[test]
    fn test_rejects_short_seed() {
        assert!(matches!(
            Ed25519Curve::master_key(&[0u8; 8]),
            Err(CurveError::InvalidSeed(_))
        ));
    }

    #[test]
    fn test_public_key_rfc8032_vector() {
        let sk = hex::decode("9d61b19deffd5a60ba844af492ec2cc44449c5697b326919703bac031cae7f60").unwrap();
        let pk = Ed25519Curve::public_key_from_private(&sk).unwrap();
        assert_eq!(
            hex::encode(pk),
            "d75a980182b10ab7d54bfed3c964073a0ee172f3daa62325af021a68f707511a"
        );
    }
}
