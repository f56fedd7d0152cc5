//! Key Derivation
//!
//! Derives per-chain keypairs from a BIP-39 seed along
//! `m/44'/<coin>'/0'/<index>'` using SLIP-0010 ed25519 hardened derivation,
//! then encodes the 32-byte child key the way each chain expects.

use ed25519_dalek::SigningKey;
use rust_decimal::Decimal;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::crypto::{Ed25519Curve, EllipticCurve, KeyDerivation, Secp256k1Curve};
use crate::error::PlutusResult;
use crate::types::{Account, Chain};
use crate::utils::crypto::{keccak256, to_checksum_address};

use super::derivation_path::DerivationPath;
use super::seed::{to_seed, RecoveryPhrase, Seed};

/// Encoded keypair for one account
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct DerivedKeys {
    /// Base58 public key or EIP-55 address
    pub public_key: String,
    /// Base58 64-byte keypair or lowercase hex secret
    pub private_key: String,
    #[zeroize(skip)]
    pub path: DerivationPath,
}

impl std::fmt::Debug for DerivedKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivedKeys")
            .field("public_key", &self.public_key)
            .field("private_key", &"[REDACTED]")
            .field("path", &self.path.to_string())
            .finish()
    }
}

/// Derive the keypair for `chain` at `account_index`
pub fn derive(seed: &Seed, chain: Chain, account_index: u32) -> PlutusResult<DerivedKeys> {
    let path = DerivationPath::new(chain, account_index)?;
    derive_at_path(seed, &path)
}

/// Derive the keypair at an already-built path
pub fn derive_at_path(seed: &Seed, path: &DerivationPath) -> PlutusResult<DerivedKeys> {
    let child = Ed25519Curve::derive_path(seed.as_bytes(), &path.hardened_indices())?;

    let (public_key, private_key) = match path.chain() {
        Chain::Solana => encode_solana(&child.key),
        Chain::Ethereum => encode_ethereum(&child.key)?,
    };

    Ok(DerivedKeys {
        public_key,
        private_key,
        path: path.clone(),
    })
}

/// Derive a full account record from a phrase
pub fn derive_account(
    phrase: &RecoveryPhrase,
    chain: Chain,
    account_index: u32,
) -> PlutusResult<Account> {
    let seed = to_seed(phrase)?;
    let keys = derive(&seed, chain, account_index)?;

    Ok(Account {
        public_key: keys.public_key.clone(),
        private_key: keys.private_key.clone(),
        mnemonic: phrase.clone(),
        path: keys.path.clone(),
        chain,
        balance: Decimal::ZERO,
    })
}

fn encode_solana(secret: &[u8; 32]) -> (String, String) {
    let signing_key = SigningKey::from_bytes(secret);
    let public_key_bytes = signing_key.verifying_key().to_bytes();

    let mut keypair_bytes = Zeroizing::new([0u8; 64]);
    keypair_bytes[..32].copy_from_slice(secret);
    keypair_bytes[32..].copy_from_slice(&public_key_bytes);

    (
        bs58::encode(public_key_bytes).into_string(),
        bs58::encode(&keypair_bytes[..]).into_string(),
    )
}

fn encode_ethereum(secret: &[u8; 32]) -> PlutusResult<(String, String)> {
    let uncompressed = Secp256k1Curve::public_key_from_private(secret)?;
    let address_bytes = keccak256(&uncompressed[1..]);
    let address = to_checksum_address(&address_bytes[12..]);

    Ok((address, hex::encode(secret)))
}
