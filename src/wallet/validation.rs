//! Phrase and Address Validation
//!
//! Boolean checks for UI input. These never panic and fail closed.

use crate::types::Chain;
use crate::utils::crypto::to_checksum_address;

use super::seed::RecoveryPhrase;

/// Check a candidate phrase given as individual words
pub fn validate_words(words: &[&str]) -> bool {
    RecoveryPhrase::from_words(words).is_ok()
}

/// Check a whitespace-separated phrase
pub fn validate_phrase(phrase: &str) -> bool {
    let words: Vec<&str> = phrase.split_whitespace().collect();
    validate_words(&words)
}

/// Validate an address for a chain
/// Returns (is_valid, normalized_address)
pub fn validate_address(address: &str, chain: Chain) -> (bool, Option<String>) {
    match chain {
        Chain::Solana => validate_solana_address(address),
        Chain::Ethereum => validate_ethereum_address(address),
    }
}

fn validate_ethereum_address(address: &str) -> (bool, Option<String>) {
    let trimmed = address.trim();

    let hex_part = match trimmed.strip_prefix("0x") {
        Some(h) if h.len() == 40 => h,
        _ => return (false, None),
    };

    match hex::decode(hex_part) {
        Ok(bytes) => (true, Some(to_checksum_address(&bytes))),
        Err(_) => (false, None),
    }
}

fn validate_solana_address(address: &str) -> (bool, Option<String>) {
    let trimmed = address.trim();

    // Base58-encoded 32-byte public key
    match bs58::decode(trimmed).into_vec() {
        Ok(bytes) if bytes.len() == 32 => (true, Some(trimmed.to_string())),
        _ => (false, None),
    }
}
