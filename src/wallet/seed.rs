//! Recovery Phrase and Seed
//!
//! Generates and parses BIP-39 phrases and stretches them into seed bytes.
//!
//! SECURITY: Entropy, phrase words and seeds are zeroized on drop.

use bip39::{Language, Mnemonic};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::error::{PlutusError, PlutusResult};

/// Number of words in every phrase this wallet issues or accepts
pub const PHRASE_WORD_COUNT: usize = 12;

/// Entropy size for a 12-word phrase
const ENTROPY_BYTES: usize = 16;

/// A checksum-valid 12-word English BIP-39 phrase
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct RecoveryPhrase {
    words: Vec<String>,
}

impl RecoveryPhrase {
    /// Parse a whitespace-separated phrase
    pub fn parse(phrase: &str) -> PlutusResult<Self> {
        let words: Vec<&str> = phrase.split_whitespace().collect();
        Self::from_words(&words)
    }

    /// Build from individual words, validating count, wordlist and checksum
    pub fn from_words<S: AsRef<str>>(words: &[S]) -> PlutusResult<Self> {
        if words.len() != PHRASE_WORD_COUNT {
            return Err(PlutusError::invalid_phrase(format!(
                "Expected {} words, got {}",
                PHRASE_WORD_COUNT,
                words.len()
            )));
        }

        let words: Vec<String> = words
            .iter()
            .map(|w| w.as_ref().trim().to_lowercase())
            .collect();

        if let Some(position) = words
            .iter()
            .position(|w| Language::English.find_word(w).is_none())
        {
            return Err(PlutusError::invalid_phrase(format!(
                "Word {} is not in the wordlist",
                position + 1
            )));
        }

        let joined = Zeroizing::new(words.join(" "));
        Mnemonic::parse_in_normalized(Language::English, &joined)?;

        Ok(Self { words })
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    /// Space-joined phrase; the caller owns the zeroizing buffer
    pub fn phrase(&self) -> Zeroizing<String> {
        Zeroizing::new(self.words.join(" "))
    }

    fn mnemonic(&self) -> PlutusResult<Mnemonic> {
        Ok(Mnemonic::parse_in_normalized(
            Language::English,
            &self.phrase(),
        )?)
    }
}

impl TryFrom<Vec<String>> for RecoveryPhrase {
    type Error = PlutusError;

    fn try_from(words: Vec<String>) -> Result<Self, Self::Error> {
        let words = Zeroizing::new(words);
        Self::from_words(words.as_slice())
    }
}

impl From<RecoveryPhrase> for Vec<String> {
    fn from(phrase: RecoveryPhrase) -> Self {
        phrase.words.clone()
    }
}

impl fmt::Debug for RecoveryPhrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecoveryPhrase([REDACTED:{} words])", self.words.len())
    }
}

/// 64-byte BIP-39 seed
pub struct Seed(Zeroizing<[u8; 64]>);

impl Seed {
    /// Wrap an already stretched seed
    pub fn from_bytes(bytes: [u8; 64]) -> Self {
        Self(Zeroizing::new(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_ref()
    }
}

impl fmt::Debug for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Seed([REDACTED])")
    }
}

/// Generate a fresh 12-word phrase from OS randomness
///
/// SECURITY: Entropy is zeroized once the mnemonic is built
pub fn generate_phrase() -> PlutusResult<RecoveryPhrase> {
    let mut entropy = Zeroizing::new([0u8; ENTROPY_BYTES]);
    OsRng.fill_bytes(entropy.as_mut());

    let mnemonic = Mnemonic::from_entropy(entropy.as_ref())
        .map_err(|e| PlutusError::internal(format!("Failed to create mnemonic: {}", e)))?;

    let words: Vec<String> = mnemonic.word_iter().map(str::to_string).collect();
    Ok(RecoveryPhrase { words })
}

/// Passphrase-less PBKDF2 stretch of a phrase
pub fn to_seed(phrase: &RecoveryPhrase) -> PlutusResult<Seed> {
    let mnemonic = phrase.mnemonic()?;
    Ok(Seed(Zeroizing::new(mnemonic.to_seed(""))))
}
