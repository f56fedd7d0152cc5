//! Unified error types for Plutus Core
//!
//! All errors flow through this module for consistent handling
//! and FFI-safe error reporting.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Main error type for all Plutus operations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlutusError {
    pub code: ErrorCode,
    pub message: String,
    pub details: Option<String>,
}

impl PlutusError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    // Convenience constructors
    pub fn invalid_phrase(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidPhrase, msg)
    }

    pub fn unsupported_chain(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::UnsupportedChain, msg)
    }

    pub fn derivation(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::DerivationError, msg)
    }

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidState, msg)
    }

    pub fn ledger(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::LedgerQueryError, msg)
    }

    pub fn metadata(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::MetadataFetchError, msg)
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::DecodeError, msg)
    }

    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::PersistenceError, msg)
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigError, msg)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, msg)
    }

    /// Errors the engine degrades around instead of surfacing as fatal.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self.code,
            ErrorCode::LedgerQueryError | ErrorCode::MetadataFetchError | ErrorCode::DecodeError
        )
    }
}

impl fmt::Display for PlutusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)?;
        if let Some(ref details) = self.details {
            write!(f, " ({})", details)?;
        }
        Ok(())
    }
}

impl std::error::Error for PlutusError {}

/// Error codes for categorization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    // Wallet errors
    InvalidPhrase,
    UnsupportedChain,
    DerivationError,
    InvalidState,

    // Remote collaborators
    LedgerQueryError,
    MetadataFetchError,

    // Payload and storage errors
    DecodeError,
    PersistenceError,
    ConfigError,
    JsonError,

    // Internal
    Internal,
}

/// Result type alias for Plutus operations
pub type PlutusResult<T> = Result<T, PlutusError>;

// Conversions from common error types

impl From<serde_json::Error> for PlutusError {
    fn from(e: serde_json::Error) -> Self {
        PlutusError::new(ErrorCode::JsonError, e.to_string())
    }
}

impl From<std::io::Error> for PlutusError {
    fn from(e: std::io::Error) -> Self {
        PlutusError::new(ErrorCode::PersistenceError, e.to_string())
    }
}

impl From<reqwest::Error> for PlutusError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            PlutusError::ledger("Request timed out")
        } else if e.is_connect() {
            PlutusError::ledger("Connection failed")
        } else {
            PlutusError::ledger(e.to_string())
        }
    }
}

impl From<secp256k1::Error> for PlutusError {
    fn from(e: secp256k1::Error) -> Self {
        PlutusError::derivation(format!("Secp256k1 error: {}", e))
    }
}

impl From<bip39::Error> for PlutusError {
    fn from(e: bip39::Error) -> Self {
        PlutusError::invalid_phrase(format!("BIP39 error: {}", e))
    }
}

impl From<crate::crypto::curves::CurveError> for PlutusError {
    fn from(e: crate::crypto::curves::CurveError) -> Self {
        PlutusError::derivation(e.to_string())
    }
}

impl From<crate::api::DecodeError> for PlutusError {
    fn from(e: crate::api::DecodeError) -> Self {
        PlutusError::decode(e.to_string())
    }
}
