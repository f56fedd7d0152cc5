//! Plutus Core Library
//!
//! HD account derivation and portfolio sync engine for the Plutus
//! multi-chain wallet (Solana and Ethereum).
//!
//! # Architecture
//!
//! This crate provides:
//! - **wallet**: Recovery phrases, SLIP-0010 derivation, address validation
//! - **store**: Persisted account lifecycle over a key-value collaborator
//! - **balances**: Native balance polling, one cancellable task per account
//! - **portfolio**: Token holdings with registry and metadata enrichment
//! - **session**: Single owner wiring the store and the balance tracker
//! - **api**: Ledger and metadata clients (JSON-RPC over HTTP)
//! - **ffi**: C-ABI exports for the UI layer
//!
//! # FFI Usage
//!
//! All public FFI functions are in the `ffi` module and follow this pattern:
//! - Input: JSON string (null-terminated C string)
//! - Output: JSON string (must be freed with `plutus_free_string`)
//!
//! # Security
//!
//! Phrases, seeds and private keys are zeroized on drop. Only public keys,
//! paths and balances are persisted per account; keys are re-derived on load.
//!
//! # Example
//!
//! ```rust,ignore
//! use plutus_core::{wallet, Chain};
//!
//! let phrase = wallet::generate_phrase()?;
//! let account = wallet::derive_account(&phrase, Chain::Solana, 0)?;
//! println!("{} at {}", account.public_key, account.path);
//! ```

pub mod api;
pub mod balances;
pub mod config;
pub mod crypto;
pub mod error;
pub mod ffi;
pub mod portfolio;
pub mod session;
pub mod store;
pub mod types;
pub mod utils;
pub mod wallet;

pub use config::EngineConfig;
pub use error::{ErrorCode, PlutusError, PlutusResult};
pub use session::WalletSession;
pub use types::*;

pub use utils::crypto::{keccak256, to_checksum_address};

pub use ffi::{
    plutus_derive_account,
    plutus_free_string,
    plutus_generate_phrase,
    plutus_search_holdings,
    plutus_validate_address,
    plutus_validate_phrase,
};
