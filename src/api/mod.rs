//! API Module
//!
//! Remote collaborators: the ledger (native balances, token accounts) and
//! the off-chain token metadata service. Both sit behind traits so the
//! engine can run against in-memory fakes.

mod ledger;
mod metadata;
mod rpc;

pub use ledger::*;
pub use metadata::*;
pub use rpc::*;

/// Rejection of a ledger payload that does not have the expected shape
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("malformed field `{0}`")]
    MalformedField(&'static str),
    #[error("unexpected program `{0}`")]
    UnexpectedProgram(String),
    #[error("unexpected account type `{0}`")]
    UnexpectedType(String),
    #[error("invalid amount `{0}`")]
    InvalidAmount(String),
    #[error("invalid payload: {0}")]
    Json(String),
}
