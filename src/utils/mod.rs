//! Utilities Module
//!
//! Common utilities used across the crate.

pub mod amount;
pub mod crypto;
mod http;
pub mod logging;

pub use amount::*;
pub use crypto::*;
pub use http::*;
pub use logging::init_logging;
