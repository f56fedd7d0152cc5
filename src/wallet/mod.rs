//! Wallet Module
//!
//! Recovery phrases, seed stretching, derivation paths and per-chain key
//! derivation.

mod derivation;
mod derivation_path;
mod seed;
mod validation;

pub use derivation::*;
pub use derivation_path::*;
pub use seed::*;
pub use validation::*;
