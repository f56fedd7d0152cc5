//! Portfolio Module
//!
//! Token holdings for a wallet address, enriched from the static registry
//! and the metadata service.

mod aggregator;
mod registry;

pub use aggregator::*;
pub use registry::*;
