//! Balance Sync Module
//!
//! Native-balance polling: the pure `poll`/`reconcile` step and the
//! per-account scheduler that drives it.

mod sync;
mod tracker;

pub use sync::*;
pub use tracker::*;
