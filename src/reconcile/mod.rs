//! Cash reconciliation: normalization of heterogeneous record sources and
//! derivation of the single authoritative cash balance.

pub mod engine;
pub mod normalize;

pub use engine::*;
pub use normalize::*;
