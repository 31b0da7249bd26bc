//! Installment schedule generation and maintenance.
//!
//! Two interest models are supported. Flat-rate is the model persisted
//! schedules are generated with: interest is computed once on the original
//! principal for the whole tenure and every installment is equal.
//! Reducing-balance is the amortization view used for printed tables when no
//! persisted schedule exists: each period's interest is charged on the
//! running balance.

pub mod adjust;
pub mod generate;

pub use adjust::*;
pub use generate::*;
