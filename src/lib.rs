//! # BillBook Core
//!
//! The financial computation core of a billing and credit-book application:
//! GST invoice breakdowns, installment schedules, cash reconciliation, and
//! ledger statements.
//!
//! ## Features
//!
//! - **GST calculations**: per-line and invoice-level CGST/SGST/IGST
//!   breakdowns with discounts and auditable total rounding
//! - **Installment schedules**: flat-rate generation, reducing-balance
//!   amortization views, top-up adjustments, and settlements
//! - **Cash reconciliation**: one authoritative cash balance merged from
//!   current and legacy record collections, partner capital, expenses, and
//!   manual ledger entries
//! - **Statements**: per-customer Out/In ledgers and whole-book cash
//!   account views with running balances
//! - **Storage abstraction**: database-agnostic design with a trait-based
//!   snapshot source
//!
//! Every computation is a pure function over an immutable snapshot; the
//! core never mutates source records and performs no I/O of its own.
//!
//! ## Quick Start
//!
//! ```rust
//! use billbook_core::{compute_invoice, Invoice, InvoiceLine};
//! use bigdecimal::BigDecimal;
//! use chrono::NaiveDate;
//!
//! let mut invoice = Invoice::new(
//!     "INV-1".to_string(),
//!     NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
//! );
//! invoice.supplier_state = Some("Delhi".to_string());
//! invoice.customer_state = Some("Delhi".to_string());
//! invoice.lines.push(InvoiceLine::new(
//!     "Widget".to_string(),
//!     BigDecimal::from(2),
//!     BigDecimal::from(500),
//!     BigDecimal::from(18),
//! ));
//!
//! let totals = compute_invoice(&invoice).unwrap();
//! assert_eq!(totals.total, BigDecimal::from(1180));
//! ```

pub mod reconcile;
pub mod schedule;
pub mod statement;
pub mod tax;
pub mod traits;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use reconcile::*;
pub use schedule::*;
pub use statement::*;
pub use tax::*;
pub use traits::*;
pub use types::*;
