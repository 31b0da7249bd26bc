//! GST tax computation for invoices

pub mod invoice;

pub use invoice::*;
