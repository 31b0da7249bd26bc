//! Traits for the storage boundary
//!
//! The core never talks to a database. A host application implements
//! [`SnapshotSource`] over whatever store it uses (a hosted document
//! database in production, [`MemorySnapshotStore`](crate::utils::MemorySnapshotStore)
//! in tests) and the [`SnapshotLoader`] turns the reads into one immutable
//! [`Snapshot`].

use async_trait::async_trait;
use bigdecimal::BigDecimal;

use crate::reconcile::{merge_record_sources, NormalizationReport, RawCreditRecord, Snapshot};
use crate::types::*;
use crate::utils::validation::validate_company_id;

/// Read access to the record streams of one company.
///
/// Every method returns the full collection for the company id; filtering
/// and pagination belong to the host, not the core.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    /// Invoices for the billing side
    async fn fetch_invoices(&self, company_id: &str) -> CoreResult<Vec<Invoice>>;

    /// Credit records from the current collection, still in raw shape
    async fn fetch_records(&self, company_id: &str) -> CoreResult<Vec<RawCreditRecord>>;

    /// Credit records from the legacy collection, still in raw shape
    async fn fetch_legacy_records(&self, company_id: &str) -> CoreResult<Vec<RawCreditRecord>>;

    /// Partner capital movements
    async fn fetch_partner_transactions(
        &self,
        company_id: &str,
    ) -> CoreResult<Vec<PartnerTransaction>>;

    /// Recorded expenses
    async fn fetch_expenses(&self, company_id: &str) -> CoreResult<Vec<Expense>>;

    /// Manually posted ledger entries
    async fn fetch_manual_ledger(&self, company_id: &str) -> CoreResult<Vec<ManualLedgerEntry>>;
}

/// Assembles reconciliation snapshots from a [`SnapshotSource`].
///
/// All source reads complete before the record merge runs; the merge is the
/// only barrier the computation core needs.
pub struct SnapshotLoader<S: SnapshotSource> {
    source: S,
    opening_balance: BigDecimal,
}

impl<S: SnapshotSource> SnapshotLoader<S> {
    /// Create a loader with a zero opening balance.
    pub fn new(source: S) -> Self {
        Self {
            source,
            opening_balance: BigDecimal::from(0),
        }
    }

    /// Set the cash-in-hand the book starts from.
    pub fn with_opening_balance(mut self, opening_balance: BigDecimal) -> Self {
        self.opening_balance = opening_balance;
        self
    }

    /// Load and normalize everything reconciliation needs for one company.
    pub async fn load(&self, company_id: &str) -> CoreResult<(Snapshot, NormalizationReport)> {
        validate_company_id(company_id)?;

        let current = self.source.fetch_records(company_id).await?;
        let legacy = self.source.fetch_legacy_records(company_id).await?;
        let partner_transactions = self.source.fetch_partner_transactions(company_id).await?;
        let expenses = self.source.fetch_expenses(company_id).await?;
        let manual_ledger = self.source.fetch_manual_ledger(company_id).await?;

        let (records, report) = merge_record_sources(&current, &legacy);

        Ok((
            Snapshot {
                opening_balance: self.opening_balance.clone(),
                partner_transactions,
                expenses,
                manual_ledger,
                records,
            },
            report,
        ))
    }

    /// Load the invoices of one company.
    pub async fn load_invoices(&self, company_id: &str) -> CoreResult<Vec<Invoice>> {
        validate_company_id(company_id)?;
        self.source.fetch_invoices(company_id).await
    }
}
