//! In-memory snapshot source for testing

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::reconcile::RawCreditRecord;
use crate::traits::SnapshotSource;
use crate::types::*;

/// In-memory [`SnapshotSource`] implementation for testing and development,
/// keyed by company id per collection.
#[derive(Debug, Clone, Default)]
pub struct MemorySnapshotStore {
    invoices: Arc<RwLock<HashMap<String, Vec<Invoice>>>>,
    records: Arc<RwLock<HashMap<String, Vec<RawCreditRecord>>>>,
    legacy_records: Arc<RwLock<HashMap<String, Vec<RawCreditRecord>>>>,
    partner_transactions: Arc<RwLock<HashMap<String, Vec<PartnerTransaction>>>>,
    expenses: Arc<RwLock<HashMap<String, Vec<Expense>>>>,
    manual_ledger: Arc<RwLock<HashMap<String, Vec<ManualLedgerEntry>>>>,
}

impl MemorySnapshotStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all data (useful for testing)
    pub fn clear(&self) {
        self.invoices.write().unwrap().clear();
        self.records.write().unwrap().clear();
        self.legacy_records.write().unwrap().clear();
        self.partner_transactions.write().unwrap().clear();
        self.expenses.write().unwrap().clear();
        self.manual_ledger.write().unwrap().clear();
    }

    pub fn add_invoice(&self, company_id: &str, invoice: Invoice) {
        self.invoices
            .write()
            .unwrap()
            .entry(company_id.to_string())
            .or_default()
            .push(invoice);
    }

    pub fn add_record(&self, company_id: &str, record: RawCreditRecord) {
        self.records
            .write()
            .unwrap()
            .entry(company_id.to_string())
            .or_default()
            .push(record);
    }

    pub fn add_legacy_record(&self, company_id: &str, record: RawCreditRecord) {
        self.legacy_records
            .write()
            .unwrap()
            .entry(company_id.to_string())
            .or_default()
            .push(record);
    }

    pub fn add_partner_transaction(&self, company_id: &str, transaction: PartnerTransaction) {
        self.partner_transactions
            .write()
            .unwrap()
            .entry(company_id.to_string())
            .or_default()
            .push(transaction);
    }

    pub fn add_expense(&self, company_id: &str, expense: Expense) {
        self.expenses
            .write()
            .unwrap()
            .entry(company_id.to_string())
            .or_default()
            .push(expense);
    }

    pub fn add_ledger_entry(&self, company_id: &str, entry: ManualLedgerEntry) {
        self.manual_ledger
            .write()
            .unwrap()
            .entry(company_id.to_string())
            .or_default()
            .push(entry);
    }
}

fn fetch<T: Clone>(
    collection: &Arc<RwLock<HashMap<String, Vec<T>>>>,
    company_id: &str,
) -> CoreResult<Vec<T>> {
    Ok(collection
        .read()
        .unwrap()
        .get(company_id)
        .cloned()
        .unwrap_or_default())
}

#[async_trait]
impl SnapshotSource for MemorySnapshotStore {
    async fn fetch_invoices(&self, company_id: &str) -> CoreResult<Vec<Invoice>> {
        fetch(&self.invoices, company_id)
    }

    async fn fetch_records(&self, company_id: &str) -> CoreResult<Vec<RawCreditRecord>> {
        fetch(&self.records, company_id)
    }

    async fn fetch_legacy_records(&self, company_id: &str) -> CoreResult<Vec<RawCreditRecord>> {
        fetch(&self.legacy_records, company_id)
    }

    async fn fetch_partner_transactions(
        &self,
        company_id: &str,
    ) -> CoreResult<Vec<PartnerTransaction>> {
        fetch(&self.partner_transactions, company_id)
    }

    async fn fetch_expenses(&self, company_id: &str) -> CoreResult<Vec<Expense>> {
        fetch(&self.expenses, company_id)
    }

    async fn fetch_manual_ledger(&self, company_id: &str) -> CoreResult<Vec<ManualLedgerEntry>> {
        fetch(&self.manual_ledger, company_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::BigDecimal;
    use chrono::NaiveDate;

    #[tokio::test]
    async fn collections_are_scoped_by_company() {
        let store = MemorySnapshotStore::new();
        let expense = Expense::new(
            NaiveDate::from_ymd_opt(2024, 1, 7).unwrap(),
            "Stationery".to_string(),
            BigDecimal::from(150),
        );
        store.add_expense("acme", expense);

        assert_eq!(store.fetch_expenses("acme").await.unwrap().len(), 1);
        assert!(store.fetch_expenses("other").await.unwrap().is_empty());

        store.clear();
        assert!(store.fetch_expenses("acme").await.unwrap().is_empty());
    }
}
