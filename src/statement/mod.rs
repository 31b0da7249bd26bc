//! Ledger statements: per-customer Out/In statements and whole-book cash
//! account views, all pure projections of the same normalized data the
//! reconciliation engine consumes.

use bigdecimal::BigDecimal;
use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::reconcile::CashEvent;
use crate::types::*;

/// Direction of a statement entry from the book's point of view:
/// `Out` is money handed to the customer, `In` is money received.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowDirection {
    Out,
    In,
}

/// A payment received against a record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    pub record_id: String,
    pub customer_id: Option<String>,
    pub date: NaiveDate,
    pub amount: BigDecimal,
}

/// One line of a customer or whole-book statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementEntry {
    pub date: NaiveDate,
    pub direction: FlowDirection,
    pub description: String,
    pub amount: BigDecimal,
    pub record_id: Option<String>,
    pub customer_id: Option<String>,
}

/// Derive the receipt stream from normalized records: one receipt per paid
/// installment and one per received settlement. Statements built from these
/// receipts stay consistent with the reconciled cash balance because both
/// read the same rows.
pub fn receipts_from_records(records: &[CreditRecord]) -> Vec<Receipt> {
    let mut receipts = Vec::new();
    for record in records {
        if !record.status.is_committed() {
            continue;
        }
        for installment in &record.schedule {
            if let Some(amount) = installment.paid_contribution() {
                receipts.push(Receipt {
                    record_id: record.id.clone(),
                    customer_id: record.customer_id.clone(),
                    date: installment.paid_date.unwrap_or(installment.due_date),
                    amount,
                });
            }
        }
        if let Some(settlement) = &record.settlement {
            if settlement.amount_received && settlement.total_paid > BigDecimal::from(0) {
                receipts.push(Receipt {
                    record_id: record.id.clone(),
                    customer_id: record.customer_id.clone(),
                    date: settlement.date,
                    amount: settlement.total_paid.clone(),
                });
            }
        }
    }
    receipts
}

/// Build a chronological Out/In statement: one Out entry per committed
/// record at creation, one In entry per receipt. When `customer_id` is
/// given only that customer's records and receipts are included.
pub fn build_statement(
    records: &[CreditRecord],
    receipts: &[Receipt],
    customer_id: Option<&str>,
) -> Vec<StatementEntry> {
    let belongs = |candidate: &Option<String>| match customer_id {
        Some(wanted) => candidate.as_deref() == Some(wanted),
        None => true,
    };

    let mut entries = Vec::new();
    for record in records {
        if !record.status.is_committed() || !belongs(&record.customer_id) {
            continue;
        }
        if let Some(start_date) = record.start_date {
            entries.push(StatementEntry {
                date: start_date,
                direction: FlowDirection::Out,
                description: format!("Record Created (ID: {})", record.id),
                amount: record.principal.clone(),
                record_id: Some(record.id.clone()),
                customer_id: record.customer_id.clone(),
            });
        }
    }

    for receipt in receipts {
        if !belongs(&receipt.customer_id) {
            continue;
        }
        entries.push(StatementEntry {
            date: receipt.date,
            direction: FlowDirection::In,
            description: format!("Payment Received (Record: {})", receipt.record_id),
            amount: receipt.amount.clone(),
            record_id: Some(receipt.record_id.clone()),
            customer_id: receipt.customer_id.clone(),
        });
    }

    entries.sort_by_key(|entry| entry.date);
    entries
}

/// Fold a statement into running balances: Out adds to what the customer
/// owes, In reduces it.
pub fn with_running_balance(entries: &[StatementEntry]) -> Vec<(StatementEntry, BigDecimal)> {
    let mut balance = BigDecimal::from(0);
    entries
        .iter()
        .map(|entry| {
            match entry.direction {
                FlowDirection::Out => balance += &entry.amount,
                FlowDirection::In => balance -= &entry.amount,
            }
            (entry.clone(), balance.clone())
        })
        .collect()
}

/// One month of the whole-book cash account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyLedger {
    /// First day of the month
    pub month: NaiveDate,
    pub opening_balance: BigDecimal,
    pub entries: Vec<CashEvent>,
    pub closing_balance: BigDecimal,
}

/// Bucket cash events into calendar months with chained opening/closing
/// balances, starting from the book's opening balance.
pub fn monthly_ledgers(events: &[CashEvent], opening_balance: &BigDecimal) -> Vec<MonthlyLedger> {
    let mut sorted: Vec<CashEvent> = events.to_vec();
    sorted.sort_by_key(|event| event.date);

    let Some(first) = sorted.first() else {
        return Vec::new();
    };
    let last_date = sorted.last().map(|event| event.date).unwrap_or(first.date);

    let mut month = first.date.with_day(1).unwrap_or(first.date);
    let mut ledgers = Vec::new();
    let mut running_balance = opening_balance.clone();

    while month <= last_date {
        let Some(next_month) = month.checked_add_months(Months::new(1)) else {
            break;
        };

        let entries: Vec<CashEvent> = sorted
            .iter()
            .filter(|event| event.date >= month && event.date < next_month)
            .cloned()
            .collect();

        let month_opening = running_balance.clone();
        for event in &entries {
            running_balance += event.signed_amount();
        }

        if !entries.is_empty() || month_opening != BigDecimal::from(0) {
            ledgers.push(MonthlyLedger {
                month,
                opening_balance: month_opening,
                closing_balance: running_balance.clone(),
                entries,
            });
        }
        month = next_month;
    }

    ledgers
}

/// A date-bounded cash account statement with per-line running balances
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodStatement {
    pub from: NaiveDate,
    pub to: NaiveDate,
    /// Balance brought forward from everything before `from`
    pub opening_balance: BigDecimal,
    pub lines: Vec<(CashEvent, BigDecimal)>,
    pub closing_balance: BigDecimal,
}

/// Cut a period out of the cash account: everything before `from` folds into
/// the opening balance, every event in the period carries its running
/// balance.
pub fn period_statement(
    events: &[CashEvent],
    opening_balance: &BigDecimal,
    from: NaiveDate,
    to: NaiveDate,
) -> PeriodStatement {
    let mut sorted: Vec<CashEvent> = events.to_vec();
    sorted.sort_by_key(|event| event.date);

    let mut balance = opening_balance.clone();
    for event in sorted.iter().filter(|event| event.date < from) {
        balance += event.signed_amount();
    }
    let period_opening = balance.clone();

    let mut lines = Vec::new();
    for event in sorted
        .iter()
        .filter(|event| event.date >= from && event.date <= to)
    {
        balance += event.signed_amount();
        lines.push((event.clone(), balance.clone()));
    }

    PeriodStatement {
        from,
        to,
        opening_balance: period_opening,
        lines,
        closing_balance: balance,
    }
}
