//! The cash reconciliation engine.
//!
//! One pass over an immutable snapshot derives the cash balance, per-record
//! outstanding/collected figures, and the dashboard metrics. The event
//! stream is built in a fixed order for auditability; the arithmetic itself
//! is commutative, so re-running over the same snapshot always produces the
//! same balance regardless of how the manual ledger happens to be ordered.

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::*;

/// Immutable snapshot of every cash-affecting source for one company.
///
/// Records must already be normalized (see
/// [`merge_record_sources`](crate::reconcile::merge_record_sources)); all
/// source reads complete before the snapshot is assembled.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub opening_balance: BigDecimal,
    pub partner_transactions: Vec<PartnerTransaction>,
    pub expenses: Vec<Expense>,
    pub manual_ledger: Vec<ManualLedgerEntry>,
    pub records: Vec<CreditRecord>,
}

impl Snapshot {
    pub fn new(opening_balance: BigDecimal) -> Self {
        Self {
            opening_balance,
            ..Default::default()
        }
    }
}

/// Direction of a cash event. `Credit` flows into the cash account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CashDirection {
    Credit,
    Debit,
}

/// What kind of activity produced a cash event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventCategory {
    /// Record commencement or top-up outflow, and manual postings
    Record,
    Installment,
    Partner,
    Expense,
    Fee,
    Settlement,
}

/// One cash-affecting event derived from the snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashEvent {
    pub date: NaiveDate,
    pub particulars: String,
    pub direction: CashDirection,
    pub category: EventCategory,
    pub amount: BigDecimal,
    pub record_id: Option<String>,
    pub customer_id: Option<String>,
}

impl CashEvent {
    /// The event's contribution to the cash balance.
    pub fn signed_amount(&self) -> BigDecimal {
        match self.direction {
            CashDirection::Credit => self.amount.clone(),
            CashDirection::Debit => -&self.amount,
        }
    }
}

/// Arithmetic-guard observability: how often values had to be clamped or
/// de-duplicated. Purely informational.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardCounters {
    /// Negative intermediate values clamped to zero
    pub negative_clamps: u32,
    /// Adjustments skipped because a manual ledger entry already covers them
    pub adjustments_deduped: u32,
}

/// Outstanding/collected figures for one record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordFigures {
    pub record_id: String,
    pub customer_id: Option<String>,
    pub principal: BigDecimal,
    pub collected: BigDecimal,
    pub outstanding: BigDecimal,
}

/// Aggregates the dashboard shows alongside the cash balance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardMetrics {
    pub total_given_count: u32,
    pub total_given_principal: BigDecimal,
    pub active_count: u32,
    pub active_principal: BigDecimal,
    pub active_outstanding: BigDecimal,
    pub total_collections: BigDecimal,
    pub total_service_charges: BigDecimal,
    /// Principal handed out net of service charges
    pub net_given: BigDecimal,
}

/// Result of one reconciliation pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationReport {
    pub cash_balance: BigDecimal,
    pub per_record: Vec<RecordFigures>,
    pub metrics: DashboardMetrics,
    pub guards: GuardCounters,
}

/// Whether a manual ledger entry already represents this adjustment.
///
/// The match is (record id, same calendar day), the heuristic the book has
/// always used. It can over-merge two distinct adjustments posted the same
/// day and under-merge timestamps shifted across midnight; changing it would
/// silently change historical balances, so it stays as-is.
fn covered_by_manual_ledger(
    manual_ledger: &[ManualLedgerEntry],
    record_id: &str,
    adjustment_date: NaiveDate,
) -> bool {
    manual_ledger.iter().any(|entry| {
        entry.record_id.as_deref() == Some(record_id) && entry.date == adjustment_date
    })
}

fn record_events(
    record: &CreditRecord,
    manual_ledger: &[ManualLedgerEntry],
    events: &mut Vec<CashEvent>,
    guards: &mut GuardCounters,
) {
    let customer = record.customer_name.clone().unwrap_or_else(|| record.id.clone());

    // Only the net amount handed out at commencement leaves cash up front;
    // top-ups are individual events of their own.
    let adjustment_total: BigDecimal = record.adjustments.iter().map(|adj| &adj.amount).sum();
    let net_commencement_raw = &record.principal - &adjustment_total;
    if net_commencement_raw < BigDecimal::from(0) {
        guards.negative_clamps += 1;
        tracing::debug!(record = %record.id, "adjustments exceed principal; commencement clamped");
    }
    let net_commencement = clamp_non_negative(net_commencement_raw);

    if record.start_date.is_none() {
        tracing::debug!(record = %record.id, "committed record has no start date; commencement skipped");
    }
    if let Some(start_date) = record.start_date {
        if net_commencement > BigDecimal::from(0) {
            events.push(CashEvent {
                date: start_date,
                particulars: format!("Record Created: {customer}"),
                direction: CashDirection::Debit,
                category: EventCategory::Record,
                amount: net_commencement.clone(),
                record_id: Some(record.id.clone()),
                customer_id: record.customer_id.clone(),
            });
        }
    }

    for adjustment in &record.adjustments {
        if covered_by_manual_ledger(manual_ledger, &record.id, adjustment.date) {
            guards.adjustments_deduped += 1;
            tracing::debug!(
                record = %record.id,
                date = %adjustment.date,
                "adjustment already posted through the manual ledger"
            );
            continue;
        }
        events.push(CashEvent {
            date: adjustment.date,
            particulars: format!("Add-on Entry: {customer}"),
            direction: CashDirection::Debit,
            category: EventCategory::Record,
            amount: adjustment.amount.clone(),
            record_id: Some(record.id.clone()),
            customer_id: record.customer_id.clone(),
        });
        if let Some(fee) = &adjustment.service_fee {
            if *fee > BigDecimal::from(0) {
                events.push(CashEvent {
                    date: adjustment.date,
                    particulars: format!("Service Fee ({customer})"),
                    direction: CashDirection::Credit,
                    category: EventCategory::Fee,
                    amount: fee.clone(),
                    record_id: Some(record.id.clone()),
                    customer_id: record.customer_id.clone(),
                });
            }
        }
    }

    if let Some(start_date) = record.start_date {
        let commencement_fee = record.commencement_fee(&net_commencement);
        if commencement_fee > BigDecimal::from(0) {
            events.push(CashEvent {
                date: start_date,
                particulars: format!("Service Fee ({customer})"),
                direction: CashDirection::Credit,
                category: EventCategory::Fee,
                amount: commencement_fee,
                record_id: Some(record.id.clone()),
                customer_id: record.customer_id.clone(),
            });
        }
    }

    for installment in &record.schedule {
        if let Some(collected) = installment.paid_contribution() {
            events.push(CashEvent {
                date: installment.paid_date.unwrap_or(installment.due_date),
                particulars: format!("Inst Received: {customer}"),
                direction: CashDirection::Credit,
                category: EventCategory::Installment,
                amount: collected,
                record_id: Some(record.id.clone()),
                customer_id: record.customer_id.clone(),
            });
        }
    }

    if let Some(settlement) = &record.settlement {
        if settlement.amount_received && settlement.total_paid > BigDecimal::from(0) {
            events.push(CashEvent {
                date: settlement.date,
                particulars: format!("Settlement Received: {customer}"),
                direction: CashDirection::Credit,
                category: EventCategory::Settlement,
                amount: settlement.total_paid.clone(),
                record_id: Some(record.id.clone()),
                customer_id: record.customer_id.clone(),
            });
        }
    }
}

fn collect_events(snapshot: &Snapshot) -> (Vec<CashEvent>, GuardCounters) {
    let mut events = Vec::new();
    let mut guards = GuardCounters::default();

    for tx in &snapshot.partner_transactions {
        events.push(CashEvent {
            date: tx.date,
            particulars: format!(
                "{} ({})",
                tx.partner_name,
                match tx.flow {
                    PartnerFlow::Investment => "investment",
                    PartnerFlow::Withdrawal => "withdrawal",
                }
            ),
            direction: match tx.flow {
                PartnerFlow::Investment => CashDirection::Credit,
                PartnerFlow::Withdrawal => CashDirection::Debit,
            },
            category: EventCategory::Partner,
            amount: tx.amount.clone(),
            record_id: None,
            customer_id: None,
        });
    }

    for expense in &snapshot.expenses {
        events.push(CashEvent {
            date: expense.date,
            particulars: expense.narration.clone(),
            direction: CashDirection::Debit,
            category: EventCategory::Expense,
            amount: expense.amount.clone(),
            record_id: None,
            customer_id: None,
        });
    }

    for entry in &snapshot.manual_ledger {
        for posting in &entry.postings {
            if posting.account != CASH_ACCOUNT {
                continue;
            }
            events.push(CashEvent {
                date: entry.date,
                particulars: entry.narration.clone(),
                direction: match posting.posting_type {
                    PostingType::Debit => CashDirection::Credit,
                    PostingType::Credit => CashDirection::Debit,
                },
                category: EventCategory::Record,
                amount: posting.amount.clone(),
                record_id: entry.record_id.clone(),
                customer_id: entry.customer_id.clone(),
            });
        }
    }

    for record in &snapshot.records {
        if !record.status.is_committed() {
            continue;
        }
        record_events(record, &snapshot.manual_ledger, &mut events, &mut guards);
    }

    (events, guards)
}

/// Every cash-affecting event in the snapshot, in the engine's audit order
/// (partners, expenses, manual postings, then per-record activity).
pub fn cash_events(snapshot: &Snapshot) -> Vec<CashEvent> {
    collect_events(snapshot).0
}

/// Run one reconciliation pass over the snapshot.
///
/// Deterministic and idempotent: the same snapshot always yields the same
/// report, independent of manual-ledger insertion order.
pub fn reconcile(snapshot: &Snapshot) -> ReconciliationReport {
    let (events, mut guards) = collect_events(snapshot);

    let mut cash_balance = snapshot.opening_balance.clone();
    for event in &events {
        cash_balance += event.signed_amount();
    }

    let mut per_record = Vec::new();
    let mut metrics = DashboardMetrics {
        total_given_count: 0,
        total_given_principal: BigDecimal::from(0),
        active_count: 0,
        active_principal: BigDecimal::from(0),
        active_outstanding: BigDecimal::from(0),
        total_collections: BigDecimal::from(0),
        total_service_charges: BigDecimal::from(0),
        net_given: BigDecimal::from(0),
    };

    for record in &snapshot.records {
        if !record.status.is_committed() {
            continue;
        }

        let collected = record.collected();
        let outstanding = record.outstanding();
        if record.total_payable() < record.collected_installments() {
            guards.negative_clamps += 1;
            tracing::debug!(record = %record.id, "collections exceed payable; outstanding clamped");
        }

        metrics.total_given_count += 1;
        metrics.total_given_principal += &record.principal;
        metrics.total_collections += &collected;
        if record.status.is_open() {
            metrics.active_count += 1;
            metrics.active_principal += &record.principal;
            metrics.active_outstanding += &outstanding;
        }

        per_record.push(RecordFigures {
            record_id: record.id.clone(),
            customer_id: record.customer_id.clone(),
            principal: record.principal.clone(),
            collected,
            outstanding,
        });
    }

    metrics.total_service_charges = events
        .iter()
        .filter(|event| event.category == EventCategory::Fee)
        .map(|event| &event.amount)
        .sum();
    metrics.net_given = &metrics.total_given_principal - &metrics.total_service_charges;

    ReconciliationReport {
        cash_balance,
        per_record,
        metrics,
        guards,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::{generate_schedule, mark_paid, GenerateParams};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn bd(value: i64) -> BigDecimal {
        BigDecimal::from(value)
    }

    fn disbursed_record(id: &str, principal: i64, fee: i64) -> CreditRecord {
        let mut record = CreditRecord::new(
            id.to_string(),
            bd(principal),
            bd(24),
            12,
            date(2024, 1, 10),
        );
        record.status = RecordStatus::Active;
        record.service_charge = bd(fee);
        record.due_day = 5;
        record
    }

    #[test]
    fn balance_matches_worked_example() {
        // Opening 0, one 50000 investment, one record of 10000 with a 200
        // fee and no payments yet: 50000 - 10000 + 200 = 40200.
        let mut snapshot = Snapshot::new(bd(0));
        snapshot.partner_transactions.push(PartnerTransaction::new(
            date(2024, 1, 5),
            "Asha".to_string(),
            PartnerFlow::Investment,
            bd(50000),
        ));
        snapshot.records.push(disbursed_record("r1", 10000, 200));

        let report = reconcile(&snapshot);
        assert_eq!(report.cash_balance, bd(40200));
        assert_eq!(report.metrics.total_given_principal, bd(10000));
        assert_eq!(report.metrics.total_service_charges, bd(200));
        assert_eq!(report.metrics.net_given, bd(9800));
    }

    #[test]
    fn expenses_and_withdrawals_reduce_balance() {
        let mut snapshot = Snapshot::new(bd(1000));
        snapshot.partner_transactions.push(PartnerTransaction::new(
            date(2024, 1, 5),
            "Asha".to_string(),
            PartnerFlow::Withdrawal,
            bd(300),
        ));
        snapshot
            .expenses
            .push(Expense::new(date(2024, 1, 7), "Stationery".to_string(), bd(150)));

        let report = reconcile(&snapshot);
        assert_eq!(report.cash_balance, bd(550));
    }

    #[test]
    fn manual_cash_postings_follow_debit_credit_rule() {
        let mut snapshot = Snapshot::new(bd(0));
        snapshot.manual_ledger.push(
            ManualLedgerEntry::new(date(2024, 2, 1), "Correction".to_string())
                .posting(CASH_ACCOUNT, PostingType::Debit, bd(500))
                .posting("Service Income", PostingType::Credit, bd(500)),
        );
        snapshot.manual_ledger.push(
            ManualLedgerEntry::new(date(2024, 2, 2), "Payout".to_string())
                .posting(CASH_ACCOUNT, PostingType::Credit, bd(200)),
        );

        let report = reconcile(&snapshot);
        assert_eq!(report.cash_balance, bd(300));
    }

    #[test]
    fn paid_installments_flow_back_into_cash() {
        let mut record = disbursed_record("r1", 12000, 0);
        record.installment_amount = bd(1240);
        record.schedule = generate_schedule(&GenerateParams {
            principal: bd(12000),
            annual_rate: bd(24),
            tenure_months: 12,
            entry_date: date(2024, 1, 10),
            due_day: 5,
        })
        .unwrap();
        let record = mark_paid(&record, 1, date(2024, 2, 5), None).unwrap();
        let record = mark_paid(&record, 2, date(2024, 3, 5), None).unwrap();

        let mut snapshot = Snapshot::new(bd(20000));
        snapshot.records.push(record);

        let report = reconcile(&snapshot);
        // 20000 - 12000 + 2 * 1240
        assert_eq!(report.cash_balance, bd(10480));
        assert_eq!(report.per_record[0].collected, bd(2480));
        assert_eq!(report.per_record[0].outstanding, bd(12400));
    }

    #[test]
    fn pending_records_have_no_cash_impact() {
        let mut snapshot = Snapshot::new(bd(5000));
        let mut record = disbursed_record("r1", 10000, 200);
        record.status = RecordStatus::Pending;
        snapshot.records.push(record);

        let report = reconcile(&snapshot);
        assert_eq!(report.cash_balance, bd(5000));
        assert!(report.per_record.is_empty());
    }

    #[test]
    fn adjustment_not_in_ledger_is_counted_directly() {
        let mut record = disbursed_record("r1", 15000, 0);
        record.adjustments.push(Adjustment {
            date: date(2024, 3, 15),
            amount: bd(5000),
            resulting_principal: bd(13000),
            tenure_months: 10,
            annual_rate: None,
            revised_installment: bd(1456),
            service_fee: Some(bd(100)),
            outstanding_before: Some(bd(8000)),
        });

        let mut snapshot = Snapshot::new(bd(50000));
        snapshot.records.push(record);

        let report = reconcile(&snapshot);
        // Commencement is net of the top-up: -(15000 - 5000); the top-up
        // itself is -5000 + 100 fee.
        assert_eq!(report.cash_balance, bd(50000 - 10000 - 5000 + 100));
        assert_eq!(report.guards.adjustments_deduped, 0);
    }

    #[test]
    fn ledger_covered_adjustment_is_not_double_counted() {
        let mut record = disbursed_record("r1", 15000, 0);
        record.adjustments.push(Adjustment {
            date: date(2024, 3, 15),
            amount: bd(5000),
            resulting_principal: bd(13000),
            tenure_months: 10,
            annual_rate: None,
            revised_installment: bd(1456),
            service_fee: Some(bd(100)),
            outstanding_before: Some(bd(8000)),
        });

        let mut snapshot = Snapshot::new(bd(50000));
        snapshot.manual_ledger.push(
            ManualLedgerEntry::new(date(2024, 3, 15), "Adjustment for Record r1".to_string())
                .for_record("r1".to_string())
                .posting("Credit Outstanding", PostingType::Debit, bd(5000))
                .posting(CASH_ACCOUNT, PostingType::Credit, bd(4900))
                .posting("Service Income", PostingType::Credit, bd(100)),
        );
        snapshot.records.push(record);

        let report = reconcile(&snapshot);
        // The manual entry carries the cash movement (-4900); the
        // adjustment itself is skipped.
        assert_eq!(report.cash_balance, bd(50000 - 4900 - 10000));
        assert_eq!(report.guards.adjustments_deduped, 1);
    }

    #[test]
    fn reconciliation_is_idempotent_and_order_independent() {
        let mut record = disbursed_record("r1", 15000, 300);
        record.adjustments.push(Adjustment {
            date: date(2024, 3, 15),
            amount: bd(5000),
            resulting_principal: bd(13000),
            tenure_months: 10,
            annual_rate: None,
            revised_installment: bd(1456),
            service_fee: Some(bd(100)),
            outstanding_before: Some(bd(8000)),
        });

        let mut snapshot = Snapshot::new(bd(75000));
        snapshot.manual_ledger.push(
            ManualLedgerEntry::new(date(2024, 3, 15), "Adjustment for Record r1".to_string())
                .for_record("r1".to_string())
                .posting(CASH_ACCOUNT, PostingType::Credit, bd(4900)),
        );
        snapshot.manual_ledger.push(
            ManualLedgerEntry::new(date(2024, 4, 1), "Correction".to_string())
                .posting(CASH_ACCOUNT, PostingType::Debit, bd(250)),
        );
        snapshot.records.push(record);

        let first = reconcile(&snapshot);
        let second = reconcile(&snapshot);
        assert_eq!(first, second);

        let mut shuffled = snapshot.clone();
        shuffled.manual_ledger.reverse();
        let third = reconcile(&shuffled);
        assert_eq!(first.cash_balance, third.cash_balance);
        assert_eq!(first.guards, third.guards);
    }

    #[test]
    fn settlement_total_is_added_once() {
        let mut record = disbursed_record("r1", 10000, 0);
        record.status = RecordStatus::Settled;
        record.settlement = Some(SettlementDetails {
            date: date(2024, 6, 1),
            outstanding_principal: bd(6000),
            charges_percent: bd(2),
            total_paid: bd(6120),
            amount_received: true,
        });

        let mut snapshot = Snapshot::new(bd(10000));
        snapshot.records.push(record);

        let report = reconcile(&snapshot);
        assert_eq!(report.cash_balance, bd(10000 - 10000 + 6120));
        assert_eq!(report.per_record[0].outstanding, bd(0));
    }

    #[test]
    fn unreceived_settlement_adds_nothing() {
        let mut record = disbursed_record("r1", 10000, 0);
        record.status = RecordStatus::Settled;
        record.settlement = Some(SettlementDetails {
            date: date(2024, 6, 1),
            outstanding_principal: bd(6000),
            charges_percent: bd(2),
            total_paid: bd(6120),
            amount_received: false,
        });

        let mut snapshot = Snapshot::new(bd(10000));
        snapshot.records.push(record);

        let report = reconcile(&snapshot);
        assert_eq!(report.cash_balance, bd(0));
    }
}
