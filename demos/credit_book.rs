//! Credit-book walkthrough: disburse a record, collect installments, and
//! reconcile the cash account.
//!
//! Run with: cargo run --example credit_book

use bigdecimal::BigDecimal;
use billbook_core::{
    amortization_rows, build_statement, cash_events, generate_schedule, mark_paid,
    monthly_ledgers, receipts_from_records, reconcile, utils::MemorySnapshotStore,
    with_running_balance, Expense, GenerateParams, PartnerFlow, PartnerTransaction,
    RawCreditRecord, SnapshotLoader,
};
use chrono::NaiveDate;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[tokio::main]
async fn main() {
    println!("=== Credit Book Walkthrough ===\n");

    // 1. Generate a flat-rate schedule for a new record.
    println!("1. Schedule for 12000 at 24% over 12 months, due on the 5th:");
    let params = GenerateParams {
        principal: BigDecimal::from(12000),
        annual_rate: BigDecimal::from(24),
        tenure_months: 12,
        entry_date: date(2024, 1, 10),
        due_day: 5,
    };
    let schedule = generate_schedule(&params).unwrap();
    for installment in schedule.iter().take(3) {
        println!(
            "   #{} due {} amount {}",
            installment.sequence_number, installment.due_date, installment.amount
        );
    }
    println!("   ... {} installments in total\n", schedule.len());

    // 2. The reducing-balance view used for printed amortization tables.
    println!("2. First amortization rows (reducing balance):");
    let rows = amortization_rows(
        &BigDecimal::from(12000),
        &BigDecimal::from(24),
        &schedule[0].amount,
        12,
        schedule[0].due_date,
    )
    .unwrap();
    for row in rows.iter().take(3) {
        println!(
            "   #{} opening {} interest {} principal {} closing {}",
            row.sequence_number,
            row.opening_balance,
            row.interest_part,
            row.principal_part,
            row.closing_balance
        );
    }
    println!();

    // 3. Seed a company book and reconcile it.
    let store = MemorySnapshotStore::new();
    store.add_partner_transaction(
        "demo",
        PartnerTransaction::new(
            date(2024, 1, 5),
            "Asha".to_string(),
            PartnerFlow::Investment,
            BigDecimal::from(50000),
        ),
    );
    store.add_expense(
        "demo",
        Expense::new(date(2024, 1, 20), "Office rent".to_string(), BigDecimal::from(2000)),
    );
    store.add_record(
        "demo",
        RawCreditRecord {
            id: "r1".to_string(),
            customer_id: Some("c1".to_string()),
            customer_name: Some("Ravi".to_string()),
            amount: Some(BigDecimal::from(12000)),
            installment_amount: Some(BigDecimal::from(1240)),
            rate: Some(BigDecimal::from(24)),
            tenure: Some(12),
            status: Some("Active".to_string()),
            date: Some("2024-01-10".to_string()),
            service_charge: Some(BigDecimal::from(240)),
            ..Default::default()
        },
    );

    let loader = SnapshotLoader::new(store).with_opening_balance(BigDecimal::from(10000));
    let (mut snapshot, report) = loader.load("demo").await.unwrap();
    println!("3. Loaded snapshot: {} records merged, {} legacy duplicates discarded",
        report.merged, report.legacy_duplicates_discarded);

    // Attach the generated schedule and collect two installments.
    snapshot.records[0].schedule = schedule;
    snapshot.records[0] = mark_paid(&snapshot.records[0], 1, date(2024, 2, 5), None).unwrap();
    snapshot.records[0] = mark_paid(&snapshot.records[0], 2, date(2024, 3, 5), None).unwrap();

    let result = reconcile(&snapshot);
    println!("   Cash balance:     {}", result.cash_balance);
    println!("   Active records:   {}", result.metrics.active_count);
    println!("   Outstanding:      {}", result.metrics.active_outstanding);
    println!("   Collections:      {}\n", result.metrics.total_collections);

    // 4. Monthly cash account view.
    println!("4. Monthly cash account:");
    let events = cash_events(&snapshot);
    for ledger in monthly_ledgers(&events, &snapshot.opening_balance) {
        println!(
            "   {} opening {} closing {} ({} entries)",
            ledger.month.format("%B %Y"),
            ledger.opening_balance,
            ledger.closing_balance,
            ledger.entries.len()
        );
    }
    println!();

    // 5. Customer statement.
    println!("5. Statement for customer c1:");
    let receipts = receipts_from_records(&snapshot.records);
    let entries = build_statement(&snapshot.records, &receipts, Some("c1"));
    for (entry, balance) in with_running_balance(&entries) {
        println!(
            "   {} {:?} {} -> balance {}",
            entry.date, entry.direction, entry.amount, balance
        );
    }
}
