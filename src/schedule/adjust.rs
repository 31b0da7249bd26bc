//! Top-up adjustments, payments, and settlement of credit records.
//!
//! Every function here is a pure transformation: it takes a record by
//! reference and returns the updated copy, leaving the input untouched.

use bigdecimal::BigDecimal;
use chrono::{Datelike, NaiveDate};

use crate::schedule::generate::{flat_installment, generate_schedule, GenerateParams};
use crate::types::*;
use crate::utils::validation::{validate_positive_amount, validate_tenure};

/// Outstanding principal of a running record, using the flat-rate
/// approximation the schedules were generated with: each paid installment
/// retires `installment - principal*rate/1200` of principal.
pub fn outstanding_principal(record: &CreditRecord) -> BigDecimal {
    let monthly_interest =
        round_whole(&((&record.principal * &record.annual_rate) / BigDecimal::from(1200)));

    let mut balance = record.principal.clone();
    for installment in &record.schedule {
        if installment.status == InstallmentStatus::Paid {
            let principal_paid = &record.installment_amount - &monthly_interest;
            balance -= principal_paid;
        }
    }
    clamp_non_negative(balance)
}

/// Mark one installment as paid.
///
/// The record becomes `Completed` once every installment is paid. Paying an
/// already-paid installment is a validation error, as is an unknown sequence
/// number.
pub fn mark_paid(
    record: &CreditRecord,
    sequence_number: u32,
    paid_date: NaiveDate,
    paid_amount: Option<BigDecimal>,
) -> CoreResult<CreditRecord> {
    let mut updated = record.clone();
    let installment = updated
        .schedule
        .iter_mut()
        .find(|inst| inst.sequence_number == sequence_number)
        .ok_or_else(|| {
            CoreError::Validation(format!(
                "Record {} has no installment {}",
                record.id, sequence_number
            ))
        })?;

    if installment.status == InstallmentStatus::Paid {
        return Err(CoreError::Validation(format!(
            "Installment {} of record {} is already paid",
            sequence_number, record.id
        )));
    }

    installment.status = InstallmentStatus::Paid;
    installment.paid_date = Some(paid_date);
    installment.paid_amount = paid_amount;

    if updated.is_fully_paid() {
        updated.status = RecordStatus::Completed;
    }
    Ok(updated)
}

/// Work out the adjustment a top-up request would produce: new principal is
/// the current outstanding principal plus the fresh amount, the remaining
/// tenure restarts, and the service fee is a percentage of the top-up.
pub fn plan_adjustment(
    record: &CreditRecord,
    date: NaiveDate,
    amount: BigDecimal,
    annual_rate: BigDecimal,
    tenure_months: u32,
    service_fee_percent: &BigDecimal,
) -> CoreResult<Adjustment> {
    validate_positive_amount(&amount)?;
    validate_tenure(tenure_months)?;

    let outstanding_before = outstanding_principal(record);
    let resulting_principal = &outstanding_before + &amount;
    let (_, revised_installment) =
        flat_installment(&resulting_principal, &annual_rate, tenure_months)?;
    let service_fee = round_whole(&((&amount * service_fee_percent) / BigDecimal::from(100)));

    Ok(Adjustment {
        date,
        amount,
        resulting_principal,
        tenure_months,
        annual_rate: Some(annual_rate),
        revised_installment,
        service_fee: Some(service_fee),
        outstanding_before: Some(outstanding_before),
    })
}

/// Apply a top-up adjustment: paid installments are preserved exactly as they
/// are, pending ones are discarded, and a fresh flat-rate tail is generated
/// against the adjustment's resulting principal.
pub fn apply_adjustment(record: &CreditRecord, adjustment: &Adjustment) -> CoreResult<CreditRecord> {
    validate_positive_amount(&adjustment.amount)?;
    validate_tenure(adjustment.tenure_months)?;
    if adjustment.resulting_principal < BigDecimal::from(0) {
        return Err(CoreError::Validation(format!(
            "Resulting principal cannot be negative: {}",
            adjustment.resulting_principal
        )));
    }

    let annual_rate = adjustment
        .annual_rate
        .clone()
        .unwrap_or_else(|| record.annual_rate.clone());

    // The tail keeps the day installments already fall due on; the first
    // pending row knows it even after earlier adjustments moved it.
    let due_day = record
        .schedule
        .iter()
        .find(|inst| inst.status == InstallmentStatus::Pending)
        .map(|inst| inst.due_date.day())
        .unwrap_or(record.due_day)
        .clamp(1, 28);

    let paid: Vec<Installment> = record
        .schedule
        .iter()
        .filter(|inst| inst.status == InstallmentStatus::Paid)
        .cloned()
        .collect();

    let tail = generate_schedule(&GenerateParams {
        principal: adjustment.resulting_principal.clone(),
        annual_rate: annual_rate.clone(),
        tenure_months: adjustment.tenure_months,
        entry_date: adjustment.date,
        due_day,
    })?;
    let revised_installment = tail[0].amount.clone();

    let mut schedule = paid;
    let offset = schedule.len() as u32;
    for (i, mut installment) in tail.into_iter().enumerate() {
        installment.sequence_number = offset + i as u32 + 1;
        schedule.push(installment);
    }

    let mut updated = record.clone();
    updated.principal = adjustment.resulting_principal.clone();
    updated.annual_rate = annual_rate;
    updated.tenure_months = offset + adjustment.tenure_months;
    updated.installment_amount = revised_installment;
    updated.due_day = due_day;
    updated.schedule = schedule;
    updated.service_charge = &record.service_charge
        + adjustment
            .service_fee
            .clone()
            .unwrap_or_else(|| BigDecimal::from(0));
    updated.adjustments.push(adjustment.clone());

    Ok(updated)
}

/// Work out the settlement a pre-closure would produce: the outstanding
/// principal plus a percentage charge on it.
pub fn plan_settlement(
    record: &CreditRecord,
    date: NaiveDate,
    charges_percent: BigDecimal,
    amount_received: bool,
) -> SettlementDetails {
    let outstanding = outstanding_principal(record);
    let charges = (&outstanding * &charges_percent) / BigDecimal::from(100);
    let total_paid = round_currency(&(&outstanding + &charges));

    SettlementDetails {
        date,
        outstanding_principal: outstanding,
        charges_percent,
        total_paid,
        amount_received,
    }
}

/// Close a record early: pending installments are cancelled (their amounts
/// stop counting toward the payable total) and the settlement is recorded.
pub fn settle(record: &CreditRecord, settlement: SettlementDetails) -> CreditRecord {
    let mut updated = record.clone();
    for installment in &mut updated.schedule {
        if installment.status == InstallmentStatus::Pending {
            installment.status = InstallmentStatus::Cancelled;
        }
    }
    updated.status = RecordStatus::Settled;
    updated.settlement = Some(settlement);
    updated
}

/// Undo a settlement: cancelled installments become pending again and the
/// record returns to Active.
pub fn undo_settlement(record: &CreditRecord) -> CreditRecord {
    let mut updated = record.clone();
    for installment in &mut updated.schedule {
        if installment.status == InstallmentStatus::Cancelled {
            installment.status = InstallmentStatus::Pending;
        }
    }
    updated.status = RecordStatus::Active;
    updated.settlement = None;
    updated
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::generate::{generate_schedule, GenerateParams};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn bd(value: i64) -> BigDecimal {
        BigDecimal::from(value)
    }

    fn active_record() -> CreditRecord {
        let mut record = CreditRecord::new(
            "r1".to_string(),
            bd(12000),
            bd(24),
            12,
            date(2024, 1, 10),
        );
        record.status = RecordStatus::Active;
        record.due_day = 5;
        record.installment_amount = bd(1240);
        record.schedule = generate_schedule(&GenerateParams {
            principal: bd(12000),
            annual_rate: bd(24),
            tenure_months: 12,
            entry_date: date(2024, 1, 10),
            due_day: 5,
        })
        .unwrap();
        record
    }

    #[test]
    fn mark_paid_completes_record_on_last_installment() {
        let mut record = active_record();
        for seq in 1..=12 {
            record = mark_paid(&record, seq, date(2024, 2, 5), None).unwrap();
        }
        assert_eq!(record.status, RecordStatus::Completed);
        assert_eq!(record.collected(), bd(14880));
    }

    #[test]
    fn mark_paid_rejects_double_payment() {
        let record = active_record();
        let record = mark_paid(&record, 1, date(2024, 2, 5), None).unwrap();
        assert!(mark_paid(&record, 1, date(2024, 2, 6), None).is_err());
    }

    #[test]
    fn outstanding_principal_shrinks_with_payments() {
        let record = active_record();
        let before = outstanding_principal(&record);
        assert_eq!(before, bd(12000));

        // 1240 installment against 240 monthly interest retires 1000.
        let record = mark_paid(&record, 1, date(2024, 2, 5), None).unwrap();
        assert_eq!(outstanding_principal(&record), bd(11000));
    }

    #[test]
    fn adjustment_preserves_paid_installments() {
        let record = active_record();
        let record = mark_paid(&record, 1, date(2024, 2, 5), None).unwrap();
        let record = mark_paid(&record, 2, date(2024, 3, 5), None).unwrap();
        let paid_before: Vec<Installment> = record
            .schedule
            .iter()
            .filter(|inst| inst.status == InstallmentStatus::Paid)
            .cloned()
            .collect();

        let adjustment = plan_adjustment(
            &record,
            date(2024, 3, 20),
            bd(5000),
            bd(24),
            12,
            &bd(2),
        )
        .unwrap();
        let adjusted = apply_adjustment(&record, &adjustment).unwrap();

        let paid_after: Vec<Installment> = adjusted
            .schedule
            .iter()
            .filter(|inst| inst.status == InstallmentStatus::Paid)
            .cloned()
            .collect();
        assert_eq!(paid_before, paid_after);
        assert_eq!(adjusted.tenure_months, 14);
        assert_eq!(adjusted.schedule.len(), 14);
    }

    #[test]
    fn adjustment_regenerates_tail_from_resulting_principal() {
        let record = active_record();
        let record = mark_paid(&record, 1, date(2024, 2, 5), None).unwrap();

        // Outstanding 11000 + 5000 top-up = 16000 over 12 months at 24%.
        let adjustment =
            plan_adjustment(&record, date(2024, 2, 20), bd(5000), bd(24), 12, &bd(2)).unwrap();
        assert_eq!(adjustment.resulting_principal, bd(16000));
        assert_eq!(adjustment.service_fee, Some(bd(100)));

        let adjusted = apply_adjustment(&record, &adjustment).unwrap();
        // 16000 + 3840 interest over 12 months = 1653 per month, rounded.
        assert_eq!(adjusted.installment_amount, bd(1653));
        let pending: Vec<&Installment> = adjusted
            .schedule
            .iter()
            .filter(|inst| inst.status == InstallmentStatus::Pending)
            .collect();
        assert_eq!(pending.len(), 12);
        assert_eq!(pending[0].due_date, date(2024, 3, 5));
        assert_eq!(pending[0].sequence_number, 2);
        assert!(pending.iter().all(|inst| inst.amount == bd(1653)));
        // Service fee rolls into the record's accumulated charge.
        assert_eq!(adjusted.service_charge, bd(100));
    }

    #[test]
    fn adjustment_with_zero_tenure_fails_fast() {
        let record = active_record();
        assert!(plan_adjustment(&record, date(2024, 2, 20), bd(5000), bd(24), 0, &bd(2)).is_err());
    }

    #[test]
    fn settlement_cancels_pending_and_zeroes_outstanding() {
        let record = active_record();
        let record = mark_paid(&record, 1, date(2024, 2, 5), None).unwrap();

        let settlement = plan_settlement(&record, date(2024, 2, 20), bd(2), true);
        assert_eq!(settlement.outstanding_principal, bd(11000));
        assert_eq!(settlement.total_paid, round_currency(&bd(11220)));

        let settled = settle(&record, settlement);
        assert_eq!(settled.status, RecordStatus::Settled);
        assert!(settled
            .schedule
            .iter()
            .all(|inst| inst.status != InstallmentStatus::Pending));
        assert_eq!(settled.outstanding(), bd(0));
    }

    #[test]
    fn undo_settlement_restores_pending_tail() {
        let record = active_record();
        let settlement = plan_settlement(&record, date(2024, 2, 20), bd(2), true);
        let settled = settle(&record, settlement);

        let restored = undo_settlement(&settled);
        assert_eq!(restored.status, RecordStatus::Active);
        assert!(restored.settlement.is_none());
        assert_eq!(
            restored
                .schedule
                .iter()
                .filter(|inst| inst.status == InstallmentStatus::Pending)
                .count(),
            12
        );
    }
}
