//! Schedule generation for credit records

use bigdecimal::BigDecimal;
use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::types::*;
use crate::utils::validation::{validate_due_day, validate_principal, validate_rate, validate_tenure};

/// Inputs for generating a flat-rate installment schedule
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateParams {
    pub principal: BigDecimal,
    pub annual_rate: BigDecimal,
    pub tenure_months: u32,
    /// Disbursal date; the first installment falls in the following month
    pub entry_date: NaiveDate,
    /// Day of month installments fall due, bounded 1..=28
    pub due_day: u32,
}

/// Flat-rate totals: interest for the full tenure and the per-month amount.
///
/// `total_interest = principal * rate/100 * tenure/12`, and the installment
/// is the payable total spread evenly and rounded to a whole unit.
pub fn flat_installment(
    principal: &BigDecimal,
    annual_rate: &BigDecimal,
    tenure_months: u32,
) -> CoreResult<(BigDecimal, BigDecimal)> {
    validate_principal(principal)?;
    validate_rate(annual_rate)?;
    validate_tenure(tenure_months)?;

    let total_interest = round_currency(
        &((principal * annual_rate * BigDecimal::from(tenure_months)) / BigDecimal::from(1200)),
    );
    let total_payable = principal + &total_interest;
    let installment = round_whole(&(&total_payable / BigDecimal::from(tenure_months)));

    Ok((total_interest, installment))
}

/// Due date of the first installment: `due_day` of the month after
/// `entry_date`. With `due_day` bounded to 28 the date is always valid.
pub fn first_due_date(entry_date: NaiveDate, due_day: u32) -> CoreResult<NaiveDate> {
    validate_due_day(due_day)?;

    let (mut year, mut month) = (entry_date.year(), entry_date.month() + 1);
    if month > 12 {
        year += 1;
        month = 1;
    }
    NaiveDate::from_ymd_opt(year, month, due_day)
        .ok_or_else(|| CoreError::Validation(format!("Invalid due date {year}-{month}-{due_day}")))
}

/// Generate a flat-rate schedule: equal installments, one calendar month
/// apart, starting the month after the entry date.
pub fn generate_schedule(params: &GenerateParams) -> CoreResult<Vec<Installment>> {
    let (_, installment_amount) =
        flat_installment(&params.principal, &params.annual_rate, params.tenure_months)?;
    let first_due = first_due_date(params.entry_date, params.due_day)?;

    let mut schedule = Vec::with_capacity(params.tenure_months as usize);
    for i in 0..params.tenure_months {
        let due_date = first_due
            .checked_add_months(Months::new(i))
            .ok_or_else(|| CoreError::Validation("Due date out of range".to_string()))?;
        schedule.push(Installment::pending(i + 1, due_date, installment_amount.clone()));
    }

    Ok(schedule)
}

/// One row of a reducing-balance amortization table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleRow {
    pub sequence_number: u32,
    pub due_date: NaiveDate,
    pub opening_balance: BigDecimal,
    pub installment: BigDecimal,
    pub interest_part: BigDecimal,
    pub principal_part: BigDecimal,
    pub closing_balance: BigDecimal,
}

/// Reducing-balance amortization view over a fixed installment amount.
///
/// Per period: interest on the running balance at rate/12, principal part is
/// the remainder of the installment, and the balance never goes below zero.
/// Periods are computed strictly in date order since each depends on the
/// previous closing balance.
pub fn amortization_rows(
    principal: &BigDecimal,
    annual_rate: &BigDecimal,
    installment: &BigDecimal,
    tenure_months: u32,
    first_due: NaiveDate,
) -> CoreResult<Vec<ScheduleRow>> {
    validate_principal(principal)?;
    validate_rate(annual_rate)?;
    validate_tenure(tenure_months)?;

    let mut balance = principal.clone();
    let mut rows = Vec::with_capacity(tenure_months as usize);

    for i in 1..=tenure_months {
        let interest_part =
            round_currency(&((&balance * annual_rate) / BigDecimal::from(1200)));
        let principal_part = installment - &interest_part;
        let closing_balance = clamp_non_negative(&balance - &principal_part);
        let due_date = first_due
            .checked_add_months(Months::new(i - 1))
            .ok_or_else(|| CoreError::Validation("Due date out of range".to_string()))?;

        rows.push(ScheduleRow {
            sequence_number: i,
            due_date,
            opening_balance: balance.clone(),
            installment: installment.clone(),
            interest_part,
            principal_part,
            closing_balance: closing_balance.clone(),
        });
        balance = closing_balance;
    }

    Ok(rows)
}
