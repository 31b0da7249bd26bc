//! Normalization of raw credit-record documents.
//!
//! Records arrive from two collections: the current one and a legacy one
//! whose documents alias several fields (`emi` for `installmentAmount`,
//! `processingFee` for `serviceCharge`, and so on). Everything is folded
//! into the canonical [`CreditRecord`] here, exactly once; computation code
//! never inspects which spelling a document used.

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::types::*;

/// A credit-record document as stored, carrying both current and legacy
/// field spellings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawCreditRecord {
    pub id: String,
    pub customer_id: Option<String>,
    pub customer_name: Option<String>,
    pub amount: Option<BigDecimal>,
    pub installment_amount: Option<BigDecimal>,
    /// Legacy spelling of `installment_amount`
    pub emi: Option<BigDecimal>,
    pub rate: Option<BigDecimal>,
    /// Legacy spelling of `rate`
    pub interest_rate: Option<BigDecimal>,
    pub tenure: Option<u32>,
    pub status: Option<String>,
    /// Creation/commencement date, ISO-8601
    pub date: Option<String>,
    pub entry_date: Option<String>,
    /// Legacy spelling of `entry_date`
    pub disbursal_date: Option<String>,
    pub installment_due_day: Option<u32>,
    pub service_charge: Option<BigDecimal>,
    /// Legacy spelling of `service_charge`
    pub processing_fee: Option<BigDecimal>,
    pub service_fee_percentage: Option<BigDecimal>,
    /// Legacy spelling of `service_fee_percentage`
    pub processing_fee_percentage: Option<BigDecimal>,
    pub repayment_schedule: Vec<RawInstallment>,
    pub adjustment_history: Vec<RawAdjustment>,
    /// Legacy spelling of `adjustment_history`
    pub top_up_history: Vec<RawAdjustment>,
    pub settlement_details: Option<RawSettlement>,
    /// Legacy spelling of `settlement_details`
    pub foreclosure_details: Option<RawSettlement>,
}

/// A repayment-schedule row as stored
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawInstallment {
    pub installment_number: Option<u32>,
    /// Legacy spelling of `installment_number`
    pub emi_number: Option<u32>,
    pub due_date: Option<String>,
    pub amount: Option<BigDecimal>,
    pub status: Option<String>,
    pub payment_date: Option<String>,
    pub amount_paid: Option<BigDecimal>,
    pub remark: Option<String>,
}

/// An adjustment-history element as stored
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawAdjustment {
    pub date: Option<String>,
    pub adjustment_amount: Option<BigDecimal>,
    /// Legacy spelling of `adjustment_amount`
    pub amount: Option<BigDecimal>,
    /// Older legacy spelling still found in top-up history rows
    pub top_up_amount: Option<BigDecimal>,
    pub outstanding_before: Option<BigDecimal>,
    pub new_installment: Option<BigDecimal>,
    pub revised_installment: Option<BigDecimal>,
    pub tenure: Option<u32>,
    pub service_fee: Option<BigDecimal>,
    /// Legacy spelling of `service_fee`
    pub processing_fee: Option<BigDecimal>,
}

/// Settlement details as stored
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawSettlement {
    pub date: Option<String>,
    pub outstanding_principal: Option<BigDecimal>,
    pub charges_percentage: Option<BigDecimal>,
    pub total_paid: Option<BigDecimal>,
    pub amount_received: Option<bool>,
}

/// Counters describing what normalization did; conflicts are observable
/// here and in the log, never fatal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizationReport {
    /// Records in the merged output
    pub merged: u32,
    /// Legacy documents discarded because the id was already present
    pub legacy_duplicates_discarded: u32,
    /// Field-level disagreements resolved by preferring the current value
    pub field_conflicts: u32,
    /// Schedule rows dropped for lacking a parseable due date
    pub dropped_rows: u32,
}

/// Parse the calendar-date prefix of an ISO-8601 string. Document dates
/// sometimes carry a time suffix; only the date part is meaningful here.
pub fn parse_iso_date(value: &str) -> Option<NaiveDate> {
    let prefix = value.get(..10)?;
    NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok()
}

/// Lenient status parsing over every spelling both collections use.
pub fn parse_record_status(value: &str) -> Option<RecordStatus> {
    match value.trim().to_lowercase().as_str() {
        "pending" | "draft" => Some(RecordStatus::Pending),
        "approved" | "accepted" => Some(RecordStatus::Approved),
        "active" | "disbursed" | "given" => Some(RecordStatus::Active),
        "overdue" => Some(RecordStatus::Overdue),
        "completed" => Some(RecordStatus::Completed),
        "settled" => Some(RecordStatus::Settled),
        "rejected" => Some(RecordStatus::Rejected),
        _ => None,
    }
}

fn parse_installment_status(value: Option<&str>) -> InstallmentStatus {
    match value.map(|s| s.trim().to_lowercase()) {
        Some(s) if s == "paid" => InstallmentStatus::Paid,
        Some(s) if s == "cancelled" => InstallmentStatus::Cancelled,
        _ => InstallmentStatus::Pending,
    }
}

/// Pick the current-collection value when both spellings are present,
/// counting and logging a disagreement.
fn prefer<T: PartialEq + std::fmt::Debug>(
    record_id: &str,
    field: &str,
    current: Option<T>,
    legacy: Option<T>,
    report: &mut NormalizationReport,
) -> Option<T> {
    match (current, legacy) {
        (Some(current), Some(legacy)) => {
            if current != legacy {
                report.field_conflicts += 1;
                tracing::warn!(
                    record = record_id,
                    field,
                    current = ?current,
                    legacy = ?legacy,
                    "field spellings disagree; keeping current value"
                );
            }
            Some(current)
        }
        (Some(current), None) => Some(current),
        (None, legacy) => legacy,
    }
}

fn canonical_installment(
    index: usize,
    raw: &RawInstallment,
    record_id: &str,
    report: &mut NormalizationReport,
) -> Option<Installment> {
    let due_date = raw.due_date.as_deref().and_then(parse_iso_date);
    let Some(due_date) = due_date else {
        report.dropped_rows += 1;
        tracing::warn!(record = record_id, row = index, "schedule row has no parseable due date");
        return None;
    };

    let sequence_number = prefer(
        record_id,
        "installmentNumber",
        raw.installment_number,
        raw.emi_number,
        report,
    )
    .unwrap_or(index as u32 + 1);

    Some(Installment {
        sequence_number,
        due_date,
        amount: raw.amount.clone().unwrap_or_else(|| BigDecimal::from(0)),
        status: parse_installment_status(raw.status.as_deref()),
        paid_date: raw.payment_date.as_deref().and_then(parse_iso_date),
        paid_amount: raw.amount_paid.clone(),
        remark: raw.remark.clone(),
    })
}

fn canonical_adjustment(raw: &RawAdjustment, report: &mut NormalizationReport, record_id: &str) -> Option<Adjustment> {
    let date = raw.date.as_deref().and_then(parse_iso_date)?;
    let amount = raw
        .adjustment_amount
        .clone()
        .or_else(|| raw.amount.clone())
        .or_else(|| raw.top_up_amount.clone())
        .unwrap_or_else(|| BigDecimal::from(0));
    let outstanding_before = raw.outstanding_before.clone();
    let resulting_principal = match &outstanding_before {
        Some(outstanding) => outstanding + &amount,
        None => amount.clone(),
    };
    let revised_installment = prefer(
        record_id,
        "revisedInstallment",
        raw.new_installment.clone(),
        raw.revised_installment.clone(),
        report,
    )
    .unwrap_or_else(|| BigDecimal::from(0));
    let service_fee = prefer(
        record_id,
        "serviceFee",
        raw.service_fee.clone(),
        raw.processing_fee.clone(),
        report,
    );

    Some(Adjustment {
        date,
        amount,
        resulting_principal,
        tenure_months: raw.tenure.unwrap_or(0),
        annual_rate: None,
        revised_installment,
        service_fee,
        outstanding_before,
    })
}

fn canonical_settlement(raw: &RawSettlement) -> Option<SettlementDetails> {
    let date = raw.date.as_deref().and_then(parse_iso_date)?;
    Some(SettlementDetails {
        date,
        outstanding_principal: raw
            .outstanding_principal
            .clone()
            .unwrap_or_else(|| BigDecimal::from(0)),
        charges_percent: raw
            .charges_percentage
            .clone()
            .unwrap_or_else(|| BigDecimal::from(0)),
        total_paid: raw.total_paid.clone().unwrap_or_else(|| BigDecimal::from(0)),
        amount_received: raw.amount_received.unwrap_or(false),
    })
}

/// Fold one raw document into the canonical record shape.
pub fn canonicalize(raw: &RawCreditRecord, report: &mut NormalizationReport) -> CreditRecord {
    let id = raw.id.clone();

    let installment_amount = prefer(
        &id,
        "installmentAmount",
        raw.installment_amount.clone(),
        raw.emi.clone(),
        report,
    )
    .unwrap_or_else(|| BigDecimal::from(0));

    let annual_rate = prefer(&id, "rate", raw.rate.clone(), raw.interest_rate.clone(), report)
        .unwrap_or_else(|| BigDecimal::from(0));

    let entry_date = prefer(
        &id,
        "entryDate",
        raw.entry_date.clone(),
        raw.disbursal_date.clone(),
        report,
    )
    .as_deref()
    .and_then(parse_iso_date);

    let service_charge = prefer(
        &id,
        "serviceCharge",
        raw.service_charge.clone(),
        raw.processing_fee.clone(),
        report,
    )
    .unwrap_or_else(|| BigDecimal::from(0));

    let service_charge_percent = prefer(
        &id,
        "serviceFeePercentage",
        raw.service_fee_percentage.clone(),
        raw.processing_fee_percentage.clone(),
        report,
    )
    .unwrap_or_else(|| BigDecimal::from(0));

    let status = match raw.status.as_deref().map(parse_record_status) {
        Some(Some(status)) => status,
        other => {
            if let Some(None) = other {
                report.field_conflicts += 1;
                tracing::warn!(record = %id, status = ?raw.status, "unknown status; treating as Pending");
            }
            RecordStatus::Pending
        }
    };

    let adjustment_rows = if !raw.adjustment_history.is_empty() {
        if !raw.top_up_history.is_empty() {
            report.field_conflicts += 1;
            tracing::warn!(record = %id, "both adjustment and top-up history present; keeping current");
        }
        &raw.adjustment_history
    } else {
        &raw.top_up_history
    };
    let adjustments = adjustment_rows
        .iter()
        .filter_map(|row| canonical_adjustment(row, report, &id))
        .collect();

    let settlement = match (&raw.settlement_details, &raw.foreclosure_details) {
        (Some(current), Some(_)) => {
            report.field_conflicts += 1;
            tracing::warn!(record = %id, "both settlement and foreclosure details present; keeping current");
            canonical_settlement(current)
        }
        (Some(current), None) => canonical_settlement(current),
        (None, Some(legacy)) => canonical_settlement(legacy),
        (None, None) => None,
    };

    let schedule: Vec<Installment> = raw
        .repayment_schedule
        .iter()
        .enumerate()
        .filter_map(|(index, row)| canonical_installment(index, row, &id, report))
        .collect();

    let due_day = raw
        .installment_due_day
        .unwrap_or(1)
        .clamp(1, 28);

    CreditRecord {
        id,
        customer_id: raw.customer_id.clone(),
        customer_name: raw.customer_name.clone(),
        principal: raw.amount.clone().unwrap_or_else(|| BigDecimal::from(0)),
        annual_rate,
        tenure_months: raw.tenure.unwrap_or(0),
        installment_amount,
        status,
        start_date: raw.date.as_deref().and_then(parse_iso_date),
        entry_date,
        due_day,
        service_charge,
        service_charge_percent,
        schedule,
        adjustments,
        settlement,
    }
}

/// Merge the current and legacy collections into one canonical record set,
/// keyed by id. The current collection wins; a legacy document whose id is
/// already present is discarded (and compared, so disagreements surface in
/// the report). Callers must have finished every source read before calling
/// this; it is the single merge barrier.
pub fn merge_record_sources(
    current: &[RawCreditRecord],
    legacy: &[RawCreditRecord],
) -> (Vec<CreditRecord>, NormalizationReport) {
    let mut report = NormalizationReport::default();
    let mut by_id: HashMap<String, usize> = HashMap::new();
    let mut merged: Vec<CreditRecord> = Vec::new();

    for raw in current.iter().chain(legacy.iter()) {
        if let Some(&existing) = by_id.get(&raw.id) {
            report.legacy_duplicates_discarded += 1;
            let duplicate = canonicalize(raw, &mut report);
            let kept: &CreditRecord = &merged[existing];
            if duplicate.principal != kept.principal
                || duplicate.tenure_months != kept.tenure_months
                || duplicate.installment_amount != kept.installment_amount
            {
                report.field_conflicts += 1;
                tracing::warn!(
                    record = %raw.id,
                    "legacy duplicate disagrees with current record; keeping current"
                );
            } else {
                tracing::debug!(record = %raw.id, "discarded identical legacy duplicate");
            }
            continue;
        }

        let record = canonicalize(raw, &mut report);
        by_id.insert(record.id.clone(), merged.len());
        merged.push(record);
    }

    report.merged = merged.len() as u32;
    (merged, report)
}
