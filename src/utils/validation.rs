//! Validation utilities
//!
//! A validation failure aborts the single computation it belongs to (one
//! invoice, one schedule); it never takes down a whole batch.

use bigdecimal::BigDecimal;

use crate::types::*;

/// Validate that an amount is strictly positive
pub fn validate_positive_amount(amount: &BigDecimal) -> CoreResult<()> {
    if *amount <= BigDecimal::from(0) {
        Err(CoreError::Validation(
            "Amount must be positive".to_string(),
        ))
    } else {
        Ok(())
    }
}

/// Validate that a principal is not negative
pub fn validate_principal(principal: &BigDecimal) -> CoreResult<()> {
    if *principal < BigDecimal::from(0) {
        Err(CoreError::Validation(format!(
            "Principal cannot be negative: {principal}"
        )))
    } else {
        Ok(())
    }
}

/// Validate that an interest or fee rate is not negative
pub fn validate_rate(rate: &BigDecimal) -> CoreResult<()> {
    if *rate < BigDecimal::from(0) {
        Err(CoreError::Validation(format!(
            "Rate cannot be negative: {rate}"
        )))
    } else {
        Ok(())
    }
}

/// Validate a tenure in months; zero would divide a schedule by nothing
pub fn validate_tenure(tenure_months: u32) -> CoreResult<()> {
    if tenure_months == 0 {
        Err(CoreError::Validation(
            "Tenure must be at least one month".to_string(),
        ))
    } else {
        Ok(())
    }
}

/// Validate an installment due day. Bounded to 1..=28 so every month of the
/// year has the day.
pub fn validate_due_day(due_day: u32) -> CoreResult<()> {
    if (1..=28).contains(&due_day) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Due day must be between 1 and 28, got {due_day}"
        )))
    }
}

/// Validate a company/tenant identifier
pub fn validate_company_id(company_id: &str) -> CoreResult<()> {
    if company_id.trim().is_empty() {
        return Err(CoreError::Validation(
            "Company ID cannot be empty".to_string(),
        ));
    }

    if company_id.len() > 64 {
        return Err(CoreError::Validation(
            "Company ID cannot exceed 64 characters".to_string(),
        ));
    }

    Ok(())
}
