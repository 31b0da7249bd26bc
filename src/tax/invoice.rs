//! GST (Goods and Services Tax) breakdown for invoice lines and totals

use bigdecimal::rounding::RoundingMode;
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

use crate::types::*;

/// Whether a transaction is taxed within one state or across states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaxType {
    /// Supplier and customer registered in the same state: CGST + SGST
    IntraState,
    /// Different (or unknown) states: IGST
    InterState,
}

impl TaxType {
    /// Derive the tax type from supplier/customer states.
    ///
    /// Comparison is trimmed and case-insensitive. A missing state on either
    /// side yields `InterState`, the fail-safe policy: the full rate is still
    /// charged rather than silently split on bad data.
    pub fn from_states(supplier_state: Option<&str>, customer_state: Option<&str>) -> Self {
        match (supplier_state, customer_state) {
            (Some(supplier), Some(customer)) => {
                let supplier = supplier.trim();
                let customer = customer.trim();
                if !supplier.is_empty()
                    && !customer.is_empty()
                    && supplier.eq_ignore_ascii_case(customer)
                {
                    TaxType::IntraState
                } else {
                    TaxType::InterState
                }
            }
            _ => TaxType::InterState,
        }
    }
}

/// A total GST rate split into its CGST/SGST/IGST components
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxSplit {
    pub total_rate: BigDecimal,
    pub cgst_rate: BigDecimal,
    pub sgst_rate: BigDecimal,
    pub igst_rate: BigDecimal,
}

impl TaxSplit {
    /// Split a total rate for the given tax type: intra-state halves the rate
    /// between CGST and SGST, inter-state applies it wholly as IGST.
    pub fn for_type(tax_type: TaxType, total_rate: BigDecimal) -> Self {
        match tax_type {
            TaxType::IntraState => {
                let half_rate = &total_rate / BigDecimal::from(2);
                Self {
                    total_rate,
                    cgst_rate: half_rate.clone(),
                    sgst_rate: half_rate,
                    igst_rate: BigDecimal::from(0),
                }
            }
            TaxType::InterState => Self {
                total_rate: total_rate.clone(),
                cgst_rate: BigDecimal::from(0),
                sgst_rate: BigDecimal::from(0),
                igst_rate: total_rate,
            },
        }
    }
}

/// Tax breakdown for a single invoice line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineTax {
    /// Taxable amount after the line discount, clamped at zero
    pub base_amount: BigDecimal,
    pub discount_amount: BigDecimal,
    pub cgst_amount: BigDecimal,
    pub sgst_amount: BigDecimal,
    pub igst_amount: BigDecimal,
    /// Base plus all tax components
    pub total_amount: BigDecimal,
}

/// Compute the tax breakdown for one invoice line.
///
/// Negative quantity or rate is treated as zero rather than producing a
/// negative base; the discount is applied to quantity x rate before the tax
/// split.
pub fn compute_line(line: &InvoiceLine, tax_type: TaxType) -> CoreResult<LineTax> {
    if line.tax_rate < BigDecimal::from(0) {
        return Err(CoreError::Validation(format!(
            "Tax rate cannot be negative: {}",
            line.tax_rate
        )));
    }

    let quantity = clamp_non_negative(line.quantity.clone());
    let unit_rate = clamp_non_negative(line.unit_rate.clone());
    if quantity != line.quantity || unit_rate != line.unit_rate {
        tracing::debug!(line = %line.description, "negative quantity/rate clamped to zero");
    }

    let gross = &quantity * &unit_rate;
    let discount_amount = line
        .discount
        .as_ref()
        .map(|d| d.amount_off(&gross))
        .unwrap_or_else(|| BigDecimal::from(0));
    let base_amount = clamp_non_negative(&gross - &discount_amount);

    let split = TaxSplit::for_type(tax_type, line.tax_rate.clone());
    let cgst_amount = (&base_amount * &split.cgst_rate) / BigDecimal::from(100);
    let sgst_amount = (&base_amount * &split.sgst_rate) / BigDecimal::from(100);
    let igst_amount = (&base_amount * &split.igst_rate) / BigDecimal::from(100);
    let total_amount = &base_amount + &cgst_amount + &sgst_amount + &igst_amount;

    Ok(LineTax {
        base_amount,
        discount_amount,
        cgst_amount,
        sgst_amount,
        igst_amount,
        total_amount,
    })
}

/// Complete invoice-level tax and total breakdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceTotals {
    pub tax_type: TaxType,
    pub lines: Vec<LineTax>,
    /// Sum of line base amounts
    pub subtotal: BigDecimal,
    pub total_cgst: BigDecimal,
    pub total_sgst: BigDecimal,
    pub total_igst: BigDecimal,
    /// Invoice-level discount actually subtracted
    pub discount_amount: BigDecimal,
    /// Grand total before rounding
    pub pre_round_total: BigDecimal,
    /// Delta added by ceiling rounding, kept separate so it stays auditable
    pub round_up_amount: BigDecimal,
    /// Final payable total
    pub total: BigDecimal,
}

/// Compute the full tax breakdown and totals for an invoice.
///
/// A percentage global discount is computed on the subtotal and subtracted
/// from subtotal + taxes; the result is clamped at zero and then optionally
/// ceiling-rounded to the configured unit, with the rounding delta recorded.
pub fn compute_invoice(invoice: &Invoice) -> CoreResult<InvoiceTotals> {
    let tax_type = TaxType::from_states(
        invoice.supplier_state.as_deref(),
        invoice.customer_state.as_deref(),
    );

    let mut lines = Vec::with_capacity(invoice.lines.len());
    for line in &invoice.lines {
        lines.push(compute_line(line, tax_type)?);
    }

    let subtotal = round_currency(&lines.iter().map(|l| &l.base_amount).sum::<BigDecimal>());
    let total_cgst = round_currency(&lines.iter().map(|l| &l.cgst_amount).sum::<BigDecimal>());
    let total_sgst = round_currency(&lines.iter().map(|l| &l.sgst_amount).sum::<BigDecimal>());
    let total_igst = round_currency(&lines.iter().map(|l| &l.igst_amount).sum::<BigDecimal>());

    let discount_amount = match &invoice.global_discount {
        Some(discount) => round_currency(&match discount.kind {
            DiscountKind::Percentage => (&subtotal * &discount.value) / BigDecimal::from(100),
            DiscountKind::Amount => discount.value.clone(),
        }),
        None => BigDecimal::from(0),
    };

    let before_discount = &subtotal + &total_cgst + &total_sgst + &total_igst;
    let pre_round_total = clamp_non_negative(&before_discount - &discount_amount);

    let (total, round_up_amount) = match invoice.round_up_to.step() {
        Some(step) => {
            let rounded = (&pre_round_total / &step).with_scale_round(0, RoundingMode::Ceiling) * &step;
            let delta = &rounded - &pre_round_total;
            (rounded, delta)
        }
        None => (pre_round_total.clone(), BigDecimal::from(0)),
    };

    Ok(InvoiceTotals {
        tax_type,
        lines,
        subtotal,
        total_cgst,
        total_sgst,
        total_igst,
        discount_amount,
        pre_round_total,
        round_up_amount,
        total,
    })
}

/// Recover the base amount from a tax-inclusive total (reverse calculation),
/// used by quotation tooling where only the final price is known.
pub fn reverse_base_from_total(
    total_amount: &BigDecimal,
    total_rate: &BigDecimal,
) -> CoreResult<BigDecimal> {
    if total_rate < &BigDecimal::from(0) {
        return Err(CoreError::Validation(format!(
            "Tax rate cannot be negative: {total_rate}"
        )));
    }
    let divisor = BigDecimal::from(100) + total_rate;
    Ok(round_currency(
        &((total_amount * BigDecimal::from(100)) / divisor),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn bd(value: i64) -> BigDecimal {
        BigDecimal::from(value)
    }

    #[test]
    fn tax_type_from_states() {
        assert_eq!(
            TaxType::from_states(Some("Delhi"), Some("Delhi")),
            TaxType::IntraState
        );
        assert_eq!(
            TaxType::from_states(Some("Delhi"), Some("delhi ")),
            TaxType::IntraState
        );
        assert_eq!(
            TaxType::from_states(Some("Delhi"), Some("Haryana")),
            TaxType::InterState
        );
        assert_eq!(TaxType::from_states(Some("Delhi"), None), TaxType::InterState);
        assert_eq!(TaxType::from_states(Some(""), Some("")), TaxType::InterState);
    }

    #[test]
    fn intra_state_line_splits_rate_evenly() {
        let line = InvoiceLine::new("Product A".to_string(), bd(2), bd(500), bd(18));
        let result = compute_line(&line, TaxType::IntraState).unwrap();

        assert_eq!(result.base_amount, bd(1000));
        assert_eq!(result.cgst_amount, bd(90));
        assert_eq!(result.sgst_amount, bd(90));
        assert_eq!(result.igst_amount, bd(0));
        assert_eq!(result.total_amount, bd(1180));
    }

    #[test]
    fn inter_state_line_uses_igst_only() {
        let line = InvoiceLine::new("Product A".to_string(), bd(2), bd(500), bd(18));
        let result = compute_line(&line, TaxType::InterState).unwrap();

        assert_eq!(result.cgst_amount, bd(0));
        assert_eq!(result.sgst_amount, bd(0));
        assert_eq!(result.igst_amount, bd(180));
        assert_eq!(result.total_amount, bd(1180));
    }

    #[test]
    fn line_discount_applies_before_tax() {
        let line = InvoiceLine::new("Product A".to_string(), bd(1), bd(1000), bd(18))
            .with_discount(Discount::percentage(bd(10)));
        let result = compute_line(&line, TaxType::IntraState).unwrap();

        assert_eq!(result.discount_amount, bd(100));
        assert_eq!(result.base_amount, bd(900));
        assert_eq!(result.cgst_amount, bd(81));
        assert_eq!(result.sgst_amount, bd(81));
    }

    #[test]
    fn oversized_amount_discount_clamps_base_at_zero() {
        let line = InvoiceLine::new("Product A".to_string(), bd(1), bd(100), bd(18))
            .with_discount(Discount::amount(bd(500)));
        let result = compute_line(&line, TaxType::IntraState).unwrap();

        assert_eq!(result.base_amount, bd(0));
        assert_eq!(result.total_amount, bd(0));
    }

    #[test]
    fn negative_quantity_treated_as_zero() {
        let line = InvoiceLine::new("Product A".to_string(), bd(-3), bd(100), bd(18));
        let result = compute_line(&line, TaxType::IntraState).unwrap();

        assert_eq!(result.base_amount, bd(0));
        assert_eq!(result.total_amount, bd(0));
    }

    #[test]
    fn negative_tax_rate_is_rejected() {
        let line = InvoiceLine::new("Product A".to_string(), bd(1), bd(100), bd(-5));
        assert!(compute_line(&line, TaxType::IntraState).is_err());
    }

    #[test]
    fn invoice_totals_reconcile_with_components() {
        let mut invoice = Invoice::new("inv1".to_string(), date(2024, 1, 15));
        invoice.supplier_state = Some("Delhi".to_string());
        invoice.customer_state = Some("Delhi".to_string());
        invoice.lines = vec![
            InvoiceLine::new("Product A".to_string(), bd(2), bd(500), bd(18)),
            InvoiceLine::new("Product B".to_string(), bd(1), bd(300), bd(18)),
        ];

        let totals = compute_invoice(&invoice).unwrap();

        assert_eq!(totals.tax_type, TaxType::IntraState);
        assert_eq!(totals.subtotal, round_currency(&bd(1300)));
        assert_eq!(
            totals.total_cgst.clone() + totals.total_sgst.clone(),
            round_currency(&bd(117)) + round_currency(&bd(117))
        );
        // total == subtotal + taxes - discount + rounding delta
        let recomputed = &totals.subtotal + &totals.total_cgst + &totals.total_sgst
            + &totals.total_igst
            - &totals.discount_amount
            + &totals.round_up_amount;
        assert_eq!(totals.total, recomputed);
    }

    #[test]
    fn global_discount_clamps_total_at_zero() {
        let mut invoice = Invoice::new("inv1".to_string(), date(2024, 1, 15));
        invoice.lines = vec![InvoiceLine::new("Product A".to_string(), bd(1), bd(100), bd(0))];
        invoice.global_discount = Some(Discount::amount(bd(500)));

        let totals = compute_invoice(&invoice).unwrap();
        assert_eq!(totals.total, bd(0));
    }

    #[test]
    fn round_up_to_ten_records_delta() {
        // Pre-round total of 1183 must become 1190 with a delta of 7.
        let mut invoice = Invoice::new("inv1".to_string(), date(2024, 1, 15));
        invoice.lines = vec![InvoiceLine::new("Product A".to_string(), bd(1), bd(1183), bd(0))];
        invoice.round_up_to = RoundUpTo::Ten;

        let totals = compute_invoice(&invoice).unwrap();
        assert_eq!(totals.pre_round_total, round_currency(&bd(1183)));
        assert_eq!(totals.total, bd(1190));
        assert_eq!(totals.round_up_amount, bd(7));
    }

    #[test]
    fn round_up_leaves_exact_multiples_alone() {
        let mut invoice = Invoice::new("inv1".to_string(), date(2024, 1, 15));
        invoice.lines = vec![InvoiceLine::new("Product A".to_string(), bd(1), bd(1200), bd(0))];
        invoice.round_up_to = RoundUpTo::Hundred;

        let totals = compute_invoice(&invoice).unwrap();
        assert_eq!(totals.total, bd(1200));
        assert_eq!(totals.round_up_amount, bd(0));
    }

    #[test]
    fn reverse_calculation_recovers_base() {
        let base = reverse_base_from_total(&bd(1180), &bd(18)).unwrap();
        assert_eq!(base, round_currency(&bd(1000)));
    }
}
