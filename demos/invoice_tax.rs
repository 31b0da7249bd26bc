//! GST invoice calculation examples
//!
//! Run with: cargo run --example invoice_tax

use bigdecimal::BigDecimal;
use billbook_core::{
    compute_invoice, compute_line, reverse_base_from_total, Discount, Invoice, InvoiceLine,
    RoundUpTo, TaxType,
};
use chrono::NaiveDate;

fn main() {
    println!("=== GST Invoice Calculation Examples ===\n");

    // Example 1: intra-state line (CGST + SGST)
    println!("1. Intra-state line (Delhi -> Delhi):");
    let line = InvoiceLine::new(
        "Laptop".to_string(),
        BigDecimal::from(2),
        BigDecimal::from(500),
        BigDecimal::from(18),
    );
    let result = compute_line(&line, TaxType::IntraState).unwrap();
    println!("   Base amount: {}", result.base_amount);
    println!("   CGST (9%):   {}", result.cgst_amount);
    println!("   SGST (9%):   {}", result.sgst_amount);
    println!("   Total:       {}\n", result.total_amount);

    // Example 2: inter-state line (IGST)
    println!("2. Inter-state line (Delhi -> Haryana):");
    let result = compute_line(&line, TaxType::InterState).unwrap();
    println!("   Base amount: {}", result.base_amount);
    println!("   IGST (18%):  {}", result.igst_amount);
    println!("   Total:       {}\n", result.total_amount);

    // Example 3: full invoice with discounts and rounding
    println!("3. Invoice with line discount, global discount, and rounding:");
    let mut invoice = Invoice::new(
        "INV-2024-001".to_string(),
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
    );
    invoice.supplier_state = Some("Delhi".to_string());
    invoice.customer_state = Some("Delhi".to_string());
    invoice.lines.push(
        InvoiceLine::new(
            "Laptop".to_string(),
            BigDecimal::from(2),
            BigDecimal::from(500),
            BigDecimal::from(18),
        )
        .with_discount(Discount::percentage(BigDecimal::from(10))),
    );
    invoice.lines.push(InvoiceLine::new(
        "Mouse".to_string(),
        BigDecimal::from(3),
        BigDecimal::from(100),
        BigDecimal::from(18),
    ));
    invoice.global_discount = Some(Discount::amount(BigDecimal::from(50)));
    invoice.round_up_to = RoundUpTo::Ten;

    let totals = compute_invoice(&invoice).unwrap();
    println!("   Subtotal:        {}", totals.subtotal);
    println!("   CGST:            {}", totals.total_cgst);
    println!("   SGST:            {}", totals.total_sgst);
    println!("   Discount:        {}", totals.discount_amount);
    println!("   Before rounding: {}", totals.pre_round_total);
    println!("   Rounding:        {}", totals.round_up_amount);
    println!("   Grand total:     {}\n", totals.total);

    // Example 4: reverse calculation from a tax-inclusive price
    println!("4. Reverse calculation (1180 inclusive of 18%):");
    let base = reverse_base_from_total(&BigDecimal::from(1180), &BigDecimal::from(18)).unwrap();
    println!("   Base amount: {base}");
}
