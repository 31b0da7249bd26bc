//! Core types and data structures for the billing/credit-book domain

use bigdecimal::rounding::RoundingMode;
use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Account name the source application posts cash movements against.
pub const CASH_ACCOUNT: &str = "Cash / Bank";

/// Round a monetary value to two fractional digits, half-up.
pub fn round_currency(value: &BigDecimal) -> BigDecimal {
    value.with_scale_round(2, RoundingMode::HalfUp)
}

/// Round a monetary value to a whole currency unit, half-up.
///
/// Installment amounts are carried in whole units, matching how the
/// schedules are quoted to customers.
pub fn round_whole(value: &BigDecimal) -> BigDecimal {
    value.with_scale_round(0, RoundingMode::HalfUp)
}

/// Clamp a value at zero. Negative intermediate results are a guard
/// condition, never an output.
pub fn clamp_non_negative(value: BigDecimal) -> BigDecimal {
    if value < BigDecimal::from(0) {
        BigDecimal::from(0)
    } else {
        value
    }
}

/// Discount kinds supported on invoice lines and at invoice level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiscountKind {
    /// Percentage of the undiscounted amount
    Percentage,
    /// Flat amount off
    Amount,
}

/// A discount applied to an invoice line or to the invoice total
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Discount {
    pub kind: DiscountKind,
    pub value: BigDecimal,
}

impl Discount {
    pub fn percentage(value: BigDecimal) -> Self {
        Self {
            kind: DiscountKind::Percentage,
            value,
        }
    }

    pub fn amount(value: BigDecimal) -> Self {
        Self {
            kind: DiscountKind::Amount,
            value,
        }
    }

    /// Amount taken off `gross`, clamped to `[0, gross]` so a discount can
    /// never push an amount negative.
    pub fn amount_off(&self, gross: &BigDecimal) -> BigDecimal {
        let raw = match self.kind {
            DiscountKind::Percentage => (gross * &self.value) / BigDecimal::from(100),
            DiscountKind::Amount => self.value.clone(),
        };
        if raw < BigDecimal::from(0) {
            BigDecimal::from(0)
        } else if &raw > gross {
            gross.clone()
        } else {
            raw
        }
    }
}

/// Rounding unit applied to an invoice grand total (ceiling rounding)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RoundUpTo {
    /// No rounding
    #[default]
    None,
    /// Nearest 10 above
    Ten,
    /// Nearest 100 above
    Hundred,
}

impl RoundUpTo {
    /// The rounding step, or `None` when rounding is disabled.
    pub fn step(&self) -> Option<BigDecimal> {
        match self {
            RoundUpTo::None => None,
            RoundUpTo::Ten => Some(BigDecimal::from(10)),
            RoundUpTo::Hundred => Some(BigDecimal::from(100)),
        }
    }
}

/// One line of an invoice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceLine {
    /// Optional product/service reference (catalog id, HSN code, ...)
    pub product_ref: Option<String>,
    /// Item description
    pub description: String,
    pub quantity: BigDecimal,
    pub unit_rate: BigDecimal,
    /// Line-level discount, applied before tax
    pub discount: Option<Discount>,
    /// Total GST rate percentage for this line (e.g. 18 for 18%)
    pub tax_rate: BigDecimal,
}

impl InvoiceLine {
    pub fn new(
        description: String,
        quantity: BigDecimal,
        unit_rate: BigDecimal,
        tax_rate: BigDecimal,
    ) -> Self {
        Self {
            product_ref: None,
            description,
            quantity,
            unit_rate,
            discount: None,
            tax_rate,
        }
    }

    pub fn with_discount(mut self, discount: Discount) -> Self {
        self.discount = Some(discount);
        self
    }
}

/// An invoice as handed to the tax calculator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: String,
    pub date: NaiveDate,
    /// Supplier's state of registration; drives intra/inter-state tax type
    pub supplier_state: Option<String>,
    /// Customer's state
    pub customer_state: Option<String>,
    pub lines: Vec<InvoiceLine>,
    /// Invoice-level discount applied after taxes are summed
    pub global_discount: Option<Discount>,
    /// Grand-total rounding unit
    pub round_up_to: RoundUpTo,
}

impl Invoice {
    pub fn new(id: String, date: NaiveDate) -> Self {
        Self {
            id,
            date,
            supplier_state: None,
            customer_state: None,
            lines: Vec::new(),
            global_discount: None,
            round_up_to: RoundUpTo::None,
        }
    }
}

/// Lifecycle status of a credit record.
///
/// Legacy collections spell some of these differently (`Disbursed`, `Given`,
/// `Accepted`); serde aliases fold them onto the canonical variants so no
/// computation site ever sees the legacy spellings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordStatus {
    /// Created but not yet approved
    Pending,
    #[serde(alias = "Accepted")]
    Approved,
    /// Disbursed and running
    #[serde(alias = "Disbursed", alias = "Given")]
    Active,
    Overdue,
    /// Every installment paid
    Completed,
    /// Closed early through a settlement
    Settled,
    Rejected,
}

impl RecordStatus {
    /// Whether the record has committed funds and therefore participates in
    /// cash reconciliation. Pending and Rejected records have no cash impact.
    pub fn is_committed(&self) -> bool {
        matches!(
            self,
            RecordStatus::Approved
                | RecordStatus::Active
                | RecordStatus::Overdue
                | RecordStatus::Completed
                | RecordStatus::Settled
        )
    }

    /// Whether the record still accrues collections (not yet closed).
    pub fn is_open(&self) -> bool {
        matches!(
            self,
            RecordStatus::Approved | RecordStatus::Active | RecordStatus::Overdue
        )
    }
}

/// Status of a single installment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstallmentStatus {
    Pending,
    Paid,
    /// Voided by a settlement; excluded from payable totals
    Cancelled,
}

/// One scheduled periodic payment of a credit record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Installment {
    pub sequence_number: u32,
    pub due_date: NaiveDate,
    pub amount: BigDecimal,
    pub status: InstallmentStatus,
    pub paid_date: Option<NaiveDate>,
    pub paid_amount: Option<BigDecimal>,
    pub remark: Option<String>,
}

impl Installment {
    pub fn pending(sequence_number: u32, due_date: NaiveDate, amount: BigDecimal) -> Self {
        Self {
            sequence_number,
            due_date,
            amount,
            status: InstallmentStatus::Pending,
            paid_date: None,
            paid_amount: None,
            remark: None,
        }
    }

    /// Cash received for this installment, if it has been paid.
    ///
    /// Legacy rows never carry `paid_amount`; the scheduled amount stands in
    /// for them.
    pub fn paid_contribution(&self) -> Option<BigDecimal> {
        if self.status == InstallmentStatus::Paid {
            Some(self.paid_amount.clone().unwrap_or_else(|| self.amount.clone()))
        } else {
            None
        }
    }
}

/// A top-up adjustment applied to a running credit record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Adjustment {
    pub date: NaiveDate,
    /// Additional amount handed out
    pub amount: BigDecimal,
    /// Principal the remaining schedule is regenerated against
    pub resulting_principal: BigDecimal,
    /// Remaining tenure from the adjustment date forward
    pub tenure_months: u32,
    /// Revised annual rate; the record's current rate applies when absent
    pub annual_rate: Option<BigDecimal>,
    pub revised_installment: BigDecimal,
    pub service_fee: Option<BigDecimal>,
    pub outstanding_before: Option<BigDecimal>,
}

/// Early-closure details for a settled record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementDetails {
    pub date: NaiveDate,
    pub outstanding_principal: BigDecimal,
    pub charges_percent: BigDecimal,
    pub total_paid: BigDecimal,
    /// Whether the settlement amount was actually received
    pub amount_received: bool,
}

/// Canonical credit record ("loan" in the legacy collection).
///
/// Always produced by normalization; computation code never handles the raw
/// dual-shape documents directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditRecord {
    pub id: String,
    pub customer_id: Option<String>,
    pub customer_name: Option<String>,
    /// Principal handed out ("amount" in the source documents)
    pub principal: BigDecimal,
    pub annual_rate: BigDecimal,
    pub tenure_months: u32,
    pub installment_amount: BigDecimal,
    pub status: RecordStatus,
    /// Commencement date; a record without one has no cash impact yet
    pub start_date: Option<NaiveDate>,
    /// Disbursal date where tracked separately from creation
    pub entry_date: Option<NaiveDate>,
    /// Day of month installments fall due, bounded 1..=28
    pub due_day: u32,
    pub service_charge: BigDecimal,
    pub service_charge_percent: BigDecimal,
    pub schedule: Vec<Installment>,
    pub adjustments: Vec<Adjustment>,
    pub settlement: Option<SettlementDetails>,
}

impl CreditRecord {
    pub fn new(
        id: String,
        principal: BigDecimal,
        annual_rate: BigDecimal,
        tenure_months: u32,
        start_date: NaiveDate,
    ) -> Self {
        Self {
            id,
            customer_id: None,
            customer_name: None,
            principal,
            annual_rate,
            tenure_months,
            installment_amount: BigDecimal::from(0),
            status: RecordStatus::Pending,
            start_date: Some(start_date),
            entry_date: None,
            due_day: 1,
            service_charge: BigDecimal::from(0),
            service_charge_percent: BigDecimal::from(0),
            schedule: Vec::new(),
            adjustments: Vec::new(),
            settlement: None,
        }
    }

    /// Sum of cash received through paid installments.
    pub fn collected_installments(&self) -> BigDecimal {
        self.schedule
            .iter()
            .filter_map(Installment::paid_contribution)
            .sum()
    }

    /// Total cash collected: paid installments plus a received settlement.
    pub fn collected(&self) -> BigDecimal {
        let mut total = self.collected_installments();
        if let Some(settlement) = &self.settlement {
            if settlement.amount_received {
                total += &settlement.total_paid;
            }
        }
        total
    }

    /// Total payable over the life of the record.
    ///
    /// The live schedule is authoritative when present (cancelled rows do not
    /// count); otherwise fall back to installment x tenure.
    pub fn total_payable(&self) -> BigDecimal {
        if self.schedule.is_empty() {
            &self.installment_amount * BigDecimal::from(self.tenure_months)
        } else {
            self.schedule
                .iter()
                .filter(|inst| inst.status != InstallmentStatus::Cancelled)
                .map(|inst| &inst.amount)
                .sum()
        }
    }

    /// Outstanding amount still due, never negative. A settled record whose
    /// settlement amount was received owes nothing.
    pub fn outstanding(&self) -> BigDecimal {
        if let Some(settlement) = &self.settlement {
            if settlement.amount_received {
                return BigDecimal::from(0);
            }
        }
        clamp_non_negative(self.total_payable() - self.collected_installments())
    }

    /// Whether every scheduled installment has been paid.
    pub fn is_fully_paid(&self) -> bool {
        !self.schedule.is_empty()
            && self
                .schedule
                .iter()
                .all(|inst| inst.status == InstallmentStatus::Paid)
    }

    /// Commencement service fee: the stored charge when present, otherwise
    /// derived from the fee percentage against the net commencement amount.
    pub fn commencement_fee(&self, net_commencement: &BigDecimal) -> BigDecimal {
        if self.service_charge > BigDecimal::from(0) {
            self.service_charge.clone()
        } else if self.service_charge_percent > BigDecimal::from(0) {
            (net_commencement * &self.service_charge_percent) / BigDecimal::from(100)
        } else {
            BigDecimal::from(0)
        }
    }
}

/// Debit/Credit marker on a manual ledger posting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PostingType {
    Debit,
    Credit,
}

/// One posting inside a manual ledger entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerPosting {
    pub account: String,
    pub posting_type: PostingType,
    pub amount: BigDecimal,
}

/// A manually posted ledger entry (operator adjustment)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManualLedgerEntry {
    pub id: String,
    pub date: NaiveDate,
    pub narration: String,
    /// Credit record this entry belongs to, when it mirrors a record event
    pub record_id: Option<String>,
    pub customer_id: Option<String>,
    pub postings: Vec<LedgerPosting>,
}

impl ManualLedgerEntry {
    pub fn new(date: NaiveDate, narration: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            date,
            narration,
            record_id: None,
            customer_id: None,
            postings: Vec::new(),
        }
    }

    pub fn for_record(mut self, record_id: String) -> Self {
        self.record_id = Some(record_id);
        self
    }

    pub fn posting(mut self, account: &str, posting_type: PostingType, amount: BigDecimal) -> Self {
        self.postings.push(LedgerPosting {
            account: account.to_string(),
            posting_type,
            amount,
        });
        self
    }

    /// Net effect of this entry on the cash account: a Debit posting against
    /// cash adds, a Credit posting subtracts.
    pub fn cash_impact(&self) -> BigDecimal {
        let mut impact = BigDecimal::from(0);
        for posting in &self.postings {
            if posting.account == CASH_ACCOUNT {
                match posting.posting_type {
                    PostingType::Debit => impact += &posting.amount,
                    PostingType::Credit => impact -= &posting.amount,
                }
            }
        }
        impact
    }
}

/// Direction of a partner capital movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PartnerFlow {
    Investment,
    Withdrawal,
}

/// Capital moved in or out by a partner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartnerTransaction {
    pub id: String,
    pub date: NaiveDate,
    pub partner_name: String,
    pub flow: PartnerFlow,
    pub amount: BigDecimal,
}

impl PartnerTransaction {
    pub fn new(
        date: NaiveDate,
        partner_name: String,
        flow: PartnerFlow,
        amount: BigDecimal,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            date,
            partner_name,
            flow,
            amount,
        }
    }

    /// Cash impact: investments add, withdrawals subtract.
    pub fn signed_amount(&self) -> BigDecimal {
        match self.flow {
            PartnerFlow::Investment => self.amount.clone(),
            PartnerFlow::Withdrawal => -&self.amount,
        }
    }
}

/// A recorded business expense
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: String,
    pub date: NaiveDate,
    pub narration: String,
    pub amount: BigDecimal,
}

impl Expense {
    pub fn new(date: NaiveDate, narration: String, amount: BigDecimal) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            date,
            narration,
            amount,
        }
    }
}

/// Errors produced by the computation core
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Record not found: {0}")]
    RecordNotFound(String),
}

/// Result type for core operations
pub type CoreResult<T> = Result<T, CoreError>;
