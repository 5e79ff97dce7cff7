//! Rent payments and expenses.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{is_blank, require, Money, PersonRef, ValidationError};

wire_enum! {
    pub enum PaymentMethod {
        Cash => "Cash",
        Check => "Check",
        BankTransfer => "Bank Transfer",
        CreditCard => "Credit Card",
        PayPal => "PayPal",
        Other => "Other",
    }
}

impl Default for PaymentMethod {
    fn default() -> Self {
        PaymentMethod::Other
    }
}

wire_enum! {
    pub enum ExpenseType {
        Maintenance => "Maintenance",
        Repair => "Repair",
        Upgrade => "Upgrade",
        Emergency => "Emergency",
        Materials => "Materials",
        Labor => "Labor",
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// Flat reference embedded in payment history rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentFlatRef {
    pub flat_unique_id: String,
    pub title: String,
    #[serde(default)]
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RentPayment {
    pub payment_unique_id: String,
    pub amount: Money,
    #[serde(default)]
    pub payment_date: Option<String>,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub payment_method: Option<String>,
    /// `"Paid"` once the owner verified it, otherwise pending.
    #[serde(default)]
    pub payment_status: Option<String>,
    #[serde(default)]
    pub late_fee: Option<Money>,
    #[serde(default)]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub flat: Option<PaymentFlatRef>,
    #[serde(default)]
    pub tenant: Option<PersonRef>,
}

impl RentPayment {
    pub fn is_verified(&self) -> bool {
        self.payment_status.as_deref() == Some("Paid")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    pub expense_unique_id: String,
    pub expense_type: String,
    pub amount: Money,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub expense_date: Option<String>,
    #[serde(default)]
    pub vendor_name: Option<String>,
}

// ---------------------------------------------------------------------------
// Mutating bodies
// ---------------------------------------------------------------------------

/// Body of `POST /tenant/record-rent-payment` (tenant reports a payment).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordRentPayment {
    pub flat_unique_id: String,
    pub amount: Money,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_unique_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub late_fee: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl RecordRentPayment {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require(
            !is_blank(&self.flat_unique_id) && self.amount.is_positive(),
            "Invalid payment data",
        )?;
        if let Some(fee) = self.late_fee {
            require(fee.cents() >= 0, "Late fee cannot be negative")?;
        }
        Ok(())
    }
}

/// Body of `POST /owner/record-rent` (owner records rent received).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerRecordRent {
    pub flat_unique_id: String,
    pub amount: Money,
    #[serde(default)]
    pub payment_method: PaymentMethod,
}

impl OwnerRecordRent {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require(
            !is_blank(&self.flat_unique_id) && self.amount.is_positive(),
            "Please fill in all fields",
        )
    }
}

/// Body of `POST /create-manual-expense`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewExpense {
    pub owner_unique_id: String,
    pub flat_unique_id: String,
    pub expense_type: ExpenseType,
    pub amount: Money,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor_contact: Option<String>,
    #[serde(default)]
    pub is_tax_deductible: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl NewExpense {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require(
            !is_blank(&self.owner_unique_id)
                && !is_blank(&self.flat_unique_id)
                && self.amount.is_positive(),
            "Please fill in all required fields",
        )
    }
}

/// Body of `PUT /update-service-expense`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceExpenseUpdate {
    pub expense_unique_id: String,
    pub amount: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor_name: Option<String>,
}

impl ServiceExpenseUpdate {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require(!is_blank(&self.expense_unique_id), "Expense id is required")?;
        require(self.amount.is_positive(), "Amount must be greater than zero")
    }
}

// ---------------------------------------------------------------------------
// Query filters
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PaymentHistoryFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flat_unique_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_unique_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_unique_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExpenseHistoryFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_unique_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flat_unique_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expense_type: Option<ExpenseType>,
}

/// Query for `GET /financial-summary/{owner}`. Both fields absent means all time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SummaryPeriod {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub month: Option<u32>,
}

impl SummaryPeriod {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(m) = self.month {
            require((1..=12).contains(&m), "Month must be between 1 and 12")?;
            require(self.year.is_some(), "A month filter needs a year")?;
        }
        Ok(())
    }
}
