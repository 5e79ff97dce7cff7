//! Flats, tenants and the OTP handshake payloads.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{is_blank, require, Money, ValidationError};

// ---------------------------------------------------------------------------
// Flat
// ---------------------------------------------------------------------------

/// Minimal person reference embedded in flat / payment records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonRef {
    pub unique_id: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_no: Option<String>,
}

/// A flat as listed by `/list-flats` or `/owner-flats/{ownerId}`.
///
/// `is_rented` and the tenant linkage are one fact. The client never edits
/// either field locally; it refetches the list after any mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flat {
    pub flat_unique_id: String,
    pub title: String,
    #[serde(default)]
    pub address: String,
    pub rent: Money,
    #[serde(default)]
    pub is_rented: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant: Option<PersonRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<PersonRef>,
    /// Older payloads only carry the occupant id flat on the record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rented_to_unique_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl Flat {
    /// Id of the tenant currently occupying this flat, if the payload says.
    pub fn occupant_id(&self) -> Option<&str> {
        self.tenant
            .as_ref()
            .map(|t| t.unique_id.as_str())
            .or(self.rented_to_unique_id.as_deref())
            .filter(|id| !id.is_empty())
    }

    pub fn is_linked_to(&self, tenant_id: &str) -> bool {
        self.is_rented && self.occupant_id() == Some(tenant_id)
    }
}

/// Current rental summary embedded in `/all-tenants` rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RentalRef {
    pub flat_unique_id: String,
    pub title: String,
    #[serde(default)]
    pub address: String,
    pub rent: Money,
}

/// A tenant account as listed by `/available-tenants` or `/all-tenants`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
    pub unique_id: String,
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_no: Option<String>,
    #[serde(default)]
    pub currently_rented: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_rental: Option<RentalRef>,
}

impl Tenant {
    /// Not linked to any rented flat. Enforced server-side; mirrored here.
    pub fn is_available(&self) -> bool {
        !self.currently_rented
    }
}

// ---------------------------------------------------------------------------
// OTP handshake
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OtpPurpose {
    Assign,
    Vacate,
}

impl OtpPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            OtpPurpose::Assign => "assign",
            OtpPurpose::Vacate => "vacate",
        }
    }
}

impl std::fmt::Display for OtpPurpose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ephemeral request held by one open assign / vacate dialog.
///
/// Dropped when the dialog closes or settles successfully. The OTP challenge
/// it refers to lives server-side and simply expires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentRequest {
    pub flat_id: String,
    pub tenant_id: String,
    pub otp_code: Option<String>,
}

/// Body of `/request-rent-otp` and `/request-vacate-otp`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtpRequest {
    pub flat_unique_id: String,
    pub tenant_unique_id: String,
}

impl OtpRequest {
    pub fn new(flat_id: impl Into<String>, tenant_id: impl Into<String>) -> Self {
        Self {
            flat_unique_id: flat_id.into(),
            tenant_unique_id: tenant_id.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require(!is_blank(&self.flat_unique_id), "Select a flat first")?;
        require(!is_blank(&self.tenant_unique_id), "Select a tenant first")
    }
}

/// Body of `/rent-flat`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RentFlatRequest {
    pub flat_unique_id: String,
    pub tenant_unique_id: String,
    pub otp_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deposit_amount: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rented_date: Option<NaiveDate>,
}

impl RentFlatRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require(!is_blank(&self.flat_unique_id), "Select a flat first")?;
        require(!is_blank(&self.tenant_unique_id), "Select a tenant first")?;
        require(!is_blank(&self.otp_code), "Enter OTP")?;
        if let Some(dep) = self.deposit_amount {
            require(dep.cents() >= 0, "Deposit cannot be negative")?;
        }
        Ok(())
    }
}

/// Body of `/vacate-flat`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VacateFlatRequest {
    pub flat_unique_id: String,
    pub tenant_unique_id: String,
    pub otp_code: String,
}

impl VacateFlatRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require(!is_blank(&self.flat_unique_id), "Select a flat first")?;
        require(
            !is_blank(&self.tenant_unique_id),
            "Flat has no known occupant to vacate",
        )?;
        require(!is_blank(&self.otp_code), "Enter OTP")
    }
}

// ---------------------------------------------------------------------------
// Flat creation
// ---------------------------------------------------------------------------

/// Body of `/create-flat`. The backend names these fields differently from
/// the listing shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewFlat {
    pub owner_unique_id: String,
    #[serde(rename = "flat_name")]
    pub title: String,
    #[serde(rename = "location")]
    pub address: String,
    #[serde(rename = "rent_amount")]
    pub rent: Money,
}

impl NewFlat {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require(!is_blank(&self.owner_unique_id), "Owner id is required")?;
        require(!is_blank(&self.title), "Flat title is required")?;
        require(!is_blank(&self.address), "Flat address is required")?;
        require(self.rent.is_positive(), "Valid rent amount is required")
    }
}
