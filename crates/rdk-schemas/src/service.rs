//! Maintenance / service requests.

use serde::{Deserialize, Serialize};

use crate::{is_blank, require, Money, ValidationError};

wire_enum! {
    pub enum ServiceCategory {
        Plumbing => "Plumbing",
        Electrical => "Electrical",
        Hvac => "HVAC",
        Appliances => "Appliances",
        GeneralMaintenance => "General Maintenance",
        Emergency => "Emergency",
    }
}

wire_enum! {
    pub enum Priority {
        Low => "Low",
        Medium => "Medium",
        High => "High",
        Emergency => "Emergency",
    }
}

wire_enum! {
    pub enum ServiceStatus {
        Open => "Open",
        InProgress => "In Progress",
        Completed => "Completed",
        Cancelled => "Cancelled",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceRequest {
    pub request_unique_id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    pub status: String,
    #[serde(default)]
    pub requested_at: Option<String>,
    #[serde(default)]
    pub completed_at: Option<String>,
    #[serde(default)]
    pub tenant_rating: Option<u8>,
    #[serde(default)]
    pub flat_title: Option<String>,
    #[serde(default)]
    pub tenant_name: Option<String>,
}

impl ServiceRequest {
    /// Tenants may rate a request once, after the owner completed it.
    pub fn can_be_rated(&self) -> bool {
        self.status == ServiceStatus::Completed.as_str() && self.tenant_rating.is_none()
    }
}

/// Body of `POST /create-service-request`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewServiceRequest {
    pub flat_unique_id: String,
    pub tenant_unique_id: String,
    pub title: String,
    pub description: String,
    pub category: ServiceCategory,
    pub priority: Priority,
}

impl NewServiceRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require(
            !is_blank(&self.flat_unique_id),
            "You must be assigned to a flat",
        )?;
        require(!is_blank(&self.title), "Please enter a title")?;
        require(!is_blank(&self.description), "Please describe the issue")
    }
}

/// Body of `PUT /update-service-request` (owner side).
///
/// Contractor and cost fields are only sent when completing the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceRequestUpdate {
    pub request_unique_id: String,
    pub status: ServiceStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_cost: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_cost: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contractor_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contractor_contact: Option<String>,
}

impl ServiceRequestUpdate {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.status == ServiceStatus::Completed {
            require(
                self.actual_cost.is_some_and(Money::is_positive),
                "Actual cost is required to complete the request",
            )?;
        }
        Ok(())
    }

    /// Drop completion-only fields unless the status is `Completed`.
    pub fn normalized(mut self) -> Self {
        if self.status != ServiceStatus::Completed {
            self.actual_cost = None;
            self.contractor_name = None;
            self.contractor_contact = None;
        }
        self
    }
}

/// Body of `POST /rate-service-request`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceRating {
    pub request_unique_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_unique_id: Option<String>,
    pub rating: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_notes: Option<String>,
}

impl ServiceRating {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require(self.rating != 0, "Please select a rating")?;
        require(self.rating <= 5, "Rating must be between 1 and 5")
    }
}
