//! Accounts, login and profile payloads.

use serde::{Deserialize, Serialize};

use crate::{is_blank, require, ValidationError};

wire_enum! {
    /// Role of a logged-in account.
    pub enum AccountType {
        Owner => "Owner",
        Tenant => "Tenant",
        Admin => "Admin",
    }
}

/// The logged-in user as held by the session context.
///
/// `/login` returns `unique_id` and `user_id` with the same value; either
/// or both are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SessionUserWire")]
pub struct SessionUser {
    pub unique_id: String,
    pub username: String,
    pub account_type: AccountType,
    #[serde(default)]
    pub currently_rented: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_no: Option<String>,
}

#[derive(Deserialize)]
struct SessionUserWire {
    #[serde(default)]
    unique_id: Option<String>,
    #[serde(default)]
    user_id: Option<String>,
    username: String,
    account_type: AccountType,
    #[serde(default)]
    currently_rented: bool,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    contact_no: Option<String>,
}

impl TryFrom<SessionUserWire> for SessionUser {
    type Error = String;

    fn try_from(w: SessionUserWire) -> Result<Self, Self::Error> {
        let unique_id = w
            .unique_id
            .or(w.user_id)
            .filter(|id| !is_blank(id))
            .ok_or_else(|| "user record has no unique_id".to_string())?;
        Ok(SessionUser {
            unique_id,
            username: w.username,
            account_type: w.account_type,
            currently_rented: w.currently_rented,
            email: w.email,
            contact_no: w.contact_no,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require(
            !is_blank(&self.email) && !self.password.is_empty(),
            "Please fill in all fields",
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub username: String,
    pub password: String,
    pub account_type: AccountType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_no: Option<String>,
}

impl SignupRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require(
            !is_blank(&self.email) && !is_blank(&self.username) && !self.password.is_empty(),
            "Please fill in all fields",
        )?;
        require(
            self.account_type != AccountType::Admin,
            "Account type must be 'Owner' or 'Tenant'",
        )
    }
}

/// Body of `PUT /update-profile`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    pub unique_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_no: Option<String>,
}

/// Body of `POST /change-password`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordChange {
    pub unique_id: String,
    pub current_password: String,
    pub new_password: String,
}

impl PasswordChange {
    pub const MIN_LEN: usize = 6;

    pub fn validate(&self) -> Result<(), ValidationError> {
        require(
            !self.current_password.is_empty(),
            "Current password is required",
        )?;
        require(
            self.new_password.chars().count() >= Self::MIN_LEN,
            "New password must be at least 6 characters long",
        )
    }
}

/// Query filter for `GET /admin/users`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UserFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_type: Option<AccountType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currently_rented: Option<bool>,
}

/// One row of the admin user listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRow {
    pub unique_id: String,
    pub username: String,
    #[serde(default)]
    pub email: String,
    pub account_type: AccountType,
    #[serde(default)]
    pub currently_rented: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}
