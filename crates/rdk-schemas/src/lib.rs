//! rdk-schemas
//!
//! Wire and domain types shared by the facade, the workflows and the CLI.
//! The backend owns every one of these records; nothing here mutates state.
//! Field names follow the backend JSON exactly.

// ---------------------------------------------------------------------------
// Closed string enums
// ---------------------------------------------------------------------------

/// Declares an enum whose variants map 1:1 onto the backend's display
/// strings. Serde uses the exact string; `FromStr` is case-insensitive and
/// also accepts the string with spaces replaced by `-` or `_` (CLI input).
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $variant:ident => $wire:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        pub enum $name {
            $( #[serde(rename = $wire)] $variant ),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[ $( $name::$variant ),+ ];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $( $name::$variant => $wire ),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim().to_ascii_lowercase().replace(['-', '_'], " ");
                $name::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str().to_ascii_lowercase() == wanted)
                    .ok_or_else(|| {
                        let allowed: Vec<&str> = $name::ALL.iter().map(|v| v.as_str()).collect();
                        $crate::ValidationError::new(format!(
                            "invalid {} '{}'. expected one of: {}",
                            stringify!($name),
                            s,
                            allowed.join(" | ")
                        ))
                    })
            }
        }
    };
}

mod accounts;
mod financials;
mod flats;
mod money;
mod service;

pub use accounts::{
    AccountType, LoginRequest, PasswordChange, ProfileUpdate, SessionUser, SignupRequest,
    UserFilter, UserRow,
};
pub use financials::{
    Expense, ExpenseHistoryFilter, ExpenseType, NewExpense, OwnerRecordRent, PaymentFlatRef,
    PaymentHistoryFilter, PaymentMethod, RecordRentPayment, RentPayment, ServiceExpenseUpdate,
    SummaryPeriod,
};
pub use flats::{
    AssignmentRequest, Flat, NewFlat, OtpPurpose, OtpRequest, PersonRef, RentFlatRequest,
    RentalRef, Tenant, VacateFlatRequest,
};
pub use money::{Money, MoneyError, CENTS_PER_UNIT};
pub use service::{
    NewServiceRequest, Priority, ServiceCategory, ServiceRating, ServiceRequest, ServiceStatus,
    ServiceRequestUpdate,
};

// ---------------------------------------------------------------------------
// ValidationError
// ---------------------------------------------------------------------------

/// A client-side validation failure. Caught before any network call and
/// shown to the user as-is; never sent to the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError(pub String);

impl ValidationError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ValidationError {}

pub(crate) fn require(cond: bool, msg: &str) -> Result<(), ValidationError> {
    if cond {
        Ok(())
    } else {
        Err(ValidationError::new(msg))
    }
}

pub(crate) fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}
