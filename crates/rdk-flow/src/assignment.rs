//! OTP-gated assign / vacate dialog.
//!
//! # State diagram
//!
//! ```text
//!            request_otp ok                  confirm
//!   Idle ───────────────────► OtpRequested ─────────► Confirming
//!    ▲  ▲                      │   ▲   │                 │     │
//!    │  │ request_otp failed   │   │   │ resend (after   │ ok  │ rejected
//!    │  └──── (stays Idle)     │   │   │ cooldown)       ▼     │
//!    │                         │   └───┘          Settled(Success)
//!    │   tenant changed        │                                │
//!    └─────────────────────────┘   ◄── Settled(Failed), code cleared
//! ```
//!
//! One dialog owns one [`AssignmentRequest`]. Closing the dialog drops it;
//! the server-side OTP simply expires. A freshly opened dialog is always
//! `Idle`.
//!
//! Sending the OTP runs under a [`RequestGuard`] (lock plus cooldown).
//! Confirming needs `&mut self`, so at most one confirm per dialog is ever
//! outstanding. Neither path panics or leaves a lock held.

use std::fmt;
use std::time::Duration;

use tracing::{info, warn};

use rdk_api::{ErrorKind, FlatsApi};
use rdk_schemas::{AssignmentRequest, Flat, OtpPurpose, RentFlatRequest, VacateFlatRequest};

use crate::guard::{GuardOutcome, RequestGuard};

// ---------------------------------------------------------------------------
// State / events / errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settlement {
    Success,
    Failed { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogState {
    Idle,
    OtpRequested,
    Confirming,
    Settled(Settlement),
}

impl DialogState {
    pub fn name(&self) -> &'static str {
        match self {
            DialogState::Idle => "idle",
            DialogState::OtpRequested => "otp_requested",
            DialogState::Confirming => "confirming",
            DialogState::Settled(Settlement::Success) => "settled_success",
            DialogState::Settled(Settlement::Failed { .. }) => "settled_failed",
        }
    }
}

/// Emitted by every dialog operation so the caller can render feedback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogEvent {
    TenantSelected {
        tenant_id: String,
    },
    /// The tenant changed after an OTP was issued; back to `Idle`.
    Reset {
        tenant_id: String,
    },
    OtpSent {
        purpose: OtpPurpose,
        flat_id: String,
        tenant_id: String,
    },
    OtpRequestFailed {
        message: String,
    },
    /// A send or confirm is already outstanding; nothing was sent.
    Busy,
    /// The OTP was sent recently; nothing was sent.
    CoolingDown {
        remaining_ms: i64,
    },
    Confirmed {
        purpose: OtpPurpose,
        flat_id: String,
        tenant_id: String,
    },
    /// The server refused the confirmation (wrong code, or the flat changed
    /// under another session). The dialog is back in `OtpRequested`.
    ConfirmFailed {
        message: String,
        kind: ErrorKind,
    },
    Closed {
        flat_id: String,
    },
}

impl DialogEvent {
    /// Flat and tenant lists are stale after this event.
    pub fn requires_refresh(&self) -> bool {
        matches!(self, DialogEvent::Confirmed { .. })
    }
}

/// Dialog operations that were refused locally. No request was sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowError {
    FlatAlreadyRented { flat_id: String },
    NoKnownOccupant { flat_id: String },
    /// Tenant selection only applies to an assign dialog.
    NotAnAssignDialog,
    /// `confirm` before any OTP was sent.
    OtpNotRequested,
    IllegalTransition {
        from: &'static str,
        action: &'static str,
    },
    Validation(String),
}

impl fmt::Display for FlowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlowError::FlatAlreadyRented { flat_id } => {
                write!(f, "Flat {flat_id} is already rented")
            }
            FlowError::NoKnownOccupant { flat_id } => {
                write!(f, "Flat {flat_id} has no known occupant to vacate")
            }
            FlowError::NotAnAssignDialog => write!(f, "Tenant can only be chosen when assigning"),
            FlowError::OtpNotRequested => write!(f, "Request an OTP first"),
            FlowError::IllegalTransition { from, action } => {
                write!(f, "illegal dialog transition: {action} in state {from}")
            }
            FlowError::Validation(m) => write!(f, "{m}"),
        }
    }
}

impl std::error::Error for FlowError {}

// ---------------------------------------------------------------------------
// AssignmentDialog
// ---------------------------------------------------------------------------

pub struct AssignmentDialog<C>
where
    C: Fn() -> i64,
{
    purpose: OtpPurpose,
    flat: Flat,
    request: Option<AssignmentRequest>,
    state: DialogState,
    last_settlement: Option<Settlement>,
    send_guard: RequestGuard<C>,
}

impl<C: Fn() -> i64> AssignmentDialog<C> {
    /// Open an assign dialog for a vacant flat. Pick the tenant with
    /// [`select_tenant`](Self::select_tenant).
    pub fn open_assign(flat: Flat, clock: C, cooldown: Duration) -> Result<Self, FlowError> {
        if flat.is_rented {
            return Err(FlowError::FlatAlreadyRented {
                flat_id: flat.flat_unique_id,
            });
        }
        info!(flat_id = %flat.flat_unique_id, "assign dialog opened");
        Ok(Self::new(OtpPurpose::Assign, flat, None, clock, cooldown))
    }

    /// Open a vacate dialog. The tenant is the flat's current occupant.
    pub fn open_vacate(flat: Flat, clock: C, cooldown: Duration) -> Result<Self, FlowError> {
        let Some(occupant) = flat.occupant_id().map(str::to_string) else {
            return Err(FlowError::NoKnownOccupant {
                flat_id: flat.flat_unique_id,
            });
        };
        let request = AssignmentRequest {
            flat_id: flat.flat_unique_id.clone(),
            tenant_id: occupant,
            otp_code: None,
        };
        info!(flat_id = %flat.flat_unique_id, "vacate dialog opened");
        Ok(Self::new(
            OtpPurpose::Vacate,
            flat,
            Some(request),
            clock,
            cooldown,
        ))
    }

    fn new(
        purpose: OtpPurpose,
        flat: Flat,
        request: Option<AssignmentRequest>,
        clock: C,
        cooldown: Duration,
    ) -> Self {
        Self {
            purpose,
            flat,
            request,
            state: DialogState::Idle,
            last_settlement: None,
            send_guard: RequestGuard::new(cooldown, clock),
        }
    }

    pub fn purpose(&self) -> OtpPurpose {
        self.purpose
    }

    pub fn flat(&self) -> &Flat {
        &self.flat
    }

    pub fn state(&self) -> &DialogState {
        &self.state
    }

    pub fn request(&self) -> Option<&AssignmentRequest> {
        self.request.as_ref()
    }

    pub fn tenant_id(&self) -> Option<&str> {
        self.request.as_ref().map(|r| r.tenant_id.as_str())
    }

    /// Most recent confirm result, kept after a rejection returns the dialog
    /// to `OtpRequested`.
    pub fn last_settlement(&self) -> Option<&Settlement> {
        self.last_settlement.as_ref()
    }

    pub fn resend_available_in_ms(&self) -> i64 {
        self.send_guard.cooldown().remaining_ms()
    }

    fn illegal(&self, action: &'static str) -> FlowError {
        FlowError::IllegalTransition {
            from: self.state.name(),
            action,
        }
    }

    fn is_settled_success(&self) -> bool {
        self.state == DialogState::Settled(Settlement::Success)
    }

    /// Choose the tenant to assign. Changing the tenant after an OTP was
    /// issued resets the dialog to `Idle`.
    pub fn select_tenant(&mut self, tenant_id: &str) -> Result<DialogEvent, FlowError> {
        if self.purpose != OtpPurpose::Assign {
            return Err(FlowError::NotAnAssignDialog);
        }
        if matches!(self.state, DialogState::Confirming) || self.is_settled_success() {
            return Err(self.illegal("select_tenant"));
        }
        let tenant_id = tenant_id.trim();
        if tenant_id.is_empty() {
            return Err(FlowError::Validation("Select a tenant first".to_string()));
        }
        if self.tenant_id() == Some(tenant_id) {
            return Ok(DialogEvent::TenantSelected {
                tenant_id: tenant_id.to_string(),
            });
        }

        self.request = Some(AssignmentRequest {
            flat_id: self.flat.flat_unique_id.clone(),
            tenant_id: tenant_id.to_string(),
            otp_code: None,
        });

        if self.state == DialogState::Idle {
            return Ok(DialogEvent::TenantSelected {
                tenant_id: tenant_id.to_string(),
            });
        }
        self.state = DialogState::Idle;
        info!(flat_id = %self.flat.flat_unique_id, tenant_id, "tenant changed after otp; dialog reset");
        Ok(DialogEvent::Reset {
            tenant_id: tenant_id.to_string(),
        })
    }

    /// Send (or resend, once the cooldown has elapsed) the OTP to the tenant.
    pub async fn request_otp<A>(&mut self, api: &A) -> Result<DialogEvent, FlowError>
    where
        A: FlatsApi + ?Sized,
    {
        if !matches!(self.state, DialogState::Idle | DialogState::OtpRequested) {
            return Err(self.illegal("request_otp"));
        }
        let Some(tenant_id) = self.tenant_id().map(str::to_string) else {
            return Err(FlowError::Validation(match self.purpose {
                OtpPurpose::Assign => "Select a tenant first".to_string(),
                OtpPurpose::Vacate => "Flat has no known occupant to vacate".to_string(),
            }));
        };
        let flat_id = self.flat.flat_unique_id.clone();
        let purpose = self.purpose;

        let outcome = self
            .send_guard
            .run_dispatch(|| api.request_otp(&flat_id, &tenant_id, purpose))
            .await;

        Ok(match outcome {
            GuardOutcome::Completed(_) => {
                self.state = DialogState::OtpRequested;
                if let Some(req) = self.request.as_mut() {
                    req.otp_code = None;
                }
                info!(%purpose, flat_id, tenant_id, "otp sent");
                DialogEvent::OtpSent {
                    purpose,
                    flat_id,
                    tenant_id,
                }
            }
            GuardOutcome::Failed(e) => {
                warn!(%purpose, flat_id, error = %e, "otp request failed");
                DialogEvent::OtpRequestFailed {
                    message: e.user_message().to_string(),
                }
            }
            GuardOutcome::Busy => DialogEvent::Busy,
            GuardOutcome::CoolingDown { remaining_ms } => {
                DialogEvent::CoolingDown { remaining_ms }
            }
        })
    }

    /// Submit the code the tenant received.
    ///
    /// Refused locally in `Idle` and for an empty code. A rejection records
    /// `Settled(Failed)` and returns the dialog to `OtpRequested` with the
    /// code cleared.
    pub async fn confirm<A>(&mut self, api: &A, code: &str) -> Result<DialogEvent, FlowError>
    where
        A: FlatsApi + ?Sized,
    {
        match self.state {
            DialogState::OtpRequested => {}
            DialogState::Idle => return Err(FlowError::OtpNotRequested),
            _ => return Err(self.illegal("confirm")),
        }
        let code = code.trim();
        if code.is_empty() {
            return Err(FlowError::Validation("Enter OTP".to_string()));
        }
        let Some(req) = self.request.as_mut() else {
            return Err(FlowError::OtpNotRequested);
        };
        req.otp_code = Some(code.to_string());
        let flat_id = req.flat_id.clone();
        let tenant_id = req.tenant_id.clone();
        let purpose = self.purpose;

        let rent = RentFlatRequest {
            flat_unique_id: flat_id.clone(),
            tenant_unique_id: tenant_id.clone(),
            otp_code: code.to_string(),
            deposit_amount: None,
            rented_date: None,
        };
        let vacate = VacateFlatRequest {
            flat_unique_id: flat_id.clone(),
            tenant_unique_id: tenant_id.clone(),
            otp_code: code.to_string(),
        };

        self.state = DialogState::Confirming;
        let outcome = match purpose {
            OtpPurpose::Assign => api.rent_flat(&rent).await,
            OtpPurpose::Vacate => api.vacate_flat(&vacate).await,
        };

        Ok(match outcome {
            Ok(_) => {
                self.state = DialogState::Settled(Settlement::Success);
                self.last_settlement = Some(Settlement::Success);
                self.request = None;
                info!(%purpose, flat_id, tenant_id, "otp confirmed");
                DialogEvent::Confirmed {
                    purpose,
                    flat_id,
                    tenant_id,
                }
            }
            Err(e) => {
                let message = e.user_message().to_string();
                let kind = e.kind();
                warn!(%purpose, flat_id, ?kind, error = %e, "otp confirmation rejected");
                self.last_settlement = Some(Settlement::Failed {
                    message: message.clone(),
                });
                self.clear_code_and_rearm();
                DialogEvent::ConfirmFailed { message, kind }
            }
        })
    }

    fn clear_code_and_rearm(&mut self) {
        if let Some(req) = self.request.as_mut() {
            req.otp_code = None;
        }
        self.state = DialogState::OtpRequested;
    }

    /// Close the dialog, discarding its request. No server call is made.
    pub fn close(self) -> DialogEvent {
        info!(flat_id = %self.flat.flat_unique_id, state = self.state.name(), "dialog closed");
        DialogEvent::Closed {
            flat_id: self.flat.flat_unique_id,
        }
    }
}

impl<C: Fn() -> i64> fmt::Debug for AssignmentDialog<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssignmentDialog")
            .field("purpose", &self.purpose)
            .field("flat_id", &self.flat.flat_unique_id)
            .field("tenant_id", &self.tenant_id())
            .field("state", &self.state)
            .finish()
    }
}
