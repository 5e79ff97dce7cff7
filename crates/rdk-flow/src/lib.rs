//! rdk-flow
//!
//! Client-side workflows on top of the data access facade:
//!
//! - [`guard`]: in-flight lock and post-dispatch cooldown,
//! - [`assignment`]: the OTP-gated assign / vacate dialog,
//! - [`board`]: flat and tenant lists refetched after every settlement,
//! - [`session`]: the logged-in user context and its persistence.
//!
//! Workflows depend on the narrowest facade trait they drive
//! ([`rdk_api::FlatsApi`] for the dialog and board), never on the HTTP client.

pub mod assignment;
pub mod board;
pub mod guard;
pub mod session;

pub use assignment::{AssignmentDialog, DialogEvent, DialogState, FlowError, Settlement};
pub use board::{FlatBoard, FlatScope};
pub use guard::{
    system_clock_ms, Cooldown, GuardOutcome, InFlightLock, InFlightPermit, RequestGuard,
    DEFAULT_COOLDOWN,
};
pub use session::{
    FileSessionStore, MemorySessionStore, PersistedSession, SessionContext, SessionError,
    SessionStore,
};
