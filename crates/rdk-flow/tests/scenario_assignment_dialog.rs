//! Assign / vacate dialog against the in-memory backend.
//!
//! GREEN when:
//! - `confirm` in `Idle` is refused without a network call.
//! - Two sends within 5 s make exactly one OTP request.
//! - A wrong code surfaces the server message and re-arms the dialog with
//!   the code cleared.
//! - A confirmed assign shows the flat rented and linked after refetch; a
//!   confirmed vacate shows it vacant and unlinked.
//! - Closing after an OTP and reopening starts at `Idle`.
//! - When two dialogs race on one flat, the later confirm surfaces the
//!   server's conflict, re-arms, and the first assignment stands.

mod common;

use std::time::Duration;

use common::{FakeBackend, TestClock, GOOD_CODE, OWNER_ID};
use rdk_api::{ApiError, ErrorKind};
use rdk_flow::{
    AssignmentDialog, DialogEvent, DialogState, FlatBoard, FlatScope, FlowError, Settlement,
};
use rdk_schemas::OtpPurpose;

const COOLDOWN: Duration = Duration::from_secs(30);

async fn owner_board(api: &FakeBackend) -> FlatBoard {
    let mut board = FlatBoard::new(FlatScope::Owner(OWNER_ID.to_string()));
    board.refresh(api).await.unwrap();
    board
}

#[tokio::test]
async fn confirm_in_idle_is_refused_locally() {
    let api = FakeBackend::seeded();
    let board = owner_board(&api).await;
    let clock = TestClock::at(0);

    let flat = board.flat("flat-1").unwrap().clone();
    let mut dialog = AssignmentDialog::open_assign(flat, clock.reader(), COOLDOWN).unwrap();
    dialog.select_tenant("t1").unwrap();

    let err = dialog.confirm(&api, GOOD_CODE).await.unwrap_err();
    assert_eq!(err, FlowError::OtpNotRequested);
    assert_eq!(dialog.state(), &DialogState::Idle);
    assert_eq!(api.calls_to("rent_flat"), 0);
    assert_eq!(api.calls_to("request_otp"), 0);
}

#[tokio::test]
async fn rapid_second_send_makes_no_call() {
    let api = FakeBackend::seeded();
    let clock = TestClock::at(1_000);
    let mut dialog =
        AssignmentDialog::open_assign(common::flat("flat-1", None), clock.reader(), COOLDOWN)
            .unwrap();
    dialog.select_tenant("t1").unwrap();

    let first = dialog.request_otp(&api).await.unwrap();
    assert!(matches!(first, DialogEvent::OtpSent { .. }));

    clock.advance_ms(4_000);
    let second = dialog.request_otp(&api).await.unwrap();
    assert_eq!(second, DialogEvent::CoolingDown { remaining_ms: 26_000 });
    assert_eq!(api.calls_to("request_otp"), 1);
    assert_eq!(dialog.state(), &DialogState::OtpRequested);

    clock.advance_ms(26_000);
    let resend = dialog.request_otp(&api).await.unwrap();
    assert!(matches!(resend, DialogEvent::OtpSent { .. }));
    assert_eq!(api.calls_to("request_otp"), 2);
}

#[tokio::test]
async fn wrong_code_rearms_dialog_then_assign_succeeds() {
    let api = FakeBackend::seeded();
    let mut board = owner_board(&api).await;
    let clock = TestClock::at(0);

    let flat = board.flat("flat-1").unwrap().clone();
    let mut dialog = AssignmentDialog::open_assign(flat, clock.reader(), COOLDOWN).unwrap();
    dialog.select_tenant("t1").unwrap();
    dialog.request_otp(&api).await.unwrap();

    let rejected = dialog.confirm(&api, "000000").await.unwrap();
    assert_eq!(
        rejected,
        DialogEvent::ConfirmFailed {
            message: "Invalid or expired OTP".to_string(),
            kind: ErrorKind::OtpRejected,
        }
    );
    assert_eq!(dialog.state(), &DialogState::OtpRequested);
    assert_eq!(dialog.request().unwrap().otp_code, None);
    assert_eq!(
        dialog.last_settlement(),
        Some(&Settlement::Failed {
            message: "Invalid or expired OTP".to_string()
        })
    );
    assert!(!board.apply_settlement(&api, &rejected).await.unwrap());

    let confirmed = dialog.confirm(&api, GOOD_CODE).await.unwrap();
    assert_eq!(
        confirmed,
        DialogEvent::Confirmed {
            purpose: OtpPurpose::Assign,
            flat_id: "flat-1".to_string(),
            tenant_id: "t1".to_string(),
        }
    );
    assert_eq!(dialog.state(), &DialogState::Settled(Settlement::Success));
    assert!(dialog.request().is_none());

    assert!(board.apply_settlement(&api, &confirmed).await.unwrap());
    let f = board.flat("flat-1").unwrap();
    assert!(f.is_rented);
    assert!(f.is_linked_to("t1"));
    assert!(board.available_tenants().iter().all(|t| t.unique_id != "t1"));
}

#[tokio::test]
async fn vacate_unlinks_tenant_after_refetch() {
    let api = FakeBackend::seeded();
    let mut board = owner_board(&api).await;
    let clock = TestClock::at(0);

    let flat = board.flat("flat-2").unwrap().clone();
    let mut dialog = AssignmentDialog::open_vacate(flat, clock.reader(), COOLDOWN).unwrap();
    assert_eq!(dialog.tenant_id(), Some("t2"));

    let sent = dialog.request_otp(&api).await.unwrap();
    assert!(matches!(
        sent,
        DialogEvent::OtpSent {
            purpose: OtpPurpose::Vacate,
            ..
        }
    ));
    let done = dialog.confirm(&api, GOOD_CODE).await.unwrap();
    board.apply_settlement(&api, &done).await.unwrap();

    let f = board.flat("flat-2").unwrap();
    assert!(!f.is_rented);
    assert_eq!(f.occupant_id(), None);
    assert!(board.available_tenants().iter().any(|t| t.unique_id == "t2"));
}

#[tokio::test]
async fn closing_after_otp_then_reopening_starts_idle() {
    let api = FakeBackend::seeded();
    let clock = TestClock::at(0);
    let flat = common::flat("flat-1", None);

    let mut dialog =
        AssignmentDialog::open_assign(flat.clone(), clock.reader(), COOLDOWN).unwrap();
    dialog.select_tenant("t1").unwrap();
    dialog.request_otp(&api).await.unwrap();
    assert_eq!(dialog.state(), &DialogState::OtpRequested);

    let closed = dialog.close();
    assert_eq!(
        closed,
        DialogEvent::Closed {
            flat_id: "flat-1".to_string()
        }
    );

    let reopened = AssignmentDialog::open_assign(flat, clock.reader(), COOLDOWN).unwrap();
    assert_eq!(reopened.state(), &DialogState::Idle);
    assert!(reopened.request().is_none());
    // close makes no server call
    assert_eq!(api.calls(), vec!["request_otp:assign:flat-1:t1".to_string()]);
}

#[tokio::test]
async fn changing_tenant_after_otp_resets_to_idle() {
    let api = FakeBackend::seeded();
    let clock = TestClock::at(0);
    let mut dialog =
        AssignmentDialog::open_assign(common::flat("flat-1", None), clock.reader(), COOLDOWN)
            .unwrap();
    dialog.select_tenant("t1").unwrap();
    dialog.request_otp(&api).await.unwrap();

    let ev = dialog.select_tenant("t3").unwrap();
    assert_eq!(
        ev,
        DialogEvent::Reset {
            tenant_id: "t3".to_string()
        }
    );
    assert_eq!(dialog.state(), &DialogState::Idle);
    assert_eq!(
        dialog.confirm(&api, GOOD_CODE).await.unwrap_err(),
        FlowError::OtpNotRequested
    );
}

#[tokio::test]
async fn failed_send_stays_idle_without_cooldown() {
    let api = FakeBackend::seeded();
    let clock = TestClock::at(0);
    let mut dialog =
        AssignmentDialog::open_assign(common::flat("flat-1", None), clock.reader(), COOLDOWN)
            .unwrap();
    dialog.select_tenant("t1").unwrap();

    api.fail_next_otp(ApiError::server(500, "Mail server unavailable"));
    let ev = dialog.request_otp(&api).await.unwrap();
    assert_eq!(
        ev,
        DialogEvent::OtpRequestFailed {
            message: "Mail server unavailable".to_string()
        }
    );
    assert_eq!(dialog.state(), &DialogState::Idle);
    assert_eq!(dialog.resend_available_in_ms(), 0);

    let retry = dialog.request_otp(&api).await.unwrap();
    assert!(matches!(retry, DialogEvent::OtpSent { .. }));
}

#[tokio::test]
async fn send_without_tenant_is_refused_locally() {
    let api = FakeBackend::seeded();
    let mut dialog = AssignmentDialog::open_assign(
        common::flat("flat-1", None),
        TestClock::at(0).reader(),
        COOLDOWN,
    )
    .unwrap();

    let err = dialog.request_otp(&api).await.unwrap_err();
    assert_eq!(err, FlowError::Validation("Select a tenant first".to_string()));
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn empty_code_is_refused_locally() {
    let api = FakeBackend::seeded();
    let mut dialog = AssignmentDialog::open_vacate(
        common::flat("flat-2", Some("t2")),
        TestClock::at(0).reader(),
        COOLDOWN,
    )
    .unwrap();
    dialog.request_otp(&api).await.unwrap();

    let err = dialog.confirm(&api, "   ").await.unwrap_err();
    assert_eq!(err, FlowError::Validation("Enter OTP".to_string()));
    assert_eq!(dialog.state(), &DialogState::OtpRequested);
    assert_eq!(api.calls_to("vacate_flat"), 0);
}

#[tokio::test]
async fn settled_dialog_refuses_further_sends() {
    let api = FakeBackend::seeded();
    let clock = TestClock::at(0);
    let mut dialog = AssignmentDialog::open_vacate(
        common::flat("flat-2", Some("t2")),
        clock.reader(),
        COOLDOWN,
    )
    .unwrap();
    dialog.request_otp(&api).await.unwrap();
    dialog.confirm(&api, GOOD_CODE).await.unwrap();

    clock.advance_ms(60_000);
    let err = dialog.request_otp(&api).await.unwrap_err();
    assert!(matches!(
        err,
        FlowError::IllegalTransition {
            from: "settled_success",
            action: "request_otp"
        }
    ));
}

#[tokio::test]
async fn losing_concurrent_assign_reports_conflict() {
    let api = FakeBackend::seeded();
    api.add_tenant("t3");
    let mut board = owner_board(&api).await;
    let clock = TestClock::at(0);
    let flat = board.flat("flat-1").unwrap().clone();

    let mut first =
        AssignmentDialog::open_assign(flat.clone(), clock.reader(), COOLDOWN).unwrap();
    first.select_tenant("t1").unwrap();
    first.request_otp(&api).await.unwrap();

    let mut second = AssignmentDialog::open_assign(flat, clock.reader(), COOLDOWN).unwrap();
    second.select_tenant("t3").unwrap();
    second.request_otp(&api).await.unwrap();

    let won = second.confirm(&api, GOOD_CODE).await.unwrap();
    assert!(matches!(won, DialogEvent::Confirmed { .. }));

    let lost = first.confirm(&api, GOOD_CODE).await.unwrap();
    assert_eq!(
        lost,
        DialogEvent::ConfirmFailed {
            message: "Flat is already rented".to_string(),
            kind: ErrorKind::StateConflict,
        }
    );
    assert_eq!(first.state(), &DialogState::OtpRequested);
    assert_eq!(first.request().unwrap().otp_code, None);
    assert_eq!(api.calls_to("rent_flat"), 2);

    board.apply_settlement(&api, &won).await.unwrap();
    let f = board.flat("flat-1").unwrap();
    assert!(f.is_linked_to("t3"));
    assert!(!f.is_linked_to("t1"));
}

#[tokio::test]
async fn vacate_after_flat_changed_hands_reports_conflict() {
    let api = FakeBackend::seeded();
    let clock = TestClock::at(0);
    let flat = common::flat("flat-2", Some("t2"));

    let mut first =
        AssignmentDialog::open_vacate(flat.clone(), clock.reader(), COOLDOWN).unwrap();
    first.request_otp(&api).await.unwrap();
    let mut second = AssignmentDialog::open_vacate(flat, clock.reader(), COOLDOWN).unwrap();
    second.request_otp(&api).await.unwrap();

    second.confirm(&api, GOOD_CODE).await.unwrap();
    let lost = first.confirm(&api, GOOD_CODE).await.unwrap();
    assert!(matches!(
        lost,
        DialogEvent::ConfirmFailed {
            kind: ErrorKind::StateConflict,
            ..
        }
    ));
    assert_eq!(first.state(), &DialogState::OtpRequested);
}
