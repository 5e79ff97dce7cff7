//! `rdk flats assign` / `rdk flats vacate` against a mock backend.
//!
//! GREEN when:
//! - The OTP is requested once when the dialog opens.
//! - A rejected code prints the server message and the prompt comes back.
//! - The accepted code settles the assign and the flat list is refetched.
//! - `q` closes the dialog without a confirm call.
//! - A tenant outside the availability list is refused before any OTP.

mod common;

use common::Workspace;
use httpmock::prelude::*;
use predicates::prelude::*;
use serde_json::json;

fn mock_owner_board(server: &MockServer, flat_rented: bool) -> (httpmock::Mock<'_>, httpmock::Mock<'_>) {
    let flat = if flat_rented {
        json!({
            "flat_unique_id": "flat-1",
            "title": "Sunny 2BHK",
            "address": "MG Road",
            "rent": 15000,
            "is_rented": true,
            "tenant": {"unique_id": "t1", "username": "ravi"},
        })
    } else {
        json!({
            "flat_unique_id": "flat-1",
            "title": "Sunny 2BHK",
            "address": "MG Road",
            "rent": 15000,
            "is_rented": false,
        })
    };
    let flats = server.mock(move |when, then| {
        when.method(GET).path("/owner-flats/own-1");
        then.status(200).json_body(json!({"flats": [flat]}));
    });
    let tenants = server.mock(|when, then| {
        when.method(GET).path("/available-tenants");
        then.status(200).json_body(json!({
            "available_tenants": [
                {"unique_id": "t1", "username": "ravi", "email": "ravi@example.com"}
            ]
        }));
    });
    (flats, tenants)
}

#[test]
fn wrong_code_then_right_code_assigns() {
    let ws = Workspace::new();
    ws.login_as("own-1", "Owner");
    let server = MockServer::start();
    let (flats, _tenants) = mock_owner_board(&server, false);

    let otp = server.mock(|when, then| {
        when.method(POST)
            .path("/request-rent-otp")
            .json_body(json!({"flat_unique_id": "flat-1", "tenant_unique_id": "t1"}));
        then.status(200).json_body(json!({"message": "OTP sent to tenant"}));
    });
    let rejected = server.mock(|when, then| {
        when.method(POST)
            .path("/rent-flat")
            .json_body_partial(r#"{"otp_code": "000000"}"#);
        then.status(400).json_body(json!({"error": "Invalid or expired OTP"}));
    });
    let accepted = server.mock(|when, then| {
        when.method(POST)
            .path("/rent-flat")
            .json_body_partial(r#"{"otp_code": "123456"}"#);
        then.status(200).json_body(json!({"message": "Flat rented successfully"}));
    });

    ws.rdk(&server.base_url())
        .args(["flats", "assign", "--flat", "flat-1", "--tenant", "t1"])
        .write_stdin("000000\n123456\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("OTP sent to tenant t1"))
        .stdout(predicate::str::contains("OTP rejected: Invalid or expired OTP"))
        .stdout(predicate::str::contains(
            "assigned=true flat_id=flat-1 tenant_id=t1",
        ));

    otp.assert_hits(1);
    rejected.assert_hits(1);
    accepted.assert_hits(1);
    // initial load + refetch after the settlement
    flats.assert_hits(2);
}

#[test]
fn quitting_closes_without_confirm() {
    let ws = Workspace::new();
    ws.login_as("own-1", "Owner");
    let server = MockServer::start();
    let (flats, _tenants) = mock_owner_board(&server, false);
    let otp = server.mock(|when, then| {
        when.method(POST).path("/request-rent-otp");
        then.status(200).json_body(json!({"message": "OTP sent"}));
    });
    let rent = server.mock(|when, then| {
        when.method(POST).path("/rent-flat");
        then.status(200).json_body(json!({}));
    });

    ws.rdk(&server.base_url())
        .args(["flats", "assign", "--flat", "flat-1", "--tenant", "t1"])
        .write_stdin("q\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("closed=true flat_id=flat-1"));

    otp.assert_hits(1);
    rent.assert_hits(0);
    flats.assert_hits(1);
}

#[test]
fn immediate_resend_is_held_by_cooldown() {
    let ws = Workspace::new();
    ws.login_as("own-1", "Owner");
    let server = MockServer::start();
    let _board = mock_owner_board(&server, false);
    let otp = server.mock(|when, then| {
        when.method(POST).path("/request-rent-otp");
        then.status(200).json_body(json!({"message": "OTP sent"}));
    });

    ws.rdk(&server.base_url())
        .args(["flats", "assign", "--flat", "flat-1", "--tenant", "t1"])
        .write_stdin("resend\nq\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Resend available in"));

    otp.assert_hits(1);
}

#[test]
fn unavailable_tenant_is_refused_before_otp() {
    let ws = Workspace::new();
    ws.login_as("own-1", "Owner");
    let server = MockServer::start();
    let _board = mock_owner_board(&server, false);
    let otp = server.mock(|when, then| {
        when.method(POST).path("/request-rent-otp");
        then.status(200).json_body(json!({}));
    });

    ws.rdk(&server.base_url())
        .args(["flats", "assign", "--flat", "flat-1", "--tenant", "t9"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Tenant t9 is not available"));
    otp.assert_hits(0);
}

#[test]
fn vacate_uses_current_occupant() {
    let ws = Workspace::new();
    ws.login_as("own-1", "Owner");
    let server = MockServer::start();
    let _board = mock_owner_board(&server, true);
    let otp = server.mock(|when, then| {
        when.method(POST)
            .path("/request-vacate-otp")
            .json_body(json!({"flat_unique_id": "flat-1", "tenant_unique_id": "t1"}));
        then.status(200).json_body(json!({"message": "OTP sent"}));
    });
    let vacate = server.mock(|when, then| {
        when.method(POST).path("/vacate-flat").json_body(json!({
            "flat_unique_id": "flat-1",
            "tenant_unique_id": "t1",
            "otp_code": "654321",
        }));
        then.status(200).json_body(json!({"message": "Flat vacated"}));
    });

    ws.rdk(&server.base_url())
        .args(["flats", "vacate", "--flat", "flat-1"])
        .write_stdin("654321\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("vacated=true flat_id=flat-1 tenant_id=t1"));

    otp.assert_hits(1);
    vacate.assert_hits(1);
}
