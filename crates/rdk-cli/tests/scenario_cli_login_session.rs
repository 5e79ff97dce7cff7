//! `rdk login` / `logout` and the persisted session.
//!
//! GREEN when:
//! - A successful login writes the user and the backend cookie to the
//!   session file, and later commands replay that cookie.
//! - "Account not verified" marks the e-mail as pending verification.
//! - `verify-otp` falls back to the pending e-mail and clears it.
//! - `logout` removes the session file.

mod common;

use common::Workspace;
use httpmock::prelude::*;
use predicates::prelude::*;
use serde_json::json;

#[test]
fn login_stores_user_and_cookie_then_replays_it() {
    let ws = Workspace::new();
    let server = MockServer::start();
    let login = server.mock(|when, then| {
        when.method(POST)
            .path("/login")
            .json_body(json!({"email": "asha@example.com", "password": "hunter22"}));
        then.status(200)
            .header("Set-Cookie", "session=fresh42; Path=/")
            .json_body(json!({
                "message": "Login successful",
                "user": {
                    "user_id": "own-1",
                    "unique_id": "own-1",
                    "username": "asha",
                    "account_type": "Owner",
                    "email": "asha@example.com"
                }
            }));
    });

    ws.rdk(&server.base_url())
        .args(["login", "--email", "asha@example.com"])
        .env("RDK_LOGIN_PASSWORD", "hunter22")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "logged_in=true user_id=own-1 username=\"asha\" account_type=Owner",
        ));
    login.assert_hits(1);

    let session = ws.session_json();
    assert_eq!(session["user"]["unique_id"], "own-1");
    assert_eq!(session["cookie"], "session=fresh42");

    let flats = server.mock(|when, then| {
        when.method(GET)
            .path("/owner-flats/own-1")
            .header("cookie", "session=fresh42");
        then.status(200).json_body(json!({"flats": []}));
    });
    let tenants = server.mock(|when, then| {
        when.method(GET).path("/available-tenants");
        then.status(200).json_body(json!({"available_tenants": []}));
    });
    ws.rdk(&server.base_url())
        .args(["flats", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("flats=0 vacant=0 rented=0"));
    flats.assert_hits(1);
    tenants.assert_hits(1);

    ws.rdk(&server.base_url())
        .arg("logout")
        .assert()
        .success()
        .stdout(predicate::str::contains("logged_out=true"));
    assert!(!ws.session_path().exists());
}

#[test]
fn password_from_stdin() {
    let ws = Workspace::new();
    let server = MockServer::start();
    let login = server.mock(|when, then| {
        when.method(POST)
            .path("/login")
            .json_body(json!({"email": "ravi@example.com", "password": "pa55word"}));
        then.status(200).json_body(json!({
            "unique_id": "t1",
            "username": "ravi",
            "account_type": "Tenant",
            "currently_rented": true
        }));
    });

    ws.rdk(&server.base_url())
        .args(["login", "--email", "ravi@example.com", "--password-stdin"])
        .write_stdin("pa55word\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("account_type=Tenant"));
    login.assert_hits(1);
}

#[test]
fn unverified_login_leaves_verification_pending() {
    let ws = Workspace::new();
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/login");
        then.status(403)
            .json_body(json!({"error": "Account not verified. Please verify your email."}));
    });
    let verify = server.mock(|when, then| {
        when.method(POST)
            .path("/verify-otp")
            .json_body(json!({"email": "new@example.com", "otp_code": "482913"}));
        then.status(200).json_body(json!({"message": "Email verified"}));
    });

    ws.rdk(&server.base_url())
        .args(["login", "--email", "new@example.com"])
        .env("RDK_LOGIN_PASSWORD", "hunter22")
        .assert()
        .failure()
        .stderr(predicate::str::contains("verify-otp"));

    ws.rdk(&server.base_url())
        .arg("whoami")
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "Verification pending for new@example.com",
        ));

    ws.rdk(&server.base_url())
        .args(["verify-otp", "--code", "482913"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Email verified"));
    verify.assert_hits(1);
    assert!(ws.session_json().get("pending_email").is_none());
}

#[test]
fn missing_password_names_the_env_var() {
    let ws = Workspace::new();
    let server = MockServer::start();

    ws.rdk(&server.base_url())
        .args(["login", "--email", "asha@example.com"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("RDK_LOGIN_PASSWORD"));
}

#[test]
fn unreachable_backend_is_reported() {
    let ws = Workspace::new();
    ws.rdk(common::DEAD_BACKEND)
        .args(["login", "--email", "asha@example.com"])
        .env("RDK_LOGIN_PASSWORD", "hunter22")
        .assert()
        .failure()
        .stderr(predicate::str::contains("transport error"));
}
