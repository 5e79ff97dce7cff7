//! Login, sign-up, verification and profile commands.

use std::io;

use anyhow::{bail, Context, Result};

use rdk_api::{AccountsApi, ApiError, ErrorKind};
use rdk_config::resolve_credentials;
use rdk_schemas::{AccountType, LoginRequest, PasswordChange, ProfileUpdate, SignupRequest};

use super::{or_dash, print_ack, print_json, read_line, Ctx};

/// The password comes from stdin when asked, else from the configured env var.
fn password(ctx: &Ctx, from_stdin: bool) -> Result<String> {
    if from_stdin {
        return read_line(io::stdin().lock());
    }
    let creds = resolve_credentials(&ctx.loaded.config_json, |k| std::env::var(k).ok());
    creds
        .password
        .with_context(|| format!("no password: pass --password-stdin or set {}", creds.password_var))
}

pub async fn login(ctx: &mut Ctx, email: Option<String>, password_stdin: bool) -> Result<()> {
    let email = match email {
        Some(e) => e,
        None => resolve_credentials(&ctx.loaded.config_json, |k| std::env::var(k).ok())
            .email
            .context("no email: pass --email or set the configured email env var")?,
    };
    let req = LoginRequest {
        email: email.trim().to_string(),
        password: password(ctx, password_stdin)?,
    };

    let outcome = ctx.submit(|| ctx.api.login(&req)).await;
    let user = match outcome {
        Ok(user) => user,
        Err(err) => {
            let unverified = err
                .downcast_ref::<ApiError>()
                .is_some_and(|e| e.kind() == ErrorKind::NotVerified);
            if unverified {
                ctx.session.require_verification(&req.email)?;
                bail!(
                    "{err}. Run `rdk verify-otp --code <code>` with the code sent to {}",
                    req.email
                );
            }
            return Err(err);
        }
    };

    let cookie = ctx.api.session_cookie();
    println!(
        "logged_in=true user_id={} username={:?} account_type={}",
        user.unique_id, user.username, user.account_type
    );
    ctx.session.login(user, cookie)?;
    Ok(())
}

pub fn logout(ctx: &mut Ctx) -> Result<()> {
    ctx.session.logout()?;
    println!("logged_out=true");
    Ok(())
}

pub fn whoami(ctx: &Ctx) -> Result<()> {
    if ctx.session.current().is_none() {
        if let Some(email) = ctx.session.pending_email() {
            bail!("Not logged in. Verification pending for {email}");
        }
    }
    let user = ctx.session.require_user()?;
    println!("user_id={}", user.unique_id);
    println!("username={}", user.username);
    println!("account_type={}", user.account_type);
    println!("email={}", or_dash(user.email.as_deref()));
    if user.account_type == AccountType::Tenant {
        println!("currently_rented={}", user.currently_rented);
    }
    Ok(())
}

pub async fn signup(
    ctx: &mut Ctx,
    mut req: SignupRequest,
    password_stdin: bool,
) -> Result<()> {
    req.password = password(ctx, password_stdin)?;
    let ack = ctx.submit(|| ctx.api.signup(&req)).await?;
    ctx.session.require_verification(&req.email)?;
    print_ack(&ack, "Account created");
    println!("verification_pending={}", req.email.trim());
    Ok(())
}

fn verification_email(ctx: &Ctx, email: Option<String>) -> Result<String> {
    email
        .or_else(|| ctx.session.pending_email().map(str::to_string))
        .context("no e-mail awaiting verification: pass --email")
}

pub async fn verify_otp(ctx: &mut Ctx, email: Option<String>, code: &str) -> Result<()> {
    let email = verification_email(ctx, email)?;
    let ack = ctx.submit(|| ctx.api.verify_otp(&email, code)).await?;
    ctx.session.clear_pending_verification()?;
    print_ack(&ack, "Account verified. You can now log in");
    Ok(())
}

pub async fn resend_otp(ctx: &Ctx, email: Option<String>) -> Result<()> {
    let email = verification_email(ctx, email)?;
    let ack = ctx.submit(|| ctx.api.resend_otp(&email)).await?;
    print_ack(&ack, "A new code has been sent");
    Ok(())
}

pub async fn show_profile(ctx: &Ctx) -> Result<()> {
    let user = ctx.session.require_user()?;
    let profile = ctx.api.profile(&user.unique_id).await?;
    print_json(&profile)
}

pub async fn update_profile(
    ctx: &mut Ctx,
    username: Option<String>,
    contact_no: Option<String>,
) -> Result<()> {
    let mut user = ctx.session.require_user()?.clone();
    let req = ProfileUpdate {
        unique_id: user.unique_id.clone(),
        username,
        contact_no,
    };
    let ack = ctx.submit(|| ctx.api.update_profile(&req)).await?;
    if let Some(name) = req.username {
        user.username = name;
    }
    if let Some(contact) = req.contact_no {
        user.contact_no = Some(contact);
    }
    ctx.session.update(user)?;
    print_ack(&ack, "Profile updated");
    Ok(())
}

/// Reads the current and the new password from two stdin lines.
pub async fn change_password(ctx: &Ctx) -> Result<()> {
    let user = ctx.session.require_user()?;
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let req = PasswordChange {
        unique_id: user.unique_id.clone(),
        current_password: read_line(&mut input)?,
        new_password: read_line(&mut input)?,
    };
    let ack = ctx.submit(|| ctx.api.change_password(&req)).await?;
    print_ack(&ack, "Password changed");
    Ok(())
}
