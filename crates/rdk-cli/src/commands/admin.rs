//! `rdk admin ...`

use std::fs;

use anyhow::{bail, Context, Result};

use rdk_api::AdminApi;
use rdk_schemas::{AccountType, UserFilter};

use super::{print_ack, print_json, Ctx};

pub async fn stats(ctx: &Ctx) -> Result<()> {
    ctx.session.require_role(AccountType::Admin)?;
    print_json(&ctx.api.statistics().await?)
}

pub async fn users(ctx: &Ctx, filter: UserFilter) -> Result<()> {
    ctx.session.require_role(AccountType::Admin)?;
    let rows = ctx.api.users(&filter).await?;
    for u in &rows {
        println!(
            "user_id={} username={:?} email={} account_type={} rented={}",
            u.unique_id, u.username, u.email, u.account_type, u.currently_rented
        );
    }
    println!("users={}", rows.len());
    Ok(())
}

pub async fn user(ctx: &Ctx, user_id: &str) -> Result<()> {
    ctx.session.require_role(AccountType::Admin)?;
    print_json(&ctx.api.user_details(user_id).await?)
}

pub async fn cleanup(ctx: &Ctx) -> Result<()> {
    ctx.session.require_role(AccountType::Admin)?;
    let report = ctx.submit(|| ctx.api.cleanup()).await?;
    print_json(&report)
}

/// Print the export, or write it to `out` when given.
pub async fn export(ctx: &Ctx, out: Option<String>) -> Result<()> {
    ctx.session.require_role(AccountType::Admin)?;
    let data = ctx.api.export_data().await?;
    match out {
        Some(path) => {
            let body = serde_json::to_string_pretty(&data)?;
            fs::write(&path, body).with_context(|| format!("write export failed: {path}"))?;
            println!("export_written=true path={path}");
            Ok(())
        }
        None => print_json(&data),
    }
}

pub async fn delete_user(ctx: &Ctx, user_id: &str, yes: bool) -> Result<()> {
    let admin = ctx.session.require_role(AccountType::Admin)?;
    if admin.unique_id == user_id.trim() {
        bail!("REFUSING DELETE: cannot delete the logged-in admin account");
    }
    if !yes {
        bail!("REFUSING DELETE: re-run with `rdk admin delete-user --id {user_id} --yes`");
    }
    let ack = ctx.submit(|| ctx.api.delete_user(user_id)).await?;
    print_ack(&ack, "User deleted");
    Ok(())
}
