//! `rdk flats ...` and `rdk tenants ...`

use std::io;

use anyhow::{bail, Context, Result};

use rdk_api::FlatsApi;
use rdk_flow::{system_clock_ms, AssignmentDialog, FlatBoard, FlatScope};
use rdk_schemas::{AccountType, Flat, Money, NewFlat, Tenant};

use super::{dialog, or_dash, print_ack, Ctx};

fn print_flat(f: &Flat) {
    println!(
        "flat_id={} title={:?} address={:?} rent={} rented={} tenant={}",
        f.flat_unique_id,
        f.title,
        f.address,
        f.rent,
        f.is_rented,
        or_dash(f.occupant_id()),
    );
}

fn print_tenant(t: &Tenant) {
    println!(
        "tenant_id={} username={:?} email={} rented={} flat={}",
        t.unique_id,
        t.username,
        or_dash(Some(&t.email)),
        t.currently_rented,
        or_dash(t.current_rental.as_ref().map(|r| r.flat_unique_id.as_str())),
    );
}

/// Owners see their own flats unless `all` is set; everyone else sees the
/// public listing.
pub async fn list(ctx: &Ctx, all: bool) -> Result<()> {
    let scope = match ctx.session.current() {
        Some(user) if !all => FlatScope::for_user(user),
        _ => FlatScope::All,
    };
    let mut board = FlatBoard::new(scope);
    board.refresh(&ctx.api).await?;
    for f in board.flats() {
        print_flat(f);
    }
    println!(
        "flats={} vacant={} rented={}",
        board.flats().len(),
        board.vacant_flats().count(),
        board.rented_flats().count()
    );
    Ok(())
}

pub async fn create(ctx: &Ctx, title: String, address: String, rent: Money) -> Result<()> {
    let owner = ctx.session.require_role(AccountType::Owner)?;
    let req = NewFlat {
        owner_unique_id: owner.unique_id.clone(),
        title,
        address,
        rent,
    };
    let update = ctx.submit(|| ctx.api.create_flat(&req)).await?;
    match &update.flat {
        Some(f) => print_flat(f),
        None => println!("{}", update.message.as_deref().unwrap_or("Flat created")),
    }
    Ok(())
}

pub async fn delete(ctx: &Ctx, flat_id: &str) -> Result<()> {
    ctx.session.require_role(AccountType::Owner)?;
    let ack = ctx.submit(|| ctx.api.delete_flat(flat_id)).await?;
    print_ack(&ack, "Flat deleted");
    Ok(())
}

async fn owner_board(ctx: &Ctx) -> Result<FlatBoard> {
    let owner = ctx.session.require_role(AccountType::Owner)?;
    let mut board = FlatBoard::new(FlatScope::Owner(owner.unique_id.clone()));
    board.refresh(&ctx.api).await?;
    Ok(board)
}

fn find_flat(board: &FlatBoard, flat_id: &str) -> Result<Flat> {
    board
        .flat(flat_id)
        .cloned()
        .with_context(|| format!("Flat {flat_id} is not one of your flats"))
}

pub async fn assign(ctx: &Ctx, flat_id: &str, tenant_id: &str) -> Result<()> {
    let mut board = owner_board(ctx).await?;
    let flat = find_flat(&board, flat_id)?;
    if !board
        .available_tenants()
        .iter()
        .any(|t| t.unique_id == tenant_id)
    {
        bail!("Tenant {tenant_id} is not available");
    }

    let mut dlg = AssignmentDialog::open_assign(flat, system_clock_ms, ctx.config.otp_cooldown())?;
    dlg.select_tenant(tenant_id)?;

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    dialog::run(&ctx.api, &mut board, dlg, stdin.lock(), &mut stdout).await?;
    Ok(())
}

pub async fn vacate(ctx: &Ctx, flat_id: &str) -> Result<()> {
    let mut board = owner_board(ctx).await?;
    let flat = find_flat(&board, flat_id)?;
    let dlg = AssignmentDialog::open_vacate(flat, system_clock_ms, ctx.config.otp_cooldown())?;

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    dialog::run(&ctx.api, &mut board, dlg, stdin.lock(), &mut stdout).await?;
    Ok(())
}

pub async fn available_tenants(ctx: &Ctx) -> Result<()> {
    ctx.session.require_role(AccountType::Owner)?;
    let tenants = ctx.api.available_tenants().await?;
    for t in &tenants {
        print_tenant(t);
    }
    println!("tenants={}", tenants.len());
    Ok(())
}

pub async fn all_tenants(ctx: &Ctx) -> Result<()> {
    ctx.session.require_role(AccountType::Owner)?;
    let tenants = ctx.api.all_tenants().await?;
    for t in &tenants {
        print_tenant(t);
    }
    println!("tenants={}", tenants.len());
    Ok(())
}
