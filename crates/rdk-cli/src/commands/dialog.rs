//! Interactive assign / vacate loop.
//!
//! Sends the OTP as soon as the dialog opens, then reads one line at a time:
//! a code confirms, `resend` asks for a new code (subject to the cooldown),
//! `q` or end of input closes the dialog without touching the server.

use std::io::{BufRead, Write};

use anyhow::{bail, Result};
use tracing::warn;

use rdk_api::{ErrorKind, FlatsApi};
use rdk_flow::{AssignmentDialog, DialogEvent, FlatBoard, FlowError};
use rdk_schemas::OtpPurpose;

use super::secs_ceil;

#[derive(Debug, PartialEq, Eq)]
enum Input {
    Code(String),
    Resend,
    Close,
}

fn parse_input(line: &str) -> Input {
    match line.trim() {
        "q" | "quit" | "close" => Input::Close,
        "resend" | "r" => Input::Resend,
        code => Input::Code(code.to_string()),
    }
}

/// Drive `dialog` to a settlement or a close. A confirmed mutation refetches
/// `board` before returning; a failed refetch is logged and the confirmation
/// still counts.
pub async fn run<A, C, R, W>(
    api: &A,
    board: &mut FlatBoard,
    mut dialog: AssignmentDialog<C>,
    mut input: R,
    out: &mut W,
) -> Result<DialogEvent>
where
    A: FlatsApi + ?Sized,
    C: Fn() -> i64,
    R: BufRead,
    W: Write,
{
    let ev = dialog.request_otp(api).await?;
    report(out, &ev)?;

    loop {
        write!(out, "Enter OTP (resend | q): ")?;
        out.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            writeln!(out)?;
            return close(dialog, out);
        }

        let ev = match parse_input(&line) {
            Input::Close => return close(dialog, out),
            Input::Resend => dialog.request_otp(api).await,
            Input::Code(code) => dialog.confirm(api, &code).await,
        };

        match ev {
            Ok(ev @ DialogEvent::Confirmed { .. }) => {
                report(out, &ev)?;
                if let Err(e) = board.apply_settlement(api, &ev).await {
                    warn!(error = %e, "flat list refresh after confirmation failed");
                }
                return Ok(ev);
            }
            Ok(ev) => report(out, &ev)?,
            // Refused locally; the dialog is unchanged.
            Err(e @ (FlowError::Validation(_) | FlowError::OtpNotRequested)) => {
                writeln!(out, "{e}")?;
            }
            Err(e) => bail!(e),
        }
    }
}

fn close<C, W>(dialog: AssignmentDialog<C>, out: &mut W) -> Result<DialogEvent>
where
    C: Fn() -> i64,
    W: Write,
{
    let ev = dialog.close();
    report(out, &ev)?;
    Ok(ev)
}

fn report<W: Write>(out: &mut W, ev: &DialogEvent) -> Result<()> {
    match ev {
        DialogEvent::OtpSent { tenant_id, .. } => {
            writeln!(out, "OTP sent to tenant {tenant_id}")?
        }
        DialogEvent::OtpRequestFailed { message } => {
            writeln!(out, "Could not send OTP: {message} (type `resend` to retry)")?
        }
        DialogEvent::CoolingDown { remaining_ms } => writeln!(
            out,
            "OTP already sent. Resend available in {}s",
            secs_ceil(*remaining_ms)
        )?,
        DialogEvent::Busy => writeln!(out, "A request is already in progress")?,
        DialogEvent::ConfirmFailed {
            message,
            kind: ErrorKind::StateConflict,
        } => writeln!(out, "Confirmation refused: {message}")?,
        DialogEvent::ConfirmFailed { message, .. } => writeln!(out, "OTP rejected: {message}")?,
        DialogEvent::Confirmed {
            purpose,
            flat_id,
            tenant_id,
        } => match purpose {
            OtpPurpose::Assign => {
                writeln!(out, "assigned=true flat_id={flat_id} tenant_id={tenant_id}")?
            }
            OtpPurpose::Vacate => {
                writeln!(out, "vacated=true flat_id={flat_id} tenant_id={tenant_id}")?
            }
        },
        DialogEvent::Closed { flat_id } => writeln!(out, "closed=true flat_id={flat_id}")?,
        DialogEvent::TenantSelected { .. } | DialogEvent::Reset { .. } => {}
    }
    Ok(())
}
