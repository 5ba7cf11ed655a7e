//! Reset button handlers.

use getair_core::entity::button::{ZoneButton, ZoneButtonKind};

use crate::cli::{GlobalOpts, ResetCommand};
use crate::error::CliError;
use crate::output;

use super::context::CliContext;

pub async fn handle(cmd: ResetCommand, global: &GlobalOpts) -> Result<(), CliError> {
    let (ctx, _snapshot) = CliContext::connect(global).await?;
    let ectx = ctx.entity_context();

    let (zone, kind, label) = match cmd {
        ResetCommand::Filter { zone } => (
            CliContext::zone(zone)?,
            ZoneButtonKind::ResetFilterRuntime,
            "filter runtime",
        ),
        ResetCommand::Deadline { zone } => (
            CliContext::zone(zone)?,
            ZoneButtonKind::ResetModeDeadline,
            "mode deadline",
        ),
    };

    let button = ZoneButton::new(&ectx, zone, kind);
    if button.press(&ctx.coordinator).await {
        output::ok(global.quiet, &format!("zone {zone} {label} reset"));
        Ok(())
    } else {
        Err(CliError::WriteFailed)
    }
}
