//! Property write handlers.
//!
//! Each write goes through the matching entity adapter so the CLI and
//! any other front-end share one write path (snapping, label mapping,
//! validation).

use getair_core::entity::fan::ZoneFan;
use getair_core::entity::number::{ZoneNumber, ZoneNumberKind};
use getair_core::entity::select::{ZoneSelect, ZoneSelectKind};
use getair_core::entity::text::ZoneNameText;

use crate::cli::{GlobalOpts, SetCommand};
use crate::error::CliError;
use crate::output;

use super::context::CliContext;

pub async fn handle(cmd: SetCommand, global: &GlobalOpts) -> Result<(), CliError> {
    let (ctx, _snapshot) = CliContext::connect(global).await?;
    let ectx = ctx.entity_context();
    let coordinator = &ctx.coordinator;

    let (ok, description) = match cmd {
        SetCommand::Speed { zone, percentage } => {
            let zone = CliContext::zone(zone)?;
            let fan = ZoneFan::new(&ectx, zone);
            (
                fan.set_percentage(coordinator, percentage.min(100)).await,
                format!("zone {zone} speed -> {percentage}%"),
            )
        }
        SetCommand::Mode { zone, mode } => {
            let zone = CliContext::zone(zone)?;
            let select = ZoneSelect::new(&ectx, zone, ZoneSelectKind::Mode);
            (
                select.select(coordinator, &mode).await,
                format!("zone {zone} mode -> {mode}"),
            )
        }
        SetCommand::Profile { zone, name } => {
            let zone = CliContext::zone(zone)?;
            let select = ZoneSelect::new(&ectx, zone, ZoneSelectKind::TimeProfile);
            (
                select.select(coordinator, &name).await,
                format!("zone {zone} time profile -> {name}"),
            )
        }
        SetCommand::TargetTemp { zone, celsius } => {
            let zone = CliContext::zone(zone)?;
            let number = ZoneNumber::new(&ectx, zone, ZoneNumberKind::TargetTemperature);
            (
                number.set(coordinator, celsius).await,
                format!("zone {zone} target temperature -> {celsius} °C"),
            )
        }
        SetCommand::Humidity { zone, level } => {
            let zone = CliContext::zone(zone)?;
            let select = ZoneSelect::new(&ectx, zone, ZoneSelectKind::TargetHumidityLevel);
            (
                select.select(coordinator, &level).await,
                format!("zone {zone} target humidity -> {level}"),
            )
        }
        SetCommand::Name { zone, name } => {
            let zone = CliContext::zone(zone)?;
            let text = ZoneNameText::new(&ectx, zone);
            (
                text.set(coordinator, &name).await,
                format!("zone {zone} name -> {name}"),
            )
        }
    };

    if ok {
        output::ok(global.quiet, &description);
        Ok(())
    } else {
        Err(CliError::WriteFailed)
    }
}
