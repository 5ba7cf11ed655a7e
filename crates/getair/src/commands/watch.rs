//! Continuous polling mode.
//!
//! Spawns the coordinator's polling task and prints a one-line summary
//! for every published snapshot until Ctrl-C.

use owo_colors::OwoColorize;
use tokio_util::sync::CancellationToken;

use getair_core::entity::fan;
use getair_core::{ConnectionState, Snapshot};

use crate::cli::GlobalOpts;
use crate::error::CliError;

use super::context::CliContext;

fn print_summary(snapshot: &Snapshot) {
    let zones: Vec<String> = snapshot
        .zones
        .values()
        .map(|zone| {
            let fan_pct = zone
                .speed
                .map_or_else(|| "-".into(), |s| format!("{}%", fan::speed_to_percentage(s)));
            let mode = zone.mode.as_deref().unwrap_or("-");
            format!("{}: {mode} @ {fan_pct}", zone.name)
        })
        .collect();

    println!(
        "{}  {}",
        snapshot.system.last_update.to_rfc3339().dimmed(),
        zones.join("  |  ")
    );
}

pub async fn handle(global: &GlobalOpts) -> Result<(), CliError> {
    let (ctx, snapshot) = CliContext::connect(global).await?;
    print_summary(&snapshot);

    let cancel = CancellationToken::new();
    let poll_task = ctx.coordinator.spawn_polling(cancel.clone());

    let mut snapshots = ctx.coordinator.subscribe();
    let mut states = ctx.coordinator.connection_state();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let latest = snapshots.borrow_and_update().clone();
                if let Some(snapshot) = latest {
                    print_summary(&snapshot);
                }
            }
            changed = states.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = *states.borrow_and_update();
                match state {
                    ConnectionState::AuthExpired => {
                        eprintln!("{}", "authentication expired, reauth needed".red());
                    }
                    ConnectionState::UpdateFailed => {
                        eprintln!("{}", "update failed, showing last known state".yellow());
                    }
                    ConnectionState::Connected | ConnectionState::Disconnected => {}
                }
            }
        }
    }

    if !global.quiet {
        eprintln!("stopping");
    }
    cancel.cancel();
    let _ = poll_task.await;
    Ok(())
}
