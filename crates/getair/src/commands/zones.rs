//! Zone listing handler.

use tabled::Tabled;

use getair_core::ZoneData;
use getair_core::entity::fan;
use getair_core::entity::select::mode_label;

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

use super::context::CliContext;

#[derive(Tabled)]
struct ZoneRow {
    #[tabled(rename = "Zone")]
    zone: u8,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Fan")]
    fan: String,
    #[tabled(rename = "Mode")]
    mode: String,
    #[tabled(rename = "Temp (°C)")]
    temperature: String,
    #[tabled(rename = "Humidity (%)")]
    humidity: String,
    #[tabled(rename = "Filter (h)")]
    filter: String,
    #[tabled(rename = "Profile")]
    profile: String,
    #[tabled(rename = "Status")]
    status: String,
}

impl From<&ZoneData> for ZoneRow {
    fn from(zone: &ZoneData) -> Self {
        Self {
            zone: zone.zone_index.get(),
            name: zone.name.clone(),
            fan: zone
                .speed
                .map_or_else(output::dash, |s| format!("{}%", fan::speed_to_percentage(s))),
            mode: zone.mode.as_deref().map_or_else(output::dash, |m| {
                mode_label(m).map_or_else(|| m.to_owned(), ToOwned::to_owned)
            }),
            temperature: output::fmt_f64(zone.temperature),
            humidity: output::fmt_f64(zone.humidity),
            filter: output::fmt_f64(zone.filter_runtime_hours),
            profile: output::fmt_i64(zone.time_profile),
            status: if zone.is_stub() { "offline".into() } else { "online".into() },
        }
    }
}

pub async fn handle(global: &GlobalOpts) -> Result<(), CliError> {
    let (_ctx, snapshot) = CliContext::connect(global).await?;

    let rows: Vec<ZoneRow> = snapshot.zones.values().map(ZoneRow::from).collect();
    if !global.quiet {
        println!("{}", output::render_table(rows));
    }
    Ok(())
}
