//! System status handler.

use tabled::Tabled;

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

use super::context::CliContext;

#[derive(Tabled)]
struct StatusRow {
    #[tabled(rename = "Field")]
    field: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

pub async fn handle(global: &GlobalOpts) -> Result<(), CliError> {
    let (_ctx, snapshot) = CliContext::connect(global).await?;
    let system = &snapshot.system;

    let rows = vec![
        StatusRow {
            field: "Device",
            value: system.system_id.clone(),
        },
        StatusRow {
            field: "Type",
            value: output::fmt_str(system.system_type_name.as_deref()),
        },
        StatusRow {
            field: "Firmware",
            value: output::fmt_str(system.fw_version.as_deref()),
        },
        StatusRow {
            field: "Air quality (IAQ ppm)",
            value: output::fmt_f64(system.air_quality),
        },
        StatusRow {
            field: "Air pressure (hPa)",
            value: output::fmt_f64(system.air_pressure),
        },
        StatusRow {
            field: "Humidity (%)",
            value: output::fmt_f64(system.humidity),
        },
        StatusRow {
            field: "Temperature (°C)",
            value: output::fmt_f64(system.temperature),
        },
        StatusRow {
            field: "Total runtime (h)",
            value: output::fmt_f64(system.runtime_hours),
        },
        StatusRow {
            field: "IAQ accuracy",
            value: output::fmt_i64(system.iaq_accuracy),
        },
        StatusRow {
            field: "Zones",
            value: system.num_zones.to_string(),
        },
        StatusRow {
            field: "Boot time",
            value: system
                .boot_time
                .map_or_else(output::dash, |t| t.to_rfc3339()),
        },
        StatusRow {
            field: "Mode lock",
            value: system.modelock.to_string(),
        },
        StatusRow {
            field: "Notification",
            value: system
                .notification
                .clone()
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| "none".into()),
        },
        StatusRow {
            field: "Connection",
            value: system.connection_status.clone(),
        },
    ];

    if !global.quiet {
        println!("{}", output::render_table(rows));
    }
    Ok(())
}
