//! Account device listing.
//!
//! Connects without a coordinator — useful for discovering the device
//! id to put in the profile.

use std::sync::Arc;

use tabled::Tabled;

use getair_api::{ApiClient, CredentialStore};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "Device ID")]
    id: String,
    #[tabled(rename = "Type")]
    system_type: String,
    #[tabled(rename = "Alias")]
    alias: String,
}

pub async fn handle(global: &GlobalOpts) -> Result<(), CliError> {
    let config = getair_config::load_config_or_default()?;
    let profile_name = config.active_profile_name(global.profile.as_deref());
    let profile = config.profile(&profile_name)?;
    let credentials = getair_config::credentials(profile, &profile_name)?;

    let store = getair_config::storage_dir().map_or_else(
        || CredentialStore::in_temp_dir(&credentials.username),
        |dir| CredentialStore::new(&dir),
    );

    let client = Arc::new(ApiClient::new(credentials, store));
    if !client.connect().await {
        return Err(CliError::ConnectFailed);
    }

    let devices = client.list_devices().await?;
    let rows: Vec<DeviceRow> = devices
        .into_iter()
        .map(|d| DeviceRow {
            id: d.device_id,
            system_type: d.system_type.unwrap_or_else(output::dash),
            alias: d.alias.unwrap_or_else(output::dash),
        })
        .collect();

    if !global.quiet {
        println!("{}", output::render_table(rows));
    }
    Ok(())
}
