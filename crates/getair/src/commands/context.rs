//! Shared command setup: profile resolution, connect, first refresh.

use std::sync::Arc;

use getair_api::{ApiClient, CredentialStore};
use getair_core::entity::{EnabledZones, EntityContext};
use getair_core::{Coordinator, Snapshot, ZoneIndex};

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub struct CliContext {
    pub client: Arc<ApiClient>,
    pub coordinator: Arc<Coordinator>,
    pub enabled_zones: EnabledZones,
}

impl CliContext {
    /// Resolve the active profile, connect to the cloud, and run the
    /// first refresh so every handler starts from a live snapshot.
    pub async fn connect(global: &GlobalOpts) -> Result<(Self, Arc<Snapshot>), CliError> {
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

        let mut coordinator_config = profile.coordinator_config();
        if let Some(id) = &global.device_id {
            coordinator_config.device_id = id.to_uppercase().replace(':', "");
        }

        let coordinator = Arc::new(Coordinator::new(Arc::clone(&client), coordinator_config));
        let snapshot = coordinator.refresh().await?;

        let context = Self {
            client,
            coordinator,
            enabled_zones: profile.enabled_zones(),
        };
        Ok((context, snapshot))
    }

    pub fn entity_context(&self) -> EntityContext {
        EntityContext::new(Arc::clone(&self.coordinator), self.enabled_zones)
    }

    pub fn zone(index: u8) -> Result<ZoneIndex, CliError> {
        ZoneIndex::new(index).map_err(Into::into)
    }
}
