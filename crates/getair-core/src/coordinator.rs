// Polling coordinator
//
// Owns the client wrapper for one integration entry, keeps the
// connection alive, and publishes a fresh snapshot on a fixed
// schedule. All reconnect policy lives here — the session's own 401
// recovery is disabled by the wrapper. An async mutex serializes poll
// cycles and user writes so no two device operations overlap.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde_json::{Value, json};
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use getair_api::{ApiClient, Device};

use crate::error::CoreError;
use crate::retry::RetryPolicy;
use crate::snapshot::{Snapshot, SystemData, ZoneData, ZoneIndex};

pub const DEFAULT_POLLING_INTERVAL: Duration = Duration::from_secs(60);

/// Grace period after a reconnect before retrying a fetch; the freshly
/// granted token needs a moment to propagate through the cloud.
const RECONNECT_SETTLE: Duration = Duration::from_millis(500);

/// Fetch recovery: up to 3 attempts at 500 ms spacing.
const FETCH_RETRY: RetryPolicy = RetryPolicy::new(3, Duration::from_millis(500));

/// Connection state observable by consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connected,
    /// Authentication could not be restored; reauth is needed.
    AuthExpired,
    /// The last cycle failed after retries; the previous snapshot
    /// stays published until a cycle succeeds again.
    UpdateFailed,
}

/// Static configuration for one coordinator.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Normalized device id (uppercase, no colons).
    pub device_id: String,
    pub polling_interval: Duration,
}

impl CoordinatorConfig {
    pub fn new(device_id: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            polling_interval: DEFAULT_POLLING_INTERVAL,
        }
    }
}

/// Polling coordinator for one integration entry.
pub struct Coordinator {
    client: Arc<ApiClient>,
    device_id: String,
    polling_interval: Duration,
    snapshot: watch::Sender<Option<Arc<Snapshot>>>,
    state: watch::Sender<ConnectionState>,
    /// Serializes poll cycles against user-initiated writes.
    device_lock: Mutex<()>,
}

impl Coordinator {
    pub fn new(client: Arc<ApiClient>, config: CoordinatorConfig) -> Self {
        let (snapshot, _) = watch::channel(None);
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        info!(
            "coordinator initialized for device {} with polling interval {:?}",
            config.device_id, config.polling_interval
        );
        Self {
            client,
            device_id: config.device_id,
            polling_interval: config.polling_interval,
            snapshot,
            state,
            device_lock: Mutex::new(()),
        }
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn client(&self) -> &Arc<ApiClient> {
        &self.client
    }

    /// The most recently published snapshot, if any cycle succeeded yet.
    pub fn snapshot(&self) -> Option<Arc<Snapshot>> {
        self.snapshot.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<Snapshot>>> {
        self.snapshot.subscribe()
    }

    pub fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    // ── Refresh cycle ────────────────────────────────────────────────

    /// Run one poll cycle and publish the resulting snapshot.
    pub async fn refresh(&self) -> Result<Arc<Snapshot>, CoreError> {
        let _guard = self.device_lock.lock().await;

        match self.refresh_inner().await {
            Ok(snapshot) => {
                let snapshot = Arc::new(snapshot);
                let _ = self.snapshot.send(Some(Arc::clone(&snapshot)));
                let _ = self.state.send(ConnectionState::Connected);
                debug!(device = %self.device_id, "data update successful");
                Ok(snapshot)
            }
            Err(e) => {
                let next_state = match &e {
                    CoreError::AuthenticationFailed { .. } => ConnectionState::AuthExpired,
                    _ => ConnectionState::UpdateFailed,
                };
                let _ = self.state.send(next_state);
                Err(e)
            }
        }
    }

    async fn refresh_inner(&self) -> Result<Snapshot, CoreError> {
        debug!(device = %self.device_id, "starting data update");

        // Liveness check: one reconnect, then give up for this cycle.
        if !self.client.is_connected().await {
            warn!("client not connected, attempting reconnection");
            if !self.client.connect().await {
                error!("failed to reconnect");
                return Err(CoreError::AuthenticationFailed {
                    message: "reconnection unsuccessful".into(),
                });
            }
            info!("successfully reconnected");
        }

        // The cloud backend reads the credentials file during token
        // refresh; restore it before fetching if something removed it.
        if !self.client.ensure_credentials_file() {
            return Err(CoreError::UpdateFailed {
                context: "credentials file could not be created or accessed".into(),
            });
        }

        let mut device = self
            .client
            .get_device(&self.device_id, true)
            .await
            .ok_or_else(|| CoreError::UpdateFailed {
                context: "device lookup returned nothing".into(),
            })?;

        if let Err(fetch_err) = device.fetch().await {
            warn!("fetch failed ({fetch_err}), attempting reconnection");
            device = self.recover_fetch(&fetch_err).await?;
        }

        Ok(self.compile_snapshot(&device))
    }

    /// One reconnect, a settle delay for token propagation, then a
    /// bounded fetch retry with a fresh device handle per attempt.
    async fn recover_fetch(&self, cause: &getair_api::Error) -> Result<Arc<Device>, CoreError> {
        self.client.reset_reconnect_flag().await;

        if !self.client.connect().await {
            error!("reconnection failed");
            return Err(self.update_failed(cause).await);
        }
        info!("reconnection successful, waiting for token to become active");
        tokio::time::sleep(RECONNECT_SETTLE).await;
        self.client.reset_reconnect_flag().await;

        let retried = FETCH_RETRY
            .run(|attempt| async move {
                debug!("fetch retry attempt {attempt}");
                let device = self
                    .client
                    .get_device(&self.device_id, true)
                    .await
                    .ok_or_else(|| CoreError::UpdateFailed {
                        context: format!("device lookup failed on retry {attempt}"),
                    })?;
                device.fetch().await?;
                Ok::<_, CoreError>(device)
            })
            .await;

        match retried {
            Ok(device) => {
                info!("fetch recovered after reconnect");
                Ok(device)
            }
            Err(retry_err) => {
                error!("all fetch retries failed: {retry_err}");
                Err(self.update_failed(cause).await)
            }
        }
    }

    /// Build the terminal update error with diagnostic context.
    async fn update_failed(&self, cause: &getair_api::Error) -> CoreError {
        let token_present = self.client.is_connected().await;
        let device_error = match self.client.get_device(&self.device_id, true).await {
            Some(device) => device.last_error(),
            None => None,
        };

        let mut context = format!("{cause}; token present: {token_present}");
        if let Some(detail) = device_error {
            context.push_str("; device error: ");
            context.push_str(&detail);
        }
        CoreError::UpdateFailed { context }
    }

    /// Compile the snapshot from a freshly fetched device document.
    ///
    /// Zone-level failures degrade that zone to a stub record; the
    /// cycle itself still succeeds with all three zone entries present.
    fn compile_snapshot(&self, device: &Device) -> Snapshot {
        let system = SystemData::from_wire(&self.device_id, &device.system_values(), Utc::now());

        let mut zones = BTreeMap::new();
        for index in ZoneIndex::ALL {
            let zone = match device
                .select_zone(index.get())
                .and_then(|()| device.zone_values())
            {
                Ok(fields) => ZoneData::from_wire(index, &fields),
                Err(e) => {
                    warn!("error reading zone {index}: {e}, keeping minimal record");
                    ZoneData::stub(index)
                }
            };
            zones.insert(index, zone);
        }

        Snapshot { system, zones }
    }

    // ── Property writes ──────────────────────────────────────────────

    /// Set a zone's fan speed (0.0–4.0). No immediate refresh: the fan
    /// adapter reports the new state optimistically.
    pub async fn set_zone_speed(&self, zone: ZoneIndex, speed: f64) -> bool {
        self.write_zone(zone, "speed", json!(speed)).await
    }

    /// Set a zone's operating mode, then refresh.
    pub async fn set_zone_mode(&self, zone: ZoneIndex, mode: &str) -> bool {
        let ok = self.write_zone(zone, "mode", json!(mode)).await;
        if ok {
            self.request_refresh().await;
        }
        ok
    }

    /// Set a named zone property, then refresh.
    pub async fn set_zone_property(&self, zone: ZoneIndex, property: &str, value: Value) -> bool {
        let ok = self.write_zone(zone, property, value).await;
        if ok {
            self.request_refresh().await;
        }
        ok
    }

    /// Set a named system property, then refresh.
    pub async fn set_system_property(&self, property: &str, value: Value) -> bool {
        let ok = self.write_system(property, value).await;
        if ok {
            self.request_refresh().await;
        }
        ok
    }

    async fn write_zone(&self, zone: ZoneIndex, property: &str, value: Value) -> bool {
        let _guard = self.device_lock.lock().await;
        debug!("setting zone {zone} {property} = {value}");

        let Some(device) = self.client.get_device(&self.device_id, true).await else {
            error!("set {property}: device lookup returned nothing");
            return false;
        };

        device.set_autoset(false);
        if let Err(e) = device.select_zone(zone.get()) {
            error!("set {property}: {e}");
            return false;
        }
        if let Err(e) = device.set_zone_property(property, value).await {
            error!("could not stage zone {zone} {property}: {e}");
            return false;
        }

        match device.push().await {
            Ok(()) => {
                info!("successfully set zone {zone} {property}");
                true
            }
            Err(e) => {
                error!("push failed for zone {zone} {property}: {e}");
                false
            }
        }
    }

    async fn write_system(&self, property: &str, value: Value) -> bool {
        let _guard = self.device_lock.lock().await;
        debug!("setting system {property} = {value}");

        let Some(device) = self.client.get_device(&self.device_id, true).await else {
            error!("set {property}: device lookup returned nothing");
            return false;
        };

        device.set_autoset(false);
        if let Err(e) = device.set_system_property(property, value).await {
            error!("could not stage system {property}: {e}");
            return false;
        }

        match device.push().await {
            Ok(()) => {
                info!("successfully set system {property}");
                true
            }
            Err(e) => {
                error!("push failed for system {property}: {e}");
                false
            }
        }
    }

    /// Post-write refresh; a failure here is logged, not surfaced —
    /// the write itself already succeeded.
    async fn request_refresh(&self) {
        if let Err(e) = self.refresh().await {
            warn!("post-write refresh failed: {e}");
        }
    }

    // ── Polling ──────────────────────────────────────────────────────

    /// Run `refresh()` on the configured interval until cancelled.
    ///
    /// The first tick fires immediately. A cycle that overruns the
    /// interval delays the next tick instead of stacking cycles.
    pub fn spawn_polling(self: &Arc<Self>, cancel: CancellationToken) -> JoinHandle<()> {
        let coordinator = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(coordinator.polling_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        if let Err(e) = coordinator.refresh().await {
                            warn!("poll cycle failed: {e}");
                        }
                    }
                }
            }
            debug!("polling task stopped");
        })
    }
}
