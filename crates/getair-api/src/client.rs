// Cloud session and client wrapper
//
// `CloudSession` is the stateful half: one bearer token, one device
// cache, shared request plumbing. `ApiClient` owns at most one session
// per integration entry and brokers connect/reconnect plus the
// credentials-file bookkeeping; device lookups never propagate errors.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use dashmap::DashMap;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, error, info};
use url::Url;

use crate::auth::{self, Credentials, SessionToken};
use crate::credentials::CredentialStore;
use crate::device::Device;
use crate::error::Error;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// ── Shared session state ─────────────────────────────────────────────

pub(crate) struct SessionShared {
    http: reqwest::Client,
    credentials: Credentials,
    token: RwLock<Option<String>>,
    /// Internal 401 recovery; disabled by [`ApiClient`] because the
    /// polling coordinator owns all reconnect policy.
    auto_reconnect: AtomicBool,
    reconnect_in_progress: AtomicBool,
}

impl SessionShared {
    pub(crate) fn has_token(&self) -> bool {
        self.token.read().expect("token lock poisoned").is_some()
    }

    pub(crate) fn auto_reconnect(&self) -> bool {
        self.auto_reconnect.load(Ordering::Relaxed)
    }

    pub(crate) fn reconnect_in_progress(&self) -> bool {
        self.reconnect_in_progress.load(Ordering::Relaxed)
    }

    pub(crate) fn set_reconnect_in_progress(&self, value: bool) {
        self.reconnect_in_progress.store(value, Ordering::Relaxed);
    }

    /// Run the token grant and store the resulting bearer token.
    pub(crate) async fn connect(&self) -> Result<SessionToken, Error> {
        let token = auth::password_grant(&self.http, &self.credentials).await?;
        *self.token.write().expect("token lock poisoned") = Some(token.access_token.clone());
        Ok(token)
    }

    // ── URL builders ─────────────────────────────────────────────────

    pub(crate) fn device_url(&self, id: &str) -> Result<Url, Error> {
        let base = self.credentials.api_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}/v1/devices/{id}"))?)
    }

    fn devices_url(&self) -> Result<Url, Error> {
        let base = self.credentials.api_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}/v1/devices"))?)
    }

    // ── Request helpers ──────────────────────────────────────────────

    fn bearer(&self) -> Result<String, Error> {
        self.token
            .read()
            .expect("token lock poisoned")
            .clone()
            .ok_or_else(|| Error::Authentication {
                message: "no session token".into(),
            })
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("GET {url}");
        let token = self.bearer()?;
        let resp = self
            .http
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(Error::Transport)?;
        Self::parse_json(resp).await
    }

    pub(crate) async fn patch_json(&self, url: Url, body: &Value) -> Result<(), Error> {
        debug!("PATCH {url}");
        let token = self.bearer()?;
        let resp = self
            .http
            .patch(url)
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .map_err(Error::Transport)?;

        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(Error::Authentication {
                message: "session expired or invalid token".into(),
            });
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Api {
                message: format!("HTTP {status}: {}", &body[..body.len().min(200)]),
            });
        }
        Ok(())
    }

    async fn parse_json<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
        let status = resp.status();

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(Error::Authentication {
                message: "session expired or invalid token".into(),
            });
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Api {
                message: format!("HTTP {status}: {}", &body[..body.len().min(200)]),
            });
        }

        let body = resp.text().await.map_err(Error::Transport)?;
        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: format!("{e} (body preview: {:?})", &body[..body.len().min(200)]),
        })
    }
}

// ── CloudSession ─────────────────────────────────────────────────────

/// One authenticated connection to the getAir cloud.
///
/// Holds the bearer token and a cache of [`Device`] handles. Clearing
/// the cache after a reconnect makes subsequent lookups build fresh
/// handles bound to the new session state.
pub struct CloudSession {
    shared: Arc<SessionShared>,
    devices: DashMap<String, Arc<Device>>,
}

/// One row of the device listing.
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceSummary {
    pub device_id: String,
    #[serde(default)]
    pub system_type: Option<String>,
    #[serde(default)]
    pub alias: Option<String>,
}

impl CloudSession {
    pub fn new(credentials: Credentials) -> Result<Self, Error> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(Error::Transport)?;

        Ok(Self {
            shared: Arc::new(SessionShared {
                http,
                credentials,
                token: RwLock::new(None),
                auto_reconnect: AtomicBool::new(true),
                reconnect_in_progress: AtomicBool::new(false),
            }),
            devices: DashMap::new(),
        })
    }

    /// Authenticate (or re-authenticate) against the auth endpoint.
    pub async fn connect(&self) -> Result<SessionToken, Error> {
        self.shared.connect().await
    }

    pub fn has_token(&self) -> bool {
        self.shared.has_token()
    }

    pub fn set_auto_reconnect(&self, enabled: bool) {
        self.shared.auto_reconnect.store(enabled, Ordering::Relaxed);
    }

    pub fn reset_reconnect_flag(&self) {
        self.shared.set_reconnect_in_progress(false);
    }

    /// Drop all cached device handles.
    pub fn clear_devices(&self) {
        self.devices.clear();
    }

    /// Look up (or build) the handle for one device.
    pub async fn get_device(&self, id: &str, skip_fetch: bool) -> Result<Arc<Device>, Error> {
        if let Some(found) = self.devices.get(id) {
            return Ok(Arc::clone(found.value()));
        }

        let device = Arc::new(Device::new(id.to_owned(), Arc::clone(&self.shared)));
        if !skip_fetch {
            device.fetch().await?;
        }
        self.devices.insert(id.to_owned(), Arc::clone(&device));
        Ok(device)
    }

    /// List the devices registered to the account.
    pub async fn get_devices(&self) -> Result<Vec<DeviceSummary>, Error> {
        let url = self.shared.devices_url()?;
        self.shared.get_json(url).await
    }
}

// ── ApiClient ────────────────────────────────────────────────────────

/// Client wrapper owned by one integration entry.
///
/// Keeps exactly one [`CloudSession`] alive, hides the credentials-file
/// bookkeeping, and reports failures as `false`/`None` so the caller's
/// poll cycle decides how to degrade.
pub struct ApiClient {
    credentials: Credentials,
    store: CredentialStore,
    session: Mutex<Option<CloudSession>>,
}

impl ApiClient {
    pub fn new(credentials: Credentials, store: CredentialStore) -> Self {
        debug!(
            "api client created for user {}",
            credentials.username
        );
        Self {
            credentials,
            store,
            session: Mutex::new(None),
        }
    }

    pub fn credential_store(&self) -> &CredentialStore {
        &self.store
    }

    /// Connect, or reconnect when a session already exists.
    ///
    /// First connect: write the credentials file, build the session,
    /// disable its internal 401 recovery, authenticate. Reconnect:
    /// ensure the credentials file still exists, clear the device cache
    /// so lookups bind to the new session, reset the pending-reconnect
    /// flag, authenticate again on the same session.
    pub async fn connect(&self) -> bool {
        let mut guard = self.session.lock().await;

        if let Some(session) = guard.as_ref() {
            debug!("reusing existing session for reconnect");
            if let Err(e) = self.store.ensure(&self.credentials) {
                error!("could not recreate credentials file: {e}");
                return false;
            }
            session.clear_devices();
            session.reset_reconnect_flag();
            return match session.connect().await {
                Ok(_) => {
                    info!("reconnected to getAir cloud");
                    true
                }
                Err(e) => {
                    error!("reconnect failed: {e}");
                    false
                }
            };
        }

        if let Err(e) = self.store.write(&self.credentials) {
            error!("could not write credentials file: {e}");
            return false;
        }

        let session = match CloudSession::new(self.credentials.clone()) {
            Ok(s) => s,
            Err(e) => {
                error!("could not build cloud session: {e}");
                return false;
            }
        };
        session.set_auto_reconnect(false);

        match session.connect().await {
            Ok(_) => {
                info!("connected to getAir cloud");
                *guard = Some(session);
                true
            }
            Err(e) => {
                error!("connect failed: {e}");
                false
            }
        }
    }

    /// True iff a session exists and holds a token.
    pub async fn is_connected(&self) -> bool {
        self.session
            .lock()
            .await
            .as_ref()
            .is_some_and(CloudSession::has_token)
    }

    /// Device lookup that never propagates an error.
    pub async fn get_device(&self, id: &str, skip_fetch: bool) -> Option<Arc<Device>> {
        let guard = self.session.lock().await;
        let Some(session) = guard.as_ref() else {
            error!("not connected, cannot look up device {id}");
            return None;
        };
        match session.get_device(id, skip_fetch).await {
            Ok(device) => Some(device),
            Err(e) => {
                error!("device lookup failed for {id}: {e}");
                None
            }
        }
    }

    /// List the account's devices (used for device-id discovery).
    pub async fn list_devices(&self) -> Result<Vec<DeviceSummary>, Error> {
        let guard = self.session.lock().await;
        let session = guard.as_ref().ok_or_else(|| Error::Authentication {
            message: "not connected".into(),
        })?;
        session.get_devices().await
    }

    /// Recreate the credentials file if it went missing; the cloud
    /// backend reads it during token refresh.
    pub fn ensure_credentials_file(&self) -> bool {
        match self.store.ensure(&self.credentials) {
            Ok(()) => true,
            Err(e) => {
                error!("could not ensure credentials file: {e}");
                false
            }
        }
    }

    /// Clear the session's pending-reconnect flag, if any.
    pub async fn reset_reconnect_flag(&self) {
        if let Some(session) = self.session.lock().await.as_ref() {
            session.reset_reconnect_flag();
        }
    }

    /// Drop the session and remove the credentials file.
    pub async fn teardown(&self) {
        *self.session.lock().await = None;
        if let Err(e) = self.store.remove() {
            error!("could not remove credentials file: {e}");
        }
    }
}
