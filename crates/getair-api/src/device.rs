// Device handle
//
// One handle per ventilation system. The cloud exposes the whole
// system as a single JSON document (`system` map + `zones` maps);
// reads go through a zone cursor the way the vendor SDK selects zones,
// writes are staged per wire field and sent in one PATCH on `push()`.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::client::SessionShared;
use crate::error::Error;
use crate::properties::{self, PropertySlot};

/// Fixed zone cardinality of a SmartControl system.
pub const ZONE_COUNT: u8 = 3;

/// Raw device document as served by the cloud: named properties per
/// system and per zone, nothing richer.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeviceDocument {
    #[serde(default)]
    pub system: Map<String, Value>,
    /// Keyed by the zone index as a string ("1".."3").
    #[serde(default)]
    pub zones: BTreeMap<String, Map<String, Value>>,
}

#[derive(Debug)]
struct DeviceState {
    document: DeviceDocument,
    staged_system: Map<String, Value>,
    staged_zones: BTreeMap<u8, Map<String, Value>>,
    /// Zone cursor; 0 means no zone selected yet.
    selected_zone: u8,
    /// When set, property writes push immediately (vendor app default).
    autoset: bool,
    last_error: Option<String>,
}

impl Default for DeviceState {
    fn default() -> Self {
        Self {
            document: DeviceDocument::default(),
            staged_system: Map::new(),
            staged_zones: BTreeMap::new(),
            selected_zone: 0,
            autoset: true,
            last_error: None,
        }
    }
}

/// Handle to one ventilation system within a cloud session.
pub struct Device {
    id: String,
    shared: Arc<SessionShared>,
    state: RwLock<DeviceState>,
}

impl Device {
    pub(crate) fn new(id: String, shared: Arc<SessionShared>) -> Self {
        Self {
            id,
            shared,
            state: RwLock::new(DeviceState::default()),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    // ── Fetch / push ─────────────────────────────────────────────────

    /// Fetch the current device document from the cloud.
    ///
    /// With `auto_reconnect` enabled on the session, an unauthorized
    /// response triggers a single internal token grant and one retry.
    /// Integrations disable that and drive reconnects themselves.
    pub async fn fetch(&self) -> Result<(), Error> {
        match self.try_fetch().await {
            Err(Error::Authentication { .. })
                if self.shared.auto_reconnect() && !self.shared.reconnect_in_progress() =>
            {
                debug!(device = %self.id, "fetch unauthorized, internal reconnect");
                self.shared.set_reconnect_in_progress(true);
                let reconnected = self.shared.connect().await;
                self.shared.set_reconnect_in_progress(false);
                reconnected?;
                self.try_fetch().await
            }
            other => other,
        }
    }

    async fn try_fetch(&self) -> Result<(), Error> {
        let url = self.shared.device_url(&self.id)?;
        match self.shared.get_json::<DeviceDocument>(url).await {
            Ok(document) => {
                let mut state = self.state.write().expect("device state lock poisoned");
                state.document = document;
                state.last_error = None;
                Ok(())
            }
            Err(e) => {
                self.record_error(&e);
                Err(e)
            }
        }
    }

    /// Push all staged writes in one request and apply them locally.
    ///
    /// A push with nothing staged is a no-op.
    pub async fn push(&self) -> Result<(), Error> {
        let body = {
            let state = self.state.read().expect("device state lock poisoned");
            if state.staged_system.is_empty() && state.staged_zones.is_empty() {
                return Ok(());
            }
            let mut body = Map::new();
            if !state.staged_system.is_empty() {
                body.insert("system".into(), Value::Object(state.staged_system.clone()));
            }
            if !state.staged_zones.is_empty() {
                let zones: Map<String, Value> = state
                    .staged_zones
                    .iter()
                    .map(|(idx, fields)| (idx.to_string(), Value::Object(fields.clone())))
                    .collect();
                body.insert("zones".into(), Value::Object(zones));
            }
            Value::Object(body)
        };

        let url = self.shared.device_url(&self.id)?;
        match self.shared.patch_json(url, &body).await {
            Ok(()) => {
                self.apply_staged();
                Ok(())
            }
            Err(e) => {
                self.record_error(&e);
                Err(e)
            }
        }
    }

    /// Fold staged writes into the local document so reads reflect the
    /// accepted state until the next fetch.
    fn apply_staged(&self) {
        let mut state = self.state.write().expect("device state lock poisoned");
        let staged_system = std::mem::take(&mut state.staged_system);
        let staged_zones = std::mem::take(&mut state.staged_zones);
        for (field, value) in staged_system {
            state.document.system.insert(field, value);
        }
        for (idx, fields) in staged_zones {
            let zone = state.document.zones.entry(idx.to_string()).or_default();
            for (field, value) in fields {
                zone.insert(field, value);
            }
        }
    }

    // ── Zone cursor and reads ────────────────────────────────────────

    /// Move the zone cursor. Indices outside 1..=3 are rejected.
    pub fn select_zone(&self, index: u8) -> Result<(), Error> {
        if !(1..=ZONE_COUNT).contains(&index) {
            return Err(Error::UnknownZone { index });
        }
        self.state
            .write()
            .expect("device state lock poisoned")
            .selected_zone = index;
        Ok(())
    }

    pub fn selected_zone(&self) -> Option<u8> {
        let index = self
            .state
            .read()
            .expect("device state lock poisoned")
            .selected_zone;
        (index > 0).then_some(index)
    }

    /// Snapshot of the system property map.
    pub fn system_values(&self) -> Map<String, Value> {
        self.state
            .read()
            .expect("device state lock poisoned")
            .document
            .system
            .clone()
    }

    /// Snapshot of the selected zone's property map.
    ///
    /// Fails when no zone is selected or the document has no entry for
    /// the selected zone — callers degrade that zone, not the cycle.
    pub fn zone_values(&self) -> Result<Map<String, Value>, Error> {
        let state = self.state.read().expect("device state lock poisoned");
        let index = state.selected_zone;
        if index == 0 {
            return Err(Error::UnknownZone { index });
        }
        state
            .document
            .zones
            .get(&index.to_string())
            .cloned()
            .ok_or(Error::UnknownZone { index })
    }

    // ── Property writes ──────────────────────────────────────────────

    /// Disable or enable push-on-assignment.
    pub fn set_autoset(&self, enabled: bool) {
        self.state
            .write()
            .expect("device state lock poisoned")
            .autoset = enabled;
    }

    /// Stage a write on the selected zone, resolving the wire field
    /// through the property table. Pushes immediately when autoset is on.
    pub async fn set_zone_property(&self, logical: &str, value: Value) -> Result<(), Error> {
        let slot = properties::zone_slot(logical).ok_or_else(|| Error::UnknownProperty {
            name: logical.to_owned(),
        })?;

        let autoset = {
            let mut state = self.state.write().expect("device state lock poisoned");
            let index = state.selected_zone;
            if index == 0 {
                return Err(Error::UnknownZone { index });
            }
            let field = resolve_field(slot, state.document.zones.get(&index.to_string()));
            debug!(device = %self.id, zone = index, %field, "staging zone write");
            state
                .staged_zones
                .entry(index)
                .or_default()
                .insert(field.to_owned(), value);
            state.autoset
        };

        if autoset { self.push().await } else { Ok(()) }
    }

    /// Stage a system-level write.
    pub async fn set_system_property(&self, logical: &str, value: Value) -> Result<(), Error> {
        let slot = properties::system_slot(logical).ok_or_else(|| Error::UnknownProperty {
            name: logical.to_owned(),
        })?;

        let autoset = {
            let mut state = self.state.write().expect("device state lock poisoned");
            let field = resolve_field(slot, Some(&state.document.system));
            debug!(device = %self.id, %field, "staging system write");
            state.staged_system.insert(field.to_owned(), value);
            state.autoset
        };

        if autoset { self.push().await } else { Ok(()) }
    }

    pub fn has_staged_writes(&self) -> bool {
        let state = self.state.read().expect("device state lock poisoned");
        !state.staged_system.is_empty() || !state.staged_zones.is_empty()
    }

    // ── Diagnostics ──────────────────────────────────────────────────

    /// Last fetch/push failure, kept for error reporting upstream.
    pub fn last_error(&self) -> Option<String> {
        self.state
            .read()
            .expect("device state lock poisoned")
            .last_error
            .clone()
    }

    fn record_error(&self, err: &Error) {
        self.state
            .write()
            .expect("device state lock poisoned")
            .last_error = Some(err.to_string());
    }
}

/// Pick the wire field for a logical property: the primary name unless
/// the document lacks it but carries the `active_`-prefixed fallback.
fn resolve_field(slot: &PropertySlot, fields: Option<&Map<String, Value>>) -> &'static str {
    match fields {
        Some(f) if !f.contains_key(slot.primary) => slot
            .fallback
            .filter(|fb| f.contains_key(*fb))
            .unwrap_or(slot.primary),
        _ => slot.primary,
    }
}
