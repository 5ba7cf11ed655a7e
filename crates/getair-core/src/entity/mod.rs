//! Entity adapters: stateless read/write views over the coordinator's
//! snapshot, one adapter per exposed control or measurement.
//!
//! Adapters never hold device state. Reads take the current
//! [`Snapshot`]; writes go through the [`Coordinator`] and return its
//! success flag. Construction happens from an explicit
//! [`EntityContext`] — there is no global registry of live entries.

pub mod binary_sensor;
pub mod button;
pub mod datetime;
pub mod fan;
pub mod number;
pub mod select;
pub mod sensor;
pub mod switch;
pub mod text;

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::coordinator::Coordinator;
use crate::snapshot::{Snapshot, ZoneIndex};

/// Everything an adapter needs at construction time.
#[derive(Clone)]
pub struct EntityContext {
    pub coordinator: Arc<Coordinator>,
    pub device_id: String,
    pub enabled_zones: EnabledZones,
}

impl EntityContext {
    pub fn new(coordinator: Arc<Coordinator>, enabled_zones: EnabledZones) -> Self {
        let device_id = coordinator.device_id().to_owned();
        Self {
            coordinator,
            device_id,
            enabled_zones,
        }
    }
}

/// Which of the three zones get entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnabledZones {
    pub zone_1: bool,
    pub zone_2: bool,
    pub zone_3: bool,
}

impl EnabledZones {
    pub const ALL: Self = Self {
        zone_1: true,
        zone_2: true,
        zone_3: true,
    };

    pub fn contains(self, index: ZoneIndex) -> bool {
        match index.get() {
            1 => self.zone_1,
            2 => self.zone_2,
            _ => self.zone_3,
        }
    }

    /// The enabled zone indices, in order.
    pub fn iter(self) -> impl Iterator<Item = ZoneIndex> {
        ZoneIndex::ALL.into_iter().filter(move |z| self.contains(*z))
    }
}

impl Default for EnabledZones {
    fn default() -> Self {
        Self::ALL
    }
}

/// Typed value an entity reports as its state.
#[derive(Debug, Clone, PartialEq)]
pub enum EntityValue {
    Float(f64),
    Int(i64),
    Bool(bool),
    Text(String),
    Timestamp(DateTime<Utc>),
}

impl fmt::Display for EntityValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Float(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Bool(true) => write!(f, "on"),
            Self::Bool(false) => write!(f, "off"),
            Self::Text(v) => write!(f, "{v}"),
            Self::Timestamp(v) => write!(f, "{}", v.to_rfc3339()),
        }
    }
}

/// Whether an entity belongs to the system device or one zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityScope {
    System,
    Zone(ZoneIndex),
}

/// Host-platform entity domain an adapter maps onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityDomain {
    Sensor,
    BinarySensor,
    Switch,
    Select,
    Number,
    Fan,
    Button,
    DateTime,
    Text,
}

impl fmt::Display for EntityDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Sensor => "sensor",
            Self::BinarySensor => "binary_sensor",
            Self::Switch => "switch",
            Self::Select => "select",
            Self::Number => "number",
            Self::Fan => "fan",
            Self::Button => "button",
            Self::DateTime => "datetime",
            Self::Text => "text",
        };
        write!(f, "{name}")
    }
}

/// Common read surface of every adapter.
pub trait Entity: Send + Sync {
    fn unique_id(&self) -> &str;
    fn domain(&self) -> EntityDomain;
    fn scope(&self) -> EntityScope;
    /// Display name; zone entities prefix the zone's current name.
    fn name(&self, snapshot: &Snapshot) -> String;
    /// Current state, `None` when the backing attribute is absent
    /// (degraded zone, stateless entity).
    fn state(&self, snapshot: &Snapshot) -> Option<EntityValue>;
}

/// Unique-id helper: `getair_{device}_{key}` for system entities,
/// `getair_{device}_zone_{idx}_{key}` for zone entities.
pub(crate) fn unique_id(device_id: &str, scope: EntityScope, key: &str) -> String {
    match scope {
        EntityScope::System => format!("getair_{device_id}_{key}"),
        EntityScope::Zone(index) => format!("getair_{device_id}_zone_{index}_{key}"),
    }
}

/// Zone display name from the snapshot, with the standard fallback.
pub(crate) fn zone_name(snapshot: &Snapshot, index: ZoneIndex) -> String {
    snapshot
        .zone(index)
        .map_or_else(|| format!("Zone {index}"), |z| z.name.clone())
}

/// Build the full entity catalog for one device, honoring the zone
/// enable flags. Needs a snapshot because the sensor set depends on
/// which time-profile slots are named.
pub fn build_catalog(ctx: &EntityContext, snapshot: &Snapshot) -> Vec<Box<dyn Entity>> {
    let mut entities: Vec<Box<dyn Entity>> = Vec::new();
    entities.extend(sensor::entities(ctx, snapshot));
    entities.extend(binary_sensor::entities(ctx));
    entities.extend(switch::entities(ctx));
    entities.extend(select::entities(ctx));
    entities.extend(number::entities(ctx));
    entities.extend(fan::entities(ctx));
    entities.extend(button::entities(ctx));
    entities.extend(datetime::entities(ctx));
    entities.extend(text::entities(ctx));
    entities
}

#[cfg(test)]
pub(crate) mod test_support {
    #![allow(clippy::unwrap_used)]

    use std::collections::BTreeMap;

    use serde_json::json;

    use crate::snapshot::{Snapshot, SystemData, ZoneData, ZoneIndex};

    /// A fully populated snapshot for adapter tests.
    pub(crate) fn snapshot() -> Snapshot {
        let system_fields = json!({
            "system_type": "SC100",
            "system_version": "3.1",
            "fw_app_version_str": "2.4.1",
            "fw_app_version": 241,
            "air_quality": 512.0,
            "air_pressure": 1013.0,
            "indoor_humidity": 48.0,
            "indoor_temperature": 21.5,
            "runtime": 1234.0,
            "boot_time": 1_700_000_000,
            "iaq_accuracy": 2,
            "num_zones": 3,
            "modelock": false,
            "notification": "",
            "supports_auto_update": true,
            "auto_update_enabled": false,
            "time_profiles": [
                { "name": "Workday", "data": [1, 2] },
                { "name": "Weekend" }
            ]
        });
        let system = SystemData::from_wire(
            "AABBCC",
            system_fields.as_object().unwrap(),
            chrono::Utc::now(),
        );

        let mut zones = BTreeMap::new();
        for index in ZoneIndex::ALL {
            let fields = json!({
                "name": format!("Room {}", index.get()),
                "speed": 1.5,
                "mode": "ventilate",
                "temperature": 21.0,
                "humidity": 45.0,
                "outdoor_temperature": 8.0,
                "outdoor_humidity": 70.0,
                "runtime": 500.0,
                "last_filter_change": 120.0,
                "target_temp": 22.0,
                "target_hmdty_level": 2,
                "auto_mode_voc": true,
                "auto_mode_silent": false,
                "mode_deadline": 0,
                "active_time_profile": 1
            });
            zones.insert(
                index,
                ZoneData::from_wire(index, fields.as_object().unwrap()),
            );
        }

        Snapshot { system, zones }
    }

    pub(crate) fn zone(index: u8) -> ZoneIndex {
        ZoneIndex::new(index).unwrap()
    }
}
