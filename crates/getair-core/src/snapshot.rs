// Snapshot model
//
// The coordinator's consolidated view of one ventilation system:
// a system record plus exactly three zone records. A snapshot is
// immutable once published — each successful poll cycle replaces the
// previous one wholesale.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::CoreError;

/// Validated zone index, always in 1..=3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ZoneIndex(u8);

impl ZoneIndex {
    pub const ALL: [ZoneIndex; 3] = [ZoneIndex(1), ZoneIndex(2), ZoneIndex(3)];

    pub fn new(index: u8) -> Result<Self, CoreError> {
        if (1..=3).contains(&index) {
            Ok(Self(index))
        } else {
            Err(CoreError::InvalidZone { index })
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl fmt::Display for ZoneIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One of the ten named schedule slots a zone can activate.
#[derive(Debug, Clone, Serialize)]
pub struct TimeProfile {
    pub slot: u8,
    pub name: String,
    pub data: Option<Value>,
}

/// System-level attributes of one poll cycle.
#[derive(Debug, Clone, Serialize)]
pub struct SystemData {
    pub system_id: String,
    pub system_type: Option<String>,
    pub system_type_name: Option<String>,
    pub system_version: Option<String>,
    pub fw_version: Option<String>,
    pub fw_app_version: Option<i64>,
    pub air_quality: Option<f64>,
    pub air_pressure: Option<f64>,
    pub humidity: Option<f64>,
    pub temperature: Option<f64>,
    pub runtime_hours: Option<f64>,
    pub boot_time: Option<DateTime<Utc>>,
    pub iaq_accuracy: Option<i64>,
    pub num_zones: u8,
    pub modelock: bool,
    pub notification: Option<String>,
    pub notify_time: Option<DateTime<Utc>>,
    pub supports_auto_update: bool,
    pub auto_update_enabled: bool,
    /// Slots 1..=10; unnamed slots carry an empty name.
    pub time_profiles: Vec<TimeProfile>,
    pub last_update: DateTime<Utc>,
    pub connection_status: String,
}

/// Per-zone attributes. A zone whose read failed degrades to a stub
/// record carrying only its index and default name.
#[derive(Debug, Clone, Serialize)]
pub struct ZoneData {
    pub zone_index: ZoneIndex,
    pub name: String,
    pub speed: Option<f64>,
    pub mode: Option<String>,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub outdoor_temperature: Option<f64>,
    pub outdoor_humidity: Option<f64>,
    pub runtime_hours: Option<f64>,
    pub filter_runtime_hours: Option<f64>,
    pub target_temperature: Option<f64>,
    pub target_humidity_level: Option<i64>,
    pub auto_mode_voc: Option<bool>,
    pub auto_mode_silent: Option<bool>,
    /// Unix timestamp; 0 or absent means no deadline is armed.
    pub mode_deadline: Option<i64>,
    pub time_profile: Option<i64>,
}

/// Consolidated system + zone state for one device.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub system: SystemData,
    pub zones: BTreeMap<ZoneIndex, ZoneData>,
}

impl Snapshot {
    pub fn zone(&self, index: ZoneIndex) -> Option<&ZoneData> {
        self.zones.get(&index)
    }
}

// ── Wire compilation ─────────────────────────────────────────────────

fn f64_field(fields: &Map<String, Value>, key: &str) -> Option<f64> {
    fields.get(key).and_then(Value::as_f64)
}

fn i64_field(fields: &Map<String, Value>, key: &str) -> Option<i64> {
    fields.get(key).and_then(Value::as_i64)
}

fn bool_field(fields: &Map<String, Value>, key: &str) -> Option<bool> {
    fields.get(key).and_then(Value::as_bool)
}

fn str_field(fields: &Map<String, Value>, key: &str) -> Option<String> {
    fields
        .get(key)
        .and_then(Value::as_str)
        .map(ToOwned::to_owned)
}

fn timestamp_field(fields: &Map<String, Value>, key: &str) -> Option<DateTime<Utc>> {
    i64_field(fields, key).and_then(|secs| DateTime::from_timestamp(secs, 0))
}

impl SystemData {
    /// Compile the system record from the wire property map.
    pub(crate) fn from_wire(
        system_id: &str,
        fields: &Map<String, Value>,
        now: DateTime<Utc>,
    ) -> Self {
        let system_type = str_field(fields, "system_type");

        let time_profiles = (1..=10u8)
            .map(|slot| {
                let entry = fields
                    .get("time_profiles")
                    .and_then(Value::as_array)
                    .and_then(|profiles| profiles.get(usize::from(slot) - 1));
                TimeProfile {
                    slot,
                    name: entry
                        .and_then(|p| p.get("name"))
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_owned(),
                    data: entry.and_then(|p| p.get("data")).cloned(),
                }
            })
            .collect();

        Self {
            system_id: system_id.to_owned(),
            system_type_name: str_field(fields, "system_type_name").or_else(|| system_type.clone()),
            system_type,
            system_version: str_field(fields, "system_version"),
            fw_version: str_field(fields, "fw_app_version_str"),
            fw_app_version: i64_field(fields, "fw_app_version"),
            air_quality: f64_field(fields, "air_quality"),
            air_pressure: f64_field(fields, "air_pressure"),
            humidity: f64_field(fields, "indoor_humidity"),
            temperature: f64_field(fields, "indoor_temperature"),
            runtime_hours: f64_field(fields, "runtime"),
            boot_time: timestamp_field(fields, "boot_time"),
            iaq_accuracy: i64_field(fields, "iaq_accuracy"),
            num_zones: i64_field(fields, "num_zones")
                .and_then(|n| u8::try_from(n).ok())
                .unwrap_or(3),
            modelock: bool_field(fields, "modelock").unwrap_or(false),
            notification: str_field(fields, "notification"),
            notify_time: timestamp_field(fields, "notify_time"),
            supports_auto_update: bool_field(fields, "supports_auto_update").unwrap_or(false),
            auto_update_enabled: bool_field(fields, "auto_update_enabled").unwrap_or(false),
            time_profiles,
            last_update: now,
            connection_status: "online".to_owned(),
        }
    }

    /// The named (non-empty) time profile slots.
    pub fn named_time_profiles(&self) -> impl Iterator<Item = &TimeProfile> {
        self.time_profiles
            .iter()
            .filter(|p| !p.name.trim().is_empty())
    }
}

impl ZoneData {
    /// Compile one zone record from its wire property map.
    pub(crate) fn from_wire(index: ZoneIndex, fields: &Map<String, Value>) -> Self {
        Self {
            zone_index: index,
            name: str_field(fields, "name")
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| format!("Zone {index}")),
            speed: f64_field(fields, "speed"),
            mode: str_field(fields, "mode"),
            temperature: f64_field(fields, "temperature"),
            humidity: f64_field(fields, "humidity"),
            outdoor_temperature: f64_field(fields, "outdoor_temperature"),
            outdoor_humidity: f64_field(fields, "outdoor_humidity"),
            runtime_hours: f64_field(fields, "runtime"),
            filter_runtime_hours: f64_field(fields, "last_filter_change"),
            target_temperature: f64_field(fields, "target_temp"),
            target_humidity_level: i64_field(fields, "target_hmdty_level"),
            auto_mode_voc: bool_field(fields, "auto_mode_voc"),
            auto_mode_silent: bool_field(fields, "auto_mode_silent"),
            mode_deadline: i64_field(fields, "mode_deadline"),
            // Some firmware exposes the active profile only under the
            // `active_`-prefixed name.
            time_profile: i64_field(fields, "active_time_profile")
                .or_else(|| i64_field(fields, "time_profile")),
        }
    }

    /// Minimal record for a zone whose read failed this cycle.
    pub fn stub(index: ZoneIndex) -> Self {
        Self {
            zone_index: index,
            name: format!("Zone {index}"),
            speed: None,
            mode: None,
            temperature: None,
            humidity: None,
            outdoor_temperature: None,
            outdoor_humidity: None,
            runtime_hours: None,
            filter_runtime_hours: None,
            target_temperature: None,
            target_humidity_level: None,
            auto_mode_voc: None,
            auto_mode_silent: None,
            mode_deadline: None,
            time_profile: None,
        }
    }

    /// True when this record carries nothing beyond name and index.
    pub fn is_stub(&self) -> bool {
        self.speed.is_none()
            && self.mode.is_none()
            && self.temperature.is_none()
            && self.humidity.is_none()
            && self.outdoor_temperature.is_none()
            && self.outdoor_humidity.is_none()
            && self.runtime_hours.is_none()
            && self.filter_runtime_hours.is_none()
            && self.target_temperature.is_none()
            && self.target_humidity_level.is_none()
            && self.auto_mode_voc.is_none()
            && self.auto_mode_silent.is_none()
            && self.mode_deadline.is_none()
            && self.time_profile.is_none()
    }
}
