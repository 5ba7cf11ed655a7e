// Sensor adapters
//
// Read-only measurements and info fields. System sensors include one
// dynamic entry per named time-profile slot, so the set depends on the
// snapshot the catalog was built from.

use chrono::{DateTime, Utc};

use crate::snapshot::{Snapshot, SystemData, ZoneData, ZoneIndex};

use super::{Entity, EntityContext, EntityDomain, EntityScope, EntityValue, unique_id, zone_name};

/// System-level sensor kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemSensorKind {
    AirQuality,
    AirPressure,
    Humidity,
    Temperature,
    Runtime,
    BootTime,
    IaqAccuracy,
    NumZones,
    LastUpdate,
    ConnectionStatus,
    SystemType,
    SystemVersion,
    FwAppVersion,
    Notification,
    NotifyTime,
    /// Name of one of the ten schedule slots; only instantiated for
    /// slots that carry a name.
    TimeProfileName(u8),
}

/// The static system sensor set (dynamic profile-name sensors excluded).
pub const SYSTEM_SENSORS: [SystemSensorKind; 15] = [
    SystemSensorKind::AirQuality,
    SystemSensorKind::AirPressure,
    SystemSensorKind::Humidity,
    SystemSensorKind::Temperature,
    SystemSensorKind::Runtime,
    SystemSensorKind::BootTime,
    SystemSensorKind::IaqAccuracy,
    SystemSensorKind::NumZones,
    SystemSensorKind::LastUpdate,
    SystemSensorKind::ConnectionStatus,
    SystemSensorKind::SystemType,
    SystemSensorKind::SystemVersion,
    SystemSensorKind::FwAppVersion,
    SystemSensorKind::Notification,
    SystemSensorKind::NotifyTime,
];

impl SystemSensorKind {
    fn key(self) -> String {
        match self {
            Self::AirQuality => "system_air_quality_iaq".into(),
            Self::AirPressure => "system_air_pressure_hpa".into(),
            Self::Humidity => "system_humidity_percent".into(),
            Self::Temperature => "system_temperature_celsius".into(),
            Self::Runtime => "system_runtime_hours".into(),
            Self::BootTime => "system_boot_time".into(),
            Self::IaqAccuracy => "system_iaq_accuracy_level".into(),
            Self::NumZones => "system_num_zones_count".into(),
            Self::LastUpdate => "system_last_update".into(),
            Self::ConnectionStatus => "system_connection_status".into(),
            Self::SystemType => "system_type_name".into(),
            Self::SystemVersion => "system_version".into(),
            Self::FwAppVersion => "system_fw_app_version".into(),
            Self::Notification => "system_notification".into(),
            Self::NotifyTime => "system_notification_time".into(),
            Self::TimeProfileName(slot) => format!("time_profile_{slot}_name"),
        }
    }

    pub fn label(self) -> String {
        match self {
            Self::AirQuality => "Air quality (IAQ)".into(),
            Self::AirPressure => "Air pressure".into(),
            Self::Humidity => "Humidity".into(),
            Self::Temperature => "Temperature".into(),
            Self::Runtime => "Total runtime".into(),
            Self::BootTime => "Boot time".into(),
            Self::IaqAccuracy => "IAQ accuracy".into(),
            Self::NumZones => "Zone count".into(),
            Self::LastUpdate => "Last update".into(),
            Self::ConnectionStatus => "Connection status".into(),
            Self::SystemType => "System type".into(),
            Self::SystemVersion => "System version".into(),
            Self::FwAppVersion => "Firmware version".into(),
            Self::Notification => "Notification".into(),
            Self::NotifyTime => "Notification time".into(),
            Self::TimeProfileName(slot) => format!("Time profile {slot} name"),
        }
    }

    pub fn unit(self) -> Option<&'static str> {
        match self {
            Self::AirQuality => Some("ppm"),
            Self::AirPressure => Some("hPa"),
            Self::Humidity => Some("%"),
            Self::Temperature => Some("°C"),
            Self::Runtime => Some("h"),
            _ => None,
        }
    }

    fn value(self, system: &SystemData) -> Option<EntityValue> {
        match self {
            Self::AirQuality => system.air_quality.map(EntityValue::Float),
            Self::AirPressure => system.air_pressure.map(EntityValue::Float),
            Self::Humidity => system.humidity.map(EntityValue::Float),
            Self::Temperature => system.temperature.map(EntityValue::Float),
            Self::Runtime => system.runtime_hours.map(EntityValue::Float),
            Self::BootTime => system.boot_time.map(EntityValue::Timestamp),
            Self::IaqAccuracy => system.iaq_accuracy.map(EntityValue::Int),
            Self::NumZones => Some(EntityValue::Int(i64::from(system.num_zones))),
            Self::LastUpdate => Some(EntityValue::Timestamp(system.last_update)),
            Self::ConnectionStatus => {
                Some(EntityValue::Text(system.connection_status.clone()))
            }
            Self::SystemType => system.system_type_name.clone().map(EntityValue::Text),
            Self::SystemVersion => system.system_version.clone().map(EntityValue::Text),
            Self::FwAppVersion => system.fw_app_version.map(EntityValue::Int),
            Self::Notification => Some(EntityValue::Text(
                system
                    .notification
                    .clone()
                    .filter(|n| !n.is_empty())
                    .unwrap_or_else(|| "none".into()),
            )),
            Self::NotifyTime => system.notify_time.map(EntityValue::Timestamp),
            Self::TimeProfileName(slot) => system
                .time_profiles
                .get(usize::from(slot) - 1)
                .map(|p| EntityValue::Text(p.name.clone())),
        }
    }
}

/// Per-zone sensor kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneSensorKind {
    Temperature,
    Humidity,
    OutdoorTemperature,
    OutdoorHumidity,
    Runtime,
    FilterRuntime,
    TargetTemperature,
    TargetHumidityLevel,
    TimeProfile,
    ModeDeadline,
    ModeDeadlineRemaining,
}

pub const ZONE_SENSORS: [ZoneSensorKind; 11] = [
    ZoneSensorKind::Temperature,
    ZoneSensorKind::Humidity,
    ZoneSensorKind::OutdoorTemperature,
    ZoneSensorKind::OutdoorHumidity,
    ZoneSensorKind::Runtime,
    ZoneSensorKind::FilterRuntime,
    ZoneSensorKind::TargetTemperature,
    ZoneSensorKind::TargetHumidityLevel,
    ZoneSensorKind::TimeProfile,
    ZoneSensorKind::ModeDeadline,
    ZoneSensorKind::ModeDeadlineRemaining,
];

impl ZoneSensorKind {
    fn key(self) -> &'static str {
        match self {
            Self::Temperature => "temperature_celsius",
            Self::Humidity => "humidity_percent",
            Self::OutdoorTemperature => "outdoor_temperature_celsius",
            Self::OutdoorHumidity => "outdoor_humidity_percent",
            Self::Runtime => "runtime_hours",
            Self::FilterRuntime => "filter_runtime_hours",
            Self::TargetTemperature => "target_temperature_celsius",
            Self::TargetHumidityLevel => "target_humidity_level",
            Self::TimeProfile => "time_profile_id",
            Self::ModeDeadline => "mode_deadline",
            Self::ModeDeadlineRemaining => "mode_deadline_remaining_minutes",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Temperature => "Temperature (indoor)",
            Self::Humidity => "Humidity (indoor)",
            Self::OutdoorTemperature => "Temperature (outdoor)",
            Self::OutdoorHumidity => "Humidity (outdoor)",
            Self::Runtime => "Runtime",
            Self::FilterRuntime => "Filter runtime",
            Self::TargetTemperature => "Target temperature",
            Self::TargetHumidityLevel => "Target humidity level",
            Self::TimeProfile => "Active time profile",
            Self::ModeDeadline => "Mode deadline",
            Self::ModeDeadlineRemaining => "Mode deadline remaining",
        }
    }

    pub fn unit(self) -> Option<&'static str> {
        match self {
            Self::Temperature | Self::OutdoorTemperature | Self::TargetTemperature => Some("°C"),
            Self::Humidity | Self::OutdoorHumidity => Some("%"),
            Self::Runtime | Self::FilterRuntime => Some("h"),
            Self::ModeDeadlineRemaining => Some("min"),
            _ => None,
        }
    }

    fn value(self, zone: &ZoneData) -> Option<EntityValue> {
        match self {
            Self::Temperature => zone.temperature.map(EntityValue::Float),
            Self::Humidity => zone.humidity.map(EntityValue::Float),
            Self::OutdoorTemperature => zone.outdoor_temperature.map(EntityValue::Float),
            Self::OutdoorHumidity => zone.outdoor_humidity.map(EntityValue::Float),
            Self::Runtime => zone.runtime_hours.map(EntityValue::Float),
            Self::FilterRuntime => zone.filter_runtime_hours.map(EntityValue::Float),
            Self::TargetTemperature => zone.target_temperature.map(EntityValue::Float),
            Self::TargetHumidityLevel => zone.target_humidity_level.map(EntityValue::Int),
            Self::TimeProfile => zone.time_profile.map(EntityValue::Int),
            Self::ModeDeadline => zone
                .mode_deadline
                .filter(|d| *d > 0)
                .and_then(|d| DateTime::from_timestamp(d, 0))
                .map(EntityValue::Timestamp),
            Self::ModeDeadlineRemaining => {
                let deadline = zone.mode_deadline.unwrap_or(0);
                if deadline <= 0 {
                    return Some(EntityValue::Int(0));
                }
                let remaining = (deadline - Utc::now().timestamp()).max(0) / 60;
                Some(EntityValue::Int(remaining))
            }
        }
    }
}

// ── Adapters ─────────────────────────────────────────────────────────

pub struct SystemSensor {
    id: String,
    kind: SystemSensorKind,
}

impl SystemSensor {
    pub fn new(ctx: &EntityContext, kind: SystemSensorKind) -> Self {
        Self {
            id: unique_id(&ctx.device_id, EntityScope::System, &kind.key()),
            kind,
        }
    }

    pub fn kind(&self) -> SystemSensorKind {
        self.kind
    }
}

impl Entity for SystemSensor {
    fn unique_id(&self) -> &str {
        &self.id
    }

    fn domain(&self) -> EntityDomain {
        EntityDomain::Sensor
    }

    fn scope(&self) -> EntityScope {
        EntityScope::System
    }

    fn name(&self, _snapshot: &Snapshot) -> String {
        self.kind.label()
    }

    fn state(&self, snapshot: &Snapshot) -> Option<EntityValue> {
        self.kind.value(&snapshot.system)
    }
}

pub struct ZoneSensor {
    id: String,
    zone: ZoneIndex,
    kind: ZoneSensorKind,
}

impl ZoneSensor {
    pub fn new(ctx: &EntityContext, zone: ZoneIndex, kind: ZoneSensorKind) -> Self {
        Self {
            id: unique_id(&ctx.device_id, EntityScope::Zone(zone), kind.key()),
            zone,
            kind,
        }
    }

    pub fn kind(&self) -> ZoneSensorKind {
        self.kind
    }
}

impl Entity for ZoneSensor {
    fn unique_id(&self) -> &str {
        &self.id
    }

    fn domain(&self) -> EntityDomain {
        EntityDomain::Sensor
    }

    fn scope(&self) -> EntityScope {
        EntityScope::Zone(self.zone)
    }

    fn name(&self, snapshot: &Snapshot) -> String {
        format!("{} {}", zone_name(snapshot, self.zone), self.kind.label())
    }

    fn state(&self, snapshot: &Snapshot) -> Option<EntityValue> {
        snapshot.zone(self.zone).and_then(|z| self.kind.value(z))
    }
}

/// All sensors for one device: the static system set, one entry per
/// named time-profile slot, and the zone set for each enabled zone.
pub fn entities(ctx: &EntityContext, snapshot: &Snapshot) -> Vec<Box<dyn Entity>> {
    let mut out: Vec<Box<dyn Entity>> = Vec::new();

    for kind in SYSTEM_SENSORS {
        out.push(Box::new(SystemSensor::new(ctx, kind)));
    }
    for profile in snapshot.system.named_time_profiles() {
        out.push(Box::new(SystemSensor::new(
            ctx,
            SystemSensorKind::TimeProfileName(profile.slot),
        )));
    }
    for zone in ctx.enabled_zones.iter() {
        for kind in ZONE_SENSORS {
            out.push(Box::new(ZoneSensor::new(ctx, zone, kind)));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use crate::entity::test_support;
    use crate::snapshot::ZoneData;

    use super::*;

    #[test]
    fn notification_sensor_reports_none_for_empty_string() {
        let snapshot = test_support::snapshot();
        let value = SystemSensorKind::Notification.value(&snapshot.system);
        assert_eq!(value, Some(EntityValue::Text("none".into())));
    }

    #[test]
    fn boot_time_is_a_timestamp() {
        let snapshot = test_support::snapshot();
        match SystemSensorKind::BootTime.value(&snapshot.system) {
            Some(EntityValue::Timestamp(ts)) => {
                assert_eq!(ts.timestamp(), 1_700_000_000);
            }
            other => panic!("expected timestamp, got {other:?}"),
        }
    }

    #[test]
    fn deadline_sensors_treat_zero_as_unarmed() {
        let snapshot = test_support::snapshot();
        let zone = snapshot.zone(test_support::zone(1)).unwrap();

        assert_eq!(ZoneSensorKind::ModeDeadline.value(zone), None);
        assert_eq!(
            ZoneSensorKind::ModeDeadlineRemaining.value(zone),
            Some(EntityValue::Int(0))
        );
    }

    #[test]
    fn deadline_remaining_counts_down_in_minutes() {
        let mut zone = ZoneData::stub(test_support::zone(1));
        zone.mode_deadline = Some(Utc::now().timestamp() + 600);

        match ZoneSensorKind::ModeDeadlineRemaining.value(&zone) {
            Some(EntityValue::Int(minutes)) => {
                assert!((8..=10).contains(&minutes), "got {minutes}");
            }
            other => panic!("expected minutes, got {other:?}"),
        }
    }

    #[test]
    fn stub_zone_reports_no_measurements() {
        let zone = ZoneData::stub(test_support::zone(2));
        assert_eq!(ZoneSensorKind::Temperature.value(&zone), None);
        assert_eq!(ZoneSensorKind::TimeProfile.value(&zone), None);
    }
}
