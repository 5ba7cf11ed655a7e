// Number adapters
//
// Target temperature, filter runtime, and the two mode-deadline
// controls. The raw Unix control exists for power users and is meant
// to stay hidden by default; the offset control is the friendly one
// (minutes from now, writing an absolute deadline).

use chrono::Utc;
use serde_json::json;

use crate::coordinator::Coordinator;
use crate::snapshot::{Snapshot, ZoneIndex};

use super::{Entity, EntityContext, EntityDomain, EntityScope, EntityValue, unique_id, zone_name};

/// Presentation hint for a number control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberMode {
    Slider,
    Box,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneNumberKind {
    TargetTemperature,
    FilterRuntime,
    ModeDeadlineUnix,
    ModeDeadlineOffset,
}

pub const ZONE_NUMBERS: [ZoneNumberKind; 4] = [
    ZoneNumberKind::TargetTemperature,
    ZoneNumberKind::FilterRuntime,
    ZoneNumberKind::ModeDeadlineUnix,
    ZoneNumberKind::ModeDeadlineOffset,
];

impl ZoneNumberKind {
    fn key(self) -> &'static str {
        match self {
            Self::TargetTemperature => "target_temp_control",
            Self::FilterRuntime => "filter_runtime_control",
            Self::ModeDeadlineUnix => "mode_deadline_unix_control",
            Self::ModeDeadlineOffset => "mode_deadline_offset_control",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::TargetTemperature => "Target temperature",
            Self::FilterRuntime => "Filter runtime",
            Self::ModeDeadlineUnix => "Mode deadline (Unix)",
            Self::ModeDeadlineOffset => "Mode duration (minutes from now)",
        }
    }

    pub fn range(self) -> (f64, f64, f64) {
        match self {
            Self::TargetTemperature => (10.0, 30.0, 0.5),
            Self::FilterRuntime => (0.0, 10_000.0, 1.0),
            Self::ModeDeadlineUnix => (0.0, 2_147_483_647.0, 1.0),
            Self::ModeDeadlineOffset => (0.0, 120.0, 5.0),
        }
    }

    pub fn unit(self) -> Option<&'static str> {
        match self {
            Self::TargetTemperature => Some("°C"),
            Self::FilterRuntime => Some("h"),
            Self::ModeDeadlineUnix => None,
            Self::ModeDeadlineOffset => Some("min"),
        }
    }

    pub fn mode(self) -> NumberMode {
        match self {
            Self::TargetTemperature | Self::ModeDeadlineOffset => NumberMode::Slider,
            Self::FilterRuntime | Self::ModeDeadlineUnix => NumberMode::Box,
        }
    }

    /// Whether the control should be visible out of the box.
    pub fn enabled_by_default(self) -> bool {
        !matches!(self, Self::ModeDeadlineUnix)
    }
}

pub struct ZoneNumber {
    id: String,
    zone: ZoneIndex,
    kind: ZoneNumberKind,
}

impl ZoneNumber {
    pub fn new(ctx: &EntityContext, zone: ZoneIndex, kind: ZoneNumberKind) -> Self {
        Self {
            id: unique_id(&ctx.device_id, EntityScope::Zone(zone), kind.key()),
            zone,
            kind,
        }
    }

    pub fn kind(&self) -> ZoneNumberKind {
        self.kind
    }

    #[allow(clippy::cast_precision_loss)]
    pub fn value(&self, snapshot: &Snapshot) -> Option<f64> {
        let zone = snapshot.zone(self.zone)?;
        match self.kind {
            ZoneNumberKind::TargetTemperature => zone.target_temperature,
            ZoneNumberKind::FilterRuntime => zone.filter_runtime_hours,
            ZoneNumberKind::ModeDeadlineUnix => zone.mode_deadline.map(|d| d as f64),
            ZoneNumberKind::ModeDeadlineOffset => {
                let deadline = zone.mode_deadline.unwrap_or(0);
                if deadline <= 0 {
                    return Some(0.0);
                }
                let remaining = (deadline - Utc::now().timestamp()).max(0) / 60;
                Some(remaining as f64)
            }
        }
    }

    /// Write the control value through the coordinator.
    #[allow(clippy::cast_possible_truncation)]
    pub async fn set(&self, coordinator: &Coordinator, value: f64) -> bool {
        match self.kind {
            ZoneNumberKind::TargetTemperature => {
                coordinator
                    .set_zone_property(self.zone, "target_temp", json!(value))
                    .await
            }
            ZoneNumberKind::FilterRuntime => {
                coordinator
                    .set_zone_property(self.zone, "last_filter_change", json!(value))
                    .await
            }
            ZoneNumberKind::ModeDeadlineUnix => {
                coordinator
                    .set_zone_property(self.zone, "mode_deadline", json!(value.round() as i64))
                    .await
            }
            ZoneNumberKind::ModeDeadlineOffset => {
                // Minutes from now become an absolute deadline.
                let deadline = Utc::now().timestamp() + (value.round() as i64) * 60;
                coordinator
                    .set_zone_property(self.zone, "mode_deadline", json!(deadline))
                    .await
            }
        }
    }
}

impl Entity for ZoneNumber {
    fn unique_id(&self) -> &str {
        &self.id
    }

    fn domain(&self) -> EntityDomain {
        EntityDomain::Number
    }

    fn scope(&self) -> EntityScope {
        EntityScope::Zone(self.zone)
    }

    fn name(&self, snapshot: &Snapshot) -> String {
        format!("{} {}", zone_name(snapshot, self.zone), self.kind.label())
    }

    fn state(&self, snapshot: &Snapshot) -> Option<EntityValue> {
        self.value(snapshot).map(EntityValue::Float)
    }
}

pub fn entities(ctx: &EntityContext) -> Vec<Box<dyn Entity>> {
    let mut out: Vec<Box<dyn Entity>> = Vec::new();
    for zone in ctx.enabled_zones.iter() {
        for kind in ZONE_NUMBERS {
            out.push(Box::new(ZoneNumber::new(ctx, zone, kind)));
        }
    }
    out
}
