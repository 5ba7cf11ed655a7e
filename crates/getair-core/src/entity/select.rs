// Select adapters
//
// Operating mode, target humidity level, and active time profile.
// Options are presented as human labels; writes translate the label
// back to the wire value.

use serde_json::json;

use crate::coordinator::Coordinator;
use crate::snapshot::{Snapshot, ZoneIndex};

use super::{Entity, EntityContext, EntityDomain, EntityScope, EntityValue, unique_id, zone_name};

/// Operating modes accepted by the device, in menu order.
pub const AVAILABLE_MODES: [&str; 8] = [
    "ventilate",
    "ventilate_hr",
    "ventilate_inv",
    "night",
    "auto",
    "rush",
    "rush_hr",
    "rush_inv",
];

/// Human label for a wire mode value.
pub fn mode_label(mode: &str) -> Option<&'static str> {
    match mode {
        "ventilate" => Some("Ventilate"),
        "ventilate_hr" => Some("Ventilate (heat recovery)"),
        "ventilate_inv" => Some("Inverse ventilate"),
        "night" => Some("Night"),
        "auto" => Some("Auto"),
        "rush" => Some("Boost"),
        "rush_hr" => Some("Boost (heat recovery)"),
        "rush_inv" => Some("Inverse boost"),
        _ => None,
    }
}

/// Wire mode value for a human label.
pub fn mode_from_label(label: &str) -> Option<&'static str> {
    AVAILABLE_MODES
        .into_iter()
        .find(|mode| mode_label(mode) == Some(label))
}

/// Discrete target humidity levels.
pub const HUMIDITY_LEVELS: [(i64, &str); 4] =
    [(0, "Off"), (1, "Low"), (2, "Medium"), (3, "High")];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneSelectKind {
    Mode,
    TargetHumidityLevel,
    TimeProfile,
}

pub const ZONE_SELECTS: [ZoneSelectKind; 3] = [
    ZoneSelectKind::Mode,
    ZoneSelectKind::TargetHumidityLevel,
    ZoneSelectKind::TimeProfile,
];

impl ZoneSelectKind {
    fn key(self) -> &'static str {
        match self {
            Self::Mode => "operating_mode",
            Self::TargetHumidityLevel => "target_humidity_select",
            Self::TimeProfile => "time_profile_select",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Mode => "Operating mode",
            Self::TargetHumidityLevel => "Target humidity",
            Self::TimeProfile => "Time profile",
        }
    }
}

pub struct ZoneSelect {
    id: String,
    zone: ZoneIndex,
    kind: ZoneSelectKind,
}

impl ZoneSelect {
    pub fn new(ctx: &EntityContext, zone: ZoneIndex, kind: ZoneSelectKind) -> Self {
        Self {
            id: unique_id(&ctx.device_id, EntityScope::Zone(zone), kind.key()),
            zone,
            kind,
        }
    }

    /// Selectable options. Time-profile options track the named slots
    /// in the current snapshot.
    pub fn options(&self, snapshot: &Snapshot) -> Vec<String> {
        match self.kind {
            ZoneSelectKind::Mode => AVAILABLE_MODES
                .into_iter()
                .filter_map(mode_label)
                .map(ToOwned::to_owned)
                .collect(),
            ZoneSelectKind::TargetHumidityLevel => HUMIDITY_LEVELS
                .into_iter()
                .map(|(_, label)| label.to_owned())
                .collect(),
            ZoneSelectKind::TimeProfile => snapshot
                .system
                .named_time_profiles()
                .map(|p| p.name.clone())
                .collect(),
        }
    }

    /// Label of the currently active option.
    pub fn current(&self, snapshot: &Snapshot) -> Option<String> {
        let zone = snapshot.zone(self.zone)?;
        match self.kind {
            ZoneSelectKind::Mode => {
                let mode = zone.mode.as_deref()?;
                // Unknown wire values pass through so state is never lost.
                Some(mode_label(mode).map_or_else(|| mode.to_owned(), ToOwned::to_owned))
            }
            ZoneSelectKind::TargetHumidityLevel => {
                let level = zone.target_humidity_level?;
                HUMIDITY_LEVELS
                    .into_iter()
                    .find(|(value, _)| *value == level)
                    .map(|(_, label)| label.to_owned())
            }
            ZoneSelectKind::TimeProfile => {
                let slot = zone.time_profile?;
                snapshot
                    .system
                    .time_profiles
                    .iter()
                    .find(|p| i64::from(p.slot) == slot && !p.name.trim().is_empty())
                    .map(|p| p.name.clone())
            }
        }
    }

    /// Apply an option by its label. Unknown labels fail without a
    /// request.
    pub async fn select(&self, coordinator: &Coordinator, option: &str) -> bool {
        match self.kind {
            ZoneSelectKind::Mode => {
                let Some(mode) = mode_from_label(option).or_else(|| {
                    // Accept raw wire values too, mainly for scripting.
                    AVAILABLE_MODES.into_iter().find(|m| *m == option)
                }) else {
                    tracing::error!("unknown mode option: {option}");
                    return false;
                };
                coordinator.set_zone_mode(self.zone, mode).await
            }
            ZoneSelectKind::TargetHumidityLevel => {
                let Some((level, _)) = HUMIDITY_LEVELS
                    .into_iter()
                    .find(|(_, label)| *label == option)
                else {
                    tracing::error!("unknown humidity level option: {option}");
                    return false;
                };
                coordinator
                    .set_zone_property(self.zone, "target_hmdty_level", json!(level))
                    .await
            }
            ZoneSelectKind::TimeProfile => {
                let slot = coordinator.snapshot().and_then(|snapshot| {
                    snapshot
                        .system
                        .named_time_profiles()
                        .find(|p| p.name == option)
                        .map(|p| p.slot)
                });
                let Some(slot) = slot else {
                    tracing::error!("unknown time profile option: {option}");
                    return false;
                };
                coordinator
                    .set_zone_property(self.zone, "time_profile", json!(slot))
                    .await
            }
        }
    }
}

impl Entity for ZoneSelect {
    fn unique_id(&self) -> &str {
        &self.id
    }

    fn domain(&self) -> EntityDomain {
        EntityDomain::Select
    }

    fn scope(&self) -> EntityScope {
        EntityScope::Zone(self.zone)
    }

    fn name(&self, snapshot: &Snapshot) -> String {
        format!("{} {}", zone_name(snapshot, self.zone), self.kind.label())
    }

    fn state(&self, snapshot: &Snapshot) -> Option<EntityValue> {
        self.current(snapshot).map(EntityValue::Text)
    }
}

pub fn entities(ctx: &EntityContext) -> Vec<Box<dyn Entity>> {
    let mut out: Vec<Box<dyn Entity>> = Vec::new();
    for zone in ctx.enabled_zones.iter() {
        for kind in ZONE_SELECTS {
            out.push(Box::new(ZoneSelect::new(ctx, zone, kind)));
        }
    }
    out
}
