// Switch adapters
//
// The two per-zone auto-mode flags, writable through the coordinator.

use serde_json::json;

use crate::coordinator::Coordinator;
use crate::snapshot::{Snapshot, ZoneIndex};

use super::{Entity, EntityContext, EntityDomain, EntityScope, EntityValue, unique_id, zone_name};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneSwitchKind {
    AutoModeVoc,
    AutoModeSilent,
}

pub const ZONE_SWITCHES: [ZoneSwitchKind; 2] =
    [ZoneSwitchKind::AutoModeVoc, ZoneSwitchKind::AutoModeSilent];

impl ZoneSwitchKind {
    /// Logical property name written through the coordinator.
    pub fn property(self) -> &'static str {
        match self {
            Self::AutoModeVoc => "auto_mode_voc",
            Self::AutoModeSilent => "auto_mode_silent",
        }
    }

    fn key(self) -> &'static str {
        match self {
            Self::AutoModeVoc => "voc_switch",
            Self::AutoModeSilent => "silent_switch",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::AutoModeVoc => "VOC auto mode",
            Self::AutoModeSilent => "Silent mode",
        }
    }
}

pub struct ZoneSwitch {
    id: String,
    zone: ZoneIndex,
    kind: ZoneSwitchKind,
}

impl ZoneSwitch {
    pub fn new(ctx: &EntityContext, zone: ZoneIndex, kind: ZoneSwitchKind) -> Self {
        Self {
            id: unique_id(&ctx.device_id, EntityScope::Zone(zone), kind.key()),
            zone,
            kind,
        }
    }

    pub fn is_on(&self, snapshot: &Snapshot) -> Option<bool> {
        let zone = snapshot.zone(self.zone)?;
        match self.kind {
            ZoneSwitchKind::AutoModeVoc => zone.auto_mode_voc,
            ZoneSwitchKind::AutoModeSilent => zone.auto_mode_silent,
        }
    }

    pub async fn turn_on(&self, coordinator: &Coordinator) -> bool {
        coordinator
            .set_zone_property(self.zone, self.kind.property(), json!(true))
            .await
    }

    pub async fn turn_off(&self, coordinator: &Coordinator) -> bool {
        coordinator
            .set_zone_property(self.zone, self.kind.property(), json!(false))
            .await
    }
}

impl Entity for ZoneSwitch {
    fn unique_id(&self) -> &str {
        &self.id
    }

    fn domain(&self) -> EntityDomain {
        EntityDomain::Switch
    }

    fn scope(&self) -> EntityScope {
        EntityScope::Zone(self.zone)
    }

    fn name(&self, snapshot: &Snapshot) -> String {
        format!("{} {}", zone_name(snapshot, self.zone), self.kind.label())
    }

    fn state(&self, snapshot: &Snapshot) -> Option<EntityValue> {
        self.is_on(snapshot).map(EntityValue::Bool)
    }
}

pub fn entities(ctx: &EntityContext) -> Vec<Box<dyn Entity>> {
    let mut out: Vec<Box<dyn Entity>> = Vec::new();
    for zone in ctx.enabled_zones.iter() {
        for kind in ZONE_SWITCHES {
            out.push(Box::new(ZoneSwitch::new(ctx, zone, kind)));
        }
    }
    out
}
