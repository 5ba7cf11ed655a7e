// Binary sensor adapters

use crate::snapshot::{Snapshot, ZoneIndex};

use super::{Entity, EntityContext, EntityDomain, EntityScope, EntityValue, unique_id, zone_name};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemBinarySensorKind {
    Modelock,
    SupportsAutoUpdate,
    AutoUpdateEnabled,
}

pub const SYSTEM_BINARY_SENSORS: [SystemBinarySensorKind; 3] = [
    SystemBinarySensorKind::Modelock,
    SystemBinarySensorKind::SupportsAutoUpdate,
    SystemBinarySensorKind::AutoUpdateEnabled,
];

impl SystemBinarySensorKind {
    fn key(self) -> &'static str {
        match self {
            Self::Modelock => "system_modelock_state",
            Self::SupportsAutoUpdate => "system_supports_auto_update",
            Self::AutoUpdateEnabled => "system_auto_update_enabled",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Modelock => "Mode lock",
            Self::SupportsAutoUpdate => "Auto-update supported",
            Self::AutoUpdateEnabled => "Auto-update enabled",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneBinarySensorKind {
    AutoModeVoc,
    AutoModeSilent,
}

pub const ZONE_BINARY_SENSORS: [ZoneBinarySensorKind; 2] = [
    ZoneBinarySensorKind::AutoModeVoc,
    ZoneBinarySensorKind::AutoModeSilent,
];

impl ZoneBinarySensorKind {
    fn key(self) -> &'static str {
        match self {
            Self::AutoModeVoc => "auto_mode_voc",
            Self::AutoModeSilent => "auto_mode_silent",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::AutoModeVoc => "VOC auto mode",
            Self::AutoModeSilent => "Silent mode",
        }
    }
}

pub struct SystemBinarySensor {
    id: String,
    kind: SystemBinarySensorKind,
}

impl SystemBinarySensor {
    pub fn new(ctx: &EntityContext, kind: SystemBinarySensorKind) -> Self {
        Self {
            id: unique_id(&ctx.device_id, EntityScope::System, kind.key()),
            kind,
        }
    }
}

impl Entity for SystemBinarySensor {
    fn unique_id(&self) -> &str {
        &self.id
    }

    fn domain(&self) -> EntityDomain {
        EntityDomain::BinarySensor
    }

    fn scope(&self) -> EntityScope {
        EntityScope::System
    }

    fn name(&self, _snapshot: &Snapshot) -> String {
        self.kind.label().to_owned()
    }

    fn state(&self, snapshot: &Snapshot) -> Option<EntityValue> {
        let value = match self.kind {
            SystemBinarySensorKind::Modelock => snapshot.system.modelock,
            SystemBinarySensorKind::SupportsAutoUpdate => snapshot.system.supports_auto_update,
            SystemBinarySensorKind::AutoUpdateEnabled => snapshot.system.auto_update_enabled,
        };
        Some(EntityValue::Bool(value))
    }
}

pub struct ZoneBinarySensor {
    id: String,
    zone: ZoneIndex,
    kind: ZoneBinarySensorKind,
}

impl ZoneBinarySensor {
    pub fn new(ctx: &EntityContext, zone: ZoneIndex, kind: ZoneBinarySensorKind) -> Self {
        Self {
            id: unique_id(&ctx.device_id, EntityScope::Zone(zone), kind.key()),
            zone,
            kind,
        }
    }
}

impl Entity for ZoneBinarySensor {
    fn unique_id(&self) -> &str {
        &self.id
    }

    fn domain(&self) -> EntityDomain {
        EntityDomain::BinarySensor
    }

    fn scope(&self) -> EntityScope {
        EntityScope::Zone(self.zone)
    }

    fn name(&self, snapshot: &Snapshot) -> String {
        format!("{} {}", zone_name(snapshot, self.zone), self.kind.label())
    }

    fn state(&self, snapshot: &Snapshot) -> Option<EntityValue> {
        let zone = snapshot.zone(self.zone)?;
        let value = match self.kind {
            ZoneBinarySensorKind::AutoModeVoc => zone.auto_mode_voc,
            ZoneBinarySensorKind::AutoModeSilent => zone.auto_mode_silent,
        };
        value.map(EntityValue::Bool)
    }
}

pub fn entities(ctx: &EntityContext) -> Vec<Box<dyn Entity>> {
    let mut out: Vec<Box<dyn Entity>> = Vec::new();
    for kind in SYSTEM_BINARY_SENSORS {
        out.push(Box::new(SystemBinarySensor::new(ctx, kind)));
    }
    for zone in ctx.enabled_zones.iter() {
        for kind in ZONE_BINARY_SENSORS {
            out.push(Box::new(ZoneBinarySensor::new(ctx, zone, kind)));
        }
    }
    out
}
