// Button adapters
//
// Stateless reset actions: filter runtime and mode deadline both reset
// to zero.

use serde_json::json;

use crate::coordinator::Coordinator;
use crate::snapshot::{Snapshot, ZoneIndex};

use super::{Entity, EntityContext, EntityDomain, EntityScope, EntityValue, unique_id, zone_name};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneButtonKind {
    ResetFilterRuntime,
    ResetModeDeadline,
}

pub const ZONE_BUTTONS: [ZoneButtonKind; 2] = [
    ZoneButtonKind::ResetFilterRuntime,
    ZoneButtonKind::ResetModeDeadline,
];

impl ZoneButtonKind {
    /// Logical property reset by this button.
    pub fn property(self) -> &'static str {
        match self {
            Self::ResetFilterRuntime => "last_filter_change",
            Self::ResetModeDeadline => "mode_deadline",
        }
    }

    fn key(self) -> &'static str {
        match self {
            Self::ResetFilterRuntime => "reset_filter_runtime",
            Self::ResetModeDeadline => "reset_mode_deadline",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::ResetFilterRuntime => "Reset filter runtime",
            Self::ResetModeDeadline => "Reset mode deadline",
        }
    }
}

pub struct ZoneButton {
    id: String,
    zone: ZoneIndex,
    kind: ZoneButtonKind,
}

impl ZoneButton {
    pub fn new(ctx: &EntityContext, zone: ZoneIndex, kind: ZoneButtonKind) -> Self {
        Self {
            id: unique_id(&ctx.device_id, EntityScope::Zone(zone), kind.key()),
            zone,
            kind,
        }
    }

    /// Fire the reset.
    pub async fn press(&self, coordinator: &Coordinator) -> bool {
        tracing::info!(
            "resetting {} for zone {}",
            self.kind.property(),
            self.zone
        );
        coordinator
            .set_zone_property(self.zone, self.kind.property(), json!(0))
            .await
    }
}

impl Entity for ZoneButton {
    fn unique_id(&self) -> &str {
        &self.id
    }

    fn domain(&self) -> EntityDomain {
        EntityDomain::Button
    }

    fn scope(&self) -> EntityScope {
        EntityScope::Zone(self.zone)
    }

    fn name(&self, snapshot: &Snapshot) -> String {
        format!("{} {}", zone_name(snapshot, self.zone), self.kind.label())
    }

    fn state(&self, _snapshot: &Snapshot) -> Option<EntityValue> {
        None
    }
}

pub fn entities(ctx: &EntityContext) -> Vec<Box<dyn Entity>> {
    let mut out: Vec<Box<dyn Entity>> = Vec::new();
    for zone in ctx.enabled_zones.iter() {
        for kind in ZONE_BUTTONS {
            out.push(Box::new(ZoneButton::new(ctx, zone, kind)));
        }
    }
    out
}
