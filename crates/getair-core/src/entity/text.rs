// Text adapter
//
// Editable zone name, 1–50 characters.

use serde_json::json;

use crate::coordinator::Coordinator;
use crate::snapshot::{Snapshot, ZoneIndex};

use super::{Entity, EntityContext, EntityDomain, EntityScope, EntityValue, unique_id, zone_name};

pub const NAME_MIN_LENGTH: usize = 1;
pub const NAME_MAX_LENGTH: usize = 50;

pub struct ZoneNameText {
    id: String,
    zone: ZoneIndex,
}

impl ZoneNameText {
    pub fn new(ctx: &EntityContext, zone: ZoneIndex) -> Self {
        Self {
            id: unique_id(&ctx.device_id, EntityScope::Zone(zone), "name"),
            zone,
        }
    }

    pub fn value(&self, snapshot: &Snapshot) -> Option<String> {
        snapshot.zone(self.zone).map(|z| z.name.clone())
    }

    /// Rename the zone. Length limits are enforced locally.
    pub async fn set(&self, coordinator: &Coordinator, value: &str) -> bool {
        let length = value.chars().count();
        if !(NAME_MIN_LENGTH..=NAME_MAX_LENGTH).contains(&length) {
            tracing::error!(
                "zone name must be {NAME_MIN_LENGTH}-{NAME_MAX_LENGTH} characters, got {length}"
            );
            return false;
        }
        coordinator
            .set_zone_property(self.zone, "name", json!(value))
            .await
    }
}

impl Entity for ZoneNameText {
    fn unique_id(&self) -> &str {
        &self.id
    }

    fn domain(&self) -> EntityDomain {
        EntityDomain::Text
    }

    fn scope(&self) -> EntityScope {
        EntityScope::Zone(self.zone)
    }

    fn name(&self, snapshot: &Snapshot) -> String {
        format!("{} Name", zone_name(snapshot, self.zone))
    }

    fn state(&self, snapshot: &Snapshot) -> Option<EntityValue> {
        self.value(snapshot).map(EntityValue::Text)
    }
}

pub fn entities(ctx: &EntityContext) -> Vec<Box<dyn Entity>> {
    ctx.enabled_zones
        .iter()
        .map(|zone| Box::new(ZoneNameText::new(ctx, zone)) as Box<dyn Entity>)
        .collect()
}
