// Datetime adapter
//
// Mode-deadline picker: reads the armed deadline as a UTC instant,
// writes a picked instant back as a Unix timestamp.

use chrono::{DateTime, Utc};
use serde_json::json;

use crate::coordinator::Coordinator;
use crate::snapshot::{Snapshot, ZoneIndex};

use super::{Entity, EntityContext, EntityDomain, EntityScope, EntityValue, unique_id, zone_name};

pub struct ZoneDeadlineDateTime {
    id: String,
    zone: ZoneIndex,
}

impl ZoneDeadlineDateTime {
    pub fn new(ctx: &EntityContext, zone: ZoneIndex) -> Self {
        Self {
            id: unique_id(
                &ctx.device_id,
                EntityScope::Zone(zone),
                "mode_deadline_datetime_control",
            ),
            zone,
        }
    }

    /// The armed deadline; 0 or absent reads as no deadline.
    pub fn value(&self, snapshot: &Snapshot) -> Option<DateTime<Utc>> {
        snapshot
            .zone(self.zone)?
            .mode_deadline
            .filter(|d| *d > 0)
            .and_then(|d| DateTime::from_timestamp(d, 0))
    }

    /// Arm the deadline at the given instant.
    pub async fn set(&self, coordinator: &Coordinator, value: DateTime<Utc>) -> bool {
        tracing::debug!(
            "setting mode_deadline for zone {} to {}",
            self.zone,
            value.to_rfc3339()
        );
        coordinator
            .set_zone_property(self.zone, "mode_deadline", json!(value.timestamp()))
            .await
    }
}

impl Entity for ZoneDeadlineDateTime {
    fn unique_id(&self) -> &str {
        &self.id
    }

    fn domain(&self) -> EntityDomain {
        EntityDomain::DateTime
    }

    fn scope(&self) -> EntityScope {
        EntityScope::Zone(self.zone)
    }

    fn name(&self, snapshot: &Snapshot) -> String {
        format!("{} Mode deadline", zone_name(snapshot, self.zone))
    }

    fn state(&self, snapshot: &Snapshot) -> Option<EntityValue> {
        self.value(snapshot).map(EntityValue::Timestamp)
    }
}

pub fn entities(ctx: &EntityContext) -> Vec<Box<dyn Entity>> {
    ctx.enabled_zones
        .iter()
        .map(|zone| Box::new(ZoneDeadlineDateTime::new(ctx, zone)) as Box<dyn Entity>)
        .collect()
}
