// Fan adapters
//
// One fan per zone. The device speaks a discrete 0.0–4.0 speed scale
// in half steps; the fan surface speaks percentages. Both directions
// snap to the nearest defined step, so a requested 46 % lands on the
// 45 % bucket and reads back as 45.

use std::sync::atomic::{AtomicU8, Ordering};

use crate::coordinator::Coordinator;
use crate::snapshot::{Snapshot, ZoneIndex};

use super::{Entity, EntityContext, EntityDomain, EntityScope, EntityValue, unique_id, zone_name};

/// Speed steps and their percentage buckets.
pub const SPEED_STEPS: [(f64, u8); 9] = [
    (0.0, 0),
    (0.5, 15),
    (1.0, 30),
    (1.5, 45),
    (2.0, 60),
    (2.5, 75),
    (3.0, 85),
    (3.5, 95),
    (4.0, 100),
];

pub const DEFAULT_TURN_ON_PERCENTAGE: u8 = 30;

/// Percentage bucket for a device speed, snapping to the nearest step.
pub fn speed_to_percentage(speed: f64) -> u8 {
    SPEED_STEPS
        .into_iter()
        .min_by(|a, b| (a.0 - speed).abs().total_cmp(&(b.0 - speed).abs()))
        .map_or(0, |(_, pct)| pct)
}

/// Device speed for a requested percentage, snapping to the nearest
/// bucket. Zero always maps to a full stop.
pub fn percentage_to_speed(percentage: u8) -> f64 {
    if percentage == 0 {
        return 0.0;
    }
    SPEED_STEPS
        .into_iter()
        .min_by_key(|(_, pct)| i16::from(*pct).abs_diff(i16::from(percentage)))
        .map_or(0.0, |(speed, _)| speed)
}

pub struct ZoneFan {
    id: String,
    zone: ZoneIndex,
    /// Last non-zero percentage, restored on turn-on; 0 = none yet.
    last_nonzero: AtomicU8,
}

impl ZoneFan {
    pub fn new(ctx: &EntityContext, zone: ZoneIndex) -> Self {
        Self {
            id: unique_id(&ctx.device_id, EntityScope::Zone(zone), "fan"),
            zone,
            last_nonzero: AtomicU8::new(0),
        }
    }

    pub fn zone(&self) -> ZoneIndex {
        self.zone
    }

    /// Current percentage, snapped to the defined buckets.
    pub fn percentage(&self, snapshot: &Snapshot) -> Option<u8> {
        let speed = snapshot.zone(self.zone)?.speed?;
        Some(speed_to_percentage(speed))
    }

    pub fn is_on(&self, snapshot: &Snapshot) -> bool {
        self.percentage(snapshot).is_some_and(|pct| pct > 0)
    }

    /// Set the fan speed by percentage. No post-write refresh: the new
    /// state is reported optimistically until the next poll.
    pub async fn set_percentage(&self, coordinator: &Coordinator, percentage: u8) -> bool {
        let speed = percentage_to_speed(percentage);
        if percentage > 0 {
            self.last_nonzero.store(percentage, Ordering::Relaxed);
        }
        coordinator.set_zone_speed(self.zone, speed).await
    }

    /// Turn on, restoring the last non-zero percentage (or the default).
    pub async fn turn_on(&self, coordinator: &Coordinator, percentage: Option<u8>) -> bool {
        let pct = percentage.unwrap_or_else(|| {
            let last = self.last_nonzero.load(Ordering::Relaxed);
            if last > 0 { last } else { DEFAULT_TURN_ON_PERCENTAGE }
        });
        self.set_percentage(coordinator, pct).await
    }

    /// Turn off, remembering the current percentage for the next
    /// turn-on.
    pub async fn turn_off(&self, coordinator: &Coordinator, snapshot: Option<&Snapshot>) -> bool {
        if let Some(current) = snapshot.and_then(|s| self.percentage(s)) {
            if current > 0 {
                self.last_nonzero.store(current, Ordering::Relaxed);
            }
        }
        self.set_percentage(coordinator, 0).await
    }
}

impl Entity for ZoneFan {
    fn unique_id(&self) -> &str {
        &self.id
    }

    fn domain(&self) -> EntityDomain {
        EntityDomain::Fan
    }

    fn scope(&self) -> EntityScope {
        EntityScope::Zone(self.zone)
    }

    fn name(&self, snapshot: &Snapshot) -> String {
        format!("{} Fan", zone_name(snapshot, self.zone))
    }

    fn state(&self, snapshot: &Snapshot) -> Option<EntityValue> {
        self.percentage(snapshot)
            .map(|pct| EntityValue::Int(i64::from(pct)))
    }
}

pub fn entities(ctx: &EntityContext) -> Vec<Box<dyn Entity>> {
    ctx.enabled_zones
        .iter()
        .map(|zone| Box::new(ZoneFan::new(ctx, zone)) as Box<dyn Entity>)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn speed_maps_to_its_bucket() {
        assert_eq!(speed_to_percentage(0.0), 0);
        assert_eq!(speed_to_percentage(1.5), 45);
        assert_eq!(speed_to_percentage(4.0), 100);
        // Off-grid readings snap to the nearest step.
        assert_eq!(speed_to_percentage(1.6), 45);
        assert_eq!(speed_to_percentage(3.8), 100);
    }

    #[test]
    fn percentage_snaps_to_nearest_bucket() {
        assert_eq!(percentage_to_speed(0), 0.0);
        assert_eq!(percentage_to_speed(30), 1.0);
        assert_eq!(percentage_to_speed(46), 1.5);
        assert_eq!(percentage_to_speed(100), 4.0);
    }

    #[test]
    fn snapping_is_idempotent() {
        // 46 % resolves to a defined step; reading it back yields the
        // step's bucket, not 46.
        let speed = percentage_to_speed(46);
        let bucket = speed_to_percentage(speed);
        assert_eq!(bucket, 45);
        assert_eq!(percentage_to_speed(bucket), speed);
    }
}
