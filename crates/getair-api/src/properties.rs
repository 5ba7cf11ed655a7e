//! Logical-to-wire property mapping.
//!
//! Some firmware revisions expose writable attributes under an
//! `active_`-prefixed wire name instead of the plain one. Each logical
//! property names its primary wire field and an optional fallback; the
//! fallback is chosen when the fetched document carries it but lacks
//! the primary field.

/// One writable property and its wire field names.
#[derive(Debug, Clone, Copy)]
pub struct PropertySlot {
    pub logical: &'static str,
    pub primary: &'static str,
    pub fallback: Option<&'static str>,
}

/// Writable per-zone properties.
pub const ZONE_PROPERTIES: &[PropertySlot] = &[
    PropertySlot {
        logical: "name",
        primary: "name",
        fallback: None,
    },
    PropertySlot {
        logical: "speed",
        primary: "speed",
        fallback: Some("active_speed"),
    },
    PropertySlot {
        logical: "mode",
        primary: "mode",
        fallback: Some("active_mode"),
    },
    PropertySlot {
        logical: "target_temp",
        primary: "target_temp",
        fallback: None,
    },
    PropertySlot {
        logical: "target_hmdty_level",
        primary: "target_hmdty_level",
        fallback: None,
    },
    PropertySlot {
        logical: "last_filter_change",
        primary: "last_filter_change",
        fallback: None,
    },
    PropertySlot {
        logical: "mode_deadline",
        primary: "mode_deadline",
        fallback: None,
    },
    PropertySlot {
        logical: "time_profile",
        primary: "time_profile",
        fallback: Some("active_time_profile"),
    },
    PropertySlot {
        logical: "auto_mode_voc",
        primary: "auto_mode_voc",
        fallback: None,
    },
    PropertySlot {
        logical: "auto_mode_silent",
        primary: "auto_mode_silent",
        fallback: None,
    },
];

/// Writable system-level properties.
pub const SYSTEM_PROPERTIES: &[PropertySlot] = &[
    PropertySlot {
        logical: "auto_update_enabled",
        primary: "auto_update_enabled",
        fallback: None,
    },
    PropertySlot {
        logical: "notification",
        primary: "notification",
        fallback: None,
    },
];

pub fn zone_slot(logical: &str) -> Option<&'static PropertySlot> {
    ZONE_PROPERTIES.iter().find(|s| s.logical == logical)
}

pub fn system_slot(logical: &str) -> Option<&'static PropertySlot> {
    SYSTEM_PROPERTIES.iter().find(|s| s.logical == logical)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_logical_name_is_unique() {
        let mut seen = std::collections::HashSet::new();
        for slot in ZONE_PROPERTIES {
            assert!(seen.insert(slot.logical), "duplicate: {}", slot.logical);
        }
    }

    #[test]
    fn lookup_finds_fallback_slots() {
        let slot = zone_slot("time_profile").expect("slot exists");
        assert_eq!(slot.primary, "time_profile");
        assert_eq!(slot.fallback, Some("active_time_profile"));
        assert!(zone_slot("no_such_property").is_none());
    }
}
