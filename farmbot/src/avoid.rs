//! Time-decaying click blacklist.
//!
//! Failed engagements leave a zone behind so the search pass stops offering
//! the same unreachable spot. Zones are never mutated after creation; they
//! age out on their own.

use std::time::{Duration, Instant};

use vision::{Bounds, Point};

/// A "do not click here" zone.
#[derive(Debug, Clone, Copy)]
pub struct AvoidedArea {
    pub bounds: Bounds,
    pub created: Instant,
    pub duration: Duration,
}

impl AvoidedArea {
    fn expired(&self, now: Instant) -> bool {
        now.duration_since(self.created) > self.duration
    }
}

/// Append-only list of avoided zones with lazy expiry.
#[derive(Debug, Default)]
pub struct AvoidanceList {
    areas: Vec<AvoidedArea>,
}

impl AvoidanceList {
    pub fn push(&mut self, bounds: Bounds, duration: Duration, now: Instant) {
        self.areas.push(AvoidedArea {
            bounds,
            created: now,
            duration,
        });
    }

    /// Drop expired zones. Runs once per tick.
    pub fn prune(&mut self, now: Instant) {
        self.areas.retain(|area| !area.expired(now));
    }

    /// Whether `point` sits inside any live zone. This is the selection
    /// filter for attack anchors.
    pub fn contains(&self, point: Point, now: Instant) -> bool {
        self.areas
            .iter()
            .any(|area| !area.expired(now) && area.bounds.contains(point))
    }

    /// Whether `query` overlaps any live zone.
    #[allow(dead_code)] // Rectangle form for overlay and support consumers
    pub fn is_avoided(&self, query: Bounds, now: Instant) -> bool {
        self.areas
            .iter()
            .any(|area| !area.expired(now) && area.bounds.overlaps(query))
    }

    pub fn iter(&self) -> impl Iterator<Item = &AvoidedArea> {
        self.areas.iter()
    }

    pub fn len(&self) -> usize {
        self.areas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.areas.is_empty()
    }
}
