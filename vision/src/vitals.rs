//! Aggregated per-tick perception state.
//!
//! `Vitals` owns the five bar trackers plus the marker read and derives the
//! compound signals the behavior layer keys on: player alive state, target
//! alive/NPC/mover flags, marker distance.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::bars::{BarKind, BarPalette, BarSpec, BarTracker};
use crate::frame::Frame;
use crate::marker::{detect_marker, Marker};

/// Consecutive ticks with no player bar detected before the stat tray counts
/// as collapsed rather than the player as dead.
const TRAY_MISS_LIMIT: u32 = 5;

/// Whether the player character is known to be alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AliveState {
    /// No conclusive read yet.
    Unknown,
    /// Every player bar has been missing or empty for a while; the stat tray
    /// is collapsed and needs reopening.
    TrayClosed,
    Alive,
    Dead,
}

/// Shade families for all five tracked bars. The target plate reuses the
/// player HP/MP families.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BarPalettes {
    pub hp: BarPalette,
    pub mp: BarPalette,
    pub fp: BarPalette,
    pub target_hp: BarPalette,
    pub target_mp: BarPalette,
}

impl Default for BarPalettes {
    fn default() -> Self {
        Self {
            hp: BarPalette::hp(),
            mp: BarPalette::mp(),
            fp: BarPalette::fp(),
            target_hp: BarPalette::hp(),
            target_mp: BarPalette::mp(),
        }
    }
}

pub struct Vitals {
    pub hp: BarTracker,
    pub mp: BarTracker,
    pub fp: BarTracker,
    pub target_hp: BarTracker,
    pub target_mp: BarTracker,
    alive: AliveState,
    tray_misses: u32,
    marker: Option<Marker>,
    marker_distance: Option<f64>,
}

impl Vitals {
    pub fn new(palettes: BarPalettes) -> Self {
        Self {
            hp: BarTracker::new(BarSpec::player(BarKind::Hp), palettes.hp),
            mp: BarTracker::new(BarSpec::player(BarKind::Mp), palettes.mp),
            fp: BarTracker::new(BarSpec::player(BarKind::Fp), palettes.fp),
            target_hp: BarTracker::new(BarSpec::target(BarKind::TargetHp), palettes.target_hp),
            target_mp: BarTracker::new(BarSpec::target(BarKind::TargetMp), palettes.target_mp),
            alive: AliveState::Unknown,
            tray_misses: 0,
            marker: None,
            marker_distance: None,
        }
    }

    /// Re-read every tracked signal from the frame.
    pub fn refresh(&mut self, frame: &Frame, now: Instant) {
        self.hp.refresh(frame, now);
        self.mp.refresh(frame, now);
        self.fp.refresh(frame, now);
        self.target_hp.refresh(frame, now);
        self.target_mp.refresh(frame, now);

        self.refresh_alive();

        self.marker = detect_marker(frame);
        self.marker_distance = self
            .marker
            .map(|m| frame.center().distance(m.centroid));
    }

    fn refresh_alive(&mut self) {
        if self.hp.is_detected() {
            self.tray_misses = 0;
            self.alive = if self.hp.percent() > 0 {
                AliveState::Alive
            } else {
                AliveState::Dead
            };
            return;
        }
        if self.mp.is_detected() || self.fp.is_detected() {
            // The tray is clearly open, so an unmeasurable HP fill is empty.
            self.tray_misses = 0;
            self.alive = AliveState::Dead;
            return;
        }

        self.tray_misses += 1;
        if self.tray_misses >= TRAY_MISS_LIMIT {
            if self.alive != AliveState::TrayClosed {
                debug!(misses = self.tray_misses, "stat tray looks collapsed");
            }
            self.alive = AliveState::TrayClosed;
        }
    }

    pub fn alive(&self) -> AliveState {
        self.alive
    }

    pub fn player_alive(&self) -> bool {
        self.alive == AliveState::Alive
    }

    /// Marker-confirmed selection this tick.
    pub fn target_on_screen(&self) -> bool {
        self.marker.is_some()
    }

    pub fn target_marker(&self) -> Option<Marker> {
        self.marker
    }

    /// Screen-space distance from frame center to the marker centroid.
    pub fn target_distance(&self) -> Option<f64> {
        self.marker_distance
    }

    /// A live target shows a plate with a non-empty HP fill. A vanished plate
    /// reads as dead, so a kill still registers when the final empty-bar
    /// frame is missed.
    pub fn target_alive(&self) -> bool {
        self.target_hp.is_detected() && self.target_hp.percent() > 0
    }

    /// Full HP with no MP reads as a vendor or quest NPC.
    pub fn target_is_npc(&self) -> bool {
        self.target_hp.percent() == 100 && self.target_mp.percent() == 0
    }

    pub fn target_is_mover(&self) -> bool {
        self.target_mp.percent() > 0
    }
}
