//! Plain-data snapshot of what the bot currently sees and does.
//!
//! Status logging and any external overlay consume this; the engine never
//! knows how (or whether) it gets rendered.

use vision::bars::BarTracker;
use vision::mobs::Mob;
use vision::Bounds;

/// One tracked bar, flattened for display.
#[derive(Debug, Clone, Copy)]
pub struct BarView {
    pub name: &'static str,
    pub percent: u8,
    pub detected: bool,
    pub bounds: Option<Bounds>,
}

impl From<&BarTracker> for BarView {
    fn from(tracker: &BarTracker) -> Self {
        Self {
            name: tracker.kind().name(),
            percent: tracker.percent(),
            detected: tracker.is_detected(),
            bounds: tracker.last_bounds(),
        }
    }
}

/// Per-tick state snapshot.
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// Human-readable state label.
    pub state: &'static str,
    pub bars: Vec<BarView>,
    /// Mobs from the most recent detection pass.
    pub targets: Vec<Mob>,
    pub kills: u32,
    pub kills_per_hour: f64,
    pub avoided_zones: usize,
}
