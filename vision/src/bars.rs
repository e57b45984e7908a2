//! Status-bar measurement with running-max calibration.
//!
//! The client never tells us how wide a full bar is; it depends on window
//! size and UI scale. Each tracker therefore remembers the widest fill it has
//! ever measured and reports the current width as a percentage of that
//! maximum. Until a stat has been full at least once the reading is low, which
//! is harmless: thresholds only trigger conservative actions.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cluster::cluster;
use crate::frame::{Color, Frame};
use crate::geometry::Bounds;
use crate::scan::scan_matches;

/// Gradient shading breaks a bar into nearby match runs; clustering rejoins
/// them across gaps up to this many pixels.
const BAR_CLUSTER_GAP: i32 = 3;

/// Which stat a tracker follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarKind {
    Hp,
    Mp,
    Fp,
    TargetHp,
    TargetMp,
}

impl BarKind {
    pub fn name(&self) -> &'static str {
        match self {
            BarKind::Hp => "hp",
            BarKind::Mp => "mp",
            BarKind::Fp => "fp",
            BarKind::TargetHp => "target_hp",
            BarKind::TargetMp => "target_mp",
        }
    }
}

/// Shade family for one bar. Bars render with a vertical gradient, so several
/// shades map to the same stat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BarPalette {
    pub shades: Vec<Color>,
    pub tolerance: u8,
}

impl BarPalette {
    pub fn hp() -> Self {
        Self {
            shades: vec![
                Color::new(174, 18, 55),
                Color::new(188, 24, 62),
                Color::new(204, 30, 70),
                Color::new(220, 36, 78),
            ],
            tolerance: 5,
        }
    }

    pub fn mp() -> Self {
        Self {
            shades: vec![
                Color::new(20, 84, 196),
                Color::new(36, 132, 220),
                Color::new(44, 164, 228),
                Color::new(56, 188, 232),
            ],
            tolerance: 5,
        }
    }

    pub fn fp() -> Self {
        Self {
            shades: vec![
                Color::new(45, 230, 29),
                Color::new(28, 172, 28),
                Color::new(44, 124, 52),
                Color::new(20, 146, 20),
            ],
            tolerance: 5,
        }
    }
}

/// Where a bar lives on the frame.
#[derive(Debug, Clone, Copy)]
pub enum BarRegion {
    /// Fixed rectangle from the frame origin.
    Fixed(Bounds),
    /// Horizontal band inset from both frame edges; the target plate centers
    /// itself, so its region scales with the window.
    CenterBand { inset: i32, top: i32, height: i32 },
}

impl BarRegion {
    fn resolve(&self, frame: &Frame) -> Bounds {
        match *self {
            BarRegion::Fixed(b) => b,
            BarRegion::CenterBand { inset, top, height } => Bounds::new(
                inset,
                top,
                (frame.width() as i32 - inset * 2).max(0),
                height,
            ),
        }
    }
}

/// Search region and size constraints for one bar. Size bounds are inclusive
/// and reject glyph fragments and neighboring UI strips sharing the palette.
#[derive(Debug, Clone, Copy)]
pub struct BarSpec {
    pub kind: BarKind,
    pub region: BarRegion,
    pub min_width: i32,
    pub max_width: i32,
    pub min_height: i32,
    pub max_height: i32,
}

impl BarSpec {
    /// Player bars sit in the top-left stat tray.
    pub fn player(kind: BarKind) -> Self {
        Self {
            kind,
            region: BarRegion::Fixed(Bounds::new(0, 0, 500, 350)),
            min_width: 1,
            max_width: 300,
            min_height: 12,
            max_height: 30,
        }
    }

    /// Target bars appear in the top-center plate.
    pub fn target(kind: BarKind) -> Self {
        Self {
            kind,
            region: BarRegion::CenterBand {
                inset: 400,
                top: 0,
                height: 120,
            },
            min_width: 1,
            max_width: 600,
            min_height: 12,
            max_height: 30,
        }
    }
}

/// Self-calibrating width tracker for one bar.
pub struct BarTracker {
    spec: BarSpec,
    palette: BarPalette,
    running_max: i32,
    value: u8,
    detected: bool,
    last_bounds: Option<Bounds>,
    last_measured: Option<Instant>,
}

impl BarTracker {
    pub fn new(spec: BarSpec, palette: BarPalette) -> Self {
        Self {
            spec,
            palette,
            running_max: 0,
            value: 0,
            detected: false,
            last_bounds: None,
            last_measured: None,
        }
    }

    pub fn kind(&self) -> BarKind {
        self.spec.kind
    }

    /// Current percentage, 0..=100. Reads 0 before the first measurement.
    pub fn percent(&self) -> u8 {
        self.value
    }

    /// Whether the last refresh found the bar.
    pub fn is_detected(&self) -> bool {
        self.detected
    }

    pub fn last_bounds(&self) -> Option<Bounds> {
        self.last_bounds
    }

    /// Time since the last successful measurement; `None` before the first.
    /// A bar that stays unmeasured while an action is in flight is the
    /// obstacle signal the state machine watches for.
    pub fn staleness(&self, now: Instant) -> Option<Duration> {
        self.last_measured.map(|t| now.duration_since(t))
    }

    /// Restart the staleness window without a measurement, so a retry gets a
    /// full window to show progress.
    pub fn reset_staleness(&mut self, now: Instant) {
        self.last_measured = Some(now);
    }

    /// Re-measure the bar. Returns true when the percentage changed.
    ///
    /// When nothing qualifies, the previous percentage is kept, `is_detected`
    /// drops to false and the staleness clock keeps running.
    pub fn refresh(&mut self, frame: &Frame, now: Instant) -> bool {
        let region = self.spec.region.resolve(frame);
        let points = scan_matches(
            frame,
            region,
            &self.palette.shades,
            self.palette.tolerance,
            None,
        );

        let found = cluster(&points, BAR_CLUSTER_GAP, BAR_CLUSTER_GAP)
            .into_iter()
            .filter(|b| {
                b.w >= self.spec.min_width
                    && b.w <= self.spec.max_width
                    && b.h >= self.spec.min_height
                    && b.h <= self.spec.max_height
            })
            .max_by_key(|b| b.w);

        let Some(bar) = found else {
            self.detected = false;
            return false;
        };

        self.running_max = self.running_max.max(bar.w);
        let percent = if self.running_max == 0 {
            0
        } else {
            let ratio = bar.w as f64 / self.running_max as f64;
            ((ratio * 100.0).round() as i64).clamp(0, 100) as u8
        };

        let changed = percent != self.value;
        if changed {
            debug!(
                bar = self.spec.kind.name(),
                from = self.value,
                to = percent,
                "bar level changed"
            );
        }

        self.value = percent;
        self.detected = true;
        self.last_bounds = Some(bar);
        self.last_measured = Some(now);
        changed
    }
}
