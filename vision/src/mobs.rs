//! Mob-label detection and target selection.
//!
//! Mobs are recognized by the color of their floating name label, one color
//! class per temperament. Detection is scan + cluster + size filtering per
//! class; selection applies the aggression policy and picks the closest
//! anchor that is in range and not parked in an avoided zone.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cluster::cluster;
use crate::frame::{Color, Frame};
use crate::geometry::{Bounds, Point};
use crate::scan::scan_matches;

/// After killing an aggressive mob, a lone aggressive label inside this
/// window is passed over for passives; it is usually the same pack respawning
/// or a straggler already leashing back.
pub const AGGRESSIVE_KILL_GRACE: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MobKind {
    Passive,
    Aggressive,
    Violet,
}

impl MobKind {
    pub fn name(&self) -> &'static str {
        match self {
            MobKind::Passive => "passive",
            MobKind::Aggressive => "aggressive",
            MobKind::Violet => "violet",
        }
    }
}

/// One detected, classified name label. Rebuilt from scratch every scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mob {
    pub kind: MobKind,
    pub bounds: Bounds,
}

impl Mob {
    /// Where to click: centered just under the label, on the model.
    pub fn attack_anchor(&self) -> Point {
        self.bounds.bottom_center()
    }
}

/// Label color for one mob class.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MobColor {
    pub color: Color,
    pub tolerance: u8,
}

/// Everything label detection needs to know about the client's rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MobProfile {
    pub passive: MobColor,
    pub aggressive: MobColor,
    pub violet: MobColor,
    /// Name labels are one glyph row: generous X joins across letter gaps,
    /// tight Y so stacked labels stay apart.
    pub cluster_x_gap: i32,
    pub cluster_y_gap: i32,
    /// Exclusive label width bounds. At or below the minimum is stray pixels;
    /// at or above the maximum is two labels overlapping.
    pub min_label_width: i32,
    pub max_label_width: i32,
    /// Labels above this line are UI, not world.
    pub top_margin: i32,
    /// Rows this close to the bottom edge are the skill bar.
    pub bottom_margin: i32,
    /// Carved out of the scan so the player's own tray cannot bleed into a
    /// label color family.
    pub exclusion: Bounds,
}

impl Default for MobProfile {
    fn default() -> Self {
        Self {
            passive: MobColor {
                color: Color::new(234, 234, 149),
                tolerance: 5,
            },
            aggressive: MobColor {
                color: Color::new(179, 23, 23),
                tolerance: 5,
            },
            violet: MobColor {
                color: Color::new(182, 144, 146),
                tolerance: 5,
            },
            cluster_x_gap: 50,
            cluster_y_gap: 3,
            min_label_width: 15,
            max_label_width: 150,
            top_margin: 110,
            bottom_margin: 100,
            exclusion: Bounds::new(0, 0, 250, 110),
        }
    }
}

/// Detect and classify every name label on the frame. Violet labels are
/// reported so the overlay can show them, but the selection policy never
/// offers them.
pub fn detect_mobs(frame: &Frame, profile: &MobProfile) -> Vec<Mob> {
    let mut mobs = Vec::new();
    for (kind, class) in [
        (MobKind::Passive, profile.passive),
        (MobKind::Aggressive, profile.aggressive),
        (MobKind::Violet, profile.violet),
    ] {
        detect_class(frame, profile, kind, class, &mut mobs);
    }
    mobs
}

fn detect_class(
    frame: &Frame,
    profile: &MobProfile,
    kind: MobKind,
    class: MobColor,
    out: &mut Vec<Mob>,
) {
    let region = Bounds::new(
        0,
        0,
        frame.width() as i32 - 1,
        frame.height() as i32 - 1 - profile.bottom_margin,
    );
    let points = scan_matches(
        frame,
        region,
        &[class.color],
        class.tolerance,
        Some(profile.exclusion),
    );
    if points.is_empty() {
        return;
    }

    let before = out.len();
    for bounds in cluster(&points, profile.cluster_x_gap, profile.cluster_y_gap) {
        if bounds.w <= profile.min_label_width || bounds.w >= profile.max_label_width {
            continue;
        }
        if bounds.y < profile.top_margin {
            continue;
        }
        out.push(Mob { kind, bounds });
    }

    debug!(
        kind = kind.name(),
        points = points.len(),
        labels = out.len() - before,
        "mob class scanned"
    );
}

/// Inputs the selection policy needs beyond the candidates themselves.
#[derive(Debug, Clone, Copy)]
pub struct SelectionContext {
    /// Screen center; distance is measured from here to the attack anchor.
    pub center: Point,
    pub max_distance: f64,
    pub prioritize_aggressive: bool,
    /// Passives are only engaged at or above this own-HP percentage.
    pub min_hp_for_passive: u8,
    pub player_hp: u8,
    pub last_kill: Option<(MobKind, Instant)>,
    pub now: Instant,
}

/// Pick the target to engage, or `None` when nothing qualifies.
///
/// `avoided` is the attack-anchor blacklist test supplied by the caller.
pub fn pick_target(
    mobs: &[Mob],
    ctx: &SelectionContext,
    avoided: impl Fn(Point) -> bool,
) -> Option<Mob> {
    let aggressive: Vec<&Mob> = mobs
        .iter()
        .filter(|m| m.kind == MobKind::Aggressive)
        .collect();
    let passive: Vec<&Mob> = mobs.iter().filter(|m| m.kind == MobKind::Passive).collect();

    let offered: Vec<&Mob> = if !ctx.prioritize_aggressive {
        let mut all = aggressive;
        all.extend(passive);
        all
    } else {
        let just_cleared = match ctx.last_kill {
            Some((MobKind::Aggressive, at)) => {
                aggressive.len() == 1 && ctx.now.duration_since(at) < AGGRESSIVE_KILL_GRACE
            }
            _ => false,
        };
        if (aggressive.is_empty() || just_cleared) && ctx.player_hp >= ctx.min_hp_for_passive {
            passive
        } else {
            aggressive
        }
    };

    let mut best: Option<(&Mob, f64)> = None;
    for mob in offered {
        let anchor = mob.attack_anchor();
        if avoided(anchor) {
            continue;
        }
        let dist = ctx.center.distance(anchor);
        if dist > ctx.max_distance {
            continue;
        }
        if best.is_none_or(|(_, d)| dist < d) {
            best = Some((mob, dist));
        }
    }

    best.map(|(m, _)| *m)
}
