//! The farming state machine.
//!
//! One perceive-decide-act pass per tick. Exactly one state handler runs per
//! tick and returns the next state; everything that must happen regardless of
//! state (restoration, party skills, settle windows) runs before the dispatch.

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use vision::mobs::{detect_mobs, pick_target, Mob, MobKind, SelectionContext};
use vision::vitals::{AliveState, Vitals};
use vision::{Bounds, Point};

use super::{Behavior, TickCtx};
use crate::avoid::AvoidanceList;
use crate::config::{Config, SLOT_COUNT};
use crate::motion::Motion;
use crate::overlay::{BarView, Snapshot};
use crate::stats::{format_duration, Statistics};

/// Settle time between the attack click and the verify pass.
const CLICK_SETTLE: Duration = Duration::from_millis(150);
/// Settle time after reopening the stat tray.
const TRAY_REOPEN_WAIT: Duration = Duration::from_millis(500);
/// Camera sweeps per spot before moving somewhere new.
const MAX_ROTATIONS: u32 = 30;
/// Buff casts block client input for roughly this long.
const BUFF_SETTLE: Duration = Duration::from_millis(1500);
const PET_PICKUP_SETTLE: Duration = Duration::from_millis(1500);
const MOTION_PICKUP_SETTLE: Duration = Duration::from_millis(1000);
/// AOE skills only land when the marker is roughly melee-close.
const AOE_SKILL_RANGE: f64 = 75.0;
/// A grouped target is left standing once its HP has dropped below this.
const AOE_DEFER_BELOW_HP: u8 = 90;
/// Zone dropped over a click that produced no confirmed selection.
const VERIFY_FAIL_ZONE: i32 = 2;
const VERIFY_FAIL_TTL: Duration = Duration::from_secs(5);
/// Zone dropped around an abandoned engagement, growing per prior failure.
const ABORT_ZONE: i32 = 40;
const ABORT_ZONE_GROWTH: i32 = 10;
const ABORT_ZONE_TTL: Duration = Duration::from_secs(2);
/// Reduced obstacle budget while the target has not been scratched at all.
const FULL_HP_OBSTACLE_TRIES: u32 = 2;
/// AOE heals double as self-heals; repeated casts cover the cast bar.
const AOE_HEAL_CASTS: u32 = 3;
const AOE_HEAL_GAP: Duration = Duration::from_millis(100);
/// Legacy pickup: rounds of slot taps after a kill.
const PICKUP_ROUNDS: u32 = 4;
const PICKUP_TAP_GAP: Duration = Duration::from_millis(100);

/// The engagement cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FarmingState {
    NoEnemyFound,
    SearchingForEnemy,
    EnemyFound,
    VerifyTarget,
    Attacking,
    AfterEnemyKill,
}

impl FarmingState {
    pub fn name(&self) -> &'static str {
        match self {
            FarmingState::NoEnemyFound => "no enemy found",
            FarmingState::SearchingForEnemy => "searching",
            FarmingState::EnemyFound => "enemy found",
            FarmingState::VerifyTarget => "verifying",
            FarmingState::Attacking => "attacking",
            FarmingState::AfterEnemyKill => "looting",
        }
    }
}

pub struct FarmingBehavior {
    state: FarmingState,
    avoidance: AvoidanceList,

    current_target: Option<Mob>,
    last_click: Option<Point>,
    /// Most recent detection pass, kept for the snapshot surface.
    last_detected: Vec<Mob>,

    rotations: u32,
    /// Settle deadline; state dispatch resumes once it passes.
    wait_until: Option<Instant>,

    is_attacking: bool,
    attack_started: Option<Instant>,
    attack_cursor: usize,
    obstacle_tries: u32,
    /// Aborted engagements since the last kill; scales the abort zone.
    abort_count: u32,
    /// Wounded mobs left standing for a grouped AOE finish.
    aoe_accrued: u32,

    last_kill: Option<(MobKind, Instant)>,
    /// Last time a target was engaged or killed; feeds the search timeout.
    last_progress: Instant,
    last_pickup: Option<Instant>,

    slot_used: [Option<Instant>; SLOT_COUNT],
}

impl FarmingBehavior {
    pub fn new(now: Instant) -> Self {
        Self {
            state: FarmingState::SearchingForEnemy,
            avoidance: AvoidanceList::default(),
            current_target: None,
            last_click: None,
            last_detected: Vec::new(),
            rotations: 0,
            wait_until: None,
            is_attacking: false,
            attack_started: None,
            attack_cursor: 0,
            obstacle_tries: 0,
            abort_count: 0,
            aoe_accrued: 0,
            last_kill: None,
            last_progress: now,
            last_pickup: None,
            slot_used: [None; SLOT_COUNT],
        }
    }

    pub fn state(&self) -> FarmingState {
        self.state
    }

    // -- settle windows --

    /// Defer state dispatch until `duration` from now. Overlapping waits keep
    /// the later deadline.
    fn wait(&mut self, now: Instant, duration: Duration) {
        let deadline = now + duration;
        self.wait_until = Some(match self.wait_until {
            Some(existing) if existing > deadline => existing,
            _ => deadline,
        });
    }

    fn wait_pending(&mut self, now: Instant) -> bool {
        match self.wait_until {
            Some(deadline) if now < deadline => true,
            Some(_) => {
                self.wait_until = None;
                false
            }
            None => false,
        }
    }

    /// Settle windows are dead time on the client; spend them on buffs.
    fn cast_buffs(&mut self, ctx: &mut TickCtx) {
        let cfg = ctx.config;
        if cfg.buff_slots.is_empty() {
            return;
        }
        if self.first_ready_slot(ctx.motion, cfg, &cfg.buff_slots, ctx.now) {
            self.wait(ctx.now, BUFF_SETTLE);
        }
    }

    // -- slot dispatch --

    fn slot_ready(&self, cfg: &Config, slot: u8, now: Instant) -> bool {
        let idx = slot as usize;
        if idx >= SLOT_COUNT {
            return false;
        }
        match self.slot_used[idx] {
            Some(at) => {
                now.duration_since(at) >= Duration::from_millis(cfg.slot_cooldowns_ms[idx])
            }
            None => true,
        }
    }

    fn try_slot(&mut self, motion: &mut Motion, cfg: &Config, slot: u8, now: Instant) -> bool {
        if !self.slot_ready(cfg, slot, now) {
            return false;
        }
        motion.use_slot(slot);
        self.slot_used[slot as usize] = Some(now);
        true
    }

    fn first_ready_slot(
        &mut self,
        motion: &mut Motion,
        cfg: &Config,
        slots: &[u8],
        now: Instant,
    ) -> bool {
        slots.iter().any(|&slot| self.try_slot(motion, cfg, slot, now))
    }

    /// Attack slots cycle: the cursor advances past each successful use so
    /// multi-slot layouts alternate instead of hammering the first slot.
    fn use_attack_slot(
        &mut self,
        motion: &mut Motion,
        cfg: &Config,
        slots: &[u8],
        now: Instant,
    ) -> bool {
        if slots.is_empty() {
            return false;
        }
        for i in 0..slots.len() {
            let idx = (self.attack_cursor + i) % slots.len();
            if self.try_slot(motion, cfg, slots[idx], now) {
                self.attack_cursor = (idx + 1) % slots.len();
                return true;
            }
        }
        false
    }

    // -- cross-cutting checks --

    fn check_party_skills(&mut self, ctx: &mut TickCtx) {
        let cfg = ctx.config;
        for &slot in &cfg.party_skill_slots {
            self.try_slot(ctx.motion, cfg, slot, ctx.now);
        }
    }

    fn check_restorations(&mut self, ctx: &mut TickCtx) {
        let cfg = ctx.config;
        let now = ctx.now;

        if ctx.vitals.hp.percent() < cfg.heal_threshold {
            if !cfg.heal_slots.is_empty() {
                self.first_ready_slot(ctx.motion, cfg, &cfg.heal_slots, now);
            } else if !cfg.aoe_heal_slots.is_empty() {
                for _ in 0..AOE_HEAL_CASTS {
                    if !self.first_ready_slot(ctx.motion, cfg, &cfg.aoe_heal_slots, now) {
                        break;
                    }
                    ctx.motion.pause(AOE_HEAL_GAP);
                }
            }
        }
        if ctx.vitals.mp.percent() < cfg.mp_threshold {
            self.first_ready_slot(ctx.motion, cfg, &cfg.mp_restore_slots, now);
        }
        if ctx.vitals.fp.percent() < cfg.fp_threshold {
            self.first_ready_slot(ctx.motion, cfg, &cfg.fp_restore_slots, now);
        }
    }

    fn check_search_timeout(&mut self, ctx: &TickCtx) {
        let timeout = Duration::from_millis(ctx.config.search_timeout_ms);
        if timeout.is_zero() {
            return;
        }
        let idle = ctx.now.duration_since(self.last_progress);
        if idle > timeout {
            warn!(
                idle = %format_duration(idle),
                "no target engaged for a while; the spot may be farmed out"
            );
            self.last_progress = ctx.now;
        }
    }

    // -- state handlers --

    fn on_no_enemy(&mut self, ctx: &mut TickCtx) -> FarmingState {
        if self.rotations < MAX_ROTATIONS {
            self.rotations += 1;
            ctx.motion.rotate_random();
            return FarmingState::SearchingForEnemy;
        }

        let circle = Duration::from_millis(ctx.config.circle_move_ms);
        if !circle.is_zero() {
            ctx.motion.circle_move(circle);
        }
        self.rotations = 0;
        FarmingState::SearchingForEnemy
    }

    fn on_search(&mut self, ctx: &mut TickCtx) -> FarmingState {
        if ctx.config.stop_fighting {
            return FarmingState::SearchingForEnemy;
        }

        self.last_detected = detect_mobs(ctx.frame, &ctx.config.mobs);
        if self.last_detected.is_empty() {
            return FarmingState::NoEnemyFound;
        }

        let cfg = ctx.config;
        let max_distance = if cfg.circle_move_ms > 0 {
            cfg.circle_target_distance
        } else {
            cfg.max_target_distance
        };
        let selection = SelectionContext {
            center: ctx.frame.center(),
            max_distance,
            prioritize_aggressive: cfg.prioritize_aggressive,
            min_hp_for_passive: cfg.min_hp_attack,
            player_hp: ctx.vitals.hp.percent(),
            last_kill: self.last_kill,
            now: ctx.now,
        };
        let avoidance = &self.avoidance;
        let now = ctx.now;
        let Some(target) = pick_target(&self.last_detected, &selection, |anchor| {
            avoidance.contains(anchor, now)
        }) else {
            return FarmingState::NoEnemyFound;
        };

        debug!(kind = target.kind.name(), bounds = ?target.bounds, "target chosen");
        self.current_target = Some(target);
        self.rotations = 0;
        FarmingState::EnemyFound
    }

    fn on_enemy_found(&mut self, ctx: &mut TickCtx) -> FarmingState {
        let Some(target) = self.current_target else {
            return FarmingState::SearchingForEnemy;
        };

        let anchor = target.attack_anchor();
        ctx.motion.click(anchor);
        self.last_click = Some(anchor);
        self.is_attacking = false;
        self.last_progress = ctx.now;
        self.wait(ctx.now, CLICK_SETTLE);
        FarmingState::VerifyTarget
    }

    fn on_verify(&mut self, ctx: &mut TickCtx) -> FarmingState {
        if ctx.vitals.target_on_screen() && ctx.vitals.target_alive() {
            return FarmingState::Attacking;
        }

        debug!("selection not confirmed; blacklisting the click point");
        if let Some(click) = self.last_click.take() {
            self.avoidance
                .push(zone_around(click, VERIFY_FAIL_ZONE), VERIFY_FAIL_TTL, ctx.now);
        }
        self.current_target = None;
        FarmingState::SearchingForEnemy
    }

    fn on_attacking(&mut self, ctx: &mut TickCtx) -> FarmingState {
        if !self.is_attacking {
            self.is_attacking = true;
            self.attack_started = Some(ctx.now);
            self.obstacle_tries = 0;
        }

        if !ctx.vitals.target_alive() {
            if ctx.vitals.player_alive() {
                return FarmingState::AfterEnemyKill;
            }
            self.disengage();
            return FarmingState::SearchingForEnemy;
        }

        let cfg = ctx.config;

        // Leave a wounded mob standing while grouping for an AOE finish.
        if cfg.max_aoe_farming > 1
            && self.aoe_accrued + 1 < cfg.max_aoe_farming
            && ctx.vitals.target_hp.percent() < AOE_DEFER_BELOW_HP
        {
            self.aoe_accrued += 1;
            debug!(accrued = self.aoe_accrued, "deferring wounded target");
            self.disengage();
            ctx.motion.cancel_target();
            return FarmingState::SearchingForEnemy;
        }

        let stale = ctx
            .vitals
            .target_hp
            .staleness(ctx.now)
            .is_some_and(|age| age > Duration::from_millis(cfg.obstacle_cooldown_ms));
        if !ctx.vitals.target_on_screen() || stale {
            return self.handle_obstacle(ctx);
        }

        let aoe_close = cfg.max_aoe_farming > 1
            && !cfg.aoe_attack_slots.is_empty()
            && ctx
                .vitals
                .target_distance()
                .is_some_and(|d| d < AOE_SKILL_RANGE);
        if aoe_close {
            self.use_attack_slot(ctx.motion, cfg, &cfg.aoe_attack_slots, ctx.now);
        } else {
            self.use_attack_slot(ctx.motion, cfg, &cfg.attack_slots, ctx.now);
        }
        FarmingState::Attacking
    }

    fn on_after_kill(&mut self, ctx: &mut TickCtx) -> FarmingState {
        if let Some(target) = self.current_target.take() {
            let started = self.attack_started.take().unwrap_or(ctx.now);
            let hunted_since = match self.last_kill {
                Some((_, at)) => at,
                None => ctx.stats.started(),
            };
            let search = started.duration_since(hunted_since);
            let fight = ctx.now.duration_since(started);
            ctx.stats.record_kill(search, fight, ctx.now);
            info!(
                kind = target.kind.name(),
                kills = ctx.stats.kills(),
                fight = %format_duration(fight),
                "mob down"
            );
            self.last_kill = Some((target.kind, ctx.now));
        }

        self.is_attacking = false;
        self.attack_started = None;
        self.obstacle_tries = 0;
        self.abort_count = 0;
        self.aoe_accrued = 0;
        self.last_progress = ctx.now;

        self.pickup(ctx);
        FarmingState::SearchingForEnemy
    }

    // -- engagement plumbing --

    fn disengage(&mut self) {
        self.is_attacking = false;
        self.attack_started = None;
        self.obstacle_tries = 0;
        self.current_target = None;
    }

    fn handle_obstacle(&mut self, ctx: &mut TickCtx) -> FarmingState {
        // A target still at full HP is not worth the whole retry budget.
        let cap = if ctx.vitals.target_hp.percent() == 100 {
            FULL_HP_OBSTACLE_TRIES.min(ctx.config.obstacle_max_tries)
        } else {
            ctx.config.obstacle_max_tries
        };

        if self.obstacle_tries < cap {
            debug!(attempt = self.obstacle_tries, "target unreachable; maneuvering");
            ctx.motion.avoid_obstacle(self.obstacle_tries);
            self.obstacle_tries += 1;
            ctx.vitals.target_hp.reset_staleness(ctx.now);
            return FarmingState::Attacking;
        }
        self.abort_attack(ctx)
    }

    fn abort_attack(&mut self, ctx: &mut TickCtx) -> FarmingState {
        let span = ABORT_ZONE + ABORT_ZONE_GROWTH * self.abort_count as i32;
        let center = ctx
            .vitals
            .target_marker()
            .map(|m| m.centroid)
            .or(self.last_click);
        if let Some(center) = center {
            let zone = zone_around(center, span);
            info!(?zone, aborts = self.abort_count, "engagement abandoned; area blacklisted");
            self.avoidance.push(zone, ABORT_ZONE_TTL, ctx.now);
        }
        self.abort_count += 1;
        self.disengage();
        ctx.motion.cancel_target();
        FarmingState::SearchingForEnemy
    }

    fn pickup(&mut self, ctx: &mut TickCtx) {
        let cfg = ctx.config;
        let on_cooldown = self.last_pickup.is_some_and(|at| {
            ctx.now.duration_since(at) < Duration::from_millis(cfg.pickup_cooldown_ms)
        });

        if let Some(slot) = cfg.pickup_pet_slot {
            if on_cooldown {
                return;
            }
            if self.try_slot(ctx.motion, cfg, slot, ctx.now) {
                self.last_pickup = Some(ctx.now);
                ctx.motion.pause(PET_PICKUP_SETTLE);
                if cfg.unsummon_pet {
                    ctx.motion.use_slot(slot);
                }
            }
            return;
        }

        if let Some(slot) = cfg.pickup_motion_slot {
            if on_cooldown {
                return;
            }
            if self.try_slot(ctx.motion, cfg, slot, ctx.now) {
                self.last_pickup = Some(ctx.now);
                ctx.motion.pause(MOTION_PICKUP_SETTLE);
            }
            return;
        }

        if cfg.pickup_slots.is_empty() {
            return;
        }
        for _ in 0..PICKUP_ROUNDS {
            for &slot in &cfg.pickup_slots {
                ctx.motion.use_slot(slot);
                ctx.motion.pause(PICKUP_TAP_GAP);
            }
        }
    }
}

impl Behavior for FarmingBehavior {
    fn name(&self) -> &'static str {
        "farming"
    }

    fn tick(&mut self, ctx: &mut TickCtx) {
        ctx.vitals.refresh(ctx.frame, ctx.now);
        self.avoidance.prune(ctx.now);

        match ctx.vitals.alive() {
            AliveState::Alive => {}
            AliveState::Dead => {
                debug!("player is dead; idling");
                return;
            }
            AliveState::TrayClosed => {
                if !self.wait_pending(ctx.now) {
                    debug!("stat tray closed; reopening");
                    ctx.motion.open_stat_tray();
                    self.wait(ctx.now, TRAY_REOPEN_WAIT);
                }
                return;
            }
            AliveState::Unknown => return,
        }

        self.check_party_skills(ctx);
        self.check_restorations(ctx);

        if self.wait_pending(ctx.now) {
            self.cast_buffs(ctx);
            return;
        }

        if matches!(
            self.state,
            FarmingState::NoEnemyFound | FarmingState::SearchingForEnemy
        ) {
            self.check_search_timeout(ctx);
        }

        let next = match self.state {
            FarmingState::NoEnemyFound => self.on_no_enemy(ctx),
            FarmingState::SearchingForEnemy => self.on_search(ctx),
            FarmingState::EnemyFound => self.on_enemy_found(ctx),
            FarmingState::VerifyTarget => self.on_verify(ctx),
            FarmingState::Attacking => self.on_attacking(ctx),
            FarmingState::AfterEnemyKill => self.on_after_kill(ctx),
        };
        if next != self.state {
            debug!(from = self.state.name(), to = next.name(), "state change");
            self.state = next;
        }
    }

    fn stop(&mut self, motion: &mut Motion) {
        motion.stop_all();
        self.wait_until = None;
        self.disengage();
        self.state = FarmingState::SearchingForEnemy;
    }

    fn snapshot(&self, vitals: &Vitals, stats: &Statistics, now: Instant) -> Snapshot {
        Snapshot {
            state: self.state.name(),
            bars: vec![
                BarView::from(&vitals.hp),
                BarView::from(&vitals.mp),
                BarView::from(&vitals.fp),
                BarView::from(&vitals.target_hp),
                BarView::from(&vitals.target_mp),
            ],
            targets: self.last_detected.clone(),
            kills: stats.kills(),
            kills_per_hour: stats.kills_per_hour(now),
            avoided_zones: self.avoidance.len(),
        }
    }
}

/// Square zone of `span` pixels centered on `center`.
fn zone_around(center: Point, span: i32) -> Bounds {
    Bounds::new(center.x - span / 2, center.y - span / 2, span, span)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{Action, ActionLog, Key, RecordingDriver};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use vision::vitals::BarPalettes;
    use vision::{Color, Frame};

    const W: u32 = 1200;
    const H: u32 = 600;

    const HP_RED: Color = Color::new(174, 18, 55);
    const MP_BLUE: Color = Color::new(20, 84, 196);
    const FP_GREEN: Color = Color::new(45, 230, 29);
    const PASSIVE_LABEL: Color = Color::new(234, 234, 149);
    const MARKER_BLUE: Color = Color::new(131, 148, 205);

    struct Rig {
        behavior: FarmingBehavior,
        vitals: Vitals,
        motion: Motion,
        log: ActionLog,
        config: Config,
        stats: Statistics,
    }

    impl Rig {
        fn new(t0: Instant) -> Self {
            let (driver, log) = RecordingDriver::new();
            Self {
                behavior: FarmingBehavior::new(t0),
                vitals: Vitals::new(BarPalettes::default()),
                motion: Motion::new(Box::new(driver), StdRng::seed_from_u64(11)),
                log,
                config: Config::default(),
                stats: Statistics::new(t0),
            }
        }

        fn tick(&mut self, frame: &Frame, now: Instant) {
            let mut ctx = TickCtx {
                frame,
                vitals: &mut self.vitals,
                motion: &mut self.motion,
                config: &self.config,
                stats: &mut self.stats,
                now,
            };
            self.behavior.tick(&mut ctx);
        }

        fn actions(&self) -> Vec<Action> {
            self.log.borrow().clone()
        }
    }

    fn base_frame() -> Frame {
        Frame::filled(W, H, Color::new(12, 70, 35))
    }

    fn paint_player_bars(frame: &mut Frame, hp_w: i32, mp_w: i32, fp_w: i32) {
        if hp_w > 0 {
            frame.fill_rect(Bounds::new(105, 36, hp_w, 13), HP_RED);
        }
        if mp_w > 0 {
            frame.fill_rect(Bounds::new(105, 60, mp_w, 13), MP_BLUE);
        }
        if fp_w > 0 {
            frame.fill_rect(Bounds::new(105, 84, fp_w, 13), FP_GREEN);
        }
    }

    fn paint_target_plate(frame: &mut Frame, hp_w: i32) {
        if hp_w > 0 {
            frame.fill_rect(Bounds::new(450, 30, hp_w, 13), HP_RED);
        }
    }

    fn paint_marker(frame: &mut Frame, x: i32, y: i32) {
        frame.fill_rect(Bounds::new(x, y, 8, 8), MARKER_BLUE);
    }

    /// Passive label whose attack anchor lands at (660, 346).
    fn paint_mob_label(frame: &mut Frame) {
        frame.fill_rect(Bounds::new(640, 340, 40, 6), PASSIVE_LABEL);
    }

    const MOB_ANCHOR: Point = Point::new(660, 346);

    fn searching_frame() -> Frame {
        let mut frame = base_frame();
        paint_player_bars(&mut frame, 105, 80, 80);
        paint_mob_label(&mut frame);
        frame
    }

    fn engaged_frame(plate_w: i32) -> Frame {
        let mut frame = searching_frame();
        paint_target_plate(&mut frame, plate_w);
        paint_marker(&mut frame, 596, 196);
        frame
    }

    fn at(t0: Instant, ms: u64) -> Instant {
        t0 + Duration::from_millis(ms)
    }

    #[test]
    fn full_engagement_cycle_records_one_kill() {
        let t0 = Instant::now();
        let mut rig = Rig::new(t0);

        let hunting = searching_frame();
        let fighting = engaged_frame(300);
        let mut after = searching_frame();
        after.clear_rect(Bounds::new(640, 340, 40, 6));

        rig.tick(&hunting, at(t0, 0));
        assert_eq!(rig.behavior.state(), FarmingState::EnemyFound);

        rig.tick(&hunting, at(t0, 100));
        assert_eq!(rig.behavior.state(), FarmingState::VerifyTarget);
        assert!(rig.actions().contains(&Action::Click(MOB_ANCHOR)));

        // Still inside the click settle window; state must hold.
        rig.tick(&fighting, at(t0, 200));
        assert_eq!(rig.behavior.state(), FarmingState::VerifyTarget);

        rig.tick(&fighting, at(t0, 300));
        assert_eq!(rig.behavior.state(), FarmingState::Attacking);

        rig.tick(&fighting, at(t0, 400));
        rig.tick(&fighting, at(t0, 500));
        let swings = rig
            .actions()
            .iter()
            .filter(|a| **a == Action::UseSlot(1))
            .count();
        assert_eq!(swings, 2);

        // Plate and marker vanish while the player is alive: that is a kill.
        rig.tick(&after, at(t0, 600));
        assert_eq!(rig.behavior.state(), FarmingState::AfterEnemyKill);

        rig.tick(&after, at(t0, 700));
        assert_eq!(rig.behavior.state(), FarmingState::SearchingForEnemy);
        assert_eq!(rig.stats.kills(), 1);
        assert_eq!(rig.behavior.last_kill.map(|(kind, _)| kind), Some(MobKind::Passive));
    }

    #[test]
    fn failed_verify_blacklists_the_click_point_until_expiry() {
        let t0 = Instant::now();
        let mut rig = Rig::new(t0);
        let frame = searching_frame();

        rig.tick(&frame, at(t0, 0));
        rig.tick(&frame, at(t0, 100));
        assert_eq!(rig.behavior.state(), FarmingState::VerifyTarget);

        // No marker and no plate ever show up.
        rig.tick(&frame, at(t0, 300));
        assert_eq!(rig.behavior.state(), FarmingState::SearchingForEnemy);
        assert_eq!(rig.behavior.avoidance.len(), 1);

        // The same mob is still on screen but its anchor is now blacklisted.
        rig.tick(&frame, at(t0, 400));
        assert_eq!(rig.behavior.state(), FarmingState::NoEnemyFound);

        // After the zone expires the mob is eligible again.
        rig.tick(&frame, at(t0, 5400));
        assert_eq!(rig.behavior.state(), FarmingState::SearchingForEnemy);
        rig.tick(&frame, at(t0, 5500));
        assert_eq!(rig.behavior.state(), FarmingState::EnemyFound);
    }

    #[test]
    fn rotation_cap_triggers_circle_movement() {
        let t0 = Instant::now();
        let mut rig = Rig::new(t0);
        rig.config.circle_move_ms = 3000;

        let mut empty = base_frame();
        paint_player_bars(&mut empty, 105, 80, 80);

        // States alternate searching/no-enemy, so one rotation lands every
        // other tick; 62 ticks cover 30 rotations plus the circle run.
        for i in 0..62u64 {
            rig.tick(&empty, at(t0, i * 100));
        }

        let actions = rig.actions();
        let arrows = actions
            .iter()
            .filter(|a| {
                matches!(a, Action::Hold(Key::ArrowLeft) | Action::Hold(Key::ArrowRight))
            })
            .count();
        assert_eq!(arrows, 30);
        let strafes = actions
            .iter()
            .filter(|a| **a == Action::Hold(Key::D))
            .count();
        assert_eq!(strafes, 1);
        assert!(actions.contains(&Action::Pause(Duration::from_millis(3000))));
    }

    #[test]
    fn obstacle_retries_then_aborts_with_a_zone() {
        let t0 = Instant::now();
        let mut rig = Rig::new(t0);
        rig.behavior.state = FarmingState::Attacking;
        rig.behavior.current_target = Some(Mob {
            kind: MobKind::Passive,
            bounds: Bounds::new(640, 340, 40, 6),
        });
        rig.behavior.last_click = Some(MOB_ANCHOR);

        let fighting = engaged_frame(300);
        let mut marker_lost = searching_frame();
        paint_target_plate(&mut marker_lost, 300);

        rig.tick(&fighting, at(t0, 0));
        assert_eq!(rig.behavior.state(), FarmingState::Attacking);

        // Marker gone, target untouched at 100%: two tries, then abort.
        rig.tick(&marker_lost, at(t0, 100));
        assert_eq!(rig.behavior.obstacle_tries, 1);
        assert!(rig.actions().contains(&Action::Press(Key::Z)));

        rig.tick(&marker_lost, at(t0, 200));
        assert_eq!(rig.behavior.obstacle_tries, 2);
        assert_eq!(rig.behavior.state(), FarmingState::Attacking);

        rig.tick(&marker_lost, at(t0, 300));
        assert_eq!(rig.behavior.state(), FarmingState::SearchingForEnemy);
        assert_eq!(rig.behavior.avoidance.len(), 1);
        assert!(rig.behavior.avoidance.contains(MOB_ANCHOR, at(t0, 300)));
        assert!(rig.actions().contains(&Action::Press(Key::Escape)));
        assert_eq!(rig.behavior.abort_count, 1);
    }

    #[test]
    fn aoe_farming_defers_wounded_targets_until_the_cap() {
        let t0 = Instant::now();
        let mut rig = Rig::new(t0);
        rig.config.max_aoe_farming = 3;
        rig.config.aoe_attack_slots = vec![2];
        rig.behavior.state = FarmingState::Attacking;
        rig.behavior.current_target = Some(Mob {
            kind: MobKind::Passive,
            bounds: Bounds::new(640, 340, 40, 6),
        });

        // Calibrate the plate at full width first, then wound it to 80%.
        rig.tick(&engaged_frame(300), at(t0, 0));
        rig.tick(&engaged_frame(240), at(t0, 100));

        assert_eq!(rig.behavior.aoe_accrued, 1);
        assert_eq!(rig.behavior.state(), FarmingState::SearchingForEnemy);
        assert!(rig.actions().contains(&Action::Press(Key::Escape)));
    }

    #[test]
    fn aoe_slots_are_used_when_the_marker_is_close() {
        let t0 = Instant::now();
        let mut rig = Rig::new(t0);
        rig.config.max_aoe_farming = 3;
        rig.config.aoe_attack_slots = vec![2];
        rig.behavior.state = FarmingState::Attacking;
        rig.behavior.aoe_accrued = 2;
        rig.behavior.current_target = Some(Mob {
            kind: MobKind::Passive,
            bounds: Bounds::new(640, 340, 40, 6),
        });

        // Marker centroid (600, 250) is 50 px from the (600, 300) center.
        let mut close = searching_frame();
        paint_target_plate(&mut close, 300);
        paint_marker(&mut close, 596, 246);

        rig.tick(&close, at(t0, 0));
        assert!(rig.actions().contains(&Action::UseSlot(2)));
        assert!(!rig.actions().contains(&Action::UseSlot(1)));
    }

    #[test]
    fn low_hp_triggers_a_heal_respecting_the_slot_cooldown() {
        let t0 = Instant::now();
        let mut rig = Rig::new(t0);
        rig.config.heal_slots = vec![3];
        rig.config.slot_cooldowns_ms[3] = 5000;

        let mut healthy = base_frame();
        paint_player_bars(&mut healthy, 105, 80, 80);
        let mut hurt = base_frame();
        paint_player_bars(&mut hurt, 42, 80, 80);

        rig.tick(&healthy, at(t0, 0));
        rig.tick(&hurt, at(t0, 100));
        rig.tick(&hurt, at(t0, 200));
        rig.tick(&hurt, at(t0, 300));

        let heals = rig
            .actions()
            .iter()
            .filter(|a| **a == Action::UseSlot(3))
            .count();
        assert_eq!(heals, 1);
    }

    #[test]
    fn collapsed_tray_is_reopened_once_per_settle_window() {
        let t0 = Instant::now();
        let mut rig = Rig::new(t0);
        let blank = base_frame();

        for i in 0..6u64 {
            rig.tick(&blank, at(t0, i * 100));
        }

        let presses = rig
            .actions()
            .iter()
            .filter(|a| **a == Action::Press(Key::T))
            .count();
        assert_eq!(presses, 1);
    }

    #[test]
    fn buffs_are_cast_during_settle_windows() {
        let t0 = Instant::now();
        let mut rig = Rig::new(t0);
        rig.config.buff_slots = vec![5];
        rig.config.slot_cooldowns_ms[5] = 60_000;

        let frame = searching_frame();
        rig.tick(&frame, at(t0, 0));
        rig.tick(&frame, at(t0, 100));
        assert_eq!(rig.behavior.state(), FarmingState::VerifyTarget);

        // Inside the click settle: buff fires once and extends the wait.
        rig.tick(&frame, at(t0, 150));
        rig.tick(&frame, at(t0, 600));
        assert_eq!(rig.behavior.state(), FarmingState::VerifyTarget);

        let buffs = rig
            .actions()
            .iter()
            .filter(|a| **a == Action::UseSlot(5))
            .count();
        assert_eq!(buffs, 1);

        // Past the extended deadline the verify pass finally runs.
        rig.tick(&frame, at(t0, 1700));
        assert_eq!(rig.behavior.state(), FarmingState::SearchingForEnemy);
    }

    #[test]
    fn pickup_pet_run_waits_and_respects_the_cooldown() {
        let t0 = Instant::now();
        let mut rig = Rig::new(t0);
        rig.config.pickup_pet_slot = Some(8);
        rig.behavior.state = FarmingState::AfterEnemyKill;
        rig.behavior.current_target = Some(Mob {
            kind: MobKind::Aggressive,
            bounds: Bounds::new(640, 340, 40, 6),
        });
        rig.behavior.attack_started = Some(t0);

        let frame = searching_frame();
        rig.tick(&frame, at(t0, 100));
        assert_eq!(rig.stats.kills(), 1);
        assert!(rig.actions().contains(&Action::UseSlot(8)));
        assert!(rig
            .actions()
            .contains(&Action::Pause(Duration::from_millis(1500))));

        // A second kill right away must not re-trigger the pet.
        rig.behavior.state = FarmingState::AfterEnemyKill;
        rig.behavior.current_target = Some(Mob {
            kind: MobKind::Aggressive,
            bounds: Bounds::new(640, 340, 40, 6),
        });
        rig.behavior.attack_started = Some(at(t0, 200));
        rig.tick(&frame, at(t0, 400));
        let pets = rig
            .actions()
            .iter()
            .filter(|a| **a == Action::UseSlot(8))
            .count();
        assert_eq!(pets, 1);
    }
}
