//! The capture-perceive-act loop.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info, warn};

use vision::vitals::Vitals;

use crate::behavior::{Behavior, FarmingBehavior, TickCtx};
use crate::capture::{FrameSource, WindowSource};
use crate::config::{self, Config};
use crate::input::NullDriver;
use crate::motion::Motion;
use crate::stats::{format_duration, Statistics};

/// Status line cadence, in ticks.
const STATUS_EVERY: u32 = 50;

pub fn run() -> Result<()> {
    let cfg = Config::load_or_default();
    if let Ok(path) = Config::path() {
        // Give the operator a file to edit on first run.
        if !path.exists() {
            match cfg.save() {
                Ok(()) => info!(path = ?path, "wrote default config"),
                Err(err) => warn!(error = %err, "could not write default config"),
            }
        }
    }

    let shared = config::shared(cfg);
    let _watcher = match config::watch(Arc::clone(&shared)) {
        Ok(watcher) => Some(watcher),
        Err(err) => {
            warn!(error = %err, "config hot-reload unavailable");
            None
        }
    };

    let start = Instant::now();
    let (mut source, mut vitals) = {
        let cfg = shared.read().expect("config lock poisoned");
        info!(app_name = %cfg.app_name, "farmbot starting");
        (WindowSource::new(&cfg.app_name), Vitals::new(cfg.bars.clone()))
    };
    let mut motion = Motion::new(Box::new(NullDriver), StdRng::from_entropy());
    let mut stats = Statistics::new(start);
    let mut behavior = FarmingBehavior::new(start);

    let mut was_stopped = false;
    let mut ticks = 0u32;
    loop {
        let cfg = shared.read().expect("config lock poisoned").clone();
        source.set_app_name(&cfg.app_name);

        // The kill switch releases held keys once when it flips on.
        if cfg.stop_fighting && !was_stopped {
            info!("stop_fighting enabled; releasing input");
            behavior.stop(&mut motion);
        }
        was_stopped = cfg.stop_fighting;

        let Some(frame) = source.capture() else {
            debug!(app_name = %cfg.app_name, "window not found; skipping tick");
            std::thread::sleep(Duration::from_millis(cfg.tick_interval_ms.max(100)));
            continue;
        };

        let now = Instant::now();
        let mut ctx = TickCtx {
            frame: &frame,
            vitals: &mut vitals,
            motion: &mut motion,
            config: &cfg,
            stats: &mut stats,
            now,
        };
        behavior.tick(&mut ctx);

        ticks += 1;
        if ticks % STATUS_EVERY == 0 {
            log_status(&behavior, &vitals, &stats, now);
        }

        std::thread::sleep(Duration::from_millis(cfg.tick_interval_ms));
    }
}

fn log_status(behavior: &FarmingBehavior, vitals: &Vitals, stats: &Statistics, now: Instant) {
    let snap = behavior.snapshot(vitals, stats, now);
    for bar in &snap.bars {
        if bar.detected {
            debug!(bar = bar.name, percent = bar.percent, bounds = ?bar.bounds, "bar");
        }
    }
    info!(
        behavior = behavior.name(),
        state = snap.state,
        kills = snap.kills,
        per_hour = format!("{:.1}", snap.kills_per_hour),
        mobs_seen = snap.targets.len(),
        avoided = snap.avoided_zones,
        avg_fight = %format_duration(stats.average_fight()),
        avg_search = %format_duration(stats.average_search()),
        since_kill = %stats
            .last_kill()
            .map(|at| format_duration(now.duration_since(at)))
            .unwrap_or_else(|| "never".into()),
        uptime = %format_duration(stats.uptime(now)),
        "status"
    );
}
