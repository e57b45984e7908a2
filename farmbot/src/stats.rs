//! Session kill statistics.

use std::time::{Duration, Instant};

/// Aggregated over one bot session.
///
/// Each kill carries a timing split: search time (previous kill to the first
/// attack on this target) and fight time (first attack to the kill).
#[derive(Debug, Clone)]
pub struct Statistics {
    started: Instant,
    kills: u32,
    total_search: Duration,
    total_fight: Duration,
    last_kill: Option<Instant>,
}

impl Statistics {
    pub fn new(now: Instant) -> Self {
        Self {
            started: now,
            kills: 0,
            total_search: Duration::ZERO,
            total_fight: Duration::ZERO,
            last_kill: None,
        }
    }

    pub fn record_kill(&mut self, search: Duration, fight: Duration, now: Instant) {
        self.kills += 1;
        self.total_search += search;
        self.total_fight += fight;
        self.last_kill = Some(now);
    }

    pub fn kills(&self) -> u32 {
        self.kills
    }

    pub fn started(&self) -> Instant {
        self.started
    }

    pub fn last_kill(&self) -> Option<Instant> {
        self.last_kill
    }

    pub fn uptime(&self, now: Instant) -> Duration {
        now.duration_since(self.started)
    }

    pub fn kills_per_minute(&self, now: Instant) -> f64 {
        let minutes = self.uptime(now).as_secs_f64() / 60.0;
        if minutes <= 0.0 {
            return 0.0;
        }
        f64::from(self.kills) / minutes
    }

    pub fn kills_per_hour(&self, now: Instant) -> f64 {
        self.kills_per_minute(now) * 60.0
    }

    pub fn average_search(&self) -> Duration {
        if self.kills == 0 {
            return Duration::ZERO;
        }
        self.total_search / self.kills
    }

    pub fn average_fight(&self) -> Duration {
        if self.kills == 0 {
            return Duration::ZERO;
        }
        self.total_fight / self.kills
    }
}

/// Compact `1h02m03s` rendering for status lines.
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    let hours = secs / 3600;
    let minutes = secs % 3600 / 60;
    let seconds = secs % 60;
    if hours > 0 {
        format!("{hours}h{minutes:02}m{seconds:02}s")
    } else if minutes > 0 {
        format!("{minutes}m{seconds:02}s")
    } else {
        format!("{seconds}s")
    }
}
