//! Behaviors drive one perceive-decide-act cycle per tick.

mod farming;

pub use farming::{FarmingBehavior, FarmingState};

use std::time::Instant;

use vision::vitals::Vitals;
use vision::Frame;

use crate::config::Config;
use crate::motion::Motion;
use crate::overlay::Snapshot;
use crate::stats::Statistics;

/// Everything one tick gets to see and touch.
///
/// The config is a snapshot for the whole tick; hot reloads land on the next
/// one.
pub struct TickCtx<'a> {
    pub frame: &'a Frame,
    pub vitals: &'a mut Vitals,
    pub motion: &'a mut Motion,
    pub config: &'a Config,
    pub stats: &'a mut Statistics,
    pub now: Instant,
}

/// A mode of operation. One tick runs to completion; the only cancellation
/// points are tick boundaries.
pub trait Behavior {
    fn name(&self) -> &'static str;

    fn tick(&mut self, ctx: &mut TickCtx);

    /// Release held keys and drop transient state.
    fn stop(&mut self, motion: &mut Motion);

    fn snapshot(&self, vitals: &Vitals, stats: &Statistics, now: Instant) -> Snapshot;
}
