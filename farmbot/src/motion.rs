//! Movement choreography on top of the input driver.
//!
//! Behaviors express intent (`rotate_random`, `avoid_obstacle`) instead of
//! key sequences. All pacing goes through [`InputDriver::pause`], so scripted
//! drivers run maneuvers instantly.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::Rng;
use tracing::debug;

use vision::Point;

use crate::input::{InputDriver, Key};

/// Owns the driver and the maneuver RNG.
pub struct Motion {
    driver: Box<dyn InputDriver>,
    rng: StdRng,
}

impl Motion {
    pub fn new(driver: Box<dyn InputDriver>, rng: StdRng) -> Self {
        Self { driver, rng }
    }

    pub fn click(&mut self, point: Point) {
        self.driver.click(point);
    }

    pub fn use_slot(&mut self, slot: u8) {
        self.driver.use_slot(slot);
    }

    pub fn pause(&mut self, duration: Duration) {
        self.driver.pause(duration);
    }

    /// Tap the target-lock key.
    pub fn lock_target(&mut self) {
        self.driver.press(Key::Z);
    }

    /// Drop the current selection.
    pub fn cancel_target(&mut self) {
        self.driver.press(Key::Escape);
    }

    /// Toggle the stat tray open.
    pub fn open_stat_tray(&mut self) {
        self.driver.press(Key::T);
    }

    /// Turn the camera in place for `duration`.
    pub fn rotate(&mut self, right: bool, duration: Duration) {
        let key = if right { Key::ArrowRight } else { Key::ArrowLeft };
        self.driver.hold(key);
        self.driver.pause(duration);
        self.driver.release(key);
    }

    /// One camera sweep in a random direction with jittered duration, so
    /// repeated searches do not trace the same arc.
    pub fn rotate_random(&mut self) {
        let right = self.rng.gen_bool(0.5);
        let duration = Duration::from_millis(self.rng.gen_range(40..=60));
        debug!(right, ?duration, "rotating camera");
        self.rotate(right, duration);
    }

    /// Strafing run to a new spot: forward jump with a side strafe, then a
    /// short backstep to face whatever the run uncovered.
    pub fn circle_move(&mut self, duration: Duration) {
        debug!(?duration, "circling to a new spot");
        self.driver.hold(Key::W);
        self.driver.hold(Key::Space);
        self.driver.hold(Key::D);
        self.driver.pause(duration);
        self.driver.release(Key::D);
        self.driver.pause(Duration::from_millis(20));
        self.driver.release(Key::Space);
        self.driver.release(Key::W);
        self.driver.hold(Key::S);
        self.driver.pause(Duration::from_millis(50));
        self.driver.release(Key::S);
    }

    /// One attempt at getting around whatever blocks the current target.
    ///
    /// Attempt 0 just re-locks and jumps forward. Later attempts strafe to
    /// alternating sides first, then jump forward and re-lock.
    pub fn avoid_obstacle(&mut self, attempt: u32) {
        if attempt == 0 {
            self.lock_target();
            self.driver.hold(Key::W);
            self.driver.hold(Key::Space);
            self.driver.pause(Duration::from_millis(800));
            self.driver.release(Key::Space);
            self.driver.release(Key::W);
            return;
        }

        let side = if attempt % 2 == 0 { Key::A } else { Key::D };
        self.driver.hold(side);
        self.driver.pause(Duration::from_millis(200));
        self.driver.hold(Key::W);
        self.driver.hold(Key::Space);
        self.driver.pause(Duration::from_millis(600));
        self.driver.release(side);
        self.driver.release(Key::Space);
        self.driver.release(Key::W);
        self.lock_target();
    }

    /// Release every movement key. Called when a behavior stops.
    pub fn stop_all(&mut self) {
        for key in [Key::W, Key::A, Key::S, Key::D, Key::Space] {
            self.driver.release(key);
        }
    }
}
