//! Actuator boundary.
//!
//! The engine never synthesizes OS input itself. Everything it wants to do to
//! the client goes through an [`InputDriver`], so a platform backend, a dry-run
//! logger, and the scripted test driver are interchangeable.

#[cfg(test)]
use std::cell::RefCell;
use std::fmt;
#[cfg(test)]
use std::rc::Rc;
use std::time::Duration;

use tracing::debug;

use vision::Point;

/// Keys the behaviors use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    W,
    A,
    S,
    D,
    Space,
    /// Target lock.
    Z,
    /// Stat tray toggle.
    T,
    Escape,
    ArrowLeft,
    ArrowRight,
    /// Action bar slot key, `0..=9`.
    Slot(u8),
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::W => write!(f, "w"),
            Key::A => write!(f, "a"),
            Key::S => write!(f, "s"),
            Key::D => write!(f, "d"),
            Key::Space => write!(f, "space"),
            Key::Z => write!(f, "z"),
            Key::T => write!(f, "t"),
            Key::Escape => write!(f, "escape"),
            Key::ArrowLeft => write!(f, "left"),
            Key::ArrowRight => write!(f, "right"),
            Key::Slot(n) => write!(f, "slot {n}"),
        }
    }
}

/// Fire-and-forget action primitives.
///
/// Drivers do not report failures upward; a missed click shows up as a failed
/// verify pass on a later tick, which the state machine already handles.
pub trait InputDriver {
    fn click(&mut self, point: Point);
    fn press(&mut self, key: Key);
    fn hold(&mut self, key: Key);
    fn release(&mut self, key: Key);

    /// Trigger an action bar slot.
    fn use_slot(&mut self, slot: u8) {
        self.press(Key::Slot(slot));
    }

    /// Pace a maneuver. Live drivers sleep; scripted drivers return
    /// immediately.
    fn pause(&mut self, duration: Duration);
}

/// Logs every action at debug level and sleeps for real.
///
/// The default driver until a platform backend is wired in, and a safe
/// dry-run target for watching what the bot would do.
pub struct NullDriver;

impl InputDriver for NullDriver {
    fn click(&mut self, point: Point) {
        debug!(x = point.x, y = point.y, "click");
    }

    fn press(&mut self, key: Key) {
        debug!(%key, "press");
    }

    fn hold(&mut self, key: Key) {
        debug!(%key, "hold");
    }

    fn release(&mut self, key: Key) {
        debug!(%key, "release");
    }

    fn pause(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// One recorded driver call.
#[cfg(test)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Click(Point),
    Press(Key),
    Hold(Key),
    Release(Key),
    UseSlot(u8),
    Pause(Duration),
}

/// Shared handle to a recorded action sequence.
#[cfg(test)]
pub type ActionLog = Rc<RefCell<Vec<Action>>>;

/// Records every action and never sleeps. Backs the scripted tests.
#[cfg(test)]
pub struct RecordingDriver {
    log: ActionLog,
}

#[cfg(test)]
impl RecordingDriver {
    pub fn new() -> (Self, ActionLog) {
        let log: ActionLog = Rc::default();
        let driver = Self {
            log: Rc::clone(&log),
        };
        (driver, log)
    }
}

#[cfg(test)]
impl InputDriver for RecordingDriver {
    fn click(&mut self, point: Point) {
        self.log.borrow_mut().push(Action::Click(point));
    }

    fn press(&mut self, key: Key) {
        self.log.borrow_mut().push(Action::Press(key));
    }

    fn hold(&mut self, key: Key) {
        self.log.borrow_mut().push(Action::Hold(key));
    }

    fn release(&mut self, key: Key) {
        self.log.borrow_mut().push(Action::Release(key));
    }

    fn use_slot(&mut self, slot: u8) {
        self.log.borrow_mut().push(Action::UseSlot(slot));
    }

    fn pause(&mut self, duration: Duration) {
        self.log.borrow_mut().push(Action::Pause(duration));
    }
}
