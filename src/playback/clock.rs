//! Pacing clock abstraction
//!
//! Real-time pacing goes through this trait instead of reading the wall
//! clock directly, so pacing behavior can be tested without real sleeps.

use std::time::{Duration, Instant};

/// Monotonic clock used by the dispatcher for real-time pacing
pub trait Clock {
    fn now(&mut self) -> Instant;
    fn sleep(&mut self, duration: Duration);
}

/// Wall-clock implementation backed by std
#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&mut self) -> Instant {
        Instant::now()
    }

    fn sleep(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Test clock that only advances when slept on
#[cfg(test)]
pub(crate) struct ManualClock {
    base: Instant,
    offset: Duration,
    slept: std::rc::Rc<std::cell::Cell<Duration>>,
}

#[cfg(test)]
impl ManualClock {
    /// Returns the clock and a shared counter of total time slept
    pub fn new() -> (Self, std::rc::Rc<std::cell::Cell<Duration>>) {
        let slept = std::rc::Rc::new(std::cell::Cell::new(Duration::ZERO));
        (
            Self {
                base: Instant::now(),
                offset: Duration::ZERO,
                slept: slept.clone(),
            },
            slept,
        )
    }
}

#[cfg(test)]
impl Clock for ManualClock {
    fn now(&mut self) -> Instant {
        self.base + self.offset
    }

    fn sleep(&mut self, duration: Duration) {
        self.offset += duration;
        self.slept.set(self.slept.get() + duration);
    }
}
