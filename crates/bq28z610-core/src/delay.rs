//! Injectable delay source.
//!
//! The gauge mandates real wall-clock waits between protocol steps (5 ms
//! after arming a subcommand, 200 ms after a flash commit, a full second
//! after unsealing). Production uses [`WallClockDelay`]; tests inject
//! [`NoopDelay`] so nothing sleeps.

use std::time::Duration;

pub trait DelaySource: Send + Sync {
    fn delay(&self, duration: Duration);
}

/// Blocks the current thread for the requested duration.
#[derive(Debug, Default, Clone, Copy)]
pub struct WallClockDelay;

impl DelaySource for WallClockDelay {
    fn delay(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Returns immediately.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopDelay;

impl DelaySource for NoopDelay {
    fn delay(&self, _duration: Duration) {}
}
