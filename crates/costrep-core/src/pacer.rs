//! Delay scheduling for the serial batch.
//!
//! Every wait in a run (backoff after a 429, cooldown between the two metric
//! queries, cooldown between subscriptions) goes through a [`Pacer`]. The
//! production pacer blocks the current thread; tests record the requested
//! delays instead of sleeping.

use std::time::Duration;

/// Something that can hold the current thread of control for a delay.
pub trait Pacer {
    fn pause(&self, delay: Duration);
}

/// Blocks the calling thread with `std::thread::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadPacer;

impl Pacer for ThreadPacer {
    fn pause(&self, delay: Duration) {
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
    }
}

/// Records requested delays without sleeping.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct RecordingPacer {
    pauses: std::sync::Mutex<Vec<Duration>>,
}

#[cfg(test)]
impl RecordingPacer {
    pub(crate) fn pauses(&self) -> Vec<Duration> {
        self.pauses.lock().unwrap().clone()
    }
}

#[cfg(test)]
impl Pacer for RecordingPacer {
    fn pause(&self, delay: Duration) {
        self.pauses.lock().unwrap().push(delay);
    }
}
