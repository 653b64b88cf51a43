//! Time sources.
//!
//! The round engine needs two kinds of time: a monotonic reading for the
//! countdown and display delays, and a wall-clock reading for ranking
//! timestamps.

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};

/// A source of monotonic and wall-clock time.
pub trait Clock {
    /// Monotonic time since an arbitrary, fixed origin.
    ///
    /// Must never decrease between calls.
    fn monotonic(&self) -> Duration;

    /// Current wall-clock time.
    fn wall(&self) -> DateTime<Utc>;
}

/// Clock backed by [`Instant`] and the system wall clock.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// Create a clock whose monotonic origin is now.
    pub fn new() -> Self {
        Self { origin: Instant::now() }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn monotonic(&self) -> Duration {
        self.origin.elapsed()
    }

    fn wall(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually advanced clock.
///
/// Clones share the same time, so a test can keep a handle while the engine
/// owns another.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Rc<Cell<Duration>>,
    epoch: DateTime<Utc>,
}

impl ManualClock {
    /// Create a clock at monotonic zero whose wall time starts at `epoch`.
    pub fn new(epoch: DateTime<Utc>) -> Self {
        Self {
            now: Rc::new(Cell::new(Duration::ZERO)),
            epoch,
        }
    }

    /// Move time forward.
    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    /// Move time forward by whole milliseconds.
    pub fn advance_ms(&self, ms: u64) {
        self.advance(Duration::from_millis(ms));
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(DateTime::<Utc>::default())
    }
}

impl Clock for ManualClock {
    fn monotonic(&self) -> Duration {
        self.now.get()
    }

    fn wall(&self) -> DateTime<Utc> {
        // chrono::Duration::from_std only fails beyond ~292 billion years
        self.epoch + chrono::Duration::from_std(self.now.get()).unwrap_or(chrono::Duration::zero())
    }
}
