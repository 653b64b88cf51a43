//! Round countdown.
//!
//! Remaining time is derived from monotonic elapsed time rather than from
//! counting ticks, so a late or skipped tick never stretches the limit.

use std::time::Duration;

/// Per-round countdown with a single-fire timeout.
#[derive(Clone, Debug)]
pub struct Countdown {
    limit: Duration,
    started_at: Duration,
    remaining: f64,
    armed: bool,
    fired: bool,
}

impl Countdown {
    /// Create a disarmed countdown showing the full limit.
    pub fn new(limit: Duration) -> Self {
        Self {
            limit,
            started_at: Duration::ZERO,
            remaining: limit.as_secs_f64(),
            armed: false,
            fired: false,
        }
    }

    /// Restart from the full limit at monotonic time `now`.
    pub fn start(&mut self, now: Duration) {
        self.started_at = now;
        self.remaining = self.limit.as_secs_f64();
        self.armed = true;
        self.fired = false;
    }

    /// Stop sampling. Remaining time stays frozen at its last value.
    pub fn disarm(&mut self) {
        self.armed = false;
    }

    /// Back to the full limit, disarmed.
    pub fn reset(&mut self) {
        self.remaining = self.limit.as_secs_f64();
        self.armed = false;
        self.fired = false;
    }

    /// Sample the countdown at monotonic time `now`.
    ///
    /// Returns `true` exactly once per start: on the first sample where the
    /// remaining time reaches zero. The countdown disarms itself when it
    /// fires.
    pub fn sample(&mut self, now: Duration) -> bool {
        if !self.armed {
            return false;
        }

        let elapsed = now.saturating_sub(self.started_at).as_secs_f64();
        let remaining = (self.limit.as_secs_f64() - elapsed).max(0.0);
        // Never tick back up, even if the caller hands us an older reading
        self.remaining = self.remaining.min(remaining);

        if self.remaining <= 0.0 && !self.fired {
            self.remaining = 0.0;
            self.fired = true;
            self.armed = false;
            return true;
        }
        false
    }

    /// Seconds left, clamped at zero.
    pub fn remaining(&self) -> f64 {
        self.remaining
    }

    /// Full limit of a round.
    pub fn limit(&self) -> Duration {
        self.limit
    }

    /// Whether ticks are currently being sampled.
    pub fn is_armed(&self) -> bool {
        self.armed
    }
}
