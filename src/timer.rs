use std::time::{Duration, Instant};

/// Whole-second countdown driven by the caller's ticks.
///
/// The timer never spawns anything; the event loop calls [`tick`] with the
/// current instant and gets `true` back exactly once when time runs out.
///
/// [`tick`]: CountdownTimer::tick
#[derive(Debug, Clone)]
pub struct CountdownTimer {
    duration_secs: u64,
    seconds_remaining: u64,
    armed_at: Option<Instant>,
}

impl CountdownTimer {
    pub fn new(duration_secs: u64) -> Self {
        Self {
            duration_secs,
            seconds_remaining: duration_secs,
            armed_at: None,
        }
    }

    /// Start a fresh countdown, replacing any countdown still running.
    pub fn arm(&mut self, duration_secs: u64, now: Instant) {
        self.disarm();
        self.duration_secs = duration_secs;
        self.seconds_remaining = duration_secs;
        self.armed_at = Some(now);
    }

    pub fn disarm(&mut self) {
        self.armed_at = None;
    }

    /// Disarm and show `duration_secs` as the baseline for the next countdown.
    pub fn reset(&mut self, duration_secs: u64) {
        self.disarm();
        self.duration_secs = duration_secs;
        self.seconds_remaining = duration_secs;
    }

    /// Advance to `now`. Returns `true` once, when an armed countdown hits zero.
    pub fn tick(&mut self, now: Instant) -> bool {
        let Some(armed_at) = self.armed_at else {
            return false;
        };

        let elapsed = now.saturating_duration_since(armed_at).as_secs();
        self.seconds_remaining = self.duration_secs.saturating_sub(elapsed);

        if self.seconds_remaining == 0 {
            self.armed_at = None;
            return true;
        }
        false
    }

    pub fn is_armed(&self) -> bool {
        self.armed_at.is_some()
    }

    pub fn seconds_remaining(&self) -> u64 {
        self.seconds_remaining
    }

    pub fn duration_secs(&self) -> u64 {
        self.duration_secs
    }

    /// Instant at which the armed countdown expires
    pub fn deadline(&self) -> Option<Instant> {
        self.armed_at.map(|t| t + Duration::from_secs(self.duration_secs))
    }
}
