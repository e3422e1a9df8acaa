//! Error accounting and lifecycle state of the readout loop

use std::time::{Duration, Instant};

/// Errors further apart than this start a new episode
pub const ERROR_WINDOW: Duration = Duration::from_secs(300);

/// Errors tolerated within one episode; the next one trips the breaker
pub const MAX_ERRORS: u32 = 5;

/// Lifecycle of the readout loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    /// Shutdown requested; the current cycle completes first
    ShuttingDown,
    Stopped,
}

/// Why the readout loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Shutdown,
    BreakerTripped,
}

/// Counts errors per episode and trips once an episode grows too long
#[derive(Debug, Clone)]
pub struct ErrorBreaker {
    count: u32,
    last_error: Option<Instant>,
    window: Duration,
    max_errors: u32,
}

impl Default for ErrorBreaker {
    fn default() -> Self {
        Self::new(ERROR_WINDOW, MAX_ERRORS)
    }
}

impl ErrorBreaker {
    pub fn new(window: Duration, max_errors: u32) -> Self {
        Self {
            count: 0,
            last_error: None,
            window,
            max_errors,
        }
    }

    /// Record an error happening now
    ///
    /// # Returns
    ///
    /// `true` if the breaker trips
    pub fn record(&mut self) -> bool {
        self.record_at(Instant::now())
    }

    /// Record an error that happened at `now`
    pub fn record_at(&mut self, now: Instant) -> bool {
        self.count = match self.last_error {
            Some(last) if now.saturating_duration_since(last) <= self.window => self.count + 1,
            _ => 1,
        };
        if self.count > self.max_errors {
            return true;
        }
        self.last_error = Some(now);
        false
    }

    /// Errors in the current episode
    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn window(&self) -> Duration {
        self.window
    }
}
