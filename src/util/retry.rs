use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryOutcome {
    /// Another attempt is scheduled after the fixed delay.
    Retry,
    /// The attempt bound is spent; give up.
    Exhausted,
}

/// Bounded wait-for-precondition schedule: a fixed number of attempts
/// separated by a fixed delay. The bound and the delay stay independently
/// testable instead of being baked into an ad hoc recursion.
#[derive(Debug, Clone)]
pub struct RetrySchedule {
    max_attempts: u32,
    delay: Duration,
    attempts: u32,
    next_at: Option<Instant>,
}

impl RetrySchedule {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
            attempts: 0,
            next_at: None,
        }
    }

    /// Whether an attempt may run now.
    pub fn ready(&self, now: Instant) -> bool {
        self.next_at.is_none_or(|at| now >= at)
    }

    /// Records a failed attempt and schedules the next one, unless the
    /// bound is spent.
    pub fn record_failure(&mut self, now: Instant) -> RetryOutcome {
        self.attempts += 1;
        if self.attempts >= self.max_attempts {
            RetryOutcome::Exhausted
        } else {
            self.next_at = Some(now + self.delay);
            RetryOutcome::Retry
        }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Time until the next scheduled attempt, if one is pending.
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.next_at.map(|at| at.saturating_duration_since(now))
    }
}
