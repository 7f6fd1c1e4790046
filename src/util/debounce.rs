use std::time::{Duration, Instant};

/// Cancellable quiet-period timer. Every `notify` replaces the pending
/// deadline, so a burst of notifications collapses into a single `fire`
/// once the quiet period has elapsed.
#[derive(Debug, Clone)]
pub struct Debouncer {
    quiet: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            deadline: None,
        }
    }

    /// Arms (or rearms) the deadline at `now + quiet`.
    pub fn notify(&mut self, now: Instant) {
        self.deadline = Some(now + self.quiet);
    }

    /// Returns true exactly once per elapsed deadline.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Time left until the pending deadline, if any.
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.deadline.map(|d| d.saturating_duration_since(now))
    }
}
