//! Time utilities for bounded waits.

pub use std::time::{Duration, Instant};

/// The point in time at which a bounded wait gives up.
///
/// A `Deadline` built from `None` never expires, which is how callers
/// express "wait without a timeout".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline(Option<Instant>);

impl Deadline {
    /// A deadline `timeout` from now, or one that never expires if
    /// `timeout` is `None`.
    pub fn after(timeout: Option<Duration>) -> Self {
        Self(timeout.and_then(|timeout| Instant::now().checked_add(timeout)))
    }

    /// The instant this deadline expires at, if any.
    pub fn instant(&self) -> Option<Instant> {
        self.0
    }
}
