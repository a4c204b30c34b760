/*!
 * Deadline Handling
 *
 * Every blocking operation takes an `Option<Duration>`: `None` waits
 * forever, `Some(Duration::ZERO)` polls. The deadline is derived once
 * from the monotonic clock at entry so that spurious wakeups re-wait
 * against the same absolute instant instead of restarting the clock.
 */

use std::time::{Duration, Instant};

/// Absolute deadline for a single wait, computed once at entry.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Deadline {
    at: Option<Instant>,
}

impl Deadline {
    /// Derive the deadline from a caller-supplied timeout.
    ///
    /// A timeout too large to represent as an `Instant` saturates to
    /// unbounded, which is indistinguishable from infinite for any
    /// caller that could observe it.
    pub fn after(timeout: Option<Duration>) -> Self {
        Self {
            at: timeout.and_then(|limit| Instant::now().checked_add(limit)),
        }
    }

    /// The absolute instant to wait until, or `None` for an unbounded wait.
    pub fn instant(&self) -> Option<Instant> {
        self.at
    }
}
