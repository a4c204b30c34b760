/*!
 * Multi-Wait Coordinator
 *
 * One coordinator is allocated per [`wait_any`](crate::wait_any) /
 * [`wait_all`](crate::wait_all) call and shared, via `Arc`, between the
 * waiting thread and every event registry holding a registration for it.
 * The `Arc` strong count plays the role of the reference count in the
 * teardown protocol: each registration owns one clone, the waiting
 * thread owns one, and whichever party drops the last clone frees the
 * record.
 *
 * # Progress tracking
 *
 * - Wait-any: `fired` under the progress mutex, set by the signaler that
 *   hands this wait its event.
 * - Wait-all: `events_left`, an atomic counter of unclaimed events.
 *   Decrements toward zero only happen while the progress mutex is held,
 *   so the waiting thread's check-then-park is race-free; increments
 *   (claim revocations) happen lock-free under the revoking event's own
 *   lock.
 */

use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Which completion rule a multi-wait call uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WaitMode {
    /// Complete when any one event fires.
    Any,
    /// Complete when every event has been claimed, then consume all of
    /// them atomically.
    All,
}

/// Mutex-guarded progress of one multi-wait call.
#[derive(Debug)]
pub(crate) struct Progress {
    /// Index of the event that satisfied a wait-any, once one has.
    pub(crate) fired: Option<usize>,
}

/// Per-call coordination record for a multi-event wait.
pub(crate) struct Coordinator {
    mode: WaitMode,
    /// Local to this wait; signalers lock it before touching `fired` or
    /// completing a claim.
    pub(crate) progress: Mutex<Progress>,
    pub(crate) cond: Condvar,
    /// Wait-all only: events not yet claimed for this call.
    events_left: AtomicUsize,
    /// Fast-path hint that the waiting thread has already left. Always
    /// re-checked under the progress mutex before acting on it.
    still_waiting: AtomicBool,
}

impl Coordinator {
    pub fn new_wait_any() -> Self {
        Self::new(WaitMode::Any, 0)
    }

    pub fn new_wait_all(count: usize) -> Self {
        Self::new(WaitMode::All, count)
    }

    fn new(mode: WaitMode, count: usize) -> Self {
        Self {
            mode,
            progress: Mutex::new(Progress { fired: None }),
            cond: Condvar::new(),
            events_left: AtomicUsize::new(count),
            still_waiting: AtomicBool::new(true),
        }
    }

    pub fn is_wait_all(&self) -> bool {
        self.mode == WaitMode::All
    }

    /// Relaxed: callers that intend to act on `true` must re-check under
    /// the progress mutex; `false` is stable once stored.
    pub fn is_waiting(&self) -> bool {
        self.still_waiting.load(Ordering::Relaxed)
    }

    /// Mark the waiting thread as gone. Called with the progress mutex
    /// held so in-flight signalers observe it on their locked re-check.
    pub fn retire(&self) {
        self.still_waiting.store(false, Ordering::Relaxed);
    }

    /// Claim one event toward wait-all completion. Returns true when this
    /// was the last outstanding event; the caller then notifies `cond`.
    ///
    /// Must be called with the progress mutex held.
    pub fn claim(&self) -> bool {
        let left = self.events_left.fetch_sub(1, Ordering::AcqRel);
        debug_assert!(left > 0, "claim with no events outstanding");
        left == 1
    }

    /// Take back claims an event had granted to this wait (reset, drain,
    /// or a consume by somebody else). Moves `events_left` away from
    /// zero, so no notification is needed.
    pub fn revoke_claims(&self, count: usize) {
        debug_assert!(self.is_wait_all());
        self.events_left.fetch_add(count, Ordering::AcqRel);
    }

    /// Fold the events observed already-signaled during registration into
    /// the outstanding count in one step.
    ///
    /// Must be called with the progress mutex held.
    pub fn apply_skipped(&self, count: usize) {
        if count > 0 {
            self.events_left.fetch_sub(count, Ordering::AcqRel);
        }
    }

    pub fn events_left(&self) -> usize {
        self.events_left.load(Ordering::Acquire)
    }
}
