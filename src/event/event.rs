/*!
 * Event Object
 *
 * The signaled flag is an atomic so fast paths can peek at it without
 * the lock, but it is only ever *written* while the event mutex is held;
 * a relaxed load outside the lock is never acted on without either an
 * acquire confirmation or taking the mutex.
 *
 * # Signaling
 *
 * `set` walks the registry of parked multi-waits before it publishes the
 * state. Wait-any waiters compete with single waiters for an auto-reset
 * signal and consume it on the spot; wait-all waiters only *claim* the
 * event (a reversible bookkeeping mark) and consume nothing until their
 * coordinator's final all-locks-held step.
 */

use crate::core::errors::{WaitError, WaitResult};
use crate::core::timeout::Deadline;
use crate::event::registry::Registry;
use crate::event::types::ResetPolicy;
use crate::multiwait::coordinator::Coordinator;
use parking_lot::{Condvar, Mutex, MutexGuard};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// A Win32-style event: a waitable boolean with auto- or manual-reset
/// semantics.
///
/// Thread-safe; wrap in an [`Arc`] to share across threads. Dropping the
/// event releases everything: the borrow checker rules out waiters
/// outliving it.
pub struct Event {
    /// Immutable after construction.
    auto_reset: bool,
    /// True ⇔ signaled. Written only under `registry`'s mutex.
    state: AtomicBool,
    /// The event mutex; its data is the registry of parked multi-waits.
    registry: Mutex<Registry>,
    /// Blocks single waiters. Multi-waits block on their own condvar.
    cond: Condvar,
}

impl Event {
    /// Create an event with the given reset policy and initial state.
    pub fn new(policy: ResetPolicy, initially_set: bool) -> Self {
        let event = Self {
            auto_reset: policy == ResetPolicy::Auto,
            state: AtomicBool::new(false),
            registry: Mutex::new(Registry::default()),
            cond: Condvar::new(),
        };
        if initially_set {
            // Reuse the one signaling path; no waiter can exist yet.
            event.set();
        }
        event
    }

    /// Signal the event.
    ///
    /// Auto-reset: releases exactly one waiter (a parked single waiter or
    /// wait-any), or leaves the event signaled for the next one.
    /// Manual-reset: releases every current waiter and stays signaled.
    pub fn set(&self) {
        let mut registry = self.registry.lock();

        let mut index = 0;
        while index < registry.waits.len() {
            if !registry.waits[index].coordinator.is_waiting() {
                let _ = registry.waits.remove(index);
                continue;
            }

            let coordinator = Arc::clone(&registry.waits[index].coordinator);
            let mut progress = coordinator.progress.lock();
            if !coordinator.is_waiting() {
                // Lost the race against the waiter's exit; expired now.
                drop(progress);
                let _ = registry.waits.remove(index);
                continue;
            }

            if coordinator.is_wait_all() {
                if !registry.waits[index].claimed {
                    registry.waits[index].claimed = true;
                    let completed = coordinator.claim();
                    drop(progress);
                    if completed {
                        coordinator.cond.notify_one();
                    }
                }
                // Claims never consume; the coordinator's consume step
                // owns that. Keep walking so every wait-all sees us.
                index += 1;
                continue;
            }

            // Wait-any: hand this wait its event.
            progress.fired = Some(registry.waits[index].wait_index);
            coordinator.retire();
            drop(progress);
            coordinator.cond.notify_one();
            let _ = registry.waits.remove(index);

            if self.auto_reset {
                // The single signal is used up; state stays unsignaled.
                return;
            }
            // Manual-reset satisfies everyone; keep walking.
        }

        self.state.store(true, Ordering::Release);
        drop(registry);

        if self.auto_reset {
            self.cond.notify_one();
        } else {
            self.cond.notify_all();
        }
    }

    /// Unsignal the event.
    ///
    /// Any claim this event granted to a pending wait-all is taken back,
    /// so a wait-all never completes against a reset signal.
    pub fn reset(&self) {
        let mut registry = self.registry.lock();
        self.state.store(false, Ordering::Release);
        registry.revoke_claims(None);
    }

    /// `set` immediately followed by `reset`: wake whoever is currently
    /// waiting, leave the event unsignaled.
    pub fn pulse(&self) {
        self.set();
        self.reset();
    }

    /// Block until the event is signaled.
    ///
    /// `None` waits forever; `Some(Duration::ZERO)` polls. For an
    /// auto-reset event a successful wait consumes the signal.
    ///
    /// Returns `Err(WaitError::Timeout)` if the deadline expired first.
    pub fn wait(&self, timeout: Option<Duration>) -> WaitResult<()> {
        // Polling an unsignaled event never needs the lock. Stale reads
        // only cost a spurious timeout the caller asked to risk.
        if timeout == Some(Duration::ZERO) && !self.state.load(Ordering::Relaxed) {
            return Err(WaitError::Timeout);
        }

        // A signaled manual-reset event has nothing to consume: confirm
        // the relaxed peek with an acquire load and skip the lock.
        if !self.auto_reset
            && self.state.load(Ordering::Relaxed)
            && self.state.load(Ordering::Acquire)
        {
            return Ok(());
        }

        let mut registry = self.registry.lock();
        self.wait_locked(&mut registry, timeout)
    }

    /// Inner wait routine, event mutex held.
    fn wait_locked(
        &self,
        guard: &mut MutexGuard<'_, Registry>,
        timeout: Option<Duration>,
    ) -> WaitResult<()> {
        if !self.state.load(Ordering::Relaxed) {
            if timeout == Some(Duration::ZERO) {
                return Err(WaitError::Timeout);
            }
            let deadline = Deadline::after(timeout);
            loop {
                match deadline.instant() {
                    Some(at) => {
                        if self.cond.wait_until(guard, at).timed_out() {
                            if self.state.load(Ordering::Relaxed) {
                                // The signal landed as the deadline
                                // expired; take it rather than lose it.
                                break;
                            }
                            return Err(WaitError::Timeout);
                        }
                    }
                    None => self.cond.wait(guard),
                }
                // Spurious wake or a broadcast we lost the race on.
                if self.state.load(Ordering::Relaxed) {
                    break;
                }
            }
        }
        self.consume_locked(guard, None);
        Ok(())
    }

    /// Take the signal out of the event, mutex held. Manual-reset events
    /// stay signaled. Draining an auto-reset event steals it from every
    /// pending wait-all claim except `keep`'s, whose consume step is the
    /// caller.
    pub(crate) fn consume_locked(&self, registry: &mut Registry, keep: Option<&Coordinator>) {
        if self.auto_reset {
            self.state.store(false, Ordering::Release);
            registry.revoke_claims(keep);
        }
    }

    pub(crate) fn is_auto_reset(&self) -> bool {
        self.auto_reset
    }

    /// Unsynchronized peek; may be stale.
    pub(crate) fn signaled_relaxed(&self) -> bool {
        self.state.load(Ordering::Relaxed)
    }

    /// Synchronizes with the release store of the `set` that signaled.
    pub(crate) fn signaled_acquire(&self) -> bool {
        self.state.load(Ordering::Acquire)
    }

    pub(crate) fn lock_registry(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock()
    }

    pub(crate) fn try_lock_registry(&self) -> Option<MutexGuard<'_, Registry>> {
        self.registry.try_lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Instant;

    #[test]
    fn initially_set_auto_reset_is_consumed_once() {
        let event = Event::new(ResetPolicy::Auto, true);
        assert!(event.wait(Some(Duration::ZERO)).is_ok());
        assert_eq!(event.wait(Some(Duration::ZERO)), Err(WaitError::Timeout));
    }

    #[test]
    fn manual_reset_signal_sticks() {
        let event = Event::new(ResetPolicy::Manual, true);
        assert!(event.wait(Some(Duration::ZERO)).is_ok());
        assert!(event.wait(Some(Duration::ZERO)).is_ok());
        event.reset();
        assert_eq!(event.wait(Some(Duration::ZERO)), Err(WaitError::Timeout));
    }

    #[test]
    fn unset_event_times_out() {
        let event = Event::new(ResetPolicy::Auto, false);
        assert_eq!(event.wait(Some(Duration::ZERO)), Err(WaitError::Timeout));
    }

    #[test]
    fn set_wakes_a_parked_waiter() {
        let event = Arc::new(Event::new(ResetPolicy::Auto, false));
        let event_clone = event.clone();

        let handle =
            thread::spawn(move || event_clone.wait(Some(Duration::from_secs(5))));

        thread::sleep(Duration::from_millis(50));
        event.set();

        assert!(handle.join().unwrap().is_ok());
    }

    #[test]
    fn timeout_is_a_lower_bound() {
        let event = Event::new(ResetPolicy::Auto, false);
        let start = Instant::now();
        let result = event.wait(Some(Duration::from_millis(50)));
        assert_eq!(result, Err(WaitError::Timeout));
        assert!(start.elapsed() >= Duration::from_millis(50));
    }

    #[test]
    fn pulse_leaves_the_event_unsignaled() {
        let event = Event::new(ResetPolicy::Manual, false);
        event.pulse();
        assert_eq!(event.wait(Some(Duration::ZERO)), Err(WaitError::Timeout));
    }

    #[test]
    fn manual_broadcast_wakes_every_waiter() {
        let event = Arc::new(Event::new(ResetPolicy::Manual, false));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let event_clone = event.clone();
                thread::spawn(move || event_clone.wait(Some(Duration::from_secs(5))))
            })
            .collect();

        thread::sleep(Duration::from_millis(100));
        event.set();

        for handle in handles {
            assert!(handle.join().unwrap().is_ok());
        }
    }
}
