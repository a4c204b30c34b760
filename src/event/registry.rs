/*!
 * Waiter Registry
 *
 * Each event keeps an insertion-ordered list of the multi-waits parked
 * on it, guarded by the event mutex. Signalers walk it front-to-back,
 * which gives auto-reset wait-any a rough FIFO; expired entries (their
 * coordinator already returned) are erased lazily whenever a walk or a
 * new registration holds the lock anyway.
 */

use crate::multiwait::coordinator::Coordinator;
use log::trace;
use std::collections::VecDeque;
use std::sync::Arc;

/// One (coordinator, event) link.
pub(crate) struct WaitRegistration {
    /// Owns one unit of the coordinator's reference count.
    pub(crate) coordinator: Arc<Coordinator>,
    /// Index of this event in the caller's original array.
    pub(crate) wait_index: usize,
    /// Wait-all only: this event is currently counted toward the
    /// coordinator's completion, without having been consumed yet.
    /// Reversible until the coordinator's final consume step.
    pub(crate) claimed: bool,
}

impl WaitRegistration {
    fn belongs_to(&self, coordinator: &Coordinator) -> bool {
        std::ptr::eq(Arc::as_ptr(&self.coordinator), coordinator)
    }
}

/// Registry of multi-waits parked on one event.
#[derive(Default)]
pub(crate) struct Registry {
    pub(crate) waits: VecDeque<WaitRegistration>,
}

impl Registry {
    /// Append a registration. The event mutex is held and, for a live
    /// coordinator, so is its progress mutex, which is what makes the
    /// registration visible to signalers only once it is consistent.
    pub(crate) fn register(&mut self, coordinator: Arc<Coordinator>, wait_index: usize, claimed: bool) {
        self.waits.push_back(WaitRegistration {
            coordinator,
            wait_index,
            claimed,
        });
    }

    /// Drop registrations whose coordinator has already returned. Each
    /// removal releases one reference-count unit; the last one frees the
    /// coordinator.
    pub(crate) fn sweep_expired(&mut self) {
        let before = self.waits.len();
        self.waits.retain(|registration| registration.coordinator.is_waiting());
        let removed = before - self.waits.len();
        if removed > 0 {
            trace!("swept {removed} expired multi-wait registrations");
        }
    }

    /// Reverse every claim this event has granted, except the
    /// coordinator (if any) that is consuming the event right now.
    ///
    /// Called under the event mutex by `reset`, by the auto-reset drain,
    /// and by the wait-all consume step: the signal is leaving the event,
    /// so nobody may keep counting it.
    pub(crate) fn revoke_claims(&mut self, keep: Option<&Coordinator>) {
        for registration in &mut self.waits {
            if !registration.claimed {
                continue;
            }
            if keep.is_some_and(|keep| registration.belongs_to(keep)) {
                continue;
            }
            registration.claimed = false;
            if registration.coordinator.is_waiting() {
                registration.coordinator.revoke_claims(1);
            }
        }
    }

    /// Erase all registrations of one coordinator (its wait completed
    /// through this event), dropping their reference-count units.
    pub(crate) fn remove_waiter(&mut self, coordinator: &Coordinator) {
        self.waits.retain(|registration| !registration.belongs_to(coordinator));
    }

    /// Reclaim this coordinator's claim on the event after the signal
    /// was stolen between claim and consume. Returns true if a claim was
    /// still outstanding (the stealer's own revocation may have beaten
    /// us to it).
    pub(crate) fn reclaim_stolen(&mut self, coordinator: &Coordinator) -> bool {
        for registration in &mut self.waits {
            if registration.claimed && registration.belongs_to(coordinator) {
                registration.claimed = false;
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sweep_removes_only_retired_waiters() {
        let live = Arc::new(Coordinator::new_wait_any());
        let dead = Arc::new(Coordinator::new_wait_any());
        dead.retire();

        let mut registry = Registry::default();
        registry.register(Arc::clone(&live), 0, false);
        registry.register(Arc::clone(&dead), 1, false);
        registry.sweep_expired();

        assert_eq!(registry.waits.len(), 1);
        assert!(registry.waits[0].belongs_to(&live));
    }

    #[test]
    fn revoke_claims_restores_the_outstanding_count() {
        let coordinator = Arc::new(Coordinator::new_wait_all(2));
        let mut registry = Registry::default();
        registry.register(Arc::clone(&coordinator), 0, true);
        coordinator.claim();
        assert_eq!(coordinator.events_left(), 1);

        registry.revoke_claims(None);
        assert_eq!(coordinator.events_left(), 2);
        assert!(!registry.waits[0].claimed);
    }

    #[test]
    fn revoke_claims_spares_the_consuming_waiter() {
        let consuming = Arc::new(Coordinator::new_wait_all(1));
        let other = Arc::new(Coordinator::new_wait_all(2));
        let mut registry = Registry::default();
        registry.register(Arc::clone(&consuming), 0, true);
        registry.register(Arc::clone(&other), 0, true);
        consuming.claim();
        other.claim();

        registry.revoke_claims(Some(&consuming));
        assert!(registry.waits[0].claimed);
        assert!(!registry.waits[1].claimed);
        assert_eq!(consuming.events_left(), 0);
        assert_eq!(other.events_left(), 2);
    }

    #[test]
    fn removal_drops_the_reference_count_unit() {
        let coordinator = Arc::new(Coordinator::new_wait_any());
        let mut registry = Registry::default();
        registry.register(Arc::clone(&coordinator), 0, false);
        assert_eq!(Arc::strong_count(&coordinator), 2);

        registry.remove_waiter(&coordinator);
        assert_eq!(Arc::strong_count(&coordinator), 1);
    }
}
