/*!
 * Multi-Wait Engine
 *
 * One coordinator per call. The registration pass either observes an
 * event already signaled (and claims or consumes it, depending on the
 * completion rule) or parks a registration in the event's registry; the
 * caller then blocks on the coordinator's condvar and signalers drive
 * its progress from `Event::set`.
 *
 * # Lock ordering
 *
 * Registration holds the coordinator mutex and takes one event mutex at
 * a time; `set` holds an event mutex and takes one coordinator mutex.
 * A coordinator's registration only becomes visible in an event after
 * the registering thread has released that event's lock, so the two
 * orders never close a cycle. The wait-all consume step holds multiple
 * event locks but acquires them with try-lock only, and runs with the
 * coordinator mutex released so a blocked signaler can always finish.
 */

use crate::core::errors::{WaitError, WaitResult};
use crate::core::timeout::Deadline;
use crate::event::Event;
use crate::multiwait::coordinator::{Coordinator, WaitMode};
use log::trace;
use parking_lot::MutexGuard;
use std::sync::Arc;
use std::time::Duration;

/// Block until any one of `events` is signaled; returns its index in
/// `events`.
///
/// An auto-reset event satisfying the wait is consumed; every other
/// event is left untouched. `None` waits forever, `Some(Duration::ZERO)`
/// polls. With no events this can only time out.
pub fn wait_any(events: &[&Event], timeout: Option<Duration>) -> WaitResult<usize> {
    multi_wait(events, WaitMode::Any, timeout)
}

/// Block until every event in `events` is signaled simultaneously.
///
/// All-or-nothing: on success exactly one signal has been consumed from
/// every auto-reset event in the group by this call; on timeout, none
/// have (signals observed along the way stay available to other
/// waiters). `None` waits forever, `Some(Duration::ZERO)` polls.
///
/// The events must be distinct objects; passing the same event twice is
/// a contract violation (the consume step locks each event once).
pub fn wait_all(events: &[&Event], timeout: Option<Duration>) -> WaitResult<()> {
    multi_wait(events, WaitMode::All, timeout).map(|_| ())
}

fn multi_wait(events: &[&Event], mode: WaitMode, timeout: Option<Duration>) -> WaitResult<usize> {
    let coordinator = Arc::new(match mode {
        WaitMode::Any => Coordinator::new_wait_any(),
        WaitMode::All => Coordinator::new_wait_all(events.len()),
    });

    // Held across registration and the wait loop; signalers must take it
    // to complete us, so nothing fires before the bookkeeping is whole.
    let mut progress = coordinator.progress.lock();

    let mut skipped = 0usize;
    for (index, event) in events.iter().enumerate() {
        if mode == WaitMode::Any
            && !event.is_auto_reset()
            && event.signaled_relaxed()
            && event.signaled_acquire()
        {
            // Signaled manual-reset event: nothing to consume, no lock
            // needed, and the remaining events are never registered.
            progress.fired = Some(index);
            break;
        }

        let mut registry = event.lock_registry();
        registry.sweep_expired();

        // The event mutex orders this load against any concurrent set.
        let signaled = event.signaled_relaxed();
        if signaled && mode == WaitMode::Any {
            event.consume_locked(&mut registry, None);
            progress.fired = Some(index);
            break;
        }
        if signaled {
            skipped += 1;
        }
        // For wait-all an already-signaled event registers as claimed.
        registry.register(Arc::clone(&coordinator), index, signaled);
    }
    if mode == WaitMode::All {
        coordinator.apply_skipped(skipped);
    }

    let mut deadline: Option<Deadline> = None;
    let mut timed_out = false;

    let result = loop {
        match mode {
            WaitMode::Any => {
                if let Some(index) = progress.fired {
                    break Ok(index);
                }
            }
            WaitMode::All => {
                if coordinator.events_left() == 0 {
                    // Every event is claimed; try to consume the whole
                    // group. Runs with the progress mutex released so a
                    // signaler holding an event lock and waiting on us
                    // can always finish.
                    let consumed =
                        MutexGuard::unlocked(&mut progress, || consume_all(events, &coordinator));
                    if consumed {
                        break Ok(0);
                    }
                    // A claim was stolen and the outstanding count was
                    // restored; go back to waiting (or time out).
                    continue;
                }
            }
        }

        if timed_out || timeout == Some(Duration::ZERO) {
            break Err(WaitError::Timeout);
        }

        let deadline = *deadline.get_or_insert_with(|| Deadline::after(timeout));
        match deadline.instant() {
            Some(at) => {
                // A timed-out wake still re-checks completion once at
                // the top of the loop: a signal delivered concurrently
                // with the deadline must not be lost.
                timed_out = coordinator.cond.wait_until(&mut progress, at).timed_out();
            }
            None => coordinator.cond.wait(&mut progress),
        }
    };

    coordinator.retire();
    drop(progress);
    // Our reference-count unit drops here; leftover registrations are
    // swept by later set/registration passes and drop theirs.
    result
}

/// The wait-all consume step: with every event lock held, verify all
/// targets are still signaled and drain them together. This is the
/// linearization point of wait-all completion.
fn consume_all(events: &[&Event], coordinator: &Arc<Coordinator>) -> bool {
    loop {
        let mut guards = Vec::with_capacity(events.len());
        for event in events {
            match event.try_lock_registry() {
                Some(guard) => guards.push(guard),
                None => break,
            }
        }
        if guards.len() != events.len() {
            // A signaler or drain holds one of the locks. Never block
            // while holding the others; back off and retry the cascade.
            drop(guards);
            std::hint::spin_loop();
            continue;
        }

        // The event locks order these loads; nothing can signal, reset,
        // or drain any target while we hold all of them.
        if events.iter().all(|event| event.signaled_relaxed()) {
            for (event, guard) in events.iter().zip(guards.iter_mut()) {
                event.consume_locked(guard, Some(coordinator.as_ref()));
                guard.remove_waiter(coordinator);
            }
            return true;
        }

        // At least one signal was stolen between claim and consume, by a
        // drain, a reset, or a signaler that handed it to a wait-any.
        // Reclaim whatever claims of ours survived (the stealer may have
        // revoked them already).
        let mut stolen = 0usize;
        for (event, guard) in events.iter().zip(guards.iter_mut()) {
            if !event.signaled_relaxed() && guard.reclaim_stolen(coordinator) {
                stolen += 1;
            }
        }
        if stolen > 0 {
            coordinator.revoke_claims(stolen);
        }
        trace!("wait-all consume raced; {stolen} claims reclaimed");
        return false;
    }
}
