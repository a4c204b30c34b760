/*!
 * Contention and Stress Tests
 *
 * High-contention scenarios: signalers hammering an always-available
 * auto-reset event, and a 64-worker round-robin scheduler driven
 * entirely by wait-any/wait-all.
 */

use portable_events::{wait_all, wait_any, Event, ResetPolicy, WaitError};
use serial_test::serial;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const POLL: Option<Duration> = Some(Duration::ZERO);

/// Contention on the event mutex must never surface as a spurious
/// timeout when the event is known to be signaled.
#[test]
#[serial]
fn test_polling_under_set_contention_never_times_out() {
    let event = Arc::new(Event::new(ResetPolicy::Auto, true));

    let setters: Vec<_> = (0..16)
        .map(|_| {
            let event = event.clone();
            thread::spawn(move || {
                for _ in 0..2_000 {
                    event.set();
                }
            })
        })
        .collect();

    // The consumer re-signals after every drain, so the event is always
    // available when it polls.
    for _ in 0..200_000 {
        assert_eq!(event.wait(POLL), Ok(()));
        event.set();
    }

    for setter in setters {
        setter.join().unwrap();
    }
}

const WORKERS: usize = 64;
const ROUNDS: usize = 5;

/// Round-robin scheduler: each worker owns an auto-reset wake event and
/// a manual-reset done event, plus a shared manual-reset shutdown event.
/// Exactly one worker runs at a time, asserted through a guard slot that
/// must read -1 on entry to the critical section.
#[test]
#[serial]
fn test_round_robin_scheduler_over_wait_any() {
    let wake: Vec<Arc<Event>> = (0..WORKERS)
        .map(|_| Arc::new(Event::new(ResetPolicy::Auto, false)))
        .collect();
    let done: Vec<Arc<Event>> = (0..WORKERS)
        .map(|_| Arc::new(Event::new(ResetPolicy::Manual, false)))
        .collect();
    let shutdown = Arc::new(Event::new(ResetPolicy::Manual, false));
    let guard = Arc::new(AtomicI64::new(-1));
    let rounds_run = Arc::new(AtomicUsize::new(0));
    let violated = Arc::new(AtomicBool::new(false));

    let workers: Vec<_> = (0..WORKERS)
        .map(|index| {
            let wake = wake.clone();
            let done = done.clone();
            let shutdown = shutdown.clone();
            let guard = guard.clone();
            let rounds_run = rounds_run.clone();
            let violated = violated.clone();

            thread::spawn(move || {
                for round in 0..ROUNDS {
                    let events = [&*wake[index], &*shutdown];
                    match wait_any(&events, Some(Duration::from_secs(45))) {
                        Ok(0) => {}
                        Ok(_) => return, // shutdown broadcast
                        Err(WaitError::Timeout) => {
                            violated.store(true, Ordering::SeqCst);
                            shutdown.set();
                            return;
                        }
                    }

                    // Critical section: nobody else may hold the slot.
                    let previous = guard.swap(index as i64, Ordering::SeqCst);
                    if previous != -1 {
                        violated.store(true, Ordering::SeqCst);
                        shutdown.set();
                        return;
                    }
                    thread::sleep(Duration::from_millis(2));
                    rounds_run.fetch_add(1, Ordering::SeqCst);
                    guard.store(-1, Ordering::SeqCst);

                    if round == ROUNDS - 1 {
                        done[index].set();
                    }

                    let done_refs: Vec<&Event> = done.iter().map(|event| &**event).collect();
                    if wait_all(&done_refs, POLL).is_ok() {
                        // Everyone has finished; nobody is left to wake.
                        return;
                    }

                    // Hand the token to a random worker that isn't done
                    // (possibly ourselves).
                    let next = loop {
                        let candidate = rand::random::<usize>() % WORKERS;
                        if done[candidate].wait(POLL) == Err(WaitError::Timeout) {
                            break candidate;
                        }
                    };
                    wake[next].set();
                }
                done[index].set();
            })
        })
        .collect();

    // Hand the token to the first worker and wait for the full round-robin.
    wake[0].set();
    let done_refs: Vec<&Event> = done.iter().map(|event| &**event).collect();
    assert_eq!(
        wait_all(&done_refs, Some(Duration::from_secs(45))),
        Ok(()),
        "scheduler did not complete"
    );

    assert!(!violated.load(Ordering::SeqCst), "guard slot was contended");
    assert_eq!(shutdown.wait(POLL), Err(WaitError::Timeout));
    assert_eq!(rounds_run.load(Ordering::SeqCst), WORKERS * ROUNDS);

    // Unblock any worker still parked on its wake event, then join.
    shutdown.set();
    for worker in workers {
        worker.join().unwrap();
    }
}
