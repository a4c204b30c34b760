/*!
 * Portable Events
 *
 * Win32-style event synchronization for any platform with a mutex and a
 * condition variable. Events come in two flavors: auto-reset (one waiter
 * consumes each signal) and manual-reset (the signal sticks until reset),
 * and can be waited on individually or in groups via [`wait_any`] /
 * [`wait_all`].
 *
 * # Architecture
 *
 * - [`event`]: the event object, holding signaled state, reset policy,
 *   and the registry of multi-waits parked on it.
 * - [`multiwait`]: the per-call coordinator that makes a group wait
 *   complete atomically, so wait-all over auto-reset events consumes
 *   every signal or none of them.
 * - [`platform`]: the thin adapter that forwards to host-native events
 *   on Windows, including 64-to-32-bit timeout chunking.
 *
 * # Examples
 *
 * ```
 * use portable_events::{Event, ResetPolicy};
 * use std::time::Duration;
 *
 * let event = Event::new(ResetPolicy::Auto, false);
 * event.set();
 * assert!(event.wait(Some(Duration::ZERO)).is_ok());
 * // Auto-reset: the signal was consumed by the wait above.
 * assert!(event.wait(Some(Duration::ZERO)).is_err());
 * ```
 */

pub mod core;
pub mod event;
pub mod multiwait;
pub mod platform;

pub use crate::core::errors::{WaitError, WaitResult};
pub use crate::event::{Event, ResetPolicy};
pub use crate::multiwait::{wait_all, wait_any};
