/*!
 * Multi-Event Wait
 *
 * Waiting on a group of events with either completion rule:
 * [`wait_any`] returns as soon as one event fires, [`wait_all`] returns
 * once every event can be consumed together.
 *
 * # Atomicity
 *
 * Wait-all over auto-reset events is all-or-nothing: success means
 * exactly one signal was consumed from every event by this call, timeout
 * means none were. Signalers only *claim* events toward a wait-all; the
 * waiter consumes all of them in one step with every event lock held.
 */

pub(crate) mod coordinator;
mod wait;

pub use wait::{wait_all, wait_any};
