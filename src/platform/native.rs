/*!
 * Windows-Native Events
 *
 * Forwarding adapter over the host's event objects. Semantics live in
 * the kernel; the only work here is handle lifetime, timeout chunking,
 * and normalizing abandoned waits to success (there is no equivalent to
 * propagate on other hosts).
 */

use super::{is_infinite_millis, native_wait_chunks, native_wait_millis, NATIVE_WAIT_INFINITE};
use crate::core::errors::{WaitError, WaitResult};
use crate::event::ResetPolicy;
use std::time::Duration;
use windows::core::PCWSTR;
use windows::Win32::Foundation::{
    CloseHandle, BOOL, HANDLE, WAIT_ABANDONED_0, WAIT_EVENT, WAIT_OBJECT_0, WAIT_TIMEOUT,
};
use windows::Win32::System::Threading::{
    CreateEventW, ResetEvent, SetEvent, WaitForMultipleObjects, WaitForSingleObject,
};

/// A host-provided event object with the same surface as [`Event`].
///
/// [`Event`]: crate::Event
pub struct NativeEvent {
    handle: HANDLE,
}

// Event handles are kernel objects; every forwarded call is thread-safe.
unsafe impl Send for NativeEvent {}
unsafe impl Sync for NativeEvent {}

impl NativeEvent {
    /// Create a host event with the given reset policy and initial state.
    ///
    /// Panics if the host cannot allocate the object; creation failure is
    /// resource exhaustion, which callers are not expected to recover from.
    pub fn new(policy: ResetPolicy, initially_set: bool) -> Self {
        let manual = policy == ResetPolicy::Manual;
        let handle = unsafe {
            CreateEventW(
                None,
                BOOL::from(manual),
                BOOL::from(initially_set),
                PCWSTR::null(),
            )
        };
        match handle {
            Ok(handle) => Self { handle },
            Err(err) => panic!("native event creation failed: {err}"),
        }
    }

    pub fn set(&self) {
        unsafe { SetEvent(self.handle) }.expect("native SetEvent failed");
    }

    pub fn reset(&self) {
        unsafe { ResetEvent(self.handle) }.expect("native ResetEvent failed");
    }

    pub fn pulse(&self) {
        self.set();
        self.reset();
    }

    /// Forwarded single wait with 64-to-32-bit timeout chunking.
    pub fn wait(&self, timeout: Option<Duration>) -> WaitResult<()> {
        chunked(timeout, |millis| unsafe {
            WaitForSingleObject(self.handle, millis)
        })
        .map(|_| ())
    }

    /// Forwarded multi-wait. On wait-any success returns the index of
    /// the satisfying event; on wait-all success the index is 0 and
    /// meaningless, as in the portable implementation.
    pub fn wait_multiple(
        events: &[&NativeEvent],
        wait_all: bool,
        timeout: Option<Duration>,
    ) -> WaitResult<usize> {
        let handles: Vec<HANDLE> = events.iter().map(|event| event.handle).collect();
        let result = chunked(timeout, |millis| unsafe {
            WaitForMultipleObjects(&handles, BOOL::from(wait_all), millis)
        })?;
        Ok(normalize_index(result, events.len()))
    }
}

impl Drop for NativeEvent {
    fn drop(&mut self) {
        unsafe { CloseHandle(self.handle) }.ok();
    }
}

/// Drive a native wait call against a 64-bit timeout: wait the remainder
/// first, then keep issuing full chunks while the host reports timeout.
/// The infinite sentinel is forwarded as-is, never synthesized.
fn chunked(timeout: Option<Duration>, wait: impl Fn(u32) -> WAIT_EVENT) -> WaitResult<WAIT_EVENT> {
    let millis = native_wait_millis(timeout);
    if is_infinite_millis(millis) {
        return check(wait(NATIVE_WAIT_INFINITE));
    }
    // Anything that fits below the sentinel goes through in one call; a
    // finite wait of exactly the sentinel value must be chunked too.
    if millis < u64::from(NATIVE_WAIT_INFINITE) {
        return check(wait(millis as u32));
    }

    let (remainder, mut rounds) = native_wait_chunks(millis);
    let mut result = wait(remainder);
    while result == WAIT_TIMEOUT && rounds > 0 {
        rounds -= 1;
        result = wait(super::NATIVE_WAIT_CHUNK);
    }
    check(result)
}

fn check(result: WAIT_EVENT) -> WaitResult<WAIT_EVENT> {
    if result == WAIT_TIMEOUT {
        return Err(WaitError::Timeout);
    }
    Ok(result)
}

/// Map a native success code to the caller-facing event index, folding
/// abandoned waits (which have no portable equivalent) into success.
fn normalize_index(result: WAIT_EVENT, count: usize) -> usize {
    let code = result.0;
    let abandoned = WAIT_ABANDONED_0.0;
    if code >= abandoned && (code - abandoned) < count as u32 {
        return (code - abandoned) as usize;
    }
    (code.saturating_sub(WAIT_OBJECT_0.0)) as usize
}
