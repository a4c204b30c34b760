/*!
 * Platform Fallback
 *
 * On hosts that already provide native events, a thin adapter forwards
 * to them instead of re-deriving the semantics from a mutex and condvar.
 * The one nontrivial translation is the timeout: callers speak 64-bit
 * milliseconds (or unbounded), native wait APIs take 32 bits with the
 * all-ones value reserved for "infinite", so long waits are chunked and
 * iterated while the host keeps reporting timeout.
 */

#[cfg(windows)]
mod native;

#[cfg(windows)]
pub use native::NativeEvent;

use std::time::Duration;

/// The native APIs' reserved "no deadline" marker; never passed as a
/// finite wait length.
pub const NATIVE_WAIT_INFINITE: u32 = u32::MAX;

/// Largest finite wait a single native call may be handed.
pub const NATIVE_WAIT_CHUNK: u32 = NATIVE_WAIT_INFINITE - 1;

/// Split a 64-bit millisecond timeout into native-sized pieces:
/// the remainder to wait first, then how many full chunks follow.
pub fn native_wait_chunks(milliseconds: u64) -> (u32, u64) {
    let chunk = u64::from(NATIVE_WAIT_CHUNK);
    ((milliseconds % chunk) as u32, milliseconds / chunk)
}

/// Map the crate's timeout representation onto native milliseconds.
/// `None` becomes the all-ones infinite sentinel; finite values saturate
/// just below it (a wait of `u64::MAX - 1` ms outlives any caller).
pub fn native_wait_millis(timeout: Option<Duration>) -> u64 {
    match timeout {
        None => u64::MAX,
        Some(limit) => limit.as_millis().min(u128::from(u64::MAX - 1)) as u64,
    }
}

/// Whether a millisecond value is the infinite sentinel.
pub fn is_infinite_millis(milliseconds: u64) -> bool {
    milliseconds == u64::MAX
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_timeouts_fit_in_one_chunk() {
        let (remainder, rounds) = native_wait_chunks(1_500);
        assert_eq!(remainder, 1_500);
        assert_eq!(rounds, 0);
    }

    #[test]
    fn long_timeouts_never_produce_the_infinite_marker() {
        let (remainder, rounds) = native_wait_chunks(u64::MAX - 1);
        assert!(remainder < NATIVE_WAIT_INFINITE);
        assert!(rounds > 0);

        let total = u64::from(remainder) + rounds * u64::from(NATIVE_WAIT_CHUNK);
        assert_eq!(total, u64::MAX - 1);
    }

    #[test]
    fn exact_chunk_multiples_wait_zero_first() {
        let chunk = u64::from(NATIVE_WAIT_CHUNK);
        let (remainder, rounds) = native_wait_chunks(chunk * 3);
        assert_eq!(remainder, 0);
        assert_eq!(rounds, 3);
    }

    #[test]
    fn timeout_mapping_preserves_the_sentinel() {
        assert!(is_infinite_millis(native_wait_millis(None)));
        assert!(!is_infinite_millis(native_wait_millis(Some(
            Duration::from_millis(250)
        ))));
        assert_eq!(native_wait_millis(Some(Duration::from_millis(250))), 250);
    }

    #[test]
    fn oversized_timeouts_saturate_below_the_sentinel() {
        assert_eq!(native_wait_millis(Some(Duration::MAX)), u64::MAX - 1);
    }
}
