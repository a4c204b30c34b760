/*!
 * Error Types
 * Centralized error handling with thiserror
 */

use thiserror::Error;

/// Result type for wait operations
pub type WaitResult<T> = Result<T, WaitError>;

/// Wait operation errors
///
/// Timeout is the only recoverable, caller-visible outcome; every other
/// failure class of the underlying primitives is either unrepresentable
/// (use-after-drop) or infallible under `parking_lot`.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitError {
    #[error("wait operation timed out")]
    Timeout,
}
