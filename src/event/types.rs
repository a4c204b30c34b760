/*!
 * Event Types
 */

/// What happens to the signaled state when a wait succeeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResetPolicy {
    /// A successful wait consumes the signal; one waiter per `set`.
    Auto,
    /// The signal sticks until [`reset`](crate::Event::reset); every
    /// waiter gets through.
    Manual,
}
