/*!
 * Wait/Notify Primitives
 *
 * Condvar-based parking for worker threads that have run out of work.
 */

mod condvar;

// Re-export public API
pub use condvar::{IdleSignal, WakeResult};
