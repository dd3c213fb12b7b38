/*!
 * Lock-Free Synchronization Primitives
 *
 * Data structures that make progress through atomic compare-and-swap
 * instead of blocking:
 * - Michael-Scott MPMC queue with epoch-based reclamation
 */

mod ms_queue;

// Re-export public API
pub use ms_queue::LockFreeQueue;
