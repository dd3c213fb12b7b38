/*!
 * Synchronization Primitives
 *
 * The concurrency building blocks of the feed server:
 * - Lock-free MPMC task queue (no lock on the dispatch path)
 * - Fair reader-writer lock guarding the feed
 * - Idle signal on which consumers park between tasks
 *
 * # Suspension
 *
 * Only the lock and the idle signal ever suspend a thread, and both park on a
 * condvar instead of spinning. The queue never blocks: contention is resolved
 * by retrying the compare-and-swap.
 */

pub mod lockfree;
pub mod locks;
pub mod wait;

pub use lockfree::LockFreeQueue;
pub use locks::{FairReadGuard, FairRwLock, FairWriteGuard, LockState, RawFairRwLock};
pub use wait::{IdleSignal, WakeResult};
