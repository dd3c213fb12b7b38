/*!
 * Lock-Based Synchronization Primitives
 *
 * - Fair reader-writer lock (writer priority, capped reader admission)
 */

mod fair;

// Re-export public API
pub use fair::{FairReadGuard, FairRwLock, FairWriteGuard, LockState, RawFairRwLock};
