/*!
 * Feed Server Library
 *
 * In-memory feed service processing add/remove/query commands on a pool of
 * consumer threads fed by a lock-free task queue.
 */

pub mod core;
pub mod feed;
pub mod monitoring;
pub mod server;

// Re-exports
pub use crate::core::errors::{ServerError, ServerResult};
pub use crate::core::sync::{FairRwLock, LockFreeQueue, LockState, RawFairRwLock};
pub use feed::{DuplicatePolicy, OrderedFeed, PostContent};
pub use monitoring::init_tracing;
pub use server::{
    serve, DispatchReport, Dispatcher, Mode, ProducerExit, Response, ResponseSink, ServerConfig,
    Task,
};
