/*!
 * Server Limits and Constants
 *
 * Centralized location for the feed server's limits and thresholds.
 * Performance-sensitive values are marked with [PERF].
 */

// =============================================================================
// LOCK LIMITS
// =============================================================================

/// Maximum readers admitted to a fair reader-writer lock at once
/// Readers beyond this wait until one of the active readers leaves
/// [PERF] Bounds how long a pending writer waits for readers to drain
pub const MAX_CONCURRENT_READERS: usize = 32;

// =============================================================================
// DISPATCHER LIMITS
// =============================================================================

/// Consumer threads started when parallel mode is requested without a count
pub const DEFAULT_CONSUMERS: usize = 4;

/// Upper bound on configured consumer threads
/// Each consumer is an OS thread with its own stack
pub const MAX_CONSUMERS: usize = 1024;

/// Thread name prefix for consumer threads (suffixed with the worker index)
pub const CONSUMER_THREAD_PREFIX: &str = "feed-consumer";
