/*!
 * Server Configuration
 *
 * Runtime configuration from command-line arguments and environment
 */

use crate::core::errors::{ServerError, ServerResult};
use crate::core::limits::{DEFAULT_CONSUMERS, MAX_CONCURRENT_READERS, MAX_CONSUMERS};
use crate::feed::DuplicatePolicy;

pub const USAGE: &str = "Usage: feed-server [s | p | consumers]
    s           = process requests sequentially (same as no argument)
    p           = parallel version with the default number of consumers (4)
    [consumers] = number of consumer threads for the parallel version (1..=1024)

Environment:
    FEED_READER_CAP   maximum concurrent feed readers (default 32)
    FEED_DUPLICATES   duplicate timestamp policy: before | after | reject (default before)
    FEED_TRACE_JSON   emit logs as JSON (1 or true)
    RUST_LOG          log filter (default info)";

/// Execution mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Every task runs inline on the producer thread
    Sequential,
    /// Tasks go through the queue to a pool of consumer threads
    Parallel { consumers: usize },
}

impl Mode {
    /// Number of consumer threads this mode starts
    pub fn consumers(&self) -> usize {
        match self {
            Mode::Sequential => 0,
            Mode::Parallel { consumers } => *consumers,
        }
    }
}

/// Dispatcher and feed configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub mode: Mode,
    /// Reader cap of the feed's fair lock
    pub reader_cap: usize,
    pub duplicate_policy: DuplicatePolicy,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::sequential()
    }
}

impl ServerConfig {
    pub const fn sequential() -> Self {
        Self {
            mode: Mode::Sequential,
            reader_cap: MAX_CONCURRENT_READERS,
            duplicate_policy: DuplicatePolicy::InsertBefore,
        }
    }

    pub const fn parallel(consumers: usize) -> Self {
        Self {
            mode: Mode::Parallel { consumers },
            reader_cap: MAX_CONCURRENT_READERS,
            duplicate_policy: DuplicatePolicy::InsertBefore,
        }
    }

    pub fn with_reader_cap(mut self, reader_cap: usize) -> Self {
        self.reader_cap = reader_cap;
        self
    }

    pub fn with_duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicate_policy = policy;
        self
    }

    /// Build from command-line arguments (program name excluded)
    pub fn from_args<I, S>(args: I) -> ServerResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut args = args.into_iter();
        let config = match args.next() {
            None => Self::sequential(),
            Some(arg) => match arg.as_ref() {
                "s" => Self::sequential(),
                "p" => Self::parallel(DEFAULT_CONSUMERS),
                count => {
                    let consumers = count.parse::<usize>().map_err(|_| {
                        ServerError::InvalidConfig(format!("invalid consumer count {count:?}\n{USAGE}"))
                    })?;
                    Self::parallel(consumers)
                }
            },
        };
        if args.next().is_some() {
            return Err(ServerError::InvalidConfig(format!("too many arguments\n{USAGE}")));
        }
        config.validate()?;
        Ok(config)
    }

    /// Apply `FEED_READER_CAP` and `FEED_DUPLICATES` when set
    pub fn with_env_overrides(self) -> ServerResult<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides<F>(mut self, lookup: F) -> ServerResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(cap) = lookup("FEED_READER_CAP") {
            self.reader_cap = cap.trim().parse().map_err(|_| {
                ServerError::InvalidConfig(format!("FEED_READER_CAP must be a positive integer, got {cap:?}"))
            })?;
        }
        if let Some(policy) = lookup("FEED_DUPLICATES") {
            self.duplicate_policy = policy.parse()?;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> ServerResult<()> {
        if let Mode::Parallel { consumers } = self.mode {
            if consumers == 0 || consumers > MAX_CONSUMERS {
                return Err(ServerError::InvalidConfig(format!(
                    "consumer count must be between 1 and {MAX_CONSUMERS}, got {consumers}"
                )));
            }
        }
        if self.reader_cap == 0 {
            return Err(ServerError::InvalidConfig("reader cap must be at least 1".into()));
        }
        Ok(())
    }
}
