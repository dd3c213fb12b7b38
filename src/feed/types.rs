/*!
 * Feed Types
 */

use crate::core::errors::ServerError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Snapshot of a single post, as reported in FEED responses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostContent {
    pub body: String,
    pub timestamp: f64,
}

impl PostContent {
    pub fn new(body: impl Into<String>, timestamp: f64) -> Self {
        Self {
            body: body.into(),
            timestamp,
        }
    }
}

/// What `add` does when a post with the same timestamp already exists
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DuplicatePolicy {
    /// Place the new post ahead of existing posts with equal timestamp
    #[default]
    InsertBefore,
    /// Place the new post behind existing posts with equal timestamp
    InsertAfter,
    /// Leave the feed unchanged and report failure
    Reject,
}

impl FromStr for DuplicatePolicy {
    type Err = ServerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "before" | "insert-before" => Ok(Self::InsertBefore),
            "after" | "insert-after" => Ok(Self::InsertAfter),
            "reject" => Ok(Self::Reject),
            other => Err(ServerError::InvalidConfig(format!(
                "unknown duplicate policy {other:?} (expected before, after or reject)"
            ))),
        }
    }
}

impl fmt::Display for DuplicatePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::InsertBefore => "before",
            Self::InsertAfter => "after",
            Self::Reject => "reject",
        };
        f.write_str(name)
    }
}
