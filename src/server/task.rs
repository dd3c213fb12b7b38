/*!
 * Tasks
 * Parsed commands travelling from the producer to the consumers
 */

use std::fmt;

/// Request identifier echoed back in responses
pub type RequestId = i64;

/// A unit of work; immutable once constructed
#[derive(Debug, Clone, PartialEq)]
pub enum Task {
    Add {
        id: RequestId,
        body: String,
        timestamp: f64,
    },
    Remove {
        id: RequestId,
        timestamp: f64,
    },
    Contains {
        id: RequestId,
        timestamp: f64,
    },
    Feed {
        id: RequestId,
    },
    /// Stop accepting work; never produces a response
    Shutdown,
}

/// Discriminant of a [`Task`], for logging
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    Add,
    Remove,
    Contains,
    Feed,
    Shutdown,
}

impl Task {
    pub fn kind(&self) -> TaskKind {
        match self {
            Task::Add { .. } => TaskKind::Add,
            Task::Remove { .. } => TaskKind::Remove,
            Task::Contains { .. } => TaskKind::Contains,
            Task::Feed { .. } => TaskKind::Feed,
            Task::Shutdown => TaskKind::Shutdown,
        }
    }

    /// Identifier to echo back; `None` for shutdown
    pub fn request_id(&self) -> Option<RequestId> {
        match self {
            Task::Add { id, .. }
            | Task::Remove { id, .. }
            | Task::Contains { id, .. }
            | Task::Feed { id } => Some(*id),
            Task::Shutdown => None,
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TaskKind::Add => "ADD",
            TaskKind::Remove => "REMOVE",
            TaskKind::Contains => "CONTAINS",
            TaskKind::Feed => "FEED",
            TaskKind::Shutdown => "DONE",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_and_id() {
        let task = Task::Remove { id: 7, timestamp: 1.0 };
        assert_eq!(task.kind(), TaskKind::Remove);
        assert_eq!(task.request_id(), Some(7));
        assert_eq!(Task::Shutdown.request_id(), None);
        assert_eq!(TaskKind::Shutdown.to_string(), "DONE");
    }
}
