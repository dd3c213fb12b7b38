/*!
 * Error Types
 * Centralized error handling with thiserror and miette diagnostics
 */

use miette::Diagnostic;
use thiserror::Error;

/// Result type for server operations
pub type ServerResult<T> = Result<T, ServerError>;

/// Unified server error type with miette diagnostics
///
/// Domain-level misses (removing or probing a timestamp that is not in the
/// feed) are not errors; they travel as `success: false` responses.
#[derive(Error, Debug, Diagnostic)]
pub enum ServerError {
    #[error("Malformed request: {0}")]
    #[diagnostic(
        code(server::decode),
        help("Each request must be a JSON object with a `command` of ADD, REMOVE, CONTAINS, FEED or DONE.")
    )]
    Decode(#[from] serde_json::Error),

    #[error("Failed to encode response: {0}")]
    #[diagnostic(code(server::encode))]
    Encode(serde_json::Error),

    #[error("I/O error: {0}")]
    #[diagnostic(
        code(server::io),
        help("The request source or the response sink failed. Check that stdin/stdout are still open.")
    )]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    #[diagnostic(code(server::invalid_config))]
    InvalidConfig(String),

    #[error("Consumer thread panicked: {0}")]
    #[diagnostic(
        code(server::worker_panicked),
        help("A consumer died while processing a task. The feed may hold a partially applied request.")
    )]
    WorkerPanicked(String),
}

impl ServerError {
    /// Whether the error came from the request stream rather than the server
    #[inline]
    pub fn is_decode(&self) -> bool {
        matches!(self, ServerError::Decode(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_error_from_serde() {
        let err: ServerError = serde_json::from_str::<serde_json::Value>("{not json")
            .unwrap_err()
            .into();
        assert!(err.is_decode());
        assert!(err.to_string().starts_with("Malformed request"));
    }

    #[test]
    fn test_io_error_is_not_decode() {
        let err: ServerError = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed").into();
        assert!(!err.is_decode());
        assert_eq!(err.to_string(), "I/O error: closed");
    }
}
