//! Error types shared by the tether crates.

use thiserror::Error;

/// Result alias used throughout tether.
pub type TetherResult<T> = Result<T, TetherError>;

/// Top-level error for tether operations.
///
/// Variants are coarse categories; the message carries the detail.
#[derive(Debug, Error)]
pub enum TetherError {
    /// Unexpected internal failure.
    #[error("internal error: {0}")]
    Internal(String),

    /// Invalid or inconsistent configuration.
    #[error("config error: {0}")]
    Config(String),

    /// Listener or connection failure.
    #[error("network error: {0}")]
    Network(String),

    /// Spawning or supervising a process failed.
    #[error("execution error: {0}")]
    Execution(String),

    /// A referenced resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A caller supplied an argument that violates an API contract.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A bounded resource has no room left.
    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_convert() {
        let err: TetherError = std::io::Error::other("boom").into();
        assert!(matches!(err, TetherError::Io(_)));
        assert_eq!(err.to_string(), "io error: boom");
    }

    #[test]
    fn messages_carry_category() {
        let err = TetherError::ResourceExhausted("stream ids".into());
        assert_eq!(err.to_string(), "resource exhausted: stream ids");
    }
}
