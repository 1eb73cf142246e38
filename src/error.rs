//! Error types for the regex sandbox.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while validating or executing a task.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The pattern is empty or does not compile under the engine's grammar.
    #[error("invalid pattern: {0}")]
    InvalidPattern(String),

    /// The pattern exceeds the fixed length ceiling.
    #[error("pattern too long: {length} characters (maximum {max})")]
    PatternTooLong {
        /// Length of the rejected pattern in characters.
        length: usize,
        /// The fixed ceiling.
        max: usize,
    },

    /// The input text exceeds the fixed length ceiling.
    #[error("text too long: {length} characters (maximum {max})")]
    TextTooLong {
        /// Length of the rejected text in characters.
        length: usize,
        /// The fixed ceiling.
        max: usize,
    },

    /// The task exceeded its deadline and the worker was abandoned.
    #[error("execution timed out after {0:?}; optimize the pattern or shorten the text")]
    Timeout(Duration),

    /// The worker crashed or the regex engine reported an internal failure
    /// unrelated to timeout.
    #[error("worker fault: {0}")]
    WorkerFault(#[source] anyhow::Error),
}

impl EngineError {
    /// Check if this error represents a timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, EngineError::Timeout(_))
    }

    /// Check if this error represents an invalid pattern.
    pub fn is_invalid_pattern(&self) -> bool {
        matches!(self, EngineError::InvalidPattern(_))
    }

    /// Check if this error represents an input exceeding a size ceiling.
    pub fn is_too_long(&self) -> bool {
        matches!(
            self,
            EngineError::PatternTooLong { .. } | EngineError::TextTooLong { .. }
        )
    }

    /// Check if this error represents a crashed or faulted worker.
    pub fn is_worker_fault(&self) -> bool {
        matches!(self, EngineError::WorkerFault(_))
    }
}

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_helpers() {
        let timeout = EngineError::Timeout(Duration::from_millis(800));
        assert!(timeout.is_timeout());
        assert!(!timeout.is_invalid_pattern());

        let invalid = EngineError::InvalidPattern("unclosed group".to_string());
        assert!(invalid.is_invalid_pattern());
        assert!(!invalid.is_timeout());

        let too_long = EngineError::PatternTooLong {
            length: 900,
            max: 800,
        };
        assert!(too_long.is_too_long());

        let fault = EngineError::WorkerFault(anyhow::anyhow!("backtrack limit exceeded"));
        assert!(fault.is_worker_fault());
    }

    #[test]
    fn test_error_messages() {
        let err = EngineError::TextTooLong {
            length: 150_000,
            max: 120_000,
        };
        assert_eq!(
            err.to_string(),
            "text too long: 150000 characters (maximum 120000)"
        );
    }
}
