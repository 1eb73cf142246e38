//! Fixed execution limits and the limit structs echoed back to callers.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Maximum pattern length in characters.
pub const MAX_PATTERN_LENGTH: usize = 800;

/// Maximum input text length in characters, applied to both test and replace.
pub const MAX_TEXT_LENGTH: usize = 120_000;

/// Maximum number of match rows returned by a test task.
pub const MAX_MATCHES: usize = 500;

/// Maximum replace preview length in characters.
pub const MAX_PREVIEW_LENGTH: usize = 5_000;

/// Hard wall-clock budget per task.
pub const TASK_DEADLINE: Duration = Duration::from_millis(800);

/// A progress event is emitted every this many match iterations.
pub const PROGRESS_BATCH: usize = 200;

/// Context window width in characters on each side of a match.
pub const CONTEXT_WINDOW: usize = 28;

/// Backtrack ceiling for the regex engine. Set well above what the deadline
/// allows so that timeouts settle as `Timeout` rather than an engine fault,
/// while still bounding the lifetime of an abandoned worker thread.
pub const BACKTRACK_LIMIT: usize = 1_000_000_000;

/// Limits echoed in a test response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestLimits {
    /// Maximum accepted text length in characters.
    pub max_text_length: usize,
    /// Maximum number of returned match rows.
    pub max_matches: usize,
}

/// Limits echoed in a replace response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceLimits {
    /// Maximum accepted text length in characters.
    pub max_text_length: usize,
    /// Maximum preview length in characters.
    pub max_preview_length: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limits_serialize_camel_case() {
        let limits = TestLimits {
            max_text_length: MAX_TEXT_LENGTH,
            max_matches: MAX_MATCHES,
        };
        let json = serde_json::to_value(limits).unwrap();
        assert_eq!(json["maxTextLength"], 120_000);
        assert_eq!(json["maxMatches"], 500);
    }
}
