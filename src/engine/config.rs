//! Engine configuration with builder pattern.

use std::time::Duration;

use crate::engine::limits;

/// Configuration for the regex engine.
///
/// Defaults reproduce the fixed process-wide limits; overrides are
/// construction-time only and exist for embedding and tests. The RPC
/// surface never varies limits per request.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Hard wall-clock budget per task.
    pub deadline: Duration,
    /// Maximum pattern length in characters.
    pub max_pattern_length: usize,
    /// Maximum input text length in characters.
    pub max_text_length: usize,
    /// Maximum number of match rows returned by a test task.
    pub max_matches: usize,
    /// Maximum replace preview length in characters.
    pub max_preview_length: usize,
    /// Emit a progress event every this many match iterations.
    pub progress_batch: usize,
    /// Backtrack ceiling handed to the regex engine.
    pub backtrack_limit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            deadline: limits::TASK_DEADLINE,
            max_pattern_length: limits::MAX_PATTERN_LENGTH,
            max_text_length: limits::MAX_TEXT_LENGTH,
            max_matches: limits::MAX_MATCHES,
            max_preview_length: limits::MAX_PREVIEW_LENGTH,
            progress_batch: limits::PROGRESS_BATCH,
            backtrack_limit: limits::BACKTRACK_LIMIT,
        }
    }
}

impl EngineConfig {
    /// Create a new builder for EngineConfig.
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::default()
    }
}

/// Builder for creating EngineConfig instances.
#[derive(Debug, Clone, Default)]
pub struct EngineConfigBuilder {
    deadline: Option<Duration>,
    max_pattern_length: Option<usize>,
    max_text_length: Option<usize>,
    max_matches: Option<usize>,
    max_preview_length: Option<usize>,
    progress_batch: Option<usize>,
    backtrack_limit: Option<usize>,
}

impl EngineConfigBuilder {
    /// Set the per-task deadline.
    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Set the maximum pattern length in characters.
    pub fn max_pattern_length(mut self, chars: usize) -> Self {
        self.max_pattern_length = Some(chars);
        self
    }

    /// Set the maximum text length in characters.
    pub fn max_text_length(mut self, chars: usize) -> Self {
        self.max_text_length = Some(chars);
        self
    }

    /// Set the maximum number of returned match rows.
    pub fn max_matches(mut self, rows: usize) -> Self {
        self.max_matches = Some(rows);
        self
    }

    /// Set the maximum replace preview length in characters.
    pub fn max_preview_length(mut self, chars: usize) -> Self {
        self.max_preview_length = Some(chars);
        self
    }

    /// Set the progress batch interval in match iterations.
    pub fn progress_batch(mut self, iterations: usize) -> Self {
        self.progress_batch = Some(iterations.max(1));
        self
    }

    /// Set the regex engine backtrack ceiling.
    pub fn backtrack_limit(mut self, limit: usize) -> Self {
        self.backtrack_limit = Some(limit);
        self
    }

    /// Build the EngineConfig.
    pub fn build(self) -> EngineConfig {
        let default = EngineConfig::default();
        EngineConfig {
            deadline: self.deadline.unwrap_or(default.deadline),
            max_pattern_length: self.max_pattern_length.unwrap_or(default.max_pattern_length),
            max_text_length: self.max_text_length.unwrap_or(default.max_text_length),
            max_matches: self.max_matches.unwrap_or(default.max_matches),
            max_preview_length: self
                .max_preview_length
                .unwrap_or(default.max_preview_length),
            progress_batch: self.progress_batch.unwrap_or(default.progress_batch),
            backtrack_limit: self.backtrack_limit.unwrap_or(default.backtrack_limit),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.deadline, Duration::from_millis(800));
        assert_eq!(config.max_pattern_length, 800);
        assert_eq!(config.max_text_length, 120_000);
        assert_eq!(config.max_matches, 500);
        assert_eq!(config.max_preview_length, 5_000);
    }

    #[test]
    fn test_builder() {
        let config = EngineConfig::builder()
            .deadline(Duration::from_millis(200))
            .max_matches(10)
            .progress_batch(50)
            .build();

        assert_eq!(config.deadline, Duration::from_millis(200));
        assert_eq!(config.max_matches, 10);
        assert_eq!(config.progress_batch, 50);
        // Untouched fields keep the fixed defaults.
        assert_eq!(config.max_text_length, 120_000);
    }
}
