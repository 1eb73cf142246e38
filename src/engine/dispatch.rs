//! Task dispatcher: the four-operation RPC surface.
//!
//! The dispatcher applies size limits and flag sanitization before any
//! execution, hands task descriptors to the worker executor, and shapes the
//! final response (timing, limits echo, request correlation). It never
//! blocks on algorithm execution; it only awaits the executor's terminal
//! signal, so concurrent requests proceed independently.

use std::time::{Instant, SystemTime, UNIX_EPOCH};

use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::engine::algorithms::{ReplaceResult, TestResult};
use crate::engine::config::EngineConfig;
use crate::engine::executor::{Task, TaskOutput, TaskPayload, WorkerExecutor};
use crate::engine::limits::{ReplaceLimits, TestLimits};
use crate::engine::normalize::{self, ValidateResult};
use crate::engine::progress::ProgressEvent;
use crate::engine::templates::{builtin_patterns, PatternTemplate};
use crate::error::{EngineError, Result};

/// Capacity of the progress broadcast channel. Slow subscribers that lag
/// behind lose the oldest events, never the terminal response.
const PROGRESS_CHANNEL_CAPACITY: usize = 1024;

/// Response of the `getPatterns` operation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternCatalogResponse {
    /// The read-only template catalog.
    pub items: &'static [PatternTemplate],
    /// Unix timestamp in milliseconds.
    pub timestamp: u64,
}

/// Response of the `validate` operation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateResponse {
    /// The validation result.
    #[serde(flatten)]
    pub result: ValidateResult,
    /// Elapsed wall-clock time in milliseconds.
    pub took_ms: u64,
}

/// Response of the `test` operation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResponse {
    /// Correlation id for this request's progress events.
    pub request_id: String,
    /// The scan result.
    #[serde(flatten)]
    pub result: TestResult,
    /// Elapsed wall-clock time in milliseconds.
    pub took_ms: u64,
    /// The fixed limits this response was computed under.
    pub limits: TestLimits,
}

/// Response of the `replace` operation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceResponse {
    /// Correlation id for this request's progress events.
    pub request_id: String,
    /// The replacement result.
    #[serde(flatten)]
    pub result: ReplaceResult,
    /// Elapsed wall-clock time in milliseconds.
    pub took_ms: u64,
    /// The fixed limits this response was computed under.
    pub limits: ReplaceLimits,
}

/// The RPC surface: `getPatterns`, `validate`, `test`, `replace`.
///
/// Tasks are created per request and discarded after the response is
/// shaped; the only state shared across requests is the read-only template
/// catalog and the progress channel.
#[derive(Debug)]
pub struct RegexDispatcher {
    config: EngineConfig,
    executor: WorkerExecutor,
    progress: broadcast::Sender<ProgressEvent>,
}

impl RegexDispatcher {
    /// Create a dispatcher with the fixed default limits.
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Create a dispatcher with an explicit configuration.
    pub fn with_config(config: EngineConfig) -> Self {
        let (progress, _) = broadcast::channel(PROGRESS_CHANNEL_CAPACITY);
        let executor = WorkerExecutor::new(config.clone(), progress.clone());
        Self {
            config,
            executor,
            progress,
        }
    }

    /// Subscribe to `matchProgress` events. Dropping the receiver
    /// unsubscribes. Callers issuing overlapping requests must filter by
    /// [`ProgressEvent::request_id`] to discard stale progress.
    pub fn subscribe_progress(&self) -> broadcast::Receiver<ProgressEvent> {
        self.progress.subscribe()
    }

    /// `getPatterns`: return the static template catalog. No normalization,
    /// no worker.
    pub fn patterns(&self) -> PatternCatalogResponse {
        PatternCatalogResponse {
            items: builtin_patterns(),
            timestamp: unix_millis(),
        }
    }

    /// `validate`: normalize the pattern and flags and report the census.
    pub async fn validate(&self, pattern: &str, flags: &str) -> Result<ValidateResponse> {
        let started = Instant::now();
        let flags = normalize::sanitize_flags(flags);
        normalize::validate_pattern(pattern, &flags, &self.config)?;

        let output = self
            .executor
            .run(Task {
                request_id: None,
                payload: TaskPayload::Validate {
                    pattern: pattern.to_string(),
                    flags,
                },
            })
            .await?;

        let TaskOutput::Validate(result) = output else {
            return Err(unexpected_output("validate"));
        };
        Ok(ValidateResponse {
            result,
            took_ms: elapsed_ms(started),
        })
    }

    /// `test`: scan the text for matches, streaming progress under a fresh
    /// request id.
    pub async fn test(&self, pattern: &str, flags: &str, text: &str) -> Result<TestResponse> {
        let started = Instant::now();
        let flags = normalize::sanitize_flags(flags);
        normalize::validate_pattern(pattern, &flags, &self.config)?;
        normalize::validate_text(text, &self.config)?;

        let request_id = Uuid::new_v4().to_string();
        let output = self
            .executor
            .run(Task {
                request_id: Some(request_id.clone()),
                payload: TaskPayload::Test {
                    pattern: pattern.to_string(),
                    flags,
                    text: text.to_string(),
                    max_matches: self.config.max_matches,
                },
            })
            .await?;

        let TaskOutput::Test(result) = output else {
            return Err(unexpected_output("test"));
        };
        Ok(TestResponse {
            request_id,
            result,
            took_ms: elapsed_ms(started),
            limits: TestLimits {
                max_text_length: self.config.max_text_length,
                max_matches: self.config.max_matches,
            },
        })
    }

    /// `replace`: compute a replacement preview, streaming progress under a
    /// fresh request id.
    pub async fn replace(
        &self,
        pattern: &str,
        flags: &str,
        text: &str,
        replacement: &str,
    ) -> Result<ReplaceResponse> {
        let started = Instant::now();
        let flags = normalize::sanitize_flags(flags);
        normalize::validate_pattern(pattern, &flags, &self.config)?;
        normalize::validate_text(text, &self.config)?;

        let request_id = Uuid::new_v4().to_string();
        let output = self
            .executor
            .run(Task {
                request_id: Some(request_id.clone()),
                payload: TaskPayload::Replace {
                    pattern: pattern.to_string(),
                    flags,
                    text: text.to_string(),
                    replacement: replacement.to_string(),
                    max_preview_length: self.config.max_preview_length,
                },
            })
            .await?;

        let TaskOutput::Replace(result) = output else {
            return Err(unexpected_output("replace"));
        };
        Ok(ReplaceResponse {
            request_id,
            result,
            took_ms: elapsed_ms(started),
            limits: ReplaceLimits {
                max_text_length: self.config.max_text_length,
                max_preview_length: self.config.max_preview_length,
            },
        })
    }
}

impl Default for RegexDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

fn unexpected_output(operation: &str) -> EngineError {
    EngineError::WorkerFault(anyhow::anyhow!(
        "worker returned mismatched output for {operation}"
    ))
}
