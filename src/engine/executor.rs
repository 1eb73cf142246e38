//! Worker executor: one isolated thread per task, supervised against a
//! hard deadline.
//!
//! Each task runs on a fresh OS thread so that no engine state (compiled
//! patterns, scan cursors) survives between requests and a pathological
//! pattern can never block the dispatcher. The thread reports progress and
//! its terminal result over a channel; the executor races that channel
//! against the deadline. Rust threads cannot be killed, so a timed-out
//! worker is abandoned; the engine's backtrack ceiling bounds how long an
//! abandoned worker can keep running.

use std::panic::{catch_unwind, AssertUnwindSafe};

use tokio::sync::{broadcast, mpsc};

use crate::engine::algorithms::{self, ReplaceResult, TestResult};
use crate::engine::config::EngineConfig;
use crate::engine::normalize::{self, ValidateResult};
use crate::engine::progress::{ProgressEvent, ProgressUpdate};
use crate::error::{EngineError, Result};

/// Payload of one task, keyed by task kind. Flags are sanitized by the
/// dispatcher before the payload is built.
#[derive(Debug, Clone)]
pub enum TaskPayload {
    /// Validate a pattern without scanning any text.
    Validate {
        /// Pattern source.
        pattern: String,
        /// Sanitized flags.
        flags: String,
    },
    /// Scan a text for matches.
    Test {
        /// Pattern source.
        pattern: String,
        /// Sanitized flags.
        flags: String,
        /// Input text.
        text: String,
        /// Row cap for materialized matches.
        max_matches: usize,
    },
    /// Compute a replacement preview.
    Replace {
        /// Pattern source.
        pattern: String,
        /// Sanitized flags.
        flags: String,
        /// Input text.
        text: String,
        /// Replacement template with `$1`/`$name` backreferences.
        replacement: String,
        /// Preview length cap in characters.
        max_preview_length: usize,
    },
}

/// One task descriptor, immutable once created. `request_id` is present for
/// test and replace, which stream progress; validate has none.
#[derive(Debug, Clone)]
pub struct Task {
    /// Progress correlation id, echoed in every progress event.
    pub request_id: Option<String>,
    /// The task's payload.
    pub payload: TaskPayload,
}

/// Successful output of one task.
#[derive(Debug, Clone)]
pub enum TaskOutput {
    /// Output of a validate task.
    Validate(ValidateResult),
    /// Output of a test task.
    Test(TestResult),
    /// Output of a replace task.
    Replace(ReplaceResult),
}

enum WorkerMessage {
    Progress(ProgressUpdate),
    Done(Result<TaskOutput>),
}

/// Runs one algorithm invocation per task inside a fresh worker thread and
/// enforces the deadline. Progress is relayed to the broadcast channel
/// tagged with the task's request id, without interpretation.
#[derive(Debug, Clone)]
pub struct WorkerExecutor {
    config: EngineConfig,
    progress: broadcast::Sender<ProgressEvent>,
}

impl WorkerExecutor {
    /// Create an executor publishing progress to the given channel.
    pub fn new(config: EngineConfig, progress: broadcast::Sender<ProgressEvent>) -> Self {
        Self { config, progress }
    }

    /// Run one task to settlement: `Completed` maps to `Ok`, `Failed` to
    /// `WorkerFault` (or the worker's own error), `TimedOut` to `Timeout`.
    ///
    /// Settlement is idempotent: the first terminal signal wins and the
    /// channel is dropped, so anything a late worker sends goes nowhere.
    pub async fn run(&self, task: Task) -> Result<TaskOutput> {
        let deadline = self.config.deadline;
        let config = self.config.clone();
        let request_id = task.request_id.clone();
        let payload = task.payload;

        let (tx, mut rx) = mpsc::unbounded_channel();
        std::thread::Builder::new()
            .name("regex-sandbox-worker".to_string())
            .spawn(move || {
                let progress_tx = tx.clone();
                let result = catch_unwind(AssertUnwindSafe(|| {
                    let mut sink = |update: ProgressUpdate| {
                        let _ = progress_tx.send(WorkerMessage::Progress(update));
                    };
                    execute_payload(&payload, &config, &mut sink)
                }))
                .unwrap_or_else(|panic| {
                    Err(EngineError::WorkerFault(anyhow::anyhow!(
                        "worker panicked: {}",
                        panic_message(&panic)
                    )))
                });
                let _ = tx.send(WorkerMessage::Done(result));
            })
            .map_err(|e| {
                EngineError::WorkerFault(anyhow::anyhow!("failed to spawn worker: {e}"))
            })?;

        let sleep = tokio::time::sleep(deadline);
        tokio::pin!(sleep);

        loop {
            tokio::select! {
                message = rx.recv() => match message {
                    Some(WorkerMessage::Progress(update)) => {
                        if let Some(id) = &request_id {
                            // No subscribers is fine; drop the event.
                            let _ = self.progress.send(ProgressEvent::tagged(id.clone(), update));
                        }
                    }
                    Some(WorkerMessage::Done(result)) => {
                        #[cfg(feature = "tracing")]
                        tracing::debug!(ok = result.is_ok(), "task settled");
                        return result;
                    }
                    None => {
                        return Err(EngineError::WorkerFault(anyhow::anyhow!(
                            "worker exited without a result"
                        )));
                    }
                },
                _ = &mut sleep => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(?deadline, "task deadline elapsed, abandoning worker");
                    return Err(EngineError::Timeout(deadline));
                }
            }
        }
    }
}

/// Worker-side task body. Compiles fresh pattern instances so nothing is
/// shared with any other task.
fn execute_payload(
    payload: &TaskPayload,
    config: &EngineConfig,
    sink: &mut dyn FnMut(ProgressUpdate),
) -> Result<TaskOutput> {
    match payload {
        TaskPayload::Validate { pattern, flags } => {
            normalize::run_validate(pattern, flags, config.backtrack_limit).map(TaskOutput::Validate)
        }
        TaskPayload::Test {
            pattern,
            flags,
            text,
            max_matches,
        } => {
            let re = normalize::compile(pattern, flags, config.backtrack_limit)?;
            let census = normalize::count_capturing_groups(pattern);
            algorithms::run_test(&re, text, census, *max_matches, config.progress_batch, sink)
                .map(TaskOutput::Test)
        }
        TaskPayload::Replace {
            pattern,
            flags,
            text,
            replacement,
            max_preview_length,
        } => {
            // Two fresh instances: the count scan must not share cursor or
            // cache state with the substitution pass.
            let counter = normalize::compile(pattern, flags, config.backtrack_limit)?;
            let substituter = normalize::compile(pattern, flags, config.backtrack_limit)?;
            algorithms::run_replace(
                &counter,
                &substituter,
                text,
                replacement,
                flags.contains('g'),
                *max_preview_length,
                config.progress_batch,
                sink,
            )
            .map(TaskOutput::Replace)
        }
    }
}

fn panic_message(panic: &Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
