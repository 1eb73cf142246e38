//! Progress reporting for in-flight scans.

use serde::{Deserialize, Serialize};

/// A raw progress sample produced inside a worker, before request
/// correlation is attached.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressUpdate {
    /// Current scan offset into the text, in bytes.
    pub processed: usize,
    /// Total text length in bytes.
    pub total: usize,
    /// Derived completion percentage in `[0, 100]`.
    pub percent: f64,
    /// True exactly once, on the final sample of a test scan.
    pub complete: bool,
}

impl ProgressUpdate {
    /// Build a sample with the percentage derived from `processed / total`.
    pub fn new(processed: usize, total: usize, complete: bool) -> Self {
        let percent = if total == 0 {
            100.0
        } else {
            (processed as f64 / total as f64 * 100.0).min(100.0)
        };
        Self {
            processed,
            total,
            percent,
            complete,
        }
    }
}

/// A progress event as delivered to subscribers, correlated by the
/// originating task's request id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    /// Opaque identifier of the originating test or replace request.
    pub request_id: String,
    /// Current scan offset into the text, in bytes.
    pub processed: usize,
    /// Total text length in bytes.
    pub total: usize,
    /// Derived completion percentage in `[0, 100]`.
    pub percent: f64,
    /// True exactly once, on the final sample of a test scan.
    pub complete: bool,
}

impl ProgressEvent {
    /// Tag a raw worker sample with its request id.
    pub fn tagged(request_id: String, update: ProgressUpdate) -> Self {
        Self {
            request_id,
            processed: update.processed,
            total: update.total,
            percent: update.percent,
            complete: update.complete,
        }
    }
}

/// Sink for raw progress samples emitted by the algorithms. The executor
/// installs a sink that forwards samples over the worker channel; it never
/// interprets their content.
pub type ProgressSink<'a> = &'a mut dyn FnMut(ProgressUpdate);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_derivation() {
        let update = ProgressUpdate::new(50, 200, false);
        assert_eq!(update.percent, 25.0);

        let done = ProgressUpdate::new(200, 200, true);
        assert_eq!(done.percent, 100.0);
        assert!(done.complete);
    }

    #[test]
    fn test_empty_text_is_complete() {
        let update = ProgressUpdate::new(0, 0, true);
        assert_eq!(update.percent, 100.0);
    }

    #[test]
    fn test_event_serializes_camel_case() {
        let event = ProgressEvent::tagged("abc".to_string(), ProgressUpdate::new(10, 40, false));
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["requestId"], "abc");
        assert_eq!(json["processed"], 10);
        assert_eq!(json["percent"], 25.0);
        assert_eq!(json["complete"], false);
    }
}
