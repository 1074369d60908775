//! Progress reporting for ingestion runs.
//!
//! Ingestion emits events for the read, chunk, embed and index phases so a
//! front end can render incremental feedback.

use std::sync::Arc;
use std::time::Instant;

/// Progress event emitted during knowledge operations.
#[derive(Debug, Clone)]
pub struct ProgressEvent {
    /// Phase of the operation: "read", "chunk", "embed", "index"
    pub phase: String,

    /// Current progress (files processed, chunks created, etc.)
    pub current: u64,

    /// Total expected work (if known)
    pub total: Option<u64>,

    /// Percentage complete (0.0 - 100.0)
    pub percentage: Option<f64>,

    /// Human-readable message
    pub message: String,

    /// Elapsed time since phase started
    pub elapsed_secs: Option<f64>,
}

impl ProgressEvent {
    /// Create a new progress event.
    pub fn new(
        phase: impl Into<String>,
        current: u64,
        total: Option<u64>,
        message: impl Into<String>,
    ) -> Self {
        let percentage = total.map(|t| {
            if t > 0 {
                (current as f64 / t as f64) * 100.0
            } else {
                0.0
            }
        });

        Self {
            phase: phase.into(),
            current,
            total,
            percentage,
            message: message.into(),
            elapsed_secs: None,
        }
    }

    /// Set elapsed time.
    pub fn with_elapsed(mut self, elapsed_secs: f64) -> Self {
        self.elapsed_secs = Some(elapsed_secs);
        self
    }

    /// Format as a simple user-facing line.
    pub fn format_simple(&self) -> String {
        let progress = if let Some(total) = self.total {
            format!("{}/{}", self.current, total)
        } else {
            format!("{}", self.current)
        };

        let pct = if let Some(p) = self.percentage {
            format!(" ({:.0}%)", p)
        } else {
            String::new()
        };

        format!("[{}] {}{} - {}", self.phase, progress, pct, self.message)
    }
}

/// Callback for progress events.
pub type ProgressCallback = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

/// Progress reporter that emits events through a callback.
#[derive(Clone)]
pub struct ProgressReporter {
    callback: Option<ProgressCallback>,
    start_time: Arc<Instant>,
}

impl ProgressReporter {
    /// Create a new reporter with a callback.
    pub fn new(callback: ProgressCallback) -> Self {
        Self {
            callback: Some(callback),
            start_time: Arc::new(Instant::now()),
        }
    }

    /// Create a no-op reporter (no events emitted).
    pub fn noop() -> Self {
        Self {
            callback: None,
            start_time: Arc::new(Instant::now()),
        }
    }

    /// Emit a progress event.
    pub fn emit(&self, event: ProgressEvent) {
        if let Some(callback) = &self.callback {
            let elapsed = self.start_time.elapsed().as_secs_f64();
            let event_with_time = event.with_elapsed(elapsed);

            tracing::debug!(
                phase = %event_with_time.phase,
                current = event_with_time.current,
                total = ?event_with_time.total,
                percentage = ?event_with_time.percentage,
                message = %event_with_time.message,
                elapsed_secs = elapsed,
                "Progress event"
            );

            callback(event_with_time);
        }
    }

    /// Emit read phase event.
    pub fn read(&self, current: u64, total: Option<u64>, source: &str) {
        self.emit(ProgressEvent::new(
            "read",
            current,
            total,
            format!("reading {}", source),
        ));
    }

    /// Emit chunking phase event.
    pub fn chunk(&self, current: u64, total: Option<u64>, chunks_created: usize) {
        self.emit(ProgressEvent::new(
            "chunk",
            current,
            total,
            format!("{} chunks created", chunks_created),
        ));
    }

    /// Emit embedding phase event.
    pub fn embed(&self, total: u64, model: &str) {
        self.emit(ProgressEvent::new(
            "embed",
            0,
            Some(total),
            format!("model={}", model),
        ));
    }

    /// Emit indexing phase event.
    pub fn index(&self, current: u64, total: Option<u64>, collection: &str) {
        self.emit(ProgressEvent::new(
            "index",
            current,
            total,
            format!("writing to collection '{}'", collection),
        ));
    }
}
