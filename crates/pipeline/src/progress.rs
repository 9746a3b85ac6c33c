//! Structured progress reporting for pipeline runs.
//!
//! Provides incremental feedback while a document moves through chunking,
//! question generation, indexing, and answering.

use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

/// Pipeline phase a progress event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Chunk,
    Question,
    Index,
    Answer,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Chunk => "chunk",
            Self::Question => "question",
            Self::Index => "index",
            Self::Answer => "answer",
        }
    }
}

/// Progress event emitted during a run.
#[derive(Debug, Clone, Serialize)]
pub struct ProgressEvent {
    pub phase: Phase,

    /// Current progress (batches done, chunks indexed, questions answered)
    pub current: u64,

    /// Total expected work (if known)
    pub total: Option<u64>,

    /// Percentage complete (0.0 - 100.0)
    pub percentage: Option<f64>,

    pub message: String,

    /// Seconds since the reporter was created
    pub elapsed_secs: Option<f64>,
}

impl ProgressEvent {
    pub fn new(phase: Phase, current: u64, total: Option<u64>, message: impl Into<String>) -> Self {
        let percentage = total.map(|t| {
            if t > 0 {
                (current as f64 / t as f64) * 100.0
            } else {
                0.0
            }
        });

        Self {
            phase,
            current,
            total,
            percentage,
            message: message.into(),
            elapsed_secs: None,
        }
    }

    pub fn with_elapsed(mut self, elapsed_secs: f64) -> Self {
        self.elapsed_secs = Some(elapsed_secs);
        self
    }

    /// Format as a simple user-facing line.
    pub fn format_simple(&self) -> String {
        let progress = match self.total {
            Some(total) => format!("{}/{}", self.current, total),
            None => format!("{}", self.current),
        };

        let pct = self
            .percentage
            .map(|p| format!(" ({:.0}%)", p))
            .unwrap_or_default();

        format!(
            "[{}] {}{} - {}",
            self.phase.as_str(),
            progress,
            pct,
            self.message
        )
    }
}

/// Callback for progress events.
pub type ProgressCallback = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

/// Progress reporter that emits events through a callback.
#[derive(Clone)]
pub struct ProgressReporter {
    callback: Option<ProgressCallback>,
    start_time: Instant,
}

impl ProgressReporter {
    pub fn new(callback: ProgressCallback) -> Self {
        Self {
            callback: Some(callback),
            start_time: Instant::now(),
        }
    }

    /// Reporter that emits nothing.
    pub fn noop() -> Self {
        Self {
            callback: None,
            start_time: Instant::now(),
        }
    }

    /// Reporter that logs each event at info level.
    pub fn logging() -> Self {
        Self::new(Arc::new(|event: ProgressEvent| {
            tracing::info!("{}", event.format_simple());
        }))
    }

    pub fn emit(&self, event: ProgressEvent) {
        let Some(callback) = &self.callback else {
            return;
        };

        let elapsed = self.start_time.elapsed().as_secs_f64();
        let event = event.with_elapsed(elapsed);

        tracing::debug!(
            phase = event.phase.as_str(),
            current = event.current,
            total = ?event.total,
            message = %event.message,
            elapsed_secs = elapsed,
            "Progress event"
        );

        callback(event);
    }

    pub fn chunk(&self, question_chunks: usize, answer_chunks: usize) {
        self.emit(ProgressEvent::new(
            Phase::Chunk,
            question_chunks as u64,
            None,
            format!(
                "{} question chunks, {} answer chunks",
                question_chunks, answer_chunks
            ),
        ));
    }

    pub fn question_batch(&self, current: u64, total: u64, questions_so_far: usize) {
        self.emit(ProgressEvent::new(
            Phase::Question,
            current,
            Some(total),
            format!("{} candidate questions", questions_so_far),
        ));
    }

    pub fn fallback(&self, current: u64, total: u64) {
        self.emit(ProgressEvent::new(
            Phase::Question,
            current,
            Some(total),
            "single-chunk fallback",
        ));
    }

    pub fn index(&self, current: u64, total: Option<u64>, model: &str) {
        self.emit(ProgressEvent::new(
            Phase::Index,
            current,
            total,
            format!("model={}", model),
        ));
    }

    pub fn answer(&self, current: u64, total: u64, question: &str) {
        self.emit(ProgressEvent::new(
            Phase::Answer,
            current,
            Some(total),
            question.to_string(),
        ));
    }
}

impl std::fmt::Debug for ProgressReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressReporter")
            .field("enabled", &self.callback.is_some())
            .finish()
    }
}
