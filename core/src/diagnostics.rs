//! Diagnostic side-channels for the schema engine.
//!
//! The engine reports rejected writes on the error channel, ignored settings
//! on the warning channel and tracing detail on the info channel. Nothing in
//! the engine depends on what an observer does with them.

use std::fmt;
use std::sync::{Mutex, PoisonError};

/// Observer for engine diagnostics. `field` is the dotted path of the field
/// the message is about.
pub trait Diagnostics: fmt::Debug + Send + Sync {
    fn error(&self, field: &str, message: &str);
    fn warn(&self, field: &str, message: &str);
    fn info(&self, field: &str, message: &str);
}

/// Discards every diagnostic. The engine default.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopDiagnostics;

impl Diagnostics for NoopDiagnostics {
    fn error(&self, _field: &str, _message: &str) {}
    fn warn(&self, _field: &str, _message: &str) {}
    fn info(&self, _field: &str, _message: &str) {}
}

/// Forwards diagnostics to [`tracing`] events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn error(&self, field: &str, message: &str) {
        tracing::error!(field = %field, "{message}");
    }

    fn warn(&self, field: &str, message: &str) {
        tracing::warn!(field = %field, "{message}");
    }

    fn info(&self, field: &str, message: &str) {
        tracing::info!(field = %field, "{message}");
    }
}

/// Diagnostic channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Error,
    Warn,
    Info,
}

/// One recorded diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub level: Level,
    pub field: String,
    pub message: String,
}

/// Keeps every diagnostic in memory.
///
/// # Examples
///
/// ```
/// use schema_check_core::{Diagnostics, Level, RecordingDiagnostics};
///
/// let recorder = RecordingDiagnostics::new();
/// recorder.warn("name", "regex ignored");
/// assert_eq!(recorder.count(Level::Warn), 1);
/// assert_eq!(recorder.events()[0].field, "name");
/// ```
#[derive(Debug, Default)]
pub struct RecordingDiagnostics {
    events: Mutex<Vec<Diagnostic>>,
}

impl RecordingDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far.
    pub fn events(&self) -> Vec<Diagnostic> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of diagnostics recorded on `level`.
    pub fn count(&self, level: Level) -> usize {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|event| event.level == level)
            .count()
    }

    fn push(&self, level: Level, field: &str, message: &str) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Diagnostic {
                level,
                field: field.to_string(),
                message: message.to_string(),
            });
    }
}

impl Diagnostics for RecordingDiagnostics {
    fn error(&self, field: &str, message: &str) {
        self.push(Level::Error, field, message);
    }

    fn warn(&self, field: &str, message: &str) {
        self.push(Level::Warn, field, message);
    }

    fn info(&self, field: &str, message: &str) {
        self.push(Level::Info, field, message);
    }
}
