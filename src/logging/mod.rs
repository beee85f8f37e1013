//! # Logging Capability
//!
//! Core components never talk to a logging backend directly. They receive a
//! [`LogSink`] and report through its three severities, which keeps the
//! provisioner and the dimension generator usable from any host (CLI, server,
//! game engine bridge, tests).
//!
//! - [`TracingSink`] forwards to the `tracing` macros and is what the binary uses.
//! - [`RecordingSink`] keeps every message in memory so callers can inspect them.

use std::sync::{Arc, Mutex};

/// Severity of a logged message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warn,
    Error,
}

/// Destination for informational, warning and error messages.
pub trait LogSink: Send + Sync {
    fn info(&self, message: &str);
    fn warn(&self, message: &str);
    fn error(&self, message: &str);
}

/// Sink that forwards every message to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn info(&self, message: &str) {
        tracing::info!("{}", message);
    }

    fn warn(&self, message: &str) {
        tracing::warn!("{}", message);
    }

    fn error(&self, message: &str) {
        tracing::error!("{}", message);
    }
}

/// Shared handle to the default sink.
pub fn tracing_sink() -> Arc<dyn LogSink> {
    Arc::new(TracingSink)
}

/// Sink that records messages in memory.
#[derive(Debug, Default)]
pub struct RecordingSink {
    entries: Mutex<Vec<(Severity, String)>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, severity: Severity, message: &str) {
        // A poisoned lock only means another thread panicked mid-push; keep recording.
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.push((severity, message.to_string()));
    }

    /// Snapshot of every recorded message in arrival order.
    pub fn entries(&self) -> Vec<(Severity, String)> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Messages recorded with the given severity.
    pub fn messages(&self, severity: Severity) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter(|(s, _)| *s == severity)
            .map(|(_, m)| m)
            .collect()
    }

    /// True if any message of `severity` contains `needle`.
    pub fn contains(&self, severity: Severity, needle: &str) -> bool {
        self.messages(severity).iter().any(|m| m.contains(needle))
    }
}

impl LogSink for RecordingSink {
    fn info(&self, message: &str) {
        self.push(Severity::Info, message);
    }

    fn warn(&self, message: &str) {
        self.push(Severity::Warn, message);
    }

    fn error(&self, message: &str) {
        self.push(Severity::Error, message);
    }
}
