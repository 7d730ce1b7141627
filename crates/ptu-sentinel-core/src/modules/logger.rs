//! Log sinks for rendered reports.
//!
//! `TracingSink` forwards report lines to the tracing macros at the line's
//! severity. `BufferSink` keeps lines in memory for callers that want the
//! text back (CLI output, tests).

use parking_lot::Mutex;
use tracing::{error, info, warn};

use crate::traits::{LogSink, Severity};

/// Forwards each line to the global tracing subscriber.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn emit(&self, severity: Severity, text: &str) {
        match severity {
            Severity::Info => info!(target: "ptu_sentinel::report", "{}", text),
            Severity::Warn => warn!(target: "ptu_sentinel::report", "{}", text),
            Severity::Error => error!(target: "ptu_sentinel::report", "{}", text),
        }
    }
}

/// Captures lines in memory.
#[derive(Debug, Default)]
pub struct BufferSink {
    lines: Mutex<Vec<(Severity, String)>>,
}

impl BufferSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<(Severity, String)> {
        self.lines.lock().clone()
    }

    /// All captured text joined with newlines.
    pub fn text(&self) -> String {
        self.lines.lock().iter().map(|(_, t)| t.as_str()).collect::<Vec<_>>().join("\n")
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines.lock().iter().any(|(_, t)| t.contains(needle))
    }
}

impl LogSink for BufferSink {
    fn emit(&self, severity: Severity, text: &str) {
        self.lines.lock().push((severity, text.to_string()));
    }
}
