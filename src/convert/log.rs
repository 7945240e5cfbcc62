use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogSeverity {
    Info,
    Success,
    Warning,
    Error,
}

impl std::fmt::Display for LogSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Success => write!(f, "success"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// One decision recorded during a conversion run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub message: String,
    pub severity: LogSeverity,
}

/// Append-only narrative of one conversion run.
///
/// Each run owns a fresh log; entries are never reordered or removed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversionLog {
    entries: Vec<LogEntry>,
}

impl ConversionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, severity: LogSeverity, message: impl Into<String>) {
        let message = message.into();
        tracing::debug!(severity = %severity, "{}", message);
        self.entries.push(LogEntry {
            timestamp: Utc::now(),
            message,
            severity,
        });
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.record(LogSeverity::Info, message);
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.record(LogSeverity::Success, message);
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        self.record(LogSeverity::Warning, message);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.record(LogSeverity::Error, message);
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn count(&self, severity: LogSeverity) -> usize {
        self.entries.iter().filter(|e| e.severity == severity).count()
    }

    /// Entries whose message mentions `needle`.
    pub fn mentioning<'a>(&'a self, needle: &'a str) -> impl Iterator<Item = &'a LogEntry> + 'a {
        self.entries.iter().filter(move |e| e.message.contains(needle))
    }
}
