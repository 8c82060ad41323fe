// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use std::sync::{Mutex, PoisonError};
use tracing::{debug, error, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogLevel {
    Error,
    Warn,
    Debug,
}

/// Sink for the crate's own diagnostics (parser and callback failures).
///
/// It never receives the report itself; the report goes to the transport collaborator.
pub trait DiagnosticLog: Send + Sync {
    fn log(&self, level: LogLevel, message: &str);
}

/// Forwards diagnostics to whatever `tracing` subscriber the embedding application installed.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLog;

impl DiagnosticLog for TracingLog {
    fn log(&self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Error => error!("{message}"),
            LogLevel::Warn => warn!("{message}"),
            LogLevel::Debug => debug!("{message}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
}

impl LogEntry {
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}

/// Keeps every diagnostic in memory, e.g. to attach them to the application's own telemetry.
#[derive(Debug, Default)]
pub struct MemoryLog {
    entries: Mutex<Vec<LogEntry>>,
}

impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn count(&self, level: LogLevel) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|entry| entry.level == level)
            .count()
    }
}

impl DiagnosticLog for MemoryLog {
    fn log(&self, level: LogLevel, message: &str) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(LogEntry::new(level, message));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_log_keeps_entries_in_order() {
        let log = MemoryLog::new();
        log.log(LogLevel::Warn, "first");
        log.log(LogLevel::Error, "second");
        log.log(LogLevel::Error, "third");

        assert_eq!(
            log.entries(),
            vec![
                LogEntry::new(LogLevel::Warn, "first"),
                LogEntry::new(LogLevel::Error, "second"),
                LogEntry::new(LogLevel::Error, "third"),
            ]
        );
        assert_eq!(log.count(LogLevel::Error), 2);
        assert_eq!(log.count(LogLevel::Debug), 0);
    }

    #[test]
    fn tracing_log_without_subscriber_is_silent() {
        // No subscriber is installed, the call must simply be a no-op.
        TracingLog.log(LogLevel::Error, "nobody is listening");
    }
}
