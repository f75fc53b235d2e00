//! In-memory console log for the run that is currently executing.

use tokio::sync::mpsc;

use crate::models::{LogEntry, LogLevel};
use crate::runner::events::RunEvent;

/// Accumulates the log lines of one run.
///
/// Each recorded line is also forwarded to the live sink, if one is attached,
/// so the display can show it while the run is still going.
#[derive(Debug, Default)]
pub struct RunLog {
    entries: Vec<LogEntry>,
    sink: Option<mpsc::UnboundedSender<RunEvent>>,
}

impl RunLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sink(sink: mpsc::UnboundedSender<RunEvent>) -> Self {
        Self {
            entries: Vec::new(),
            sink: Some(sink),
        }
    }

    /// Append a line stamped with the current local time.
    pub fn record(&mut self, message: impl Into<String>, level: LogLevel) {
        let entry = LogEntry::now(message, level);

        match level {
            LogLevel::Error => tracing::error!(target: "run_log", "{}", entry.message),
            LogLevel::Warning => tracing::warn!(target: "run_log", "{}", entry.message),
            LogLevel::Info | LogLevel::Success => {
                tracing::info!(target: "run_log", level = %level, "{}", entry.message)
            }
        }

        if let Some(sink) = &self.sink {
            // A display that went away must not stop the run.
            let _ = sink.send(RunEvent::Log {
                entry: entry.clone(),
            });
        }

        self.entries.push(entry);
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.record(message, LogLevel::Info);
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.record(message, LogLevel::Success);
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        self.record(message, LogLevel::Warning);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.record(message, LogLevel::Error);
    }

    pub fn reset(&mut self) {
        self.entries.clear();
    }

    /// Copy of everything recorded since the last reset.
    pub fn drain(&self) -> Vec<LogEntry> {
        self.entries.clone()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_preserves_order_and_levels() {
        let mut log = RunLog::new();
        log.info("first");
        log.success("second");
        log.warning("third");
        log.error("fourth");
        log.record("", LogLevel::Info);

        let entries = log.drain();
        let messages: Vec<&str> = entries.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, vec!["first", "second", "third", "fourth", ""]);
        let levels: Vec<LogLevel> = entries.iter().map(|e| e.level).collect();
        assert_eq!(
            levels,
            vec![
                LogLevel::Info,
                LogLevel::Success,
                LogLevel::Warning,
                LogLevel::Error,
                LogLevel::Info,
            ]
        );
    }

    #[test]
    fn test_drain_does_not_clear() {
        let mut log = RunLog::new();
        log.info("kept");
        assert_eq!(log.drain().len(), 1);
        assert_eq!(log.drain().len(), 1);
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_reset_then_drain_is_empty() {
        let mut log = RunLog::new();
        log.info("a");
        log.error("b");
        log.reset();
        assert!(log.drain().is_empty());
        assert!(log.is_empty());
    }

    #[test]
    fn test_reset_on_empty_log() {
        let mut log = RunLog::new();
        log.reset();
        assert!(log.drain().is_empty());
    }

    #[tokio::test]
    async fn test_record_forwards_to_sink() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut log = RunLog::with_sink(tx);
        log.info("Connecting...");
        log.success("Connected");

        let mut forwarded = Vec::new();
        for _ in 0..2 {
            match rx.recv().await.expect("event") {
                RunEvent::Log { entry } => forwarded.push(entry),
                other => panic!("Expected Log event, got: {:?}", other),
            }
        }
        assert_eq!(forwarded, log.drain());
    }

    #[test]
    fn test_record_survives_closed_sink() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        let mut log = RunLog::with_sink(tx);
        log.info("nobody is listening");
        assert_eq!(log.len(), 1);
    }
}
