use serde::Serialize;

use crate::models::{LogEntry, RunRecord};

/// Messages posted from the run worker back to the display context.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data")]
pub enum RunEvent {
    Started {
        run_number: u64,
        environment: String,
        action: String,
    },
    Log {
        entry: LogEntry,
    },
    Succeeded {
        record: RunRecord,
    },
    /// `record` is `None` when the run could not be persisted; `run_number`
    /// is `None` when no number could be allocated.
    Failed {
        run_number: Option<u64>,
        error: String,
        record: Option<RunRecord>,
    },
    /// Always the last event of a run; the worker accepts a new run after this.
    Finished {
        run_number: Option<u64>,
    },
}

impl RunEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunEvent::Finished { .. })
    }
}
