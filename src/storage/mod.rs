pub mod history;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{LogEntry, RunParams, RunRecord, RunStatus};

pub use history::FsHistoryStore;

#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// One past the highest persisted run number, or the starting number when empty.
    async fn next_run_number(&self) -> Result<u64>;
    async fn save(
        &self,
        run_number: u64,
        status: RunStatus,
        params: &RunParams,
        username: &str,
        logs: Vec<LogEntry>,
    ) -> Result<RunRecord>;
    async fn list_recent(&self, limit: usize) -> Result<Vec<RunRecord>>;
    async fn load(&self, run_number: u64) -> Result<Option<RunRecord>>;
    async fn prune(&self, keep: usize) -> Result<usize>;
}
