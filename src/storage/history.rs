use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Local;

use crate::errors::MigrationError;
use crate::models::{LogEntry, RunParams, RunRecord, RunStatus};
use crate::storage::HistoryStore;

/// Run history kept as one pretty-printed JSON file per run under `data_dir/builds/`.
pub struct FsHistoryStore {
    builds_dir: PathBuf,
    starting_run_number: u64,
}

impl FsHistoryStore {
    pub const DEFAULT_STARTING_RUN_NUMBER: u64 = 1599;

    /// Create a new FsHistoryStore rooted at data_dir/builds/.
    pub async fn new(data_dir: PathBuf, starting_run_number: u64) -> Result<Self> {
        let builds_dir = data_dir.join("builds");
        tokio::fs::create_dir_all(&builds_dir)
            .await
            .context("Failed to create builds directory")?;
        Ok(Self {
            builds_dir,
            starting_run_number,
        })
    }

    pub fn builds_dir(&self) -> &Path {
        &self.builds_dir
    }

    /// Path of the record file for a run number.
    pub fn record_path(&self, run_number: u64) -> PathBuf {
        self.builds_dir.join(format!("build_{}.json", run_number))
    }

    /// Extract the run number from a `build_<n>.json` file name.
    fn parse_run_number(file_name: &str) -> Option<u64> {
        file_name
            .strip_prefix("build_")?
            .strip_suffix(".json")?
            .parse()
            .ok()
    }

    /// Run numbers of all record files, highest first.
    async fn run_numbers(&self) -> Result<Vec<u64>> {
        let mut entries = match tokio::fs::read_dir(&self.builds_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e).context("Failed to read builds directory"),
        };

        let mut numbers = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            match name.to_str().and_then(Self::parse_run_number) {
                Some(n) => numbers.push(n),
                None => tracing::debug!("Ignoring non-record file {:?}", name),
            }
        }

        numbers.sort_unstable_by(|a, b| b.cmp(a));
        Ok(numbers)
    }

    async fn read_record(&self, run_number: u64) -> std::result::Result<RunRecord, MigrationError> {
        let content = tokio::fs::read_to_string(self.record_path(run_number)).await?;
        Ok(serde_json::from_str(&content)?)
    }
}

#[async_trait]
impl HistoryStore for FsHistoryStore {
    async fn next_run_number(&self) -> Result<u64> {
        let numbers = self.run_numbers().await?;
        Ok(numbers
            .first()
            .map(|max| max + 1)
            .unwrap_or(self.starting_run_number))
    }

    async fn save(
        &self,
        run_number: u64,
        status: RunStatus,
        params: &RunParams,
        username: &str,
        logs: Vec<LogEntry>,
    ) -> Result<RunRecord> {
        let now = Local::now();
        let record = RunRecord {
            run_number,
            timestamp: now.format("%Y-%m-%d %H:%M:%S").to_string(),
            date_display: now.format("%b %d, %Y %I:%M %p").to_string(),
            status,
            environment: params.environment.clone(),
            action: params.action.clone(),
            project_name: params.project_name.clone(),
            package_name: params.package_name.clone(),
            username: username.to_string(),
            logs,
        };

        let path = self.record_path(run_number);
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            tracing::warn!("Overwriting existing record for run #{}", run_number);
        }

        let json = serde_json::to_string_pretty(&record)
            .map_err(|e| MigrationError::StorageWrite(e.to_string()))?;

        // Write to a temp file first so a reader never sees a partial record.
        let tmp_path = path.with_extension("json.tmp");
        if let Err(e) = tokio::fs::write(&tmp_path, json.as_bytes()).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(
                MigrationError::StorageWrite(format!("{}: {}", tmp_path.display(), e)).into(),
            );
        }
        if let Err(e) = tokio::fs::rename(&tmp_path, &path).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(MigrationError::StorageWrite(format!("{}: {}", path.display(), e)).into());
        }

        tracing::info!(run_number, status = %status, "Saved run record");
        Ok(record)
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<RunRecord>> {
        let mut records = Vec::new();
        if limit == 0 {
            return Ok(records);
        }

        for run_number in self.run_numbers().await? {
            match self.read_record(run_number).await {
                Ok(record) => records.push(record),
                Err(e) => {
                    tracing::warn!("Skipping unreadable record for run #{}: {}", run_number, e);
                    continue;
                }
            }
            if records.len() == limit {
                break;
            }
        }

        Ok(records)
    }

    async fn load(&self, run_number: u64) -> Result<Option<RunRecord>> {
        match self.read_record(run_number).await {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                if tokio::fs::try_exists(self.record_path(run_number))
                    .await
                    .unwrap_or(false)
                {
                    tracing::warn!("Record for run #{} is unreadable: {}", run_number, e);
                }
                Ok(None)
            }
        }
    }

    async fn prune(&self, keep: usize) -> Result<usize> {
        if keep == 0 {
            return Err(MigrationError::Validation(
                "prune must keep at least one record".to_string(),
            )
            .into());
        }

        let mut removed = 0;
        for run_number in self.run_numbers().await?.into_iter().skip(keep) {
            let path = self.record_path(run_number);
            tokio::fs::remove_file(&path).await.map_err(|e| {
                MigrationError::StorageWrite(format!("{}: {}", path.display(), e))
            })?;
            removed += 1;
        }

        if removed > 0 {
            tracing::info!("Pruned {} old run records", removed);
        }
        Ok(removed)
    }
}
