use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::MigrationError;
use crate::models::LogEntry;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum RunStatus {
    Success,
    Failure,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Success => "SUCCESS",
            RunStatus::Failure => "FAILURE",
        }
    }

    /// Short marker used in history listings.
    pub fn icon(&self) -> &'static str {
        match self {
            RunStatus::Success => "OK",
            RunStatus::Failure => "ERR",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a run does once connected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Apply the package (the server keeps an undo package), then refresh the schema.
    CreateUndoPackage,
    /// Refresh the schema only.
    RefreshSchema,
}

impl Action {
    pub const ALL: [Action; 2] = [Action::CreateUndoPackage, Action::RefreshSchema];

    pub fn label(&self) -> &'static str {
        match self {
            Action::CreateUndoPackage => "Create Undo Package",
            Action::RefreshSchema => "Refresh Schema",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Action {
    type Err = MigrationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::ALL
            .into_iter()
            .find(|a| a.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                MigrationError::Validation(format!(
                    "Unknown action '{}'. Expected one of: {}",
                    s,
                    Action::ALL.map(|a| a.label()).join(", ")
                ))
            })
    }
}

/// Operator-supplied parameters for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunParams {
    pub environment: String,
    pub action: String,
    pub project_name: String,
    pub package_name: String,
}

/// A completed run as persisted in `build_<run_number>.json`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunRecord {
    #[serde(alias = "build_number")]
    pub run_number: u64,
    /// `YYYY-MM-DD HH:MM:SS`, local time.
    pub timestamp: String,
    /// `Mon DD, YYYY HH:MM AM`, local time.
    pub date_display: String,
    pub status: RunStatus,
    pub environment: String,
    pub action: String,
    pub project_name: String,
    pub package_name: String,
    pub username: String,
    #[serde(default)]
    pub logs: Vec<LogEntry>,
}
