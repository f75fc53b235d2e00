pub mod config;
pub mod log;
pub mod run;

pub use config::{AppConfig, ServiceAccount};
pub use log::{LogEntry, LogLevel};
pub use run::{Action, RunParams, RunRecord, RunStatus};
