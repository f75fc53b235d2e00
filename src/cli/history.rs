// CLI history commands: history, show, environments, prune

use anyhow::Context;

use crate::app::App;
use crate::errors::MigrationError;
use crate::models::RunRecord;
use crate::storage::HistoryStore;

const HEADER_RULE_WIDTH: usize = 70;

pub const EMPTY_HISTORY_MESSAGE: &str =
    "No migrations yet. Run 'pkgmig run' to start your first migration.";

/// One line of the history listing.
pub fn format_history_line(record: &RunRecord) -> String {
    format!(
        "{:<3} #{} {}  {}",
        record.status.icon(),
        record.run_number,
        record.project_name,
        record.date_display
    )
}

/// Full console view of a past run: a header block followed by its log lines.
pub fn format_run_console(record: &RunRecord) -> String {
    let rule = "=".repeat(HEADER_RULE_WIDTH);
    let mut out = String::new();
    out.push_str(&rule);
    out.push('\n');
    out.push_str(&format!("Migration #{}\n", record.run_number));
    out.push_str(&format!("Date: {}\n", record.date_display));
    out.push_str(&format!("Status: {}\n", record.status));
    out.push_str(&format!("Environment: {}\n", record.environment));
    out.push_str(&format!("Action: {}\n", record.action));
    out.push_str(&format!("Project: {}\n", record.project_name));
    out.push_str(&format!("User: {}\n", record.username));
    out.push_str(&rule);
    out.push_str("\n\n");
    for entry in &record.logs {
        out.push_str(&entry.console_line());
        out.push('\n');
    }
    out
}

/// pkgmig history
pub async fn cmd_history(app: &App, limit: Option<usize>, json: bool) -> anyhow::Result<()> {
    let limit = limit.unwrap_or(app.config.history_limit);
    if limit == 0 {
        anyhow::bail!("History limit must be at least 1");
    }
    let records = app
        .store
        .list_recent(limit)
        .await
        .context("Failed to list run history")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if records.is_empty() {
        println!("{}", EMPTY_HISTORY_MESSAGE);
        return Ok(());
    }

    println!("Migration History");
    for record in &records {
        println!("{}", format_history_line(record));
    }
    Ok(())
}

/// pkgmig show <run_number>
pub async fn cmd_show(app: &App, run_number: u64, json: bool) -> anyhow::Result<()> {
    let record = app
        .store
        .load(run_number)
        .await?
        .ok_or_else(|| MigrationError::NotFound(format!("migration #{}", run_number)))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        print!("{}", format_run_console(&record));
    }
    Ok(())
}

/// pkgmig environments
pub fn cmd_environments(app: &App) -> anyhow::Result<()> {
    if app.config.environments.is_empty() {
        println!("No environments configured.");
        return Ok(());
    }

    let width = app
        .config
        .environments
        .keys()
        .map(|k| k.len())
        .max()
        .unwrap_or(0);
    for (name, url) in &app.config.environments {
        println!("{:<width$}  {}", name, url, width = width);
    }
    Ok(())
}

/// pkgmig prune --keep N
pub async fn cmd_prune(app: &App, keep: usize) -> anyhow::Result<()> {
    let removed = app.store.prune(keep).await?;
    println!("Removed {} run record(s), kept the newest {}.", removed, keep);
    Ok(())
}
