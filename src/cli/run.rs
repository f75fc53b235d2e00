// CLI run command: drives one migration and prints its console as it happens

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::app::App;
use crate::models::RunParams;
use crate::runner::{RunEvent, RunWorker};
use crate::storage::HistoryStore;

/// pkgmig run
pub async fn cmd_run(
    app: &App,
    environment: &str,
    action: &str,
    project: Option<&str>,
    package: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let params = RunParams {
        environment: environment.to_string(),
        action: action.to_string(),
        project_name: project.unwrap_or_default().to_string(),
        package_name: package.unwrap_or_default().to_string(),
    };

    let (tx, mut rx) = mpsc::unbounded_channel();
    let store: Arc<dyn HistoryStore> = app.store.clone();
    let worker = RunWorker::new(Arc::new(app.runner()), store, tx);
    let handle = worker.start(params)?;

    match follow_run(&mut rx, handle, json).await? {
        Some(message) => anyhow::bail!(message),
        None => Ok(()),
    }
}

/// Print events until the run finishes. Returns the failure message, if any.
///
/// Also stops when the run task exits without sending `Finished` (a panic),
/// since the worker keeps its own sender alive.
async fn follow_run(
    rx: &mut mpsc::UnboundedReceiver<RunEvent>,
    mut handle: JoinHandle<()>,
    json: bool,
) -> anyhow::Result<Option<String>> {
    let mut failure = None;
    loop {
        let (event, joined) = tokio::select! {
            event = rx.recv() => (event, None),
            joined = &mut handle => (None, Some(joined)),
        };
        if let Some(joined) = joined {
            // Events sent before the task exited are still queued.
            drain_after_exit(rx, json, &mut failure)?;
            if let Err(e) = joined {
                tracing::error!("Run task aborted: {}", e);
                failure = Some(format!("Migration aborted: {}", e));
            }
            break;
        }
        let Some(event) = event else { break };
        if handle_event(event, json, &mut failure)? {
            break;
        }
    }
    Ok(failure)
}

/// Print one event. Returns true once the run is finished.
fn handle_event(event: RunEvent, json: bool, failure: &mut Option<String>) -> anyhow::Result<bool> {
    if json {
        println!("{}", serde_json::to_string(&event)?);
    }
    match event {
        RunEvent::Log { entry } if !json => println!("{}", entry.console_line()),
        RunEvent::Succeeded { record } if !json => {
            println!();
            println!("Migration #{} completed successfully!", record.run_number);
        }
        RunEvent::Failed {
            run_number, error, ..
        } => {
            *failure = Some(match run_number {
                Some(n) => format!("Migration #{} failed: {}", n, error),
                None => format!("Migration failed: {}", error),
            });
        }
        RunEvent::Finished { .. } => return Ok(true),
        _ => {}
    }
    Ok(false)
}

/// Flush events still queued once the run task has exited.
fn drain_after_exit(
    rx: &mut mpsc::UnboundedReceiver<RunEvent>,
    json: bool,
    failure: &mut Option<String>,
) -> anyhow::Result<()> {
    while let Ok(event) = rx.try_recv() {
        if handle_event(event, json, failure)? {
            break;
        }
    }
    Ok(())
}
