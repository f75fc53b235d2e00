use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

use crate::credentials::operator_identity;
use crate::errors::MigrationError;
use crate::models::{RunParams, RunStatus};
use crate::recorder::RunLog;
use crate::runner::events::RunEvent;
use crate::runner::MigrationRunner;
use crate::storage::HistoryStore;

/// Runs migrations one at a time on a background task.
///
/// The worker never touches the display. Everything it has to say goes out
/// as [`RunEvent`]s, ending with `Finished` whatever the outcome.
pub struct RunWorker {
    runner: Arc<MigrationRunner>,
    store: Arc<dyn HistoryStore>,
    events: mpsc::UnboundedSender<RunEvent>,
    // Held for the whole run; doubles as the one-run-at-a-time guard.
    recorder: Arc<Mutex<RunLog>>,
    identity: fn() -> String,
}

impl RunWorker {
    pub fn new(
        runner: Arc<MigrationRunner>,
        store: Arc<dyn HistoryStore>,
        events: mpsc::UnboundedSender<RunEvent>,
    ) -> Self {
        let recorder = Arc::new(Mutex::new(RunLog::with_sink(events.clone())));
        Self {
            runner,
            store,
            events,
            recorder,
            identity: operator_identity,
        }
    }

    /// Replace the operator identity lookup.
    pub fn with_identity(mut self, identity: fn() -> String) -> Self {
        self.identity = identity;
        self
    }

    pub fn is_running(&self) -> bool {
        self.recorder.try_lock().is_err()
    }

    /// Start a run in the background. Fails with `RunInProgress` while another
    /// run has not yet finished.
    pub fn start(&self, params: RunParams) -> Result<JoinHandle<()>, MigrationError> {
        let mut log = Arc::clone(&self.recorder)
            .try_lock_owned()
            .map_err(|_| MigrationError::RunInProgress)?;

        let params = self.runner.prepare(params);
        let runner = Arc::clone(&self.runner);
        let store = Arc::clone(&self.store);
        let events = self.events.clone();
        let identity = self.identity;

        Ok(tokio::spawn(async move {
            log.reset();

            let run_number = match store.next_run_number().await {
                Ok(n) => n,
                Err(e) => {
                    tracing::error!("Failed to allocate run number: {:#}", e);
                    let _ = events.send(RunEvent::Failed {
                        run_number: None,
                        error: format!("{:#}", e),
                        record: None,
                    });
                    drop(log);
                    let _ = events.send(RunEvent::Finished { run_number: None });
                    return;
                }
            };

            tracing::info!(run_number, environment = %params.environment, action = %params.action, "Run started");
            let _ = events.send(RunEvent::Started {
                run_number,
                environment: params.environment.clone(),
                action: params.action.clone(),
            });

            let outcome = runner.run(run_number, &params, &mut log).await;
            let status = if outcome.is_ok() {
                RunStatus::Success
            } else {
                RunStatus::Failure
            };

            let username = identity();
            let event = match store
                .save(run_number, status, &params, &username, log.drain())
                .await
            {
                Ok(record) => match outcome {
                    Ok(()) => RunEvent::Succeeded { record },
                    Err(e) => RunEvent::Failed {
                        run_number: Some(run_number),
                        error: e.to_string(),
                        record: Some(record),
                    },
                },
                Err(e) => {
                    tracing::error!(run_number, "Run could not be recorded: {:#}", e);
                    RunEvent::Failed {
                        run_number: Some(run_number),
                        error: format!("{:#}", e),
                        record: None,
                    }
                }
            };
            let _ = events.send(event);

            // Release the recorder before announcing completion so the next
            // start() issued on receipt of Finished is accepted.
            drop(log);
            tracing::info!(run_number, status = %status, "Run finished");
            let _ = events.send(RunEvent::Finished {
                run_number: Some(run_number),
            });
        }))
    }
}
