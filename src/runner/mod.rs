pub mod events;
pub mod worker;

#[cfg(test)]
pub(crate) mod testing;

use std::path::Path;
use std::sync::Arc;

use crate::client::{Connection, MigrationClient, Response, PROJECT_ID_HEADER, SCHEMA_RELOAD_ENDPOINT};
use crate::credentials::CredentialProvider;
use crate::errors::MigrationError;
use crate::models::{Action, AppConfig, RunParams};
use crate::recorder::RunLog;

pub use events::RunEvent;
pub use worker::RunWorker;

const RULE_WIDTH: usize = 60;

fn rule() -> String {
    "=".repeat(RULE_WIDTH)
}

/// The migration procedure: connect, apply and/or refresh, narrating into a [`RunLog`].
pub struct MigrationRunner {
    config: Arc<AppConfig>,
    client: Arc<dyn MigrationClient>,
    credentials: Arc<dyn CredentialProvider>,
}

impl MigrationRunner {
    pub fn new(
        config: Arc<AppConfig>,
        client: Arc<dyn MigrationClient>,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Self {
        Self {
            config,
            client,
            credentials,
        }
    }

    /// Fill in the configured default project when none was given.
    pub fn prepare(&self, mut params: RunParams) -> RunParams {
        if params.project_name.trim().is_empty() {
            params.project_name = self.config.default_project.clone();
        }
        params
    }

    /// Execute one run. Every failure is logged at ERROR with a closing banner
    /// before being returned; on success the banner reports success.
    pub async fn run(
        &self,
        run_number: u64,
        params: &RunParams,
        log: &mut RunLog,
    ) -> Result<(), MigrationError> {
        match self.execute(run_number, params, log).await {
            Ok(()) => {
                log.info("");
                log.success(rule());
                log.success("MIGRATION SUCCESSFUL");
                log.success(rule());
                Ok(())
            }
            Err(e) => {
                log.error(rule());
                log.error(format!("MIGRATION FAILED: {}", e));
                log.error(rule());
                Err(e)
            }
        }
    }

    async fn execute(
        &self,
        run_number: u64,
        params: &RunParams,
        log: &mut RunLog,
    ) -> Result<(), MigrationError> {
        log.info(rule());
        log.info("Starting migration process");
        log.info(format!("Run Number: {}", run_number));
        log.info(rule());
        log.info("");

        let action: Action = params.action.parse()?;
        let base_url = self
            .config
            .environment_url(&params.environment)
            .ok_or_else(|| {
                MigrationError::Validation(format!(
                    "Unknown environment '{}'",
                    params.environment
                ))
            })?;

        let username = self.config.service_account.username.as_str();
        if username.is_empty() {
            log.error("Service account username is not configured");
            return Err(MigrationError::Configuration(
                "service account username not configured".to_string(),
            ));
        }
        log.info("Loaded service account configuration");

        log.info("Retrieving service account password...");
        let password = self.credentials.get_service_account_password()?;
        log.success("Service account password retrieved successfully");
        log.info("");

        log.info("Connecting to server...");
        log.info(format!("  URL: {}", base_url));
        log.info(format!("  Project: {}", params.project_name));
        log.info(format!("  User: {}", username));

        let conn = self
            .client
            .connect(
                base_url,
                username,
                &password,
                &params.project_name,
                self.config.login_mode,
            )
            .await?;

        log.success("Connected to server successfully");
        log.info(format!("  Project ID: {}", conn.project_id()));
        log.info("");

        match action {
            Action::CreateUndoPackage => {
                self.apply_package(conn.as_ref(), params, log).await?;

                log.info("Refreshing schema...");
                match refresh_schema(conn.as_ref()).await {
                    Ok(response) if response.ok => log_refresh_started(params, log),
                    Ok(response) => {
                        log.warning(format!("Schema refresh failed: {}", response.status_code));
                        log.warning(format!("  Response: {}", response.text));
                    }
                    Err(e) => {
                        log.warning(format!("Schema refresh error: {}", e));
                        log.warning("  Migration completed, but schema refresh failed");
                    }
                }
            }
            Action::RefreshSchema => {
                log.info("Action: Refresh Schema Only");
                log.info("Refreshing schema...");
                match refresh_schema(conn.as_ref()).await {
                    Ok(response) if response.ok => log_refresh_started(params, log),
                    Ok(response) => {
                        log.error(format!("Schema refresh failed: {}", response.status_code));
                        log.error(format!("  Response: {}", response.text));
                        return Err(MigrationError::SchemaRefresh(format!(
                            "HTTP {}",
                            response.status_code
                        )));
                    }
                    Err(e) => {
                        log.error(format!("Schema refresh error: {}", e));
                        return Err(MigrationError::SchemaRefresh(e.to_string()));
                    }
                }
            }
        }

        Ok(())
    }

    async fn apply_package(
        &self,
        conn: &dyn Connection,
        params: &RunParams,
        log: &mut RunLog,
    ) -> Result<(), MigrationError> {
        log.info("Action: Apply Migration Package with Undo");

        let package = params.package_name.trim();
        if package.is_empty() {
            return Err(MigrationError::Validation(
                "Package path is required".to_string(),
            ));
        }
        let path = Path::new(package);
        let size = match tokio::fs::metadata(path).await {
            Ok(meta) if meta.is_file() => meta.len(),
            _ => {
                return Err(MigrationError::Validation(format!(
                    "Package file not found: {}",
                    package
                )))
            }
        };

        log.info("Applying migration package...");
        log.info(format!("  Package: {}", package));
        log.info(format!("  Size: {:.2} MB", size as f64 / (1024.0 * 1024.0)));
        log.info("  This may take several minutes...");

        let result = conn.apply_package(path, conn.project_id()).await?;

        log.success("Package applied successfully!");
        log.info("Undo package created automatically");
        if !result.environments.is_empty() {
            log.info("Importing to environments:");
            for name in &result.environments {
                log.info(format!("  Environment: {}", name));
            }
        }

        log.info("");
        log.success("Migration package imported successfully!");
        log.info("");
        Ok(())
    }
}

async fn refresh_schema(conn: &dyn Connection) -> Result<Response, MigrationError> {
    conn.post(SCHEMA_RELOAD_ENDPOINT, &[(PROJECT_ID_HEADER, conn.project_id())])
        .await
}

fn log_refresh_started(params: &RunParams, log: &mut RunLog) {
    log.success("Schema refresh initiated successfully");
    log.info(format!("  Project: {}", params.project_name));
    log.info("  Status: Schema updating in background...");
}
