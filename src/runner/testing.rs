//! Test doubles shared by the runner and worker tests.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::sync::Notify;

use crate::client::{Connection, MigrationClient, MigrationResult, Response};
use crate::credentials::CredentialProvider;
use crate::errors::MigrationError;
use crate::models::{AppConfig, RunParams};
use crate::runner::MigrationRunner;

#[derive(Clone)]
pub struct MockClient {
    pub reject_login: bool,
    pub apply_error: Option<String>,
    pub schema_status: u16,
    pub schema_transport_error: bool,
    /// When set, `connect` waits for a notification before returning.
    pub gate: Option<Arc<Notify>>,
    pub connects: Arc<AtomicUsize>,
    pub applied: Arc<AtomicUsize>,
    pub refreshes: Arc<AtomicUsize>,
}

impl Default for MockClient {
    fn default() -> Self {
        Self {
            reject_login: false,
            apply_error: None,
            schema_status: 200,
            schema_transport_error: false,
            gate: None,
            connects: Arc::new(AtomicUsize::new(0)),
            applied: Arc::new(AtomicUsize::new(0)),
            refreshes: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl MigrationClient for MockClient {
    async fn connect(
        &self,
        _url: &str,
        username: &str,
        _password: &str,
        _project_name: &str,
        _login_mode: u32,
    ) -> Result<Box<dyn Connection>, MigrationError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if self.reject_login {
            return Err(MigrationError::Auth(format!("login rejected for '{}'", username)));
        }
        Ok(Box::new(MockConnection {
            client: self.clone(),
        }))
    }
}

struct MockConnection {
    client: MockClient,
}

#[async_trait]
impl Connection for MockConnection {
    fn project_id(&self) -> &str {
        "8D67909E4B1C3A2F"
    }

    async fn apply_package(
        &self,
        _file_path: &Path,
        _target_project_id: &str,
    ) -> Result<MigrationResult, MigrationError> {
        if let Some(msg) = &self.client.apply_error {
            return Err(MigrationError::Package(msg.clone()));
        }
        self.client.applied.fetch_add(1, Ordering::SeqCst);
        Ok(MigrationResult {
            environments: vec!["CRBP_DEV".to_string()],
        })
    }

    async fn post(
        &self,
        _endpoint: &str,
        _headers: &[(&str, &str)],
    ) -> Result<Response, MigrationError> {
        self.client.refreshes.fetch_add(1, Ordering::SeqCst);
        if self.client.schema_transport_error {
            return Err(MigrationError::Network("connection reset".to_string()));
        }
        let status = self.client.schema_status;
        Ok(Response {
            ok: (200..300).contains(&status),
            status_code: status,
            text: if status == 200 {
                String::new()
            } else {
                "{\"code\":\"ERR001\"}".to_string()
            },
        })
    }
}

pub struct StaticCredentials(pub Option<String>);

impl CredentialProvider for StaticCredentials {
    fn get_service_account_password(&self) -> Result<String, MigrationError> {
        self.0.clone().ok_or_else(|| {
            MigrationError::Configuration("Service account password not configured".to_string())
        })
    }
}

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.environments.insert(
        "CRBP_DEV".to_string(),
        "https://dev.example.com/MicroStrategyLibrary/".to_string(),
    );
    config.service_account.username = "svc_migrate".to_string();
    config
}

pub fn runner_with(client: MockClient, password: Option<&str>) -> MigrationRunner {
    MigrationRunner::new(
        Arc::new(test_config()),
        Arc::new(client),
        Arc::new(StaticCredentials(password.map(str::to_string))),
    )
}

pub fn params(action: &str, package: &str) -> RunParams {
    RunParams {
        environment: "CRBP_DEV".to_string(),
        action: action.to_string(),
        project_name: "Store Health Reporting".to_string(),
        package_name: package.to_string(),
    }
}

/// A small package file in a fresh temp dir; keep the dir alive for the test.
pub fn package_file() -> (TempDir, String) {
    let dir = TempDir::new().expect("create temp dir");
    let path = dir.path().join("Migration_Package.mmp");
    std::fs::write(&path, vec![0u8; 2048]).expect("write package");
    let path = path.to_string_lossy().into_owned();
    (dir, path)
}
