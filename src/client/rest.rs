use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::client::{Connection, MigrationClient, MigrationResult, Response};
use crate::errors::MigrationError;
use crate::models::AppConfig;

pub const AUTH_TOKEN_HEADER: &str = "X-MSTR-AuthToken";

#[derive(Debug, Deserialize)]
struct ProjectSummary {
    id: String,
    name: String,
}

/// Talks to the library REST API for login, project lookup and plain POSTs.
///
/// Package import is handed to `apply_command`, an external helper that
/// receives the package path and target project id as trailing arguments.
pub struct RestMigrationClient {
    timeout: Duration,
    apply_command: Option<Vec<String>>,
}

impl RestMigrationClient {
    pub fn new(timeout: Duration, apply_command: Option<Vec<String>>) -> Self {
        Self {
            timeout,
            apply_command,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            Duration::from_secs(config.request_timeout_secs),
            config.apply_command.clone(),
        )
    }
}

#[async_trait]
impl MigrationClient for RestMigrationClient {
    async fn connect(
        &self,
        url: &str,
        username: &str,
        password: &str,
        project_name: &str,
        login_mode: u32,
    ) -> Result<Box<dyn Connection>, MigrationError> {
        let http = Client::builder()
            .cookie_store(true)
            .timeout(self.timeout)
            .build()?;
        let base_url = url.trim_end_matches('/').to_string();

        let response = http
            .post(format!("{}/api/auth/login", base_url))
            .json(&serde_json::json!({
                "username": username,
                "password": password,
                "loginMode": login_mode,
            }))
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(MigrationError::Auth(format!(
                "login rejected for '{}' (HTTP {})",
                username,
                status.as_u16()
            )));
        }
        if !status.is_success() {
            return Err(MigrationError::Network(format!(
                "login returned HTTP {}",
                status.as_u16()
            )));
        }

        let token = response
            .headers()
            .get(AUTH_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| {
                MigrationError::Auth(format!("login response carried no {}", AUTH_TOKEN_HEADER))
            })?;

        let response = http
            .get(format!("{}/api/projects", base_url))
            .header(AUTH_TOKEN_HEADER, &token)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(MigrationError::Network(format!(
                "project lookup returned HTTP {}",
                response.status().as_u16()
            )));
        }
        let projects: Vec<ProjectSummary> = response.json().await?;
        let project_id = projects
            .into_iter()
            .find(|p| p.name == project_name)
            .map(|p| p.id)
            .ok_or_else(|| {
                MigrationError::Auth(format!(
                    "project '{}' not found or not accessible",
                    project_name
                ))
            })?;

        tracing::debug!(%base_url, %project_id, "Connected");

        Ok(Box::new(RestConnection {
            http,
            base_url,
            token,
            project_id,
            apply_command: self.apply_command.clone(),
        }))
    }
}

struct RestConnection {
    http: Client,
    base_url: String,
    token: String,
    project_id: String,
    apply_command: Option<Vec<String>>,
}

#[async_trait]
impl Connection for RestConnection {
    fn project_id(&self) -> &str {
        &self.project_id
    }

    async fn apply_package(
        &self,
        file_path: &Path,
        target_project_id: &str,
    ) -> Result<MigrationResult, MigrationError> {
        let (program, args) = self
            .apply_command
            .as_deref()
            .and_then(|cmd| cmd.split_first())
            .ok_or_else(|| {
                MigrationError::Configuration(
                    "no apply_command configured for package import".to_string(),
                )
            })?;

        let output = tokio::process::Command::new(program)
            .args(args)
            .arg(file_path)
            .arg(target_project_id)
            .env("MIGRATION_BASE_URL", &self.base_url)
            .env("MIGRATION_AUTH_TOKEN", &self.token)
            .output()
            .await
            .map_err(|e| MigrationError::Package(format!("failed to start {}: {}", program, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(MigrationError::Package(format!(
                "{} exited with {}: {}",
                program,
                output.status,
                stderr.trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let environments = stdout
            .lines()
            .filter_map(|line| line.trim().strip_prefix("environment:"))
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .collect();

        Ok(MigrationResult { environments })
    }

    async fn post(
        &self,
        endpoint: &str,
        headers: &[(&str, &str)],
    ) -> Result<Response, MigrationError> {
        let mut request = self
            .http
            .post(format!("{}{}", self.base_url, endpoint))
            .header(AUTH_TOKEN_HEADER, &self.token);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await.unwrap_or_default();

        Ok(Response {
            ok: status.is_success(),
            status_code: status.as_u16(),
            text,
        })
    }
}
