pub mod rest;

use std::path::Path;

use async_trait::async_trait;

use crate::errors::MigrationError;

pub use rest::RestMigrationClient;

/// Endpoint that asks the server to reload the project schema.
pub const SCHEMA_RELOAD_ENDPOINT: &str = "/api/model/schema/reload";
/// Header naming the project a request applies to.
pub const PROJECT_ID_HEADER: &str = "X-MSTR-ProjectID";

/// Outcome of a package import.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationResult {
    /// Environment names reported by the import, if any.
    pub environments: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub ok: bool,
    pub status_code: u16,
    pub text: String,
}

#[async_trait]
pub trait MigrationClient: Send + Sync {
    async fn connect(
        &self,
        url: &str,
        username: &str,
        password: &str,
        project_name: &str,
        login_mode: u32,
    ) -> Result<Box<dyn Connection>, MigrationError>;
}

/// An authenticated session bound to one project.
#[async_trait]
pub trait Connection: Send + Sync {
    fn project_id(&self) -> &str;

    async fn apply_package(
        &self,
        file_path: &Path,
        target_project_id: &str,
    ) -> Result<MigrationResult, MigrationError>;

    async fn post(
        &self,
        endpoint: &str,
        headers: &[(&str, &str)],
    ) -> Result<Response, MigrationError>;
}
