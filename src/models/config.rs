use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServiceAccount {
    #[serde(default)]
    pub username: String,
    /// Name of the environment variable holding the account password.
    #[serde(default = "default_password_env")]
    pub password_env: String,
}

impl Default for ServiceAccount {
    fn default() -> Self {
        Self {
            username: String::new(),
            password_env: default_password_env(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    #[serde(default = "default_starting_run_number")]
    pub starting_run_number: u64,
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
    #[serde(default = "default_project")]
    pub default_project: String,
    /// Target environment name -> library base URL.
    #[serde(default)]
    pub environments: BTreeMap<String, String>,
    #[serde(default)]
    pub service_account: ServiceAccount,
    #[serde(default = "default_login_mode")]
    pub login_mode: u32,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Helper program (and leading args) that imports a package file.
    #[serde(default)]
    pub apply_command: Option<Vec<String>>,
}

fn default_password_env() -> String {
    "MIGRATION_SERVICE_PASSWORD".to_string()
}

fn default_starting_run_number() -> u64 {
    1599
}

fn default_history_limit() -> usize {
    5
}

fn default_project() -> String {
    "inventory".to_string()
}

fn default_login_mode() -> u32 {
    1
}

fn default_request_timeout_secs() -> u64 {
    300
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            starting_run_number: default_starting_run_number(),
            history_limit: default_history_limit(),
            default_project: default_project(),
            environments: BTreeMap::new(),
            service_account: ServiceAccount::default(),
            login_mode: default_login_mode(),
            request_timeout_secs: default_request_timeout_secs(),
            apply_command: None,
        }
    }
}

impl AppConfig {
    pub fn environment_url(&self, name: &str) -> Option<&str> {
        self.environments.get(name).map(String::as_str)
    }
}
