use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::client::RestMigrationClient;
use crate::credentials::EnvCredentialProvider;
use crate::models::AppConfig;
use crate::runner::MigrationRunner;
use crate::storage::FsHistoryStore;

const APP_DIR_NAME: &str = "package-migrator";

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

fn read_config(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config: AppConfig = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse config file {}", path.display()))?;
    tracing::info!("Loaded config from: {}", path.display());
    Ok(config)
}

/// Load the AppConfig, first match wins:
///   1. --config CLI flag (must exist)
///   2. PKGMIG_CONFIG_DIR/config.json
///   3. Platform config dir (dirs::config_dir()/package-migrator/config.json)
///   4. {data_dir}/config.json
///   5. AppConfig::default()
pub fn load_config(config_path: Option<&Path>) -> Result<AppConfig> {
    if let Some(path) = config_path {
        if path.exists() {
            return read_config(path);
        }
        return Err(anyhow::anyhow!("Config file not found: {}", path.display()));
    }

    let mut candidates = Vec::new();
    if let Ok(dir) = std::env::var("PKGMIG_CONFIG_DIR") {
        candidates.push(PathBuf::from(dir).join("config.json"));
    }
    if let Some(dir) = dirs::config_dir() {
        candidates.push(dir.join(APP_DIR_NAME).join("config.json"));
    }
    candidates.push(resolve_data_dir(None, None).join("config.json"));

    for path in candidates {
        if path.exists() {
            return read_config(&path);
        }
    }

    tracing::info!("No config file found, using defaults");
    Ok(AppConfig::default())
}

/// Resolve the data directory: explicit override, then the config's
/// `data_dir`, then `PKGMIG_DATA_DIR`, then the platform data dir.
pub fn resolve_data_dir(override_dir: Option<&Path>, config: Option<&AppConfig>) -> PathBuf {
    if let Some(dir) = override_dir {
        return dir.to_path_buf();
    }
    if let Some(dir) = config.and_then(|c| c.data_dir.as_ref()) {
        return dir.clone();
    }
    if let Ok(dir) = std::env::var("PKGMIG_DATA_DIR") {
        return PathBuf::from(dir);
    }
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
}

// ---------------------------------------------------------------------------
// Wiring
// ---------------------------------------------------------------------------

/// Configuration plus the history store it points at.
pub struct App {
    pub config: Arc<AppConfig>,
    pub data_dir: PathBuf,
    pub store: Arc<FsHistoryStore>,
}

impl App {
    pub async fn open(config_path: Option<&Path>, data_dir: Option<&Path>) -> Result<Self> {
        let config = load_config(config_path)?;
        let data_dir = resolve_data_dir(data_dir, Some(&config));
        let store = FsHistoryStore::new(data_dir.clone(), config.starting_run_number).await?;
        tracing::debug!("Using data directory {}", data_dir.display());
        Ok(Self {
            config: Arc::new(config),
            data_dir,
            store: Arc::new(store),
        })
    }

    /// Runner talking to the real server with the password from the environment.
    pub fn runner(&self) -> MigrationRunner {
        MigrationRunner::new(
            Arc::clone(&self.config),
            Arc::new(RestMigrationClient::from_config(&self.config)),
            Arc::new(EnvCredentialProvider::new(
                self.config.service_account.password_env.clone(),
            )),
        )
    }
}
