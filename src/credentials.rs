use crate::errors::MigrationError;

/// Source of the service account password used to log in to the target server.
pub trait CredentialProvider: Send + Sync {
    fn get_service_account_password(&self) -> Result<String, MigrationError>;
}

/// Reads the password from an environment variable.
pub struct EnvCredentialProvider {
    var: String,
}

impl EnvCredentialProvider {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl CredentialProvider for EnvCredentialProvider {
    fn get_service_account_password(&self) -> Result<String, MigrationError> {
        match std::env::var(&self.var) {
            Ok(password) if !password.is_empty() => Ok(password),
            _ => Err(MigrationError::Configuration(format!(
                "Service account password not configured (set {})",
                self.var
            ))),
        }
    }
}

pub const UNKNOWN_OPERATOR: &str = "Unknown";

/// Name of the operator running this process, or `Unknown`.
pub fn operator_identity() -> String {
    identity_from(|var| std::env::var(var).ok())
}

fn identity_from(lookup: impl Fn(&str) -> Option<String>) -> String {
    ["USER", "USERNAME"]
        .iter()
        .filter_map(|var| lookup(var))
        .map(|name| name.trim().to_string())
        .find(|name| !name.is_empty())
        .unwrap_or_else(|| UNKNOWN_OPERATOR.to_string())
}
