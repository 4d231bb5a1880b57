//! Environment-driven service configuration.
//!
//! Values are read from the process environment after `.env` has been loaded
//! by the binary (see `dotenvy`).

use std::env;
use std::path::PathBuf;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_ARTIFACT_DIR: &str = "artifacts";
pub const DEFAULT_DATA_DIR: &str = "data";

/// Deployment environment name, `sandbox` unless `ENVIRONMENT` is set.
pub fn get_environment() -> String {
    env::var("ENVIRONMENT")
        .ok()
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty())
        .unwrap_or_else(|| "sandbox".to_string())
}

/// `production` and `prod` select production behaviour (JSON logs).
pub fn is_production_environment(environment: &str) -> bool {
    matches!(environment, "production" | "prod")
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    pub port: u16,
    /// Directory holding the artifact bundle.
    pub artifact_dir: PathBuf,
    /// Directory with `<TICKER>.csv` price files.
    pub data_dir: PathBuf,
    pub environment: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            artifact_dir: PathBuf::from(DEFAULT_ARTIFACT_DIR),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            environment: "sandbox".to_string(),
        }
    }
}

impl ServiceConfig {
    /// `PORT`, `ARTIFACT_DIR`, `DATA_DIR`, `ENVIRONMENT`; unset or
    /// unparseable values fall back to the defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            artifact_dir: env::var("ARTIFACT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.artifact_dir),
            data_dir: env::var("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            environment: get_environment(),
        }
    }

    pub fn is_production(&self) -> bool {
        is_production_environment(&self.environment)
    }
}
