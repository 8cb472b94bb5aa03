// src/config.rs
//
// Engine configuration
//
// Resolution order:
// 1. File named by RENAMEHUB_CONFIG
// 2. {config_dir}/renamehub/config.toml, when it exists
// 3. Built-in defaults
//
// A file that exists but does not parse is an error, never ignored.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::confirmation::DEFAULT_CONFIRMATION_TIMEOUT_MS;
use crate::domain::naming::DEFAULT_VIDEO_EXTENSIONS;
use crate::error::{AppError, AppResult};
use crate::services::{OrchestratorSettings, RecoveryPolicy};

// ============================================================================
// Constants
// ============================================================================

/// Environment variable naming an explicit config file
pub const ENV_CONFIG_PATH: &str = "RENAMEHUB_CONFIG";

pub const CONFIG_FILE_NAME: &str = "config.toml";

pub const APP_DIR_NAME: &str = "renamehub";

pub const DEFAULT_CLIENT_ID: &str = "default";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// SQLite file; `{data_dir}/renamehub/renamehub.db` when unset
    pub database_path: Option<PathBuf>,

    /// How long a consumer has to answer a confirmation
    pub confirmation_timeout_ms: u64,

    /// Consumer addressed when a submission names none
    pub client_id: String,

    /// What startup recovery does with plans left pending
    pub recovery: RecoveryPolicy,

    /// Extensions scanned and matched as episode files
    pub video_extensions: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            confirmation_timeout_ms: DEFAULT_CONFIRMATION_TIMEOUT_MS,
            client_id: DEFAULT_CLIENT_ID.to_string(),
            recovery: RecoveryPolicy::default(),
            video_extensions: DEFAULT_VIDEO_EXTENSIONS
                .iter()
                .map(|e| e.to_string())
                .collect(),
        }
    }
}

impl EngineConfig {
    /// Load using the resolution order above
    pub fn load() -> AppResult<Self> {
        if let Ok(explicit) = std::env::var(ENV_CONFIG_PATH) {
            return Self::load_from_file(Path::new(&explicit));
        }

        match Self::default_config_path() {
            Some(path) if path.exists() => Self::load_from_file(&path),
            _ => {
                log::debug!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn load_from_file(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config = Self::from_toml(&content)
            .map_err(|e| AppError::Config(format!("{}: {}", path.display(), e)))?;
        log::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(content: &str) -> AppResult<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> AppResult<()> {
        if self.confirmation_timeout_ms == 0 {
            return Err(AppError::Config(
                "confirmation_timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.client_id.trim().is_empty() {
            return Err(AppError::Config("client_id must not be empty".to_string()));
        }
        if self.video_extensions.is_empty() {
            return Err(AppError::Config(
                "video_extensions must list at least one extension".to_string(),
            ));
        }
        Ok(())
    }

    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Configured database file, or the platform default
    pub fn resolved_database_path(&self) -> AppResult<PathBuf> {
        match &self.database_path {
            Some(path) => Ok(path.clone()),
            None => crate::db::get_database_path(),
        }
    }

    pub fn confirmation_timeout(&self) -> Duration {
        Duration::from_millis(self.confirmation_timeout_ms)
    }

    pub fn orchestrator_settings(&self) -> OrchestratorSettings {
        OrchestratorSettings {
            client_id: self.client_id.clone(),
            confirmation_timeout: self.confirmation_timeout(),
        }
    }
}
