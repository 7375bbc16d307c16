use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use artisync_core::{DEFAULT_ARTIFACT_EXTENSION, DEFAULT_RETRY_DELAYS_SECS, write_atomic};
use artisync_platform::AppPaths;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppSettings {
    #[serde(default)]
    pub target_dir: Option<PathBuf>,

    #[serde(default = "default_artifact_extension")]
    pub artifact_extension: String,

    #[serde(default)]
    pub debug_logging: bool,

    #[serde(default = "default_max_log_size_bytes")]
    pub max_log_size_bytes: u64,

    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,

    #[serde(default = "default_retry_delays")]
    pub retry_delays_secs: Vec<u64>,

    #[serde(default = "default_update_owner")]
    pub update_owner: String,

    #[serde(default = "default_update_repo")]
    pub update_repo: String,

    #[serde(default)]
    pub skipped_version: Option<String>,
}

fn default_artifact_extension() -> String {
    DEFAULT_ARTIFACT_EXTENSION.to_string()
}

fn default_max_log_size_bytes() -> u64 {
    5 * 1024 * 1024
}

fn default_http_timeout() -> u64 {
    30
}

fn default_retry_delays() -> Vec<u64> {
    DEFAULT_RETRY_DELAYS_SECS.to_vec()
}

fn default_update_owner() -> String {
    "artisync".to_string()
}

fn default_update_repo() -> String {
    "artisync".to_string()
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            target_dir: None,
            artifact_extension: default_artifact_extension(),
            debug_logging: false,
            max_log_size_bytes: default_max_log_size_bytes(),
            http_timeout_secs: default_http_timeout(),
            retry_delays_secs: default_retry_delays(),
            update_owner: default_update_owner(),
            update_repo: default_update_repo(),
            skipped_version: None,
        }
    }
}

impl AppSettings {
    pub fn load(paths: &AppPaths) -> Self {
        Self::load_from(&paths.settings_file())
    }

    pub fn load_from(path: &Path) -> Self {
        let mut settings: Self = match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|error| {
                log::warn!("Ignoring unreadable settings {}: {error}", path.display());
                Self::default()
            }),
            Err(_) => Self::default(),
        };

        if settings.retry_delays_secs.is_empty() {
            settings.retry_delays_secs = default_retry_delays();
        }
        settings.artifact_extension = settings
            .artifact_extension
            .trim()
            .trim_start_matches('.')
            .to_string();
        if settings.artifact_extension.is_empty() {
            settings.artifact_extension = default_artifact_extension();
        }

        settings
    }

    pub fn save(&self, paths: &AppPaths) -> Result<(), std::io::Error> {
        paths.ensure_dirs()?;
        self.save_to(&paths.settings_file())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_vec_pretty(self)?;
        write_atomic(path, &content)
    }
}
