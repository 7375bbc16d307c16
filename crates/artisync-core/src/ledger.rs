use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use artisync_backend::ledger_key;
use artisync_platform::AppPaths;

use crate::fsutil::write_atomic;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Ledger unavailable at {path}: {details}")]
    Unavailable { path: PathBuf, details: String },
}

impl LedgerError {
    fn unavailable(path: &Path, details: impl std::fmt::Display) -> Self {
        Self::Unavailable {
            path: path.to_path_buf(),
            details: details.to_string(),
        }
    }
}

/// Last successfully synced revision per `<source-address>|<relative-path>`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ledger {
    entries: BTreeMap<String, String>,
}

impl Ledger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn revision(&self, source_address: &str, relative_path: &str) -> Option<&str> {
        self.get(&ledger_key(source_address, relative_path))
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn record(&mut self, key: String, revision: impl Into<String>) {
        self.entries.insert(key, revision.into());
    }

    /// Returns whether an entry was removed.
    pub fn forget(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(key, revision)| (key.as_str(), revision.as_str()))
    }
}

/// Where the ledger lives on disk: the config-dir file, and a temp-dir copy
/// used when the primary location is not writable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerStore {
    primary: PathBuf,
    fallback: PathBuf,
}

impl LedgerStore {
    #[must_use]
    pub fn new(primary: PathBuf, fallback: PathBuf) -> Self {
        Self { primary, fallback }
    }

    #[must_use]
    pub fn from_paths(paths: &AppPaths) -> Self {
        Self::new(paths.ledger_file(), AppPaths::fallback_ledger_file())
    }

    #[must_use]
    pub fn primary(&self) -> &Path {
        &self.primary
    }

    #[must_use]
    pub fn fallback(&self) -> &Path {
        &self.fallback
    }

    /// Load the ledger, never failing: unreadable or corrupt files are
    /// logged and yield an empty ledger.
    ///
    /// A fallback copy only exists while the primary could not be written
    /// (a successful primary save removes it), so it is read first.
    #[must_use]
    pub fn load(&self) -> Ledger {
        match read_ledger(&self.fallback) {
            Ok(Some(ledger)) => {
                info!("Loaded ledger from fallback {}", self.fallback.display());
                return ledger;
            }
            Ok(None) => {}
            Err(error) => warn!("{error}"),
        }

        match read_ledger(&self.primary) {
            Ok(Some(ledger)) => ledger,
            Ok(None) => {
                debug!("No ledger at {}", self.primary.display());
                Ledger::new()
            }
            Err(error) => {
                warn!("{error}");
                Ledger::new()
            }
        }
    }

    /// Persist `ledger`, returning the location written, or `None` when both
    /// locations failed and the write was discarded.
    pub fn save(&self, ledger: &Ledger) -> Option<&Path> {
        let data = match serde_json::to_vec_pretty(ledger) {
            Ok(data) => data,
            Err(error) => {
                error!("Failed to serialize ledger: {error}");
                return None;
            }
        };

        match write_atomic(&self.primary, &data) {
            Ok(()) => {
                if self.fallback.exists() {
                    let _ = std::fs::remove_file(&self.fallback);
                }
                debug!("Saved {} ledger entries", ledger.len());
                return Some(&self.primary);
            }
            Err(error) => warn!(
                "{}",
                LedgerError::unavailable(&self.primary, format!("write failed: {error}"))
            ),
        }

        match write_atomic(&self.fallback, &data) {
            Ok(()) => {
                info!("Saved ledger to fallback {}", self.fallback.display());
                Some(&self.fallback)
            }
            Err(fallback_error) => {
                error!(
                    "Discarding ledger write: {}",
                    LedgerError::unavailable(&self.fallback, fallback_error)
                );
                None
            }
        }
    }
}

fn read_ledger(path: &Path) -> Result<Option<Ledger>, LedgerError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(error) => return Err(LedgerError::unavailable(path, error)),
    };
    if content.trim().is_empty() {
        return Ok(None);
    }
    serde_json::from_str(&content)
        .map(Some)
        .map_err(|error| LedgerError::unavailable(path, error))
}
