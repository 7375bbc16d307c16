//! Controller that owns the in-memory state of one artisync run.
//!
//! The controller holds the source list, the scan cache, the ledger and the
//! installed listing. Command handlers live in the submodules as `impl`
//! blocks on [`Controller`].

mod scan;
mod self_update;
mod sources;
mod sync;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use artisync_backend::RepositoryClient;
use artisync_core::{
    ArtifactCache, InstalledEntry, Ledger, LedgerStore, ReleaseFeed, ScanOptions, SourceList,
};
use artisync_platform::AppPaths;

use crate::error::AppError;
use crate::settings::AppSettings;

pub use self_update::{InstallOutcome, UpdateDecision, UpdatePrompt};

pub struct Controller {
    paths: AppPaths,
    settings: AppSettings,
    target_override: Option<PathBuf>,
    sources: SourceList,
    cache: Arc<ArtifactCache>,
    ledger: Ledger,
    store: LedgerStore,
    client: Option<Arc<dyn RepositoryClient>>,
    http_client: reqwest::Client,
    listing: Vec<InstalledEntry>,
}

impl Controller {
    /// Load persisted state from `paths`. `client` is `None` when no
    /// repository client is available; scans then fail with a clear error.
    pub fn new(
        paths: AppPaths,
        settings: AppSettings,
        client: Option<Arc<dyn RepositoryClient>>,
    ) -> Result<Self, AppError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.http_timeout_secs))
            .user_agent(concat!("artisync/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|error| AppError::operation_failed("HTTP client setup", error.to_string()))?;
        let store = LedgerStore::from_paths(&paths);
        let ledger = store.load();
        let sources = SourceList::load_from(&paths.sources_file());

        Ok(Self {
            paths,
            settings,
            target_override: None,
            sources,
            cache: Arc::new(ArtifactCache::new()),
            ledger,
            store,
            client,
            http_client,
            listing: Vec::new(),
        })
    }

    #[cfg(test)]
    #[must_use]
    pub(crate) fn with_ledger_store(mut self, store: LedgerStore) -> Self {
        self.ledger = store.load();
        self.store = store;
        self
    }

    #[must_use]
    pub fn with_target_override(mut self, target: Option<PathBuf>) -> Self {
        self.target_override = target;
        self
    }

    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    pub fn paths(&self) -> &AppPaths {
        &self.paths
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn sources(&self) -> &SourceList {
        &self.sources
    }

    pub fn listing(&self) -> &[InstalledEntry] {
        &self.listing
    }

    /// The directory batches operate on: the override when given, else the
    /// configured one.
    pub fn target_dir(&self) -> Option<&Path> {
        self.target_override
            .as_deref()
            .or(self.settings.target_dir.as_deref())
    }

    pub fn update_settings(
        &mut self,
        change: impl FnOnce(&mut AppSettings),
    ) -> Result<(), AppError> {
        change(&mut self.settings);
        self.settings
            .save(&self.paths)
            .map_err(|error| AppError::settings_save_failed("settings", error))
    }

    fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            extension: self.settings.artifact_extension.clone(),
        }
    }

    fn release_feed(&self) -> ReleaseFeed {
        ReleaseFeed::github(
            self.settings.update_owner.clone(),
            self.settings.update_repo.clone(),
        )
    }

    fn require_client(&self) -> Result<Arc<dyn RepositoryClient>, AppError> {
        self.client.clone().ok_or(AppError::GitUnavailable)
    }
}
