use std::path::{Path, PathBuf};

use log::{debug, error, info, warn};
use tokio::sync::mpsc;

use artisync_backend::{
    BackendError, InstalledArtifact, RepositoryClient, TrackedArtifact, base_file_name,
    ledger_key,
};

use crate::checkout::DisposableCheckout;
use crate::ledger::{Ledger, LedgerStore};
use crate::scanner::ScanOptions;

/// Per-item progress of a batch; `index` is zero-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncProgress {
    pub index: usize,
    pub total: usize,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    Installed { file_name: String, revision: String },
    Deleted { file_name: String },
    Failed { file_name: String, message: String },
}

impl ItemOutcome {
    #[must_use]
    pub fn file_name(&self) -> &str {
        match self {
            Self::Installed { file_name, .. }
            | Self::Deleted { file_name }
            | Self::Failed { file_name, .. } => file_name,
        }
    }

    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// One outcome per processed item, in processing order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub outcomes: Vec<ItemOutcome>,
}

impl BatchReport {
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.outcomes.len() - self.failed()
    }

    #[must_use]
    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|outcome| outcome.is_failure()).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &ItemOutcome> {
        self.outcomes.iter().filter(|outcome| outcome.is_failure())
    }
}

#[derive(Debug, Clone, Copy)]
enum BatchKind {
    Install,
    Update,
    Delete,
}

impl BatchKind {
    fn verb(self) -> &'static str {
        match self {
            Self::Install => "Installing",
            Self::Update => "Updating",
            Self::Delete => "Deleting",
        }
    }
}

/// Copy the artifact at `relative_path` of `address` into `target`.
///
/// Every call takes its own disposable checkout. The destination is
/// `<target>/<basename>` and an existing file there is overwritten.
///
/// # Errors
/// Returns `SourceUnreachable` when no checkout can be obtained,
/// `ArtifactMissing` when the path is absent from the checkout, or an IO
/// error when the copy fails.
pub async fn fetch_artifact(
    client: &dyn RepositoryClient,
    address: &str,
    relative_path: &str,
    target: &Path,
    sparse_patterns: &[String],
) -> Result<PathBuf, BackendError> {
    let checkout = DisposableCheckout::acquire(client, address, sparse_patterns).await?;

    let source = relative_path
        .split(['/', '\\'])
        .filter(|segment| !segment.is_empty())
        .fold(checkout.path().to_path_buf(), |path, segment| path.join(segment));
    if !source.is_file() {
        return Err(BackendError::artifact_missing(address, relative_path));
    }

    let dest = target.join(base_file_name(relative_path));
    tokio::fs::copy(&source, &dest)
        .await
        .map_err(|error| BackendError::io_with_path("failed to copy to", &dest, &error))?;
    debug!("Copied {relative_path} from {address} to {}", dest.display());
    Ok(dest)
}

/// Drives install, update and delete batches against one target directory.
///
/// Items run one after another; a failing item is recorded in the report
/// and the batch moves on. The ledger is written once per batch.
pub struct SyncOrchestrator<'a> {
    client: &'a dyn RepositoryClient,
    store: &'a LedgerStore,
    target: Option<&'a Path>,
    sparse_patterns: Vec<String>,
    progress: Option<mpsc::Sender<SyncProgress>>,
}

impl<'a> SyncOrchestrator<'a> {
    #[must_use]
    pub fn new(
        client: &'a dyn RepositoryClient,
        store: &'a LedgerStore,
        target: Option<&'a Path>,
        options: &ScanOptions,
    ) -> Self {
        Self {
            client,
            store,
            target,
            sparse_patterns: options.sparse_patterns(),
            progress: None,
        }
    }

    #[must_use]
    pub fn with_progress(mut self, progress: mpsc::Sender<SyncProgress>) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Install scanned remote artifacts into the target directory.
    ///
    /// # Errors
    /// Returns `TargetDirectoryUnset` before touching any item when no
    /// target directory is configured. A configured directory that does not
    /// exist yet is created.
    pub async fn install(
        &self,
        ledger: &mut Ledger,
        artifacts: &[TrackedArtifact],
    ) -> Result<BatchReport, BackendError> {
        let target = self.prepare_target().await?;
        let jobs: Vec<FetchJob<'_>> = artifacts
            .iter()
            .map(|artifact| FetchJob {
                file_name: artifact.file_name().to_string(),
                address: &artifact.source_address,
                relative_path: &artifact.relative_path,
                revision: &artifact.revision,
            })
            .collect();
        Ok(self.run_fetches(BatchKind::Install, target, ledger, &jobs).await)
    }

    /// Re-fetch the installed files that are both selected and matched.
    ///
    /// # Errors
    /// Returns `TargetDirectoryUnset` when no target directory is
    /// configured.
    pub async fn update_selected(
        &self,
        ledger: &mut Ledger,
        installed: &[InstalledArtifact],
    ) -> Result<BatchReport, BackendError> {
        let target = self.prepare_target().await?;
        let jobs = update_jobs(installed.iter().filter(|item| item.selected));
        Ok(self.run_fetches(BatchKind::Update, target, ledger, &jobs).await)
    }

    /// Re-fetch every matched installed file regardless of selection.
    ///
    /// # Errors
    /// Returns `TargetDirectoryUnset` when no target directory is
    /// configured.
    pub async fn update_all(
        &self,
        ledger: &mut Ledger,
        installed: &[InstalledArtifact],
    ) -> Result<BatchReport, BackendError> {
        let target = self.prepare_target().await?;
        let jobs = update_jobs(installed.iter());
        Ok(self.run_fetches(BatchKind::Update, target, ledger, &jobs).await)
    }

    /// Remove the selected installed files and forget their ledger entries.
    ///
    /// # Errors
    /// Returns `TargetDirectoryUnset` when the target directory is unset or
    /// missing.
    pub async fn delete(
        &self,
        ledger: &mut Ledger,
        installed: &[InstalledArtifact],
    ) -> Result<BatchReport, BackendError> {
        self.existing_target()?;
        let selected: Vec<&InstalledArtifact> =
            installed.iter().filter(|item| item.selected).collect();
        let total = selected.len();
        let mut report = BatchReport::default();

        for (index, item) in selected.into_iter().enumerate() {
            self.report(BatchKind::Delete, index, total, &item.file_name)
                .await;

            let outcome = match remove_file(&item.path).await {
                Ok(()) => {
                    if let Some(matched) = &item.matched {
                        ledger.forget(&matched.ledger_key());
                    }
                    ItemOutcome::Deleted {
                        file_name: item.file_name.clone(),
                    }
                }
                Err(error) => {
                    warn!("Failed to delete {}: {error}", item.path.display());
                    ItemOutcome::Failed {
                        file_name: item.file_name.clone(),
                        message: error.to_string(),
                    }
                }
            };
            report.outcomes.push(outcome);
        }

        self.store.save(ledger);
        info!(
            "Delete batch finished: {} removed, {} failed",
            report.succeeded(),
            report.failed()
        );
        Ok(report)
    }

    fn existing_target(&self) -> Result<&'a Path, BackendError> {
        self.target
            .filter(|target| target.is_dir())
            .ok_or(BackendError::TargetDirectoryUnset)
    }

    async fn prepare_target(&self) -> Result<&'a Path, BackendError> {
        let target = self.target.ok_or(BackendError::TargetDirectoryUnset)?;
        if !target.is_dir() {
            info!("Creating target directory {}", target.display());
            tokio::fs::create_dir_all(target).await.map_err(|error| {
                BackendError::io_with_path("failed to create", target, &error)
            })?;
        }
        Ok(target)
    }

    async fn report(&self, kind: BatchKind, index: usize, total: usize, file_name: &str) {
        let Some(progress) = &self.progress else {
            return;
        };
        let label = format!("{} {file_name} ({}/{total})", kind.verb(), index + 1);
        let _ = progress
            .send(SyncProgress {
                index,
                total,
                label,
            })
            .await;
    }

    async fn run_fetches(
        &self,
        kind: BatchKind,
        target: &Path,
        ledger: &mut Ledger,
        jobs: &[FetchJob<'_>],
    ) -> BatchReport {
        let total = jobs.len();
        let mut report = BatchReport::default();

        for (index, job) in jobs.iter().enumerate() {
            self.report(kind, index, total, &job.file_name).await;

            let result = fetch_artifact(
                self.client,
                job.address,
                job.relative_path,
                target,
                &self.sparse_patterns,
            )
            .await;

            let outcome = match result {
                Ok(_) => {
                    ledger.record(ledger_key(job.address, job.relative_path), job.revision);
                    ItemOutcome::Installed {
                        file_name: job.file_name.clone(),
                        revision: job.revision.to_string(),
                    }
                }
                Err(error) => {
                    error!(
                        "{} {} from {} failed: {error}",
                        kind.verb(),
                        job.relative_path,
                        job.address
                    );
                    ItemOutcome::Failed {
                        file_name: job.file_name.clone(),
                        message: error.to_string(),
                    }
                }
            };
            report.outcomes.push(outcome);
        }

        self.store.save(ledger);
        info!(
            "{} batch finished: {} succeeded, {} failed",
            kind.verb(),
            report.succeeded(),
            report.failed()
        );
        report
    }
}

struct FetchJob<'a> {
    file_name: String,
    address: &'a str,
    relative_path: &'a str,
    revision: &'a str,
}

fn update_jobs<'a>(items: impl Iterator<Item = &'a InstalledArtifact>) -> Vec<FetchJob<'a>> {
    items
        .filter_map(|item| {
            let matched = item.matched.as_ref()?;
            Some(FetchJob {
                file_name: item.file_name.clone(),
                address: &matched.source_address,
                relative_path: &matched.relative_path,
                revision: &matched.remote_revision,
            })
        })
        .collect()
}

async fn remove_file(path: &Path) -> Result<(), BackendError> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
            debug!("{} already absent", path.display());
            Ok(())
        }
        Err(error) => Err(BackendError::io_with_path("failed to remove", path, &error)),
    }
}
