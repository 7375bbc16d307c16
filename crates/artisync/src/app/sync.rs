//! Install, update and delete batches driven from the controller.

use tokio::sync::mpsc;

use artisync_backend::{InstalledArtifact, TrackedArtifact};
use artisync_core::{BatchReport, InstalledEntry, SyncOrchestrator, SyncProgress};

use crate::error::AppError;

use super::Controller;

enum Batch<'a> {
    Install(&'a [TrackedArtifact]),
    UpdateSelected,
    UpdateAll,
    Delete,
}

impl Batch<'_> {
    fn operation(&self) -> &'static str {
        match self {
            Self::Install(_) => "Install",
            Self::UpdateSelected | Self::UpdateAll => "Update",
            Self::Delete => "Delete",
        }
    }
}

impl Controller {
    /// Mark the listed files named in `names` as selected and clear the rest.
    /// Returns the names that matched no installed file.
    pub fn select_files(&mut self, names: &[String]) -> Vec<String> {
        let mut unmatched: Vec<String> = names.to_vec();
        for entry in &mut self.listing {
            let InstalledEntry::Artifact(artifact) = entry else {
                continue;
            };
            artifact.selected = names
                .iter()
                .any(|name| name.eq_ignore_ascii_case(&artifact.file_name));
            if artifact.selected {
                unmatched.retain(|name| !name.eq_ignore_ascii_case(&artifact.file_name));
            }
        }
        unmatched
    }

    pub async fn install(
        &mut self,
        artifacts: &[TrackedArtifact],
        on_progress: impl FnMut(&SyncProgress),
    ) -> Result<BatchReport, AppError> {
        self.run_batch(Batch::Install(artifacts), on_progress).await
    }

    pub async fn update_selected(
        &mut self,
        on_progress: impl FnMut(&SyncProgress),
    ) -> Result<BatchReport, AppError> {
        self.run_batch(Batch::UpdateSelected, on_progress).await
    }

    pub async fn update_all(
        &mut self,
        on_progress: impl FnMut(&SyncProgress),
    ) -> Result<BatchReport, AppError> {
        self.run_batch(Batch::UpdateAll, on_progress).await
    }

    pub async fn delete_selected(
        &mut self,
        on_progress: impl FnMut(&SyncProgress),
    ) -> Result<BatchReport, AppError> {
        self.run_batch(Batch::Delete, on_progress).await
    }

    async fn run_batch(
        &mut self,
        batch: Batch<'_>,
        mut on_progress: impl FnMut(&SyncProgress),
    ) -> Result<BatchReport, AppError> {
        let operation = batch.operation();
        let client = self.require_client()?;
        let options = self.scan_options();
        let installed: Vec<InstalledArtifact> = self
            .listing
            .iter()
            .filter_map(InstalledEntry::as_artifact)
            .cloned()
            .collect();
        let target = self
            .target_override
            .as_deref()
            .or(self.settings.target_dir.as_deref());
        let store = &self.store;
        let ledger = &mut self.ledger;
        let (tx, mut rx) = mpsc::channel(32);

        let work = async move {
            let orchestrator =
                SyncOrchestrator::new(client.as_ref(), store, target, &options).with_progress(tx);
            match batch {
                Batch::Install(artifacts) => orchestrator.install(ledger, artifacts).await,
                Batch::UpdateSelected => orchestrator.update_selected(ledger, &installed).await,
                Batch::UpdateAll => orchestrator.update_all(ledger, &installed).await,
                Batch::Delete => orchestrator.delete(ledger, &installed).await,
            }
        };
        let progress = async {
            while let Some(event) = rx.recv().await {
                on_progress(&event);
            }
        };

        let (result, ()) = tokio::join!(work, progress);
        let report = result.map_err(|error| AppError::operation_failed(operation, error))?;
        self.refresh_listing();
        Ok(report)
    }
}
