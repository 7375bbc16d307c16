//! Scanning sources and keeping the installed listing current.

use std::sync::Arc;

use log::info;
use tokio::sync::mpsc;

use artisync_backend::{ArtifactSource, TrackedArtifact};
use artisync_core::{
    CacheSnapshot, InstalledEntry, ScanEvent, ScanSummary, TrackedView, match_installed,
    restore_selection, scan_all, scan_into_cache, tracked_view,
};

use crate::error::AppError;

use super::Controller;

impl Controller {
    /// Recompute the installed listing from the cache, keeping selection.
    pub fn refresh_listing(&mut self) {
        let snapshot = self.cache.snapshot();
        self.refresh_listing_from(&snapshot);
    }

    fn refresh_listing_from(&mut self, snapshot: &CacheSnapshot) {
        let mut next = match_installed(
            self.target_dir(),
            snapshot,
            &self.ledger,
            &self.settings.artifact_extension,
        );
        restore_selection(&self.listing, &mut next);
        self.listing = next;
    }

    /// Scan every source on the runtime, one after another. The listing is
    /// rebuilt from the cache as it stood when each source completed, before
    /// `on_event` sees it.
    pub async fn scan_all_sources(
        &mut self,
        mut on_event: impl FnMut(&ScanEvent, &[InstalledEntry]),
    ) -> Result<ScanSummary, AppError> {
        let client = self.require_client()?;
        let sources = self.sources.sources().to_vec();
        let options = self.scan_options();
        let cache = Arc::clone(&self.cache);
        let (tx, mut rx) = mpsc::unbounded_channel();

        let pass = tokio::spawn(async move {
            scan_all(client.as_ref(), &sources, &options, &cache, |event| {
                let _ = tx.send(event.clone());
            })
            .await
        });

        while let Some(event) = rx.recv().await {
            if let ScanEvent::Completed { snapshot, .. } = &event {
                self.refresh_listing_from(snapshot);
            }
            on_event(&event, &self.listing);
        }

        let summary = pass.await.map_err(|error| {
            AppError::operation_failed("Background scan", format!("scan task panicked: {error}"))
        })?;
        info!(
            "Background scan finished: {} scanned, {} failed",
            summary.scanned, summary.failed
        );
        self.refresh_listing();
        Ok(summary)
    }

    /// Scan one source by name or address and annotate its artifacts
    /// against the ledger.
    pub async fn browse_source(
        &mut self,
        query: &str,
    ) -> Result<(ArtifactSource, Vec<(TrackedArtifact, TrackedView)>), AppError> {
        let source = self.find_source(query)?;
        let client = self.require_client()?;
        let options = self.scan_options();

        scan_into_cache(client.as_ref(), &source, &options, &self.cache)
            .await
            .map_err(|error| AppError::scan_failed(source.name.clone(), error))?;
        self.refresh_listing();

        let artifacts = self
            .cache
            .get(&source.address)
            .unwrap_or_default()
            .into_iter()
            .map(|artifact| {
                let view = tracked_view(&artifact, &self.ledger);
                (artifact, view)
            })
            .collect();
        Ok((source, artifacts))
    }

    pub(super) fn find_source(&self, query: &str) -> Result<ArtifactSource, AppError> {
        self.sources
            .find(query)
            .cloned()
            .ok_or_else(|| AppError::unknown_source(query))
    }
}

#[cfg(test)]
mod tests {
    use artisync_backend::ArtifactStatus;
    use artisync_core::{InstalledEntry, ScanEvent, TrackedView};

    use super::super::test_support::Harness;
    use crate::error::AppError;

    const ALPHA: &str = "https://example.com/alpha.git";
    const BETA: &str = "https://example.com/beta.git";

    #[tokio::test]
    async fn scan_pass_refreshes_listing_after_each_source() {
        let harness = Harness::new(&[("Alpha", ALPHA), ("Beta", BETA)]);
        harness.remotes.publish(ALPHA, "libs/a.jar", b"a", "R1");
        harness.remotes.publish(BETA, "b.jar", b"b", "R2");
        std::fs::write(harness.target().join("a.jar"), b"a").expect("a.jar written");
        std::fs::write(harness.target().join("b.jar"), b"b").expect("b.jar written");
        let mut controller = harness.controller();
        let mut matched_after_completion = Vec::new();

        let summary = controller
            .scan_all_sources(|event, listing| {
                if let ScanEvent::Completed { name, .. } = event {
                    let matched = listing
                        .iter()
                        .filter_map(InstalledEntry::as_artifact)
                        .filter(|artifact| artifact.is_matched())
                        .count();
                    matched_after_completion.push((name.clone(), matched));
                }
            })
            .await
            .expect("scan pass should run");

        assert_eq!(summary.scanned, 2);
        assert_eq!(summary.failed, 0);
        assert_eq!(
            matched_after_completion,
            vec![("Alpha".to_string(), 1), ("Beta".to_string(), 2)]
        );
        let statuses: Vec<ArtifactStatus> = controller
            .listing()
            .iter()
            .filter_map(InstalledEntry::as_artifact)
            .map(|artifact| artifact.status.clone())
            .collect();
        assert_eq!(
            statuses,
            vec![ArtifactStatus::MatchedUntracked, ArtifactStatus::MatchedUntracked]
        );
    }

    #[tokio::test]
    async fn failed_source_is_reported_and_others_still_scan() {
        let harness = Harness::new(&[("Alpha", ALPHA), ("Beta", BETA)]);
        harness.remotes.publish(BETA, "b.jar", b"b", "R2");
        let mut controller = harness.controller();
        let mut failures = Vec::new();

        let summary = controller
            .scan_all_sources(|event, _| {
                if let ScanEvent::Failed { name, .. } = event {
                    failures.push(name.clone());
                }
            })
            .await
            .expect("scan pass should run");

        assert_eq!(summary.scanned, 1);
        assert_eq!(failures, vec!["Alpha".to_string()]);
    }

    #[tokio::test]
    async fn browse_annotates_against_ledger() {
        let harness = Harness::new(&[("Alpha", ALPHA)]);
        harness.remotes.publish(ALPHA, "libs/a.jar", b"a", "R1");
        let mut controller = harness.controller();

        let (source, artifacts) = controller
            .browse_source("alpha")
            .await
            .expect("browse should scan the source");

        assert_eq!(source.address, ALPHA);
        assert_eq!(artifacts.len(), 1);
        assert_eq!(artifacts[0].0.relative_path, "libs/a.jar");
        assert_eq!(artifacts[0].1, TrackedView::Untracked);
    }

    #[tokio::test]
    async fn browse_unknown_source_is_an_error() {
        let harness = Harness::new(&[("Alpha", ALPHA)]);
        let mut controller = harness.controller();

        let result = controller.browse_source("missing").await;

        assert_eq!(result.err(), Some(AppError::unknown_source("missing")));
    }
}
