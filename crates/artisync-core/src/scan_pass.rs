use log::{info, warn};

use artisync_backend::{ArtifactSource, BackendError, RepositoryClient};

use crate::cache::{ArtifactCache, CacheSnapshot};
use crate::scanner::{ScanOptions, scan_source};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanEvent {
    Started {
        index: usize,
        total: usize,
        name: String,
    },
    /// The cache entry for the source was replaced. `snapshot` is the whole
    /// cache as it stood right after that write.
    Completed {
        index: usize,
        name: String,
        artifacts: usize,
        snapshot: CacheSnapshot,
    },
    /// The cache entry for the source was left as it was.
    Failed {
        index: usize,
        name: String,
        message: String,
    },
}

impl ScanEvent {
    #[must_use]
    pub fn label(&self) -> Option<String> {
        match self {
            Self::Started { index, total, name } => {
                Some(format!("Background scan: {name} ({}/{total})", index + 1))
            }
            Self::Completed { .. } | Self::Failed { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanSummary {
    pub scanned: usize,
    pub failed: usize,
}

/// Scan one source and replace its cache entry on success.
///
/// Returns the number of artifacts found.
///
/// # Errors
/// Propagates the scan failure; the cache is not modified in that case.
pub async fn scan_into_cache(
    client: &dyn RepositoryClient,
    source: &ArtifactSource,
    options: &ScanOptions,
    cache: &ArtifactCache,
) -> Result<usize, BackendError> {
    let artifacts = scan_source(client, source, options).await?;
    let count = artifacts.len();
    cache.replace(&source.address, artifacts);
    Ok(count)
}

/// Scan every source in declared order, one at a time.
///
/// `on_event` runs after each cache update, so a listing refresh placed in
/// the `Completed` arm always observes that source's new entry. Consumers
/// on another task should match against the carried snapshot, since the
/// live cache may already hold later sources by the time they look.
pub async fn scan_all<F>(
    client: &dyn RepositoryClient,
    sources: &[ArtifactSource],
    options: &ScanOptions,
    cache: &ArtifactCache,
    mut on_event: F,
) -> ScanSummary
where
    F: FnMut(&ScanEvent),
{
    let total = sources.len();
    let mut summary = ScanSummary::default();

    for (index, source) in sources.iter().enumerate() {
        on_event(&ScanEvent::Started {
            index,
            total,
            name: source.name.clone(),
        });

        let event = match scan_into_cache(client, source, options, cache).await {
            Ok(artifacts) => {
                summary.scanned += 1;
                ScanEvent::Completed {
                    index,
                    name: source.name.clone(),
                    artifacts,
                    snapshot: cache.snapshot(),
                }
            }
            Err(error) => {
                summary.failed += 1;
                warn!("Background scan of {} failed: {error}", source.name);
                ScanEvent::Failed {
                    index,
                    name: source.name.clone(),
                    message: error.to_string(),
                }
            }
        };
        on_event(&event);
    }

    info!(
        "Scan pass finished: {} scanned, {} failed",
        summary.scanned, summary.failed
    );
    summary
}

#[cfg(test)]
mod tests {
    use super::ScanEvent;

    #[test]
    fn started_events_carry_one_based_label() {
        let event = ScanEvent::Started {
            index: 1,
            total: 4,
            name: "Butter".to_string(),
        };

        assert_eq!(
            event.label().as_deref(),
            Some("Background scan: Butter (2/4)")
        );
    }
}
