use std::path::Path;

use log::warn;

use artisync_backend::{
    ArtifactMatch, ArtifactStatus, BackendError, InstalledArtifact, TrackedArtifact,
};

use crate::cache::CacheSnapshot;
use crate::ledger::Ledger;

/// One row of the installed listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstalledEntry {
    Artifact(InstalledArtifact),
    /// Placeholder row explaining why nothing could be listed.
    Diagnostic(String),
}

impl InstalledEntry {
    #[must_use]
    pub fn as_artifact(&self) -> Option<&InstalledArtifact> {
        match self {
            Self::Artifact(artifact) => Some(artifact),
            Self::Diagnostic(_) => None,
        }
    }
}

/// Sync state of a scanned remote artifact against the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackedView {
    Untracked,
    UpToDate,
    Outdated { ledger_revision: String },
}

/// Annotate one source's scan results for browsing.
#[must_use]
pub fn tracked_view(artifact: &TrackedArtifact, ledger: &Ledger) -> TrackedView {
    match ledger.get(&artifact.ledger_key()) {
        None | Some("") => TrackedView::Untracked,
        Some(revision) if revision == artifact.revision => TrackedView::UpToDate,
        Some(revision) => TrackedView::Outdated {
            ledger_revision: revision.to_string(),
        },
    }
}

/// Correlate the top level of `target` with the cached scan results.
///
/// Files are matched by name, case-insensitively, against each source in
/// cache order; the first source holding a same-named artifact wins even
/// when a later source also publishes one.
#[must_use]
pub fn match_installed(
    target: Option<&Path>,
    snapshot: &CacheSnapshot,
    ledger: &Ledger,
    extension: &str,
) -> Vec<InstalledEntry> {
    let Some(target) = target.filter(|path| path.is_dir()) else {
        return vec![InstalledEntry::Diagnostic(
            BackendError::TargetDirectoryUnset.to_string(),
        )];
    };

    let mut files = match list_installed_files(target, extension) {
        Ok(files) => files,
        Err(error) => {
            warn!("Failed to list {}: {error}", target.display());
            return vec![InstalledEntry::Diagnostic(format!(
                "Failed to read {}: {error}",
                target.display()
            ))];
        }
    };
    files.sort_by_key(|name| name.to_lowercase());

    files
        .into_iter()
        .map(|file_name| {
            let path = target.join(&file_name);
            let matched = find_match(&file_name, snapshot, ledger);
            let status = status_for(matched.as_ref());
            InstalledEntry::Artifact(InstalledArtifact {
                file_name,
                path,
                matched,
                status,
                selected: false,
            })
        })
        .collect()
}

/// Carry operator selection across a refresh, keyed by file name.
pub fn restore_selection(previous: &[InstalledEntry], next: &mut [InstalledEntry]) {
    for entry in next.iter_mut() {
        let InstalledEntry::Artifact(artifact) = entry else {
            continue;
        };
        artifact.selected = previous
            .iter()
            .filter_map(InstalledEntry::as_artifact)
            .any(|old| old.selected && old.file_name == artifact.file_name);
    }
}

fn find_match(
    file_name: &str,
    snapshot: &CacheSnapshot,
    ledger: &Ledger,
) -> Option<ArtifactMatch> {
    snapshot
        .iter()
        .flat_map(|(_, artifacts)| artifacts.iter())
        .find(|artifact| artifact.file_name().eq_ignore_ascii_case(file_name))
        .map(|artifact| ArtifactMatch {
            source_address: artifact.source_address.clone(),
            relative_path: artifact.relative_path.clone(),
            remote_revision: artifact.revision.clone(),
            ledger_revision: ledger.get(&artifact.ledger_key()).map(str::to_string),
        })
}

fn status_for(matched: Option<&ArtifactMatch>) -> ArtifactStatus {
    let Some(matched) = matched else {
        return ArtifactStatus::Unmanaged;
    };
    match matched.ledger_revision.as_deref() {
        None | Some("") => ArtifactStatus::MatchedUntracked,
        Some(revision) if revision == matched.remote_revision => ArtifactStatus::UpToDate,
        Some(revision) => ArtifactStatus::Outdated {
            ledger_revision: revision.to_string(),
        },
    }
}

fn list_installed_files(target: &Path, extension: &str) -> std::io::Result<Vec<String>> {
    let extension = extension.trim_start_matches('.');
    let mut files = Vec::new();

    for entry in std::fs::read_dir(target)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let path = entry.path();
        let has_extension = path
            .extension()
            .is_some_and(|ext| ext.to_string_lossy().eq_ignore_ascii_case(extension));
        if !has_extension {
            continue;
        }
        if let Some(name) = path.file_name() {
            files.push(name.to_string_lossy().into_owned());
        }
    }

    Ok(files)
}
