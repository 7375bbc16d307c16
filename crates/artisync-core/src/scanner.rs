use std::collections::HashMap;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use regex::{Regex, RegexBuilder};
use walkdir::WalkDir;

use artisync_backend::{
    ArtifactSource, BackendError, CommitRecord, Discovery, RepositoryClient, TrackedArtifact,
};

use crate::checkout::{DisposableCheckout, sparse_patterns_for};

pub const DEFAULT_ARTIFACT_EXTENSION: &str = "jar";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOptions {
    /// Artifact file extension without the leading dot.
    pub extension: String,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            extension: DEFAULT_ARTIFACT_EXTENSION.to_string(),
        }
    }
}

impl ScanOptions {
    #[must_use]
    pub fn sparse_patterns(&self) -> Vec<String> {
        sparse_patterns_for(&self.extension)
    }
}

/// Compile an artifact pattern the way every scan applies it.
///
/// # Errors
/// Returns `InvalidPattern` when the expression does not compile.
pub fn compile_pattern(pattern: &str) -> Result<Regex, BackendError> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|error| BackendError::invalid_pattern(pattern, error))
}

/// Discover every artifact of `source` and the revision that last touched it.
///
/// # Errors
/// Returns `InvalidPattern` before any checkout when the pattern does not
/// compile, and `SourceUnreachable` when no checkout can be obtained.
pub async fn scan_source(
    client: &dyn RepositoryClient,
    source: &ArtifactSource,
    options: &ScanOptions,
) -> Result<Vec<TrackedArtifact>, BackendError> {
    let pattern = compile_pattern(&source.pattern)?;

    info!("Scanning {} ({})", source.name, source.address);
    let checkout =
        DisposableCheckout::acquire(client, &source.address, &options.sparse_patterns()).await?;

    let files = list_files(checkout.path()).await?;
    let mut matched: Vec<String> = files
        .into_iter()
        .filter(|path| pattern.is_match(path))
        .collect();
    matched.sort();
    debug!(
        "{} of the files in {} match {:?}",
        matched.len(),
        source.address,
        source.pattern
    );

    let commits = match client.history(checkout.path()).await {
        Ok(commits) => commits,
        Err(error) => {
            warn!(
                "History of {} unavailable, revisions left unattributed: {error}",
                source.address
            );
            Vec::new()
        }
    };
    let revisions = attribute_revisions(&matched, &commits);

    let artifacts = matched
        .into_iter()
        .map(|relative_path| match revisions.get(relative_path.as_str()) {
            Some(commit) => TrackedArtifact {
                source_address: source.address.clone(),
                revision: commit.revision.clone(),
                revision_date: commit.date.clone(),
                discovery: Discovery::Found,
                relative_path,
            },
            None => TrackedArtifact {
                source_address: source.address.clone(),
                revision: String::new(),
                revision_date: String::new(),
                discovery: Discovery::Unknown,
                relative_path,
            },
        })
        .collect();

    Ok(artifacts)
}

/// Map each of `paths` to the first (most recent) commit listing it.
#[must_use]
pub fn attribute_revisions<'a>(
    paths: &[String],
    commits: &'a [CommitRecord],
) -> HashMap<&'a str, &'a CommitRecord> {
    let wanted: std::collections::HashSet<&str> = paths.iter().map(String::as_str).collect();
    let mut attributed: HashMap<&str, &CommitRecord> = HashMap::new();

    for commit in commits {
        for path in &commit.paths {
            if wanted.contains(path.as_str()) {
                attributed.entry(path.as_str()).or_insert(commit);
            }
        }
        if attributed.len() == wanted.len() {
            break;
        }
    }

    attributed
}

async fn list_files(root: &Path) -> Result<Vec<String>, BackendError> {
    let root: PathBuf = root.to_path_buf();
    tokio::task::spawn_blocking(move || collect_relative_files(&root))
        .await
        .map_err(|error| BackendError::from(std::io::Error::other(error)))?
}

fn collect_relative_files(root: &Path) -> Result<Vec<String>, BackendError> {
    let mut files = Vec::new();
    let walker = WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .filter_entry(|entry| !(entry.file_type().is_dir() && entry.file_name() == ".git"));

    for entry in walker {
        let entry = entry.map_err(|error| {
            BackendError::from(std::io::Error::other(format!(
                "failed to walk {}: {error}",
                root.display()
            )))
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(root) else {
            continue;
        };
        let joined = relative
            .components()
            .map(|component| component.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        files.push(joined);
    }

    Ok(files)
}
