use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

pub const DEFAULT_ARTIFACT_PATTERN: &str = r".*\.jar$";

/// A remote repository that publishes artifacts, plus the pattern selecting
/// which repository-relative paths count as artifacts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactSource {
    pub name: String,
    pub address: String,
    #[serde(default = "default_pattern")]
    pub pattern: String,
}

fn default_pattern() -> String {
    DEFAULT_ARTIFACT_PATTERN.to_string()
}

impl ArtifactSource {
    pub fn new(
        name: impl Into<String>,
        address: impl Into<String>,
        pattern: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            pattern: pattern.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Discovery {
    Found,
    Unknown,
}

impl fmt::Display for Discovery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Found => write!(f, "Found"),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedArtifact {
    pub source_address: String,
    /// `/`-separated path relative to the repository root.
    pub relative_path: String,
    /// Empty when no revision could be attributed.
    pub revision: String,
    pub revision_date: String,
    pub discovery: Discovery,
}

impl TrackedArtifact {
    #[must_use]
    pub fn file_name(&self) -> &str {
        base_file_name(&self.relative_path)
    }

    #[must_use]
    pub fn ledger_key(&self) -> String {
        ledger_key(&self.source_address, &self.relative_path)
    }
}

/// One entry of a repository's history, most recent first when listed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRecord {
    pub revision: String,
    pub date: String,
    pub paths: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactStatus {
    UpToDate,
    Outdated { ledger_revision: String },
    MatchedUntracked,
    Unmanaged,
}

impl fmt::Display for ArtifactStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UpToDate => write!(f, "Up-to-date"),
            Self::Outdated { ledger_revision } => write!(f, "Outdated (local {ledger_revision})"),
            Self::MatchedUntracked => write!(f, "Matched (not tracked)"),
            Self::Unmanaged => write!(f, "Unmanaged"),
        }
    }
}

/// Remote counterpart of an installed file, captured at match time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactMatch {
    pub source_address: String,
    pub relative_path: String,
    pub remote_revision: String,
    pub ledger_revision: Option<String>,
}

impl ArtifactMatch {
    #[must_use]
    pub fn ledger_key(&self) -> String {
        ledger_key(&self.source_address, &self.relative_path)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledArtifact {
    pub file_name: String,
    pub path: PathBuf,
    pub matched: Option<ArtifactMatch>,
    pub status: ArtifactStatus,
    pub selected: bool,
}

impl InstalledArtifact {
    #[must_use]
    pub fn is_matched(&self) -> bool {
        self.matched.is_some()
    }
}

#[must_use]
pub fn ledger_key(source_address: &str, relative_path: &str) -> String {
    format!("{source_address}|{relative_path}")
}

#[must_use]
pub fn base_file_name(relative_path: &str) -> &str {
    relative_path
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(relative_path)
}
