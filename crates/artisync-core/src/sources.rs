use std::path::Path;

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use artisync_backend::{ArtifactSource, DEFAULT_ARTIFACT_PATTERN};

use crate::fsutil::write_atomic;
use crate::scanner::compile_pattern;

const DEFAULT_SOURCES: [(&str, &str); 4] = [
    ("JustDavyy", "https://github.com/JustDavyy/osmb-scripts.git"),
    ("Butter", "https://github.com/ButterB21/Butter-Scripts.git"),
    ("Jose", "https://github.com/joseOSMB/JOSE-OSMB-SCRIPTS.git"),
    ("Fru", "https://github.com/fru-art/fru-scripts.git"),
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SourceError {
    #[error("Source name must not be empty")]
    EmptyName,
    #[error("Source address must not be empty")]
    EmptyAddress,
    #[error("A source with address {0} already exists")]
    DuplicateAddress(String),
    #[error("{0}")]
    InvalidPattern(String),
    #[error("No source at position {0}")]
    OutOfRange(usize),
}

/// Ordered, persisted list of artifact sources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceList {
    sources: Vec<ArtifactSource>,
}

impl Default for SourceList {
    fn default() -> Self {
        Self {
            sources: DEFAULT_SOURCES
                .iter()
                .map(|(name, address)| {
                    ArtifactSource::new(*name, *address, DEFAULT_ARTIFACT_PATTERN)
                })
                .collect(),
        }
    }
}

impl SourceList {
    #[must_use]
    pub fn load_from(path: &Path) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(error) => {
                if error.kind() != std::io::ErrorKind::NotFound {
                    warn!("Failed to read sources from {}: {error}", path.display());
                }
                return Self::default();
            }
        };

        match serde_json::from_str::<Self>(&content) {
            Ok(list) if !list.sources.is_empty() => list,
            Ok(_) => {
                debug!("Source list at {} is empty, using defaults", path.display());
                Self::default()
            }
            Err(error) => {
                warn!("Failed to parse sources from {}: {error}", path.display());
                Self::default()
            }
        }
    }

    /// # Errors
    /// Returns an error when serialization or the atomic write fails.
    pub fn save_to(&self, path: &Path) -> std::io::Result<()> {
        let data = serde_json::to_vec_pretty(self).map_err(std::io::Error::other)?;
        write_atomic(path, &data)
    }

    #[must_use]
    pub fn sources(&self) -> &[ArtifactSource] {
        &self.sources
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    #[must_use]
    pub fn find(&self, name_or_address: &str) -> Option<&ArtifactSource> {
        self.sources.iter().find(|source| {
            source.name.eq_ignore_ascii_case(name_or_address) || source.address == name_or_address
        })
    }

    /// # Errors
    /// Returns an error when the source is invalid or its address is taken.
    pub fn add(&mut self, source: ArtifactSource) -> Result<(), SourceError> {
        let source = validate(source)?;
        if self.sources.iter().any(|existing| existing.address == source.address) {
            return Err(SourceError::DuplicateAddress(source.address));
        }
        self.sources.push(source);
        Ok(())
    }

    /// # Errors
    /// Returns an error when `index` is out of range, the source is invalid,
    /// or another entry already uses its address.
    pub fn update(&mut self, index: usize, source: ArtifactSource) -> Result<(), SourceError> {
        if index >= self.sources.len() {
            return Err(SourceError::OutOfRange(index));
        }
        let source = validate(source)?;
        let clash = self
            .sources
            .iter()
            .enumerate()
            .any(|(position, existing)| position != index && existing.address == source.address);
        if clash {
            return Err(SourceError::DuplicateAddress(source.address));
        }
        self.sources[index] = source;
        Ok(())
    }

    /// # Errors
    /// Returns an error when `index` is out of range.
    pub fn remove(&mut self, index: usize) -> Result<ArtifactSource, SourceError> {
        if index >= self.sources.len() {
            return Err(SourceError::OutOfRange(index));
        }
        Ok(self.sources.remove(index))
    }
}

fn validate(source: ArtifactSource) -> Result<ArtifactSource, SourceError> {
    let name = source.name.trim().to_string();
    let address = source.address.trim().to_string();
    let pattern = if source.pattern.trim().is_empty() {
        DEFAULT_ARTIFACT_PATTERN.to_string()
    } else {
        source.pattern
    };

    if name.is_empty() {
        return Err(SourceError::EmptyName);
    }
    if address.is_empty() {
        return Err(SourceError::EmptyAddress);
    }
    compile_pattern(&pattern).map_err(|error| SourceError::InvalidPattern(error.to_string()))?;

    Ok(ArtifactSource {
        name,
        address,
        pattern,
    })
}
