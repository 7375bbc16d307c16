use std::sync::{Mutex, MutexGuard, PoisonError};

use artisync_backend::TrackedArtifact;

/// Cloned view of the cache, in source insertion order.
pub type CacheSnapshot = Vec<(String, Vec<TrackedArtifact>)>;

/// Last successful scan result per source address.
///
/// Entries keep the order in which each address was first stored, so
/// first-match-wins lookups follow the declared source order of the first
/// full pass.
#[derive(Debug, Default)]
pub struct ArtifactCache {
    entries: Mutex<CacheSnapshot>,
}

impl ArtifactCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, CacheSnapshot> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the entry for `address` wholesale, keeping its position.
    pub fn replace(&self, address: &str, artifacts: Vec<TrackedArtifact>) {
        let mut entries = self.lock();
        if let Some((_, existing)) = entries.iter_mut().find(|(key, _)| key == address) {
            *existing = artifacts;
        } else {
            entries.push((address.to_string(), artifacts));
        }
    }

    #[must_use]
    pub fn get(&self, address: &str) -> Option<Vec<TrackedArtifact>> {
        self.lock()
            .iter()
            .find(|(key, _)| key == address)
            .map(|(_, artifacts)| artifacts.clone())
    }

    pub fn remove(&self, address: &str) -> bool {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|(key, _)| key != address);
        entries.len() != before
    }

    #[must_use]
    pub fn snapshot(&self) -> CacheSnapshot {
        self.lock().clone()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use artisync_backend::Discovery;

    use super::*;

    fn artifact(address: &str, path: &str, revision: &str) -> TrackedArtifact {
        TrackedArtifact {
            source_address: address.to_string(),
            relative_path: path.to_string(),
            revision: revision.to_string(),
            revision_date: String::new(),
            discovery: Discovery::Found,
        }
    }

    #[test]
    fn replace_keeps_insertion_order() {
        let cache = ArtifactCache::new();
        cache.replace("b", vec![artifact("b", "b.jar", "R1")]);
        cache.replace("a", vec![artifact("a", "a.jar", "R1")]);
        cache.replace("b", vec![artifact("b", "b.jar", "R2")]);

        let snapshot = cache.snapshot();

        assert_eq!(
            snapshot.iter().map(|(key, _)| key.as_str()).collect::<Vec<_>>(),
            vec!["b", "a"]
        );
        assert_eq!(snapshot[0].1[0].revision, "R2");
    }

    #[test]
    fn remove_drops_only_that_source() {
        let cache = ArtifactCache::new();
        cache.replace("a", Vec::new());
        cache.replace("b", Vec::new());

        assert!(cache.remove("a"));
        assert!(!cache.remove("a"));
        assert!(cache.get("a").is_none());
        assert!(cache.get("b").is_some());
    }
}
