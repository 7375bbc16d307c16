#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use artisync_backend::{BackendError, CheckoutRequest, CommitRecord, RepositoryClient};
use artisync_core::LedgerStore;

/// Contents of one fake remote: files at HEAD plus its history.
#[derive(Debug, Clone, Default)]
pub struct FakeRepo {
    pub files: Vec<(String, Vec<u8>)>,
    pub commits: Vec<CommitRecord>,
    pub history_fails: bool,
}

impl FakeRepo {
    pub fn file(mut self, path: &str, contents: &[u8]) -> Self {
        self.files.push((path.to_string(), contents.to_vec()));
        self
    }

    pub fn commit(mut self, revision: &str, paths: &[&str]) -> Self {
        self.commits.push(CommitRecord {
            revision: revision.to_string(),
            date: "2026-01-01".to_string(),
            paths: paths.iter().map(ToString::to_string).collect(),
        });
        self
    }
}

/// In-memory repository client keyed by address. Unknown addresses are
/// unreachable.
#[derive(Default)]
pub struct FakeClient {
    repos: Mutex<HashMap<String, FakeRepo>>,
    checkouts: AtomicUsize,
}

impl FakeClient {
    pub fn with_repo(self, address: &str, repo: FakeRepo) -> Self {
        self.set_repo(address, repo);
        self
    }

    pub fn set_repo(&self, address: &str, repo: FakeRepo) {
        self.repos
            .lock()
            .expect("fake repos lock")
            .insert(address.to_string(), repo);
    }

    pub fn remove_repo(&self, address: &str) {
        self.repos.lock().expect("fake repos lock").remove(address);
    }

    pub fn checkouts(&self) -> usize {
        self.checkouts.load(Ordering::SeqCst)
    }

    fn history_for(&self, checkout_dir: &Path) -> Option<FakeRepo> {
        let marker = std::fs::read_to_string(checkout_dir.join(".git").join("origin")).ok()?;
        self.repos
            .lock()
            .expect("fake repos lock")
            .get(marker.trim())
            .cloned()
    }
}

#[async_trait]
impl RepositoryClient for FakeClient {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn checkout(&self, request: CheckoutRequest<'_>) -> Result<(), BackendError> {
        self.checkouts.fetch_add(1, Ordering::SeqCst);
        let repo = self
            .repos
            .lock()
            .expect("fake repos lock")
            .get(request.address)
            .cloned()
            .ok_or_else(|| BackendError::source_unreachable(request.address, "no such remote"))?;

        let git_dir = request.dest.join(".git");
        std::fs::create_dir_all(&git_dir)?;
        std::fs::write(git_dir.join("origin"), request.address)?;
        std::fs::write(git_dir.join("config.jar"), b"metadata")?;

        for (path, contents) in &repo.files {
            let file = request.dest.join(path);
            if let Some(parent) = file.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(file, contents)?;
        }
        Ok(())
    }

    async fn history(&self, checkout_dir: &Path) -> Result<Vec<CommitRecord>, BackendError> {
        let repo = self
            .history_for(checkout_dir)
            .ok_or_else(|| BackendError::CommandFailed {
                stderr: format!("{} is not a checkout", checkout_dir.display()),
            })?;
        if repo.history_fails {
            return Err(BackendError::CommandFailed {
                stderr: "git log failed: corrupt object".to_string(),
            });
        }
        Ok(repo.commits)
    }
}

pub fn ledger_store(dir: &Path) -> LedgerStore {
    LedgerStore::new(
        dir.join("config").join("ledger.json"),
        dir.join("fallback").join("ledger.json"),
    )
}
