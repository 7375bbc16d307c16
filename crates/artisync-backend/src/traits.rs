use async_trait::async_trait;
use std::path::Path;

use crate::error::BackendError;
use crate::types::CommitRecord;

/// Parameters for materializing a disposable copy of a remote repository.
#[derive(Debug, Clone, Copy)]
pub struct CheckoutRequest<'a> {
    pub address: &'a str,
    /// Existing, empty directory the copy is written into.
    pub dest: &'a Path,
    /// Sparse-checkout patterns; empty means the whole tree.
    pub sparse_patterns: &'a [String],
}

/// Narrow interface over the external version-control client.
///
/// Implementations never own the checkout directory: callers create it,
/// and callers remove it.
#[async_trait]
pub trait RepositoryClient: Send + Sync {
    fn name(&self) -> &'static str;

    /// Populate `request.dest` with a shallow copy of the remote.
    async fn checkout(&self, request: CheckoutRequest<'_>) -> Result<(), BackendError>;

    /// Full history of a checkout in a single query, most recent commit
    /// first, each commit listing the paths it touched.
    async fn history(&self, checkout_dir: &Path) -> Result<Vec<CommitRecord>, BackendError>;
}
