use std::path::Path;

use log::debug;
use tempfile::TempDir;

use artisync_backend::{BackendError, CheckoutRequest, RepositoryClient};

/// Shallow repository copy in a private temp directory, removed on drop so
/// every exit path of a scan or fetch cleans up after itself.
#[derive(Debug)]
pub struct DisposableCheckout {
    dir: TempDir,
}

impl DisposableCheckout {
    /// Create an empty temp directory and populate it through `client`.
    ///
    /// # Errors
    /// Returns `SourceUnreachable` when the checkout cannot be obtained, or
    /// an IO error when the temp directory cannot be created.
    pub async fn acquire(
        client: &dyn RepositoryClient,
        address: &str,
        sparse_patterns: &[String],
    ) -> Result<Self, BackendError> {
        let dir = tempfile::Builder::new()
            .prefix("artisync-")
            .tempdir()
            .map_err(|error| {
                BackendError::io_with_path("failed to create", &std::env::temp_dir(), &error)
            })?;
        debug!("Acquiring checkout of {address} in {}", dir.path().display());

        client
            .checkout(CheckoutRequest {
                address,
                dest: dir.path(),
                sparse_patterns,
            })
            .await
            .map_err(|error| match error {
                BackendError::SourceUnreachable { .. } => error,
                other => BackendError::source_unreachable(address, other.to_string()),
            })?;

        Ok(Self { dir })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

/// Sparse-checkout patterns selecting every file with `extension` at any depth.
#[must_use]
pub fn sparse_patterns_for(extension: &str) -> Vec<String> {
    let extension = extension.trim_start_matches('.');
    if extension.is_empty() {
        return Vec::new();
    }
    vec![format!("*.{extension}"), format!("**/*.{extension}")]
}
