use log::{debug, info};

use crate::client::GitClient;

/// Locate a `git` executable on `PATH`.
#[must_use]
pub fn detect_git() -> Option<GitClient> {
    match which::which("git") {
        Ok(path) => {
            info!("Found git at {}", path.display());
            Some(GitClient::new(path))
        }
        Err(error) => {
            debug!("git not found on PATH: {error}");
            None
        }
    }
}
