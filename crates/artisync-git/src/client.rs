use async_trait::async_trait;
use log::{debug, error, info, trace, warn};
use std::path::{Path, PathBuf};
use tokio::process::Command;

use artisync_backend::{BackendError, CheckoutRequest, CommitRecord, RepositoryClient};

use crate::command::HideWindow;
use crate::history::{HISTORY_FORMAT, parse_history};

#[derive(Debug, Clone)]
pub struct GitClient {
    path: PathBuf,
}

impl GitClient {
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Report the `git --version` string of the wrapped executable.
    ///
    /// # Errors
    /// Returns an error when the executable cannot be spawned or exits
    /// unsuccessfully.
    pub async fn version(&self) -> Result<String, BackendError> {
        let cwd = std::env::temp_dir();
        let output = self.execute(&cwd, &["--version"]).await?;
        Ok(output.trim().to_string())
    }

    fn build_command(&self, dir: &Path, args: &[&str]) -> Command {
        debug!(
            "Building git command in {}: {} {}",
            dir.display(),
            self.path.display(),
            args.join(" ")
        );

        let mut cmd = Command::new(&self.path);
        cmd.args(args)
            .current_dir(dir)
            .env("GIT_TERMINAL_PROMPT", "0")
            .kill_on_drop(true);
        cmd.hide_window();
        cmd
    }

    async fn execute(&self, dir: &Path, args: &[&str]) -> Result<String, BackendError> {
        info!("Executing git command: {}", args.join(" "));

        let output = self.build_command(dir, args).output().await?;

        debug!("git command exit status: {:?}", output.status);
        trace!("git stdout: {}", String::from_utf8_lossy(&output.stdout));

        if !output.stderr.is_empty() {
            trace!("git stderr: {}", String::from_utf8_lossy(&output.stderr));
        }

        if output.status.success() {
            let stdout = String::from_utf8_lossy(&output.stdout).to_string();
            debug!("git command succeeded, output: {} bytes", stdout.len());
            Ok(stdout)
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            error!("git command failed: args={args:?}, stderr='{stderr}'");
            Err(BackendError::CommandFailed {
                stderr: format!("git {} failed: {stderr}", args.first().unwrap_or(&"")),
            })
        }
    }

    async fn sparse_checkout(&self, request: CheckoutRequest<'_>) -> Result<(), BackendError> {
        let dest = request.dest;
        self.execute(dest, &["init", "--quiet"]).await?;
        self.execute(dest, &["config", "core.sparseCheckout", "true"])
            .await?;

        let sparse_file = dest.join(".git").join("info").join("sparse-checkout");
        if let Some(parent) = sparse_file.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|error| {
                BackendError::io_with_path("failed to create", parent, &error)
            })?;
        }
        let mut patterns = request.sparse_patterns.join("\n");
        patterns.push('\n');
        tokio::fs::write(&sparse_file, patterns)
            .await
            .map_err(|error| BackendError::io_with_path("failed to write", &sparse_file, &error))?;

        self.execute(dest, &["remote", "add", "origin", request.address])
            .await?;
        self.execute(dest, &["fetch", "--depth", "1", "origin"])
            .await?;
        self.execute(dest, &["checkout", "--quiet", "FETCH_HEAD"])
            .await?;
        Ok(())
    }

    async fn shallow_clone(&self, request: CheckoutRequest<'_>) -> Result<(), BackendError> {
        self.execute(
            request.dest,
            &["clone", "--quiet", "--depth", "1", "--", request.address, "."],
        )
        .await
        .map(|_| ())
    }
}

async fn reset_dir(dir: &Path) -> Result<(), BackendError> {
    if dir.exists() {
        tokio::fs::remove_dir_all(dir)
            .await
            .map_err(|error| BackendError::io_with_path("failed to clear", dir, &error))?;
    }
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|error| BackendError::io_with_path("failed to recreate", dir, &error))
}

#[async_trait]
impl RepositoryClient for GitClient {
    fn name(&self) -> &'static str {
        "git"
    }

    async fn checkout(&self, request: CheckoutRequest<'_>) -> Result<(), BackendError> {
        info!(
            "Checking out {} into {}",
            request.address,
            request.dest.display()
        );

        if !request.sparse_patterns.is_empty() {
            match self.sparse_checkout(request).await {
                Ok(()) => return Ok(()),
                Err(error) => {
                    warn!(
                        "Sparse checkout of {} failed, falling back to shallow clone: {error}",
                        request.address
                    );
                    reset_dir(request.dest).await?;
                }
            }
        }

        self.shallow_clone(request)
            .await
            .map_err(|error| BackendError::source_unreachable(request.address, error.to_string()))
    }

    async fn history(&self, checkout_dir: &Path) -> Result<Vec<CommitRecord>, BackendError> {
        let output = self
            .execute(
                checkout_dir,
                &[
                    "-c",
                    "core.quotePath=false",
                    "log",
                    "--all",
                    "--name-only",
                    HISTORY_FORMAT,
                ],
            )
            .await?;
        let commits = parse_history(&output);
        debug!(
            "Parsed {} commits from history of {}",
            commits.len(),
            checkout_dir.display()
        );
        Ok(commits)
    }
}
