//! Checking for a newer artisync release and launching its installer.

use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use tokio::sync::mpsc;

use artisync_core::{
    DownloadProgress, ReleaseInfo, UpdateCheck, check_for_update, download_to, retry_with_delays,
    verify_sha256,
};

use crate::error::AppError;

use super::Controller;

/// What to do once every download attempt has failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateDecision {
    RetryAgain,
    SkipVersion,
    Cancel,
}

pub trait UpdatePrompt {
    fn after_failure(&mut self, release: &ReleaseInfo, error: &AppError) -> UpdateDecision;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    Launched(PathBuf),
    Skipped { version: String },
}

impl Controller {
    /// Ask the release feed for an installable release newer than this
    /// build. Development builds and the skipped version yield `None`.
    pub async fn check_for_app_update(&self) -> Result<Option<ReleaseInfo>, AppError> {
        let check = check_for_update(
            &self.http_client,
            &self.release_feed(),
            env!("CARGO_PKG_VERSION"),
            self.settings.skipped_version.as_deref(),
        )
        .await
        .map_err(AppError::update_check_failed)?;
        Ok(actionable(check))
    }

    /// Download `release` into the downloads directory and launch it.
    ///
    /// Each round makes one attempt per configured retry delay. When a round
    /// fails, `prompt` decides whether to run another round, skip this
    /// version for good, or give up.
    pub async fn install_app_update(
        &mut self,
        release: &ReleaseInfo,
        prompt: &mut dyn UpdatePrompt,
        mut on_progress: impl FnMut(DownloadProgress),
        launch: impl Fn(&Path) -> std::io::Result<()>,
    ) -> Result<InstallOutcome, AppError> {
        let dest = self.paths.downloads_dir().join(installer_file_name(release));

        loop {
            match self
                .download_with_retries(release, &dest, &mut on_progress)
                .await
            {
                Ok(path) => {
                    info!("Launching installer {}", path.display());
                    launch(&path).map_err(|error| AppError::auto_update_failed("launch", error))?;
                    return Ok(InstallOutcome::Launched(path));
                }
                Err(error) => {
                    warn!("Update to {} failed: {error}", release.tag);
                    match prompt.after_failure(release, &error) {
                        UpdateDecision::RetryAgain => {}
                        UpdateDecision::SkipVersion => {
                            let version = release.tag.clone();
                            self.update_settings(|settings| {
                                settings.skipped_version = Some(version.clone());
                            })?;
                            return Ok(InstallOutcome::Skipped { version });
                        }
                        UpdateDecision::Cancel => return Err(error),
                    }
                }
            }
        }
    }

    async fn download_with_retries(
        &self,
        release: &ReleaseInfo,
        dest: &Path,
        on_progress: &mut impl FnMut(DownloadProgress),
    ) -> Result<PathBuf, AppError> {
        let client = &self.http_client;
        let delays = &self.settings.retry_delays_secs;
        let (tx, mut rx) = mpsc::channel(32);

        let attempts = async move {
            retry_with_delays("App update download", delays, || {
                download_verified(client, release, dest, &tx)
            })
            .await
        };
        let progress = async {
            while let Some(event) = rx.recv().await {
                on_progress(event);
            }
        };

        let (result, ()) = tokio::join!(attempts, progress);
        result.unwrap_or_else(|| {
            Err(AppError::auto_update_failed(
                "download",
                "no download attempts are configured",
            ))
        })
    }
}

fn actionable(check: UpdateCheck) -> Option<ReleaseInfo> {
    match check {
        UpdateCheck::Available(release) => Some(release),
        UpdateCheck::Skipped { version } => {
            info!("Newer release {version} was skipped earlier");
            None
        }
        UpdateCheck::DevelopmentBuild | UpdateCheck::UpToDate | UpdateCheck::NoActionableRelease => {
            debug!("No app update to offer: {check:?}");
            None
        }
    }
}

fn installer_file_name(release: &ReleaseInfo) -> String {
    Path::new(&release.asset_name)
        .file_name()
        .and_then(|name| name.to_str())
        .filter(|name| !name.is_empty())
        .map_or_else(|| format!("artisync-{}-installer", release.tag), str::to_string)
}

async fn download_verified(
    client: &reqwest::Client,
    release: &ReleaseInfo,
    dest: &Path,
    progress: &mpsc::Sender<DownloadProgress>,
) -> Result<PathBuf, AppError> {
    download_to(client, &release.asset_url, dest, progress)
        .await
        .map_err(|error| AppError::auto_update_failed("download", error))?;

    if let Some(expected) = &release.asset_sha256
        && let Err(error) = verify_sha256(dest, expected)
    {
        let _ = std::fs::remove_file(dest);
        return Err(AppError::auto_update_failed("verify", error));
    }

    Ok(dest.to_path_buf())
}
