use semver::Version;
use serde::Deserialize;
use thiserror::Error;

use crate::version::{is_development_build, is_newer_version, parse_version};

pub const GITHUB_API: &str = "https://api.github.com";

/// Application-level release metadata for a self-update prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseInfo {
    pub tag: String,
    /// Normalized form of `tag`, `None` when the tag carries no version.
    pub version: Option<Version>,
    pub page_url: String,
    pub asset_url: String,
    pub asset_name: String,
    pub asset_size: Option<u64>,
    pub asset_sha256: Option<String>,
}

/// Outcome of a self-update check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateCheck {
    DevelopmentBuild,
    UpToDate,
    Skipped { version: String },
    NoActionableRelease,
    Available(ReleaseInfo),
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitHubAsset {
    pub name: String,
    pub browser_download_url: String,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub digest: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitHubRelease {
    pub tag_name: String,
    #[serde(default)]
    pub html_url: String,
    #[serde(default)]
    pub assets: Vec<GitHubAsset>,
}

/// Release feed coordinates: `<api_base>/repos/<owner>/<repo>/releases/latest`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseFeed {
    pub api_base: String,
    pub owner: String,
    pub repo: String,
}

impl ReleaseFeed {
    pub fn github(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            api_base: GITHUB_API.to_string(),
            owner: owner.into(),
            repo: repo.into(),
        }
    }

    #[must_use]
    pub fn latest_url(&self) -> String {
        format!(
            "{}/repos/{}/{}/releases/latest",
            self.api_base.trim_end_matches('/'),
            self.owner,
            self.repo
        )
    }
}

#[derive(Debug, Error)]
pub enum UpdateError {
    #[error("release feed unavailable: {0}")]
    FeedUnavailable(#[source] reqwest::Error),
    #[error("release feed returned HTTP {status}{body_snippet}")]
    HttpStatus {
        status: reqwest::StatusCode,
        body_snippet: String,
    },
    #[error("failed to parse release feed response: {0}")]
    Parse(#[source] reqwest::Error),
}

/// Installer naming conventions for one operating system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstallerPlatform {
    pub tokens: &'static [&'static str],
    pub extensions: &'static [&'static str],
}

impl InstallerPlatform {
    pub const WINDOWS: Self = Self {
        tokens: &["win-x64", "windows-x64", "win64"],
        extensions: &["exe", "msi"],
    };
    pub const MACOS: Self = Self {
        tokens: &["osx", "macos", "darwin"],
        extensions: &["dmg", "pkg"],
    };
    pub const LINUX: Self = Self {
        tokens: &["linux"],
        extensions: &["appimage", "deb", "rpm"],
    };

    #[must_use]
    pub fn current() -> Self {
        if cfg!(target_os = "macos") {
            Self::MACOS
        } else if cfg!(target_os = "windows") {
            Self::WINDOWS
        } else {
            Self::LINUX
        }
    }

    fn is_installer_type(&self, name: &str) -> bool {
        let lower = name.to_ascii_lowercase();
        self.extensions
            .iter()
            .any(|ext| lower.ends_with(&format!(".{ext}")))
    }

    fn is_platform_installer(&self, name: &str) -> bool {
        let lower = name.to_ascii_lowercase();
        let marked = lower.contains("setup") || lower.contains("installer");
        marked
            && self.tokens.iter().any(|token| lower.contains(token))
            && self.is_installer_type(&lower)
    }
}

/// Pick the installable asset: a platform-specific installer package first,
/// then the first asset of a recognized installer type.
#[must_use]
pub fn select_asset<'a>(
    assets: &'a [GitHubAsset],
    platform: &InstallerPlatform,
) -> Option<&'a GitHubAsset> {
    assets
        .iter()
        .find(|asset| platform.is_platform_installer(&asset.name))
        .or_else(|| {
            assets
                .iter()
                .find(|asset| platform.is_installer_type(&asset.name))
        })
}

fn release_info_from(release: GitHubRelease, platform: &InstallerPlatform) -> Option<ReleaseInfo> {
    let asset = select_asset(&release.assets, platform)?;
    Some(ReleaseInfo {
        version: parse_version(&release.tag_name),
        tag: release.tag_name.clone(),
        page_url: release.html_url.clone(),
        asset_url: asset.browser_download_url.clone(),
        asset_name: asset.name.clone(),
        asset_size: asset.size,
        asset_sha256: asset.digest.as_deref().and_then(parse_sha256_digest),
    })
}

/// Fetch the most recent published release and its installable asset.
///
/// Returns `Ok(None)` when the release carries no asset this platform can
/// install.
///
/// # Errors
/// Returns an error when the feed request fails, answers with a non-success
/// status, or the body cannot be parsed.
pub async fn fetch_latest_release(
    client: &reqwest::Client,
    feed: &ReleaseFeed,
    platform: &InstallerPlatform,
) -> Result<Option<ReleaseInfo>, UpdateError> {
    let url = feed.latest_url();
    log::debug!("Querying release feed {url}");

    let response = client
        .get(&url)
        .header("User-Agent", concat!("artisync/", env!("CARGO_PKG_VERSION")))
        .header("Accept", "application/vnd.github+json")
        .send()
        .await
        .map_err(UpdateError::FeedUnavailable)?;

    if !response.status().is_success() {
        let status = response.status();
        let body_snippet = response
            .text()
            .await
            .ok()
            .map(|body| response_snippet(&body, 160))
            .unwrap_or_default();
        return Err(UpdateError::HttpStatus {
            status,
            body_snippet,
        });
    }

    let release: GitHubRelease = response.json().await.map_err(UpdateError::Parse)?;
    Ok(release_info_from(release, platform))
}

/// Check the feed for a release newer than `current_version`.
///
/// # Errors
/// Propagates [`fetch_latest_release`] failures.
pub async fn check_for_update(
    client: &reqwest::Client,
    feed: &ReleaseFeed,
    current_version: &str,
    skipped_version: Option<&str>,
) -> Result<UpdateCheck, UpdateError> {
    if is_development_build(current_version) {
        log::debug!("Skipping update check for development build {current_version}");
        return Ok(UpdateCheck::DevelopmentBuild);
    }

    let Some(release) = fetch_latest_release(client, feed, &InstallerPlatform::current()).await?
    else {
        return Ok(UpdateCheck::NoActionableRelease);
    };

    Ok(classify_release(release, current_version, skipped_version))
}

fn classify_release(
    release: ReleaseInfo,
    current_version: &str,
    skipped_version: Option<&str>,
) -> UpdateCheck {
    if !is_newer_version(&release.tag, current_version) {
        return UpdateCheck::UpToDate;
    }

    let skipped = skipped_version
        .and_then(parse_version)
        .is_some_and(|skipped| release.version.as_ref() == Some(&skipped));
    if skipped {
        return UpdateCheck::Skipped {
            version: release.tag,
        };
    }

    UpdateCheck::Available(release)
}

fn response_snippet(body: &str, max_chars: usize) -> String {
    let snippet: String = body.chars().take(max_chars).collect();
    if snippet.is_empty() {
        String::new()
    } else {
        format!(": {snippet}")
    }
}

fn parse_sha256_digest(digest: &str) -> Option<String> {
    let (algorithm, hash) = digest.split_once(':')?;
    if !algorithm.eq_ignore_ascii_case("sha256") {
        return None;
    }
    if hash.len() != 64 || !hash.chars().all(|ch| ch.is_ascii_hexdigit()) {
        return None;
    }
    Some(hash.to_ascii_lowercase())
}
