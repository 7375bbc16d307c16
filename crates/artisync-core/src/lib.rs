//! Core sync engine for artisync.
//!
//! Everything here is independent of the front end and of the concrete
//! version-control client:
//! - Repository scanning and revision attribution over a disposable checkout.
//! - The commit-state ledger and the in-memory artifact cache.
//! - Installed-set matching and the install/update/delete orchestrator.
//! - Release feed lookup, version comparison, and chunked downloads for
//!   self-updates.

pub mod cache;
mod checkout;
pub mod download;
mod fsutil;
pub mod ledger;
pub mod matcher;
pub mod orchestrator;
pub mod retry;
pub mod scan_pass;
pub mod scanner;
pub mod sources;
pub mod update;
pub mod version;

/// Per-source scan cache shared between the scan pass and the listing.
pub use cache::{ArtifactCache, CacheSnapshot};
/// Disposable shallow checkout and the sparse patterns it is taken with.
pub use checkout::{DisposableCheckout, sparse_patterns_for};
/// Streaming download helper and digest verification.
pub use download::{DownloadProgress, TransferError, download_to, verify_sha256};
/// Atomic temp-file-and-rename write used for every persisted file.
pub use fsutil::write_atomic;
/// Durable revision ledger and its on-disk store.
pub use ledger::{Ledger, LedgerError, LedgerStore};
/// Installed listing correlation against scan results.
pub use matcher::{InstalledEntry, TrackedView, match_installed, restore_selection, tracked_view};
/// Batch install/update/delete with progress and per-item outcomes.
pub use orchestrator::{BatchReport, ItemOutcome, SyncOrchestrator, SyncProgress, fetch_artifact};
/// Bounded retry with fixed delays.
pub use retry::{DEFAULT_RETRY_DELAYS_SECS, retry_with_delays};
/// Sequential scan of every configured source.
pub use scan_pass::{ScanEvent, ScanSummary, scan_all, scan_into_cache};
/// Single-source scan and pattern compilation.
pub use scanner::{
    DEFAULT_ARTIFACT_EXTENSION, ScanOptions, attribute_revisions, compile_pattern, scan_source,
};
/// Persisted source list with built-in defaults.
pub use sources::{SourceError, SourceList};
/// Release feed model, asset selection, and update check.
pub use update::{
    GitHubAsset, GitHubRelease, InstallerPlatform, ReleaseFeed, ReleaseInfo, UpdateCheck,
    UpdateError, check_for_update, fetch_latest_release, select_asset,
};
/// Version normalization and comparison.
pub use version::{is_development_build, is_newer_version, parse_version};
