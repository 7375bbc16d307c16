mod common;

use artisync_backend::{
    ArtifactSource, ArtifactStatus, BackendError, DEFAULT_ARTIFACT_PATTERN, Discovery,
    InstalledArtifact, ledger_key,
};
use artisync_core::{
    ArtifactCache, InstalledEntry, ItemOutcome, Ledger, ScanEvent, ScanOptions, SyncOrchestrator,
    match_installed, scan_all, scan_source,
};
use tempfile::tempdir;
use tokio::sync::mpsc;

use common::{FakeClient, FakeRepo, ledger_store};

const SRC: &str = "https://example.com/plugins.git";
const OTHER: &str = "https://example.com/other.git";

fn source(address: &str) -> ArtifactSource {
    ArtifactSource::new("Plugins", address, DEFAULT_ARTIFACT_PATTERN)
}

fn example_repo(revision: &str, contents: &[u8]) -> FakeRepo {
    FakeRepo::default()
        .file("libs/example.jar", contents)
        .file("README.md", b"docs")
        .commit(revision, &["libs/example.jar", "README.md"])
}

fn installed(entries: &[InstalledEntry]) -> Vec<InstalledArtifact> {
    entries
        .iter()
        .filter_map(InstalledEntry::as_artifact)
        .cloned()
        .collect()
}

#[tokio::test]
async fn scan_install_then_listing_reports_up_to_date() {
    let client = FakeClient::default().with_repo(SRC, example_repo("R1", b"v1"));
    let dir = tempdir().expect("create temp dir");
    let target = dir.path().join("target");
    std::fs::create_dir_all(&target).expect("create target dir");
    let store = ledger_store(dir.path());
    let options = ScanOptions::default();
    let mut ledger = store.load();

    let tracked = scan_source(&client, &source(SRC), &options)
        .await
        .expect("scan should succeed");
    assert_eq!(tracked.len(), 1);
    assert_eq!(tracked[0].relative_path, "libs/example.jar");
    assert_eq!(tracked[0].revision, "R1");
    assert_eq!(tracked[0].discovery, Discovery::Found);

    let orchestrator = SyncOrchestrator::new(&client, &store, Some(target.as_path()), &options);
    let report = orchestrator
        .install(&mut ledger, &tracked)
        .await
        .expect("install batch should run");

    assert_eq!(
        report.outcomes,
        vec![ItemOutcome::Installed {
            file_name: "example.jar".to_string(),
            revision: "R1".to_string(),
        }]
    );
    assert_eq!(
        std::fs::read(target.join("example.jar")).expect("read installed file"),
        b"v1"
    );
    let persisted = store.load();
    assert_eq!(persisted.get(&ledger_key(SRC, "libs/example.jar")), Some("R1"));

    let cache = ArtifactCache::new();
    cache.replace(SRC, tracked);
    let listing = installed(&match_installed(
        Some(target.as_path()),
        &cache.snapshot(),
        &persisted,
        &options.extension,
    ));
    assert_eq!(listing.len(), 1);
    assert_eq!(listing[0].file_name, "example.jar");
    assert_eq!(listing[0].status, ArtifactStatus::UpToDate);
}

#[tokio::test]
async fn newer_remote_revision_is_outdated_until_updated() {
    let client = FakeClient::default().with_repo(SRC, example_repo("R1", b"v1"));
    let dir = tempdir().expect("create temp dir");
    let target = dir.path().join("target");
    std::fs::create_dir_all(&target).expect("create target dir");
    std::fs::write(target.join("example.jar"), b"v0").expect("write old artifact");
    let store = ledger_store(dir.path());
    let options = ScanOptions::default();
    let mut ledger = Ledger::new();
    ledger.record(ledger_key(SRC, "libs/example.jar"), "R0");

    let cache = ArtifactCache::new();
    cache.replace(
        SRC,
        scan_source(&client, &source(SRC), &options)
            .await
            .expect("scan should succeed"),
    );
    let listing = installed(&match_installed(
        Some(target.as_path()),
        &cache.snapshot(),
        &ledger,
        &options.extension,
    ));
    assert_eq!(
        listing[0].status,
        ArtifactStatus::Outdated {
            ledger_revision: "R0".to_string()
        }
    );

    let orchestrator = SyncOrchestrator::new(&client, &store, Some(target.as_path()), &options);
    let report = orchestrator
        .update_all(&mut ledger, &listing)
        .await
        .expect("update batch should run");

    assert_eq!(report.failed(), 0);
    assert_eq!(ledger.get(&ledger_key(SRC, "libs/example.jar")), Some("R1"));
    assert_eq!(
        std::fs::read(target.join("example.jar")).expect("read updated file"),
        b"v1"
    );
    let refreshed = installed(&match_installed(
        Some(target.as_path()),
        &cache.snapshot(),
        &ledger,
        &options.extension,
    ));
    assert_eq!(refreshed[0].status, ArtifactStatus::UpToDate);
}

#[tokio::test]
async fn one_failing_item_does_not_abort_the_batch() {
    let client = FakeClient::default().with_repo(
        SRC,
        FakeRepo::default()
            .file("a.jar", b"a")
            .file("c.jar", b"c")
            .commit("R1", &["a.jar", "b.jar", "c.jar"]),
    );
    let dir = tempdir().expect("create temp dir");
    let target = dir.path().join("target");
    std::fs::create_dir_all(&target).expect("create target dir");
    let store = ledger_store(dir.path());
    let options = ScanOptions::default();
    let mut ledger = Ledger::new();

    let mut tracked = scan_source(&client, &source(SRC), &options)
        .await
        .expect("scan should succeed");
    let mut gone = tracked[0].clone();
    gone.relative_path = "b.jar".to_string();
    tracked.insert(1, gone);

    let (tx, mut rx) = mpsc::channel(16);
    let orchestrator =
        SyncOrchestrator::new(&client, &store, Some(target.as_path()), &options).with_progress(tx);
    let report = orchestrator
        .install(&mut ledger, &tracked)
        .await
        .expect("install batch should run");
    drop(orchestrator);

    assert_eq!(report.outcomes.len(), 3);
    assert_eq!(report.failed(), 1);
    assert!(matches!(
        &report.outcomes[1],
        ItemOutcome::Failed { file_name, message } if file_name == "b.jar" && message.contains("not found")
    ));
    assert!(target.join("a.jar").exists());
    assert!(target.join("c.jar").exists());
    assert_eq!(ledger.len(), 2);
    assert_eq!(store.load(), ledger);

    let mut labels = Vec::new();
    while let Some(progress) = rx.recv().await {
        labels.push(progress.label);
    }
    assert_eq!(
        labels,
        vec![
            "Installing a.jar (1/3)",
            "Installing b.jar (2/3)",
            "Installing c.jar (3/3)"
        ]
    );
}

#[tokio::test]
async fn installing_twice_leaves_the_same_state() {
    let client = FakeClient::default().with_repo(SRC, example_repo("R1", b"v1"));
    let dir = tempdir().expect("create temp dir");
    let target = dir.path().join("target");
    std::fs::create_dir_all(&target).expect("create target dir");
    let store = ledger_store(dir.path());
    let options = ScanOptions::default();
    let mut ledger = Ledger::new();
    let tracked = scan_source(&client, &source(SRC), &options)
        .await
        .expect("scan should succeed");
    let orchestrator = SyncOrchestrator::new(&client, &store, Some(target.as_path()), &options);

    orchestrator
        .install(&mut ledger, &tracked)
        .await
        .expect("first install should run");
    let first_ledger = ledger.clone();
    orchestrator
        .install(&mut ledger, &tracked)
        .await
        .expect("second install should run");

    assert_eq!(ledger, first_ledger);
    let files: Vec<_> = std::fs::read_dir(&target)
        .expect("list target dir")
        .filter_map(Result::ok)
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(files, vec!["example.jar"]);
    assert_eq!(
        std::fs::read(target.join("example.jar")).expect("read installed file"),
        b"v1"
    );
}

#[tokio::test]
async fn unset_target_fails_before_any_item() {
    let client = FakeClient::default().with_repo(SRC, example_repo("R1", b"v1"));
    let dir = tempdir().expect("create temp dir");
    let store = ledger_store(dir.path());
    let options = ScanOptions::default();
    let mut ledger = Ledger::new();
    let tracked = scan_source(&client, &source(SRC), &options)
        .await
        .expect("scan should succeed");
    let checkouts_after_scan = client.checkouts();

    let orchestrator = SyncOrchestrator::new(&client, &store, None, &options);
    let result = orchestrator.install(&mut ledger, &tracked).await;
    assert_eq!(result, Err(BackendError::TargetDirectoryUnset));

    assert_eq!(client.checkouts(), checkouts_after_scan);
    assert!(ledger.is_empty());
}

#[tokio::test]
async fn install_creates_configured_target_that_does_not_exist() {
    let client = FakeClient::default().with_repo(SRC, example_repo("R1", b"v1"));
    let dir = tempdir().expect("create temp dir");
    let target = dir.path().join("game").join("plugins");
    let store = ledger_store(dir.path());
    let options = ScanOptions::default();
    let mut ledger = Ledger::new();
    let tracked = scan_source(&client, &source(SRC), &options)
        .await
        .expect("scan should succeed");

    let orchestrator = SyncOrchestrator::new(&client, &store, Some(target.as_path()), &options);
    let report = orchestrator
        .install(&mut ledger, &tracked)
        .await
        .expect("install should create the target directory");

    assert_eq!(report.failed(), 0);
    assert_eq!(
        std::fs::read(target.join("example.jar")).expect("read installed file"),
        b"v1"
    );
    assert_eq!(ledger.get(&ledger_key(SRC, "libs/example.jar")), Some("R1"));
}

#[tokio::test]
async fn delete_requires_an_existing_target() {
    let client = FakeClient::default();
    let dir = tempdir().expect("create temp dir");
    let missing = dir.path().join("missing");
    let store = ledger_store(dir.path());
    let options = ScanOptions::default();
    let mut ledger = Ledger::new();

    let orchestrator = SyncOrchestrator::new(&client, &store, Some(missing.as_path()), &options);
    let result = orchestrator.delete(&mut ledger, &[]).await;

    assert_eq!(result, Err(BackendError::TargetDirectoryUnset));
    assert!(!missing.exists());
}

#[tokio::test]
async fn delete_removes_selected_files_and_ledger_keys() {
    let client = FakeClient::default().with_repo(SRC, example_repo("R1", b"v1"));
    let dir = tempdir().expect("create temp dir");
    let target = dir.path().join("target");
    std::fs::create_dir_all(&target).expect("create target dir");
    std::fs::write(target.join("local.jar"), b"mine").expect("write unmanaged file");
    let store = ledger_store(dir.path());
    let options = ScanOptions::default();
    let mut ledger = Ledger::new();
    let tracked = scan_source(&client, &source(SRC), &options)
        .await
        .expect("scan should succeed");
    let orchestrator = SyncOrchestrator::new(&client, &store, Some(target.as_path()), &options);
    orchestrator
        .install(&mut ledger, &tracked)
        .await
        .expect("install should run");

    let cache = ArtifactCache::new();
    cache.replace(SRC, tracked);
    let mut listing = installed(&match_installed(
        Some(target.as_path()),
        &cache.snapshot(),
        &ledger,
        &options.extension,
    ));
    for item in &mut listing {
        item.selected = item.file_name == "example.jar";
    }

    let report = orchestrator
        .delete(&mut ledger, &listing)
        .await
        .expect("delete batch should run");

    assert_eq!(
        report.outcomes,
        vec![ItemOutcome::Deleted {
            file_name: "example.jar".to_string()
        }]
    );
    assert!(!target.join("example.jar").exists());
    assert!(target.join("local.jar").exists());
    assert!(ledger.is_empty());
    assert!(store.load().is_empty());
}

#[tokio::test]
async fn update_selected_only_touches_selected_matched_files() {
    let client = FakeClient::default().with_repo(
        SRC,
        FakeRepo::default()
            .file("a.jar", b"a2")
            .file("b.jar", b"b2")
            .commit("R2", &["a.jar", "b.jar"]),
    );
    let dir = tempdir().expect("create temp dir");
    let target = dir.path().join("target");
    std::fs::create_dir_all(&target).expect("create target dir");
    for name in ["a.jar", "b.jar", "local.jar"] {
        std::fs::write(target.join(name), b"old").expect("write installed file");
    }
    let store = ledger_store(dir.path());
    let options = ScanOptions::default();
    let mut ledger = Ledger::new();
    let cache = ArtifactCache::new();
    cache.replace(
        SRC,
        scan_source(&client, &source(SRC), &options)
            .await
            .expect("scan should succeed"),
    );
    let mut listing = installed(&match_installed(
        Some(target.as_path()),
        &cache.snapshot(),
        &ledger,
        &options.extension,
    ));
    for item in &mut listing {
        item.selected = item.file_name != "b.jar";
    }

    let orchestrator = SyncOrchestrator::new(&client, &store, Some(target.as_path()), &options);
    let report = orchestrator
        .update_selected(&mut ledger, &listing)
        .await
        .expect("update batch should run");

    assert_eq!(report.outcomes.len(), 1);
    assert_eq!(report.outcomes[0].file_name(), "a.jar");
    assert_eq!(std::fs::read(target.join("a.jar")).expect("read a.jar"), b"a2");
    assert_eq!(std::fs::read(target.join("b.jar")).expect("read b.jar"), b"old");
    assert_eq!(
        std::fs::read(target.join("local.jar")).expect("read local.jar"),
        b"old"
    );
}

#[tokio::test]
async fn scan_pass_keeps_previous_entry_when_a_source_fails() {
    let client = FakeClient::default()
        .with_repo(SRC, example_repo("R1", b"v1"))
        .with_repo(OTHER, FakeRepo::default().file("other.jar", b"o"));
    let options = ScanOptions::default();
    let cache = ArtifactCache::new();
    let sources = vec![source(SRC), ArtifactSource::new("Other", OTHER, r".*\.jar$")];

    scan_all(&client, &sources, &options, &cache, |_| {}).await;
    assert_eq!(cache.get(OTHER).map(|artifacts| artifacts.len()), Some(1));

    client.remove_repo(OTHER);
    client.set_repo(SRC, example_repo("R2", b"v2"));
    let mut events = Vec::new();
    let summary = scan_all(&client, &sources, &options, &cache, |event| {
        events.push(event.clone());
    })
    .await;

    assert_eq!(summary.scanned, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(
        cache.get(SRC).expect("source entry should exist")[0].revision,
        "R2"
    );
    assert_eq!(cache.get(OTHER).map(|artifacts| artifacts.len()), Some(1));
    assert_eq!(events.len(), 4);
    assert_eq!(
        events[0].label().as_deref(),
        Some("Background scan: Plugins (1/2)")
    );
    assert!(matches!(&events[3], ScanEvent::Failed { name, .. } if name == "Other"));
}

#[tokio::test]
async fn completed_events_carry_cache_as_of_that_source() {
    let client = FakeClient::default()
        .with_repo(SRC, example_repo("R1", b"v1"))
        .with_repo(OTHER, FakeRepo::default().file("other.jar", b"o"));
    let options = ScanOptions::default();
    let cache = ArtifactCache::new();
    let sources = vec![source(SRC), ArtifactSource::new("Other", OTHER, r".*\.jar$")];
    let mut snapshots = Vec::new();

    scan_all(&client, &sources, &options, &cache, |event| {
        if let ScanEvent::Completed { name, snapshot, .. } = event {
            let addresses: Vec<String> =
                snapshot.iter().map(|(address, _)| address.clone()).collect();
            snapshots.push((name.clone(), addresses));
        }
    })
    .await;

    assert_eq!(
        snapshots,
        vec![
            ("Plugins".to_string(), vec![SRC.to_string()]),
            ("Other".to_string(), vec![SRC.to_string(), OTHER.to_string()]),
        ]
    );
}

#[tokio::test]
async fn invalid_pattern_fails_before_checkout() {
    let client = FakeClient::default().with_repo(SRC, example_repo("R1", b"v1"));
    let broken = ArtifactSource::new("Broken", SRC, "(unclosed");

    let result = scan_source(&client, &broken, &ScanOptions::default()).await;

    assert!(matches!(result, Err(BackendError::InvalidPattern { .. })));
    assert_eq!(client.checkouts(), 0);
}

#[tokio::test]
async fn unattributable_files_are_unknown() {
    let mut repo = example_repo("R1", b"v1").file("extra/Upper.JAR", b"x");
    repo.history_fails = true;
    let client = FakeClient::default().with_repo(SRC, repo);

    let tracked = scan_source(&client, &source(SRC), &ScanOptions::default())
        .await
        .expect("scan should succeed without history");

    let paths: Vec<&str> = tracked.iter().map(|a| a.relative_path.as_str()).collect();
    assert_eq!(paths, vec!["extra/Upper.JAR", "libs/example.jar"]);
    assert!(
        tracked
            .iter()
            .all(|a| a.discovery == Discovery::Unknown && a.revision.is_empty())
    );
}

#[tokio::test]
async fn unreachable_source_is_reported() {
    let client = FakeClient::default();

    let result = scan_source(&client, &source(SRC), &ScanOptions::default()).await;

    assert!(matches!(
        result,
        Err(BackendError::SourceUnreachable { ref address, .. }) if address == SRC
    ));
}
