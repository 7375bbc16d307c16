use std::path::Path;
use std::process::Command;

use artisync_backend::{ArtifactSource, Discovery, ledger_key};
use artisync_core::{Ledger, LedgerStore, ScanOptions, SyncOrchestrator, scan_source};
use artisync_git::{GitClient, detect_git};
use tempfile::tempdir;

fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args([
            "-c",
            "user.name=artisync",
            "-c",
            "user.email=artisync@example.invalid",
            "-c",
            "commit.gpgsign=false",
        ])
        .args(args)
        .current_dir(dir)
        .output()
        .expect("run git");
    assert!(
        output.status.success(),
        "git {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

fn remote_with_example_jar(root: &Path) -> (String, String) {
    let remote = root.join("remote");
    std::fs::create_dir_all(remote.join("libs")).expect("create remote dirs");
    git(&remote, &["init", "--quiet"]);
    std::fs::write(remote.join("libs").join("example.jar"), b"v1").expect("write jar");
    std::fs::write(remote.join("README.md"), b"docs").expect("write readme");
    git(&remote, &["add", "."]);
    git(&remote, &["commit", "--quiet", "-m", "add example"]);
    let revision = git(&remote, &["rev-parse", "HEAD"]);
    (remote.to_string_lossy().into_owned(), revision)
}

#[tokio::test]
async fn local_repository_scan_and_install() {
    let Some(client) = detect_git() else {
        eprintln!("git not found, skipping");
        return;
    };
    run_scan_and_install(&client).await;
}

async fn run_scan_and_install(client: &GitClient) {
    let dir = tempdir().expect("create temp dir");
    let (address, revision) = remote_with_example_jar(dir.path());
    let source = ArtifactSource::new("Local", address.clone(), r".*\.jar$");
    let options = ScanOptions::default();

    let tracked = scan_source(client, &source, &options)
        .await
        .expect("scan of local repository should succeed");

    assert_eq!(tracked.len(), 1);
    assert_eq!(tracked[0].relative_path, "libs/example.jar");
    assert_eq!(tracked[0].revision, revision);
    assert_eq!(tracked[0].discovery, Discovery::Found);
    assert!(!tracked[0].revision_date.is_empty());

    let target = dir.path().join("target");
    std::fs::create_dir_all(&target).expect("create target dir");
    let store = LedgerStore::new(
        dir.path().join("config").join("ledger.json"),
        dir.path().join("fallback").join("ledger.json"),
    );
    let mut ledger = Ledger::new();
    let report = SyncOrchestrator::new(client, &store, Some(target.as_path()), &options)
        .install(&mut ledger, &tracked)
        .await
        .expect("install should run");

    assert_eq!(report.failed(), 0);
    assert_eq!(
        std::fs::read(target.join("example.jar")).expect("read installed jar"),
        b"v1"
    );
    assert_eq!(
        store.load().get(&ledger_key(&address, "libs/example.jar")),
        Some(revision.as_str())
    );
}
