//! Dispatch of parsed CLI commands onto the controller, plus plain-text
//! rendering of its results.

use std::io::{BufRead, Write};

use log::warn;

use artisync_backend::{ArtifactSource, ArtifactStatus, TrackedArtifact};
use artisync_core::{
    BatchReport, DownloadProgress, InstalledEntry, ItemOutcome, ReleaseInfo, ScanEvent,
    SyncProgress, TrackedView,
};

use crate::app::{Controller, InstallOutcome, UpdateDecision, UpdatePrompt};
use crate::cli::{Commands, ConfigCommand, SourceArgs, SourcesCommand};
use crate::error::AppError;
use crate::logging;

pub async fn run(controller: &mut Controller, command: Commands) -> Result<(), AppError> {
    match command {
        Commands::Status => {
            scan_with_progress(controller).await?;
            print_listing(controller.listing());
        }
        Commands::Browse { source } => {
            let (source, artifacts) = controller.browse_source(&source).await?;
            println!("{} ({})", source.name, source.address);
            for (artifact, view) in &artifacts {
                println!("  {}", browse_line(artifact, view));
            }
            if artifacts.is_empty() {
                println!("  no artifacts match {}", source.pattern);
            }
        }
        Commands::Install {
            source,
            artifacts,
            all,
        } => {
            let (source, available) = controller.browse_source(&source).await?;
            let chosen = choose_artifacts(&source, available, &artifacts, all)?;
            let report = controller.install(&chosen, print_sync_progress).await?;
            print_report(&report);
        }
        Commands::Update { files, all } => {
            scan_with_progress(controller).await?;
            let report = if all {
                controller.update_all(print_sync_progress).await?
            } else {
                select_or_fail(controller, &files, "update")?;
                controller.update_selected(print_sync_progress).await?
            };
            print_report(&report);
        }
        Commands::Delete { files } => {
            scan_with_progress(controller).await?;
            select_or_fail(controller, &files, "delete")?;
            let report = controller.delete_selected(print_sync_progress).await?;
            print_report(&report);
        }
        Commands::CheckUpdate => match controller.check_for_app_update().await? {
            Some(release) => println!(
                "artisync {} is available (running {}): {}",
                release.tag,
                env!("CARGO_PKG_VERSION"),
                release.page_url
            ),
            None => println!("artisync {} is up to date", env!("CARGO_PKG_VERSION")),
        },
        Commands::SelfUpdate => self_update(controller).await?,
        Commands::Sources(command) => run_sources(controller, command)?,
        Commands::Config(command) => run_config(controller, command)?,
    }
    Ok(())
}

async fn scan_with_progress(controller: &mut Controller) -> Result<(), AppError> {
    let summary = controller
        .scan_all_sources(|event, _| match event {
            ScanEvent::Started { .. } => {
                if let Some(label) = event.label() {
                    eprintln!("{label}");
                }
            }
            ScanEvent::Completed {
                name, artifacts, ..
            } => eprintln!("  {name}: {artifacts} artifact(s)"),
            ScanEvent::Failed { name, message, .. } => eprintln!("  {name}: {message}"),
        })
        .await?;
    if summary.failed > 0 {
        warn!("{} source(s) could not be scanned", summary.failed);
    }
    Ok(())
}

fn select_or_fail(
    controller: &mut Controller,
    files: &[String],
    operation: &'static str,
) -> Result<(), AppError> {
    if files.is_empty() {
        return Err(AppError::nothing_to_do(operation));
    }
    let unmatched = controller.select_files(files);
    if !unmatched.is_empty() {
        return Err(AppError::message(format!(
            "Not installed in the target directory: {}",
            unmatched.join(", ")
        )));
    }
    Ok(())
}

fn choose_artifacts(
    source: &ArtifactSource,
    available: Vec<(TrackedArtifact, TrackedView)>,
    wanted: &[String],
    all: bool,
) -> Result<Vec<TrackedArtifact>, AppError> {
    let available: Vec<TrackedArtifact> =
        available.into_iter().map(|(artifact, _)| artifact).collect();
    if all {
        return if available.is_empty() {
            Err(AppError::nothing_to_do("install"))
        } else {
            Ok(available)
        };
    }
    if wanted.is_empty() {
        return Err(AppError::nothing_to_do("install"));
    }

    wanted
        .iter()
        .map(|name| {
            available
                .iter()
                .find(|artifact| {
                    artifact.relative_path == *name
                        || artifact.file_name().eq_ignore_ascii_case(name)
                })
                .cloned()
                .ok_or_else(|| {
                    AppError::message(format!("{} does not publish {name}", source.name))
                })
        })
        .collect()
}

fn browse_line(artifact: &TrackedArtifact, view: &TrackedView) -> String {
    let state = match view {
        TrackedView::Untracked => "not installed".to_string(),
        TrackedView::UpToDate => "up-to-date".to_string(),
        TrackedView::Outdated { ledger_revision } => {
            format!("outdated (installed {})", short_revision(ledger_revision))
        }
    };
    let revision = if artifact.revision.is_empty() {
        "unknown".to_string()
    } else {
        format!(
            "{} {}",
            short_revision(&artifact.revision),
            artifact.revision_date
        )
    };
    format!("{:<48} {revision:<22} {state}", artifact.relative_path)
}

fn short_revision(revision: &str) -> &str {
    revision.get(..10).unwrap_or(revision)
}

fn print_listing(listing: &[InstalledEntry]) {
    if listing.is_empty() {
        println!("No artifacts installed in the target directory");
    }
    for entry in listing {
        match entry {
            InstalledEntry::Diagnostic(message) => println!("{message}"),
            InstalledEntry::Artifact(artifact) => {
                let origin = artifact.matched.as_ref().map_or_else(String::new, |matched| {
                    format!("  <- {}", matched.relative_path)
                });
                println!(
                    "{:<40} {}{origin}",
                    artifact.file_name,
                    status_label(&artifact.status)
                );
            }
        }
    }
}

fn status_label(status: &ArtifactStatus) -> String {
    match status {
        ArtifactStatus::Outdated { ledger_revision } => {
            format!("Outdated (local {})", short_revision(ledger_revision))
        }
        other => other.to_string(),
    }
}

fn print_sync_progress(progress: &SyncProgress) {
    eprintln!("{}", progress.label);
}

fn print_report(report: &BatchReport) {
    for outcome in &report.outcomes {
        match outcome {
            ItemOutcome::Installed {
                file_name,
                revision,
            } if revision.is_empty() => println!("installed {file_name}"),
            ItemOutcome::Installed {
                file_name,
                revision,
            } => println!("installed {file_name} @ {}", short_revision(revision)),
            ItemOutcome::Deleted { file_name } => println!("deleted {file_name}"),
            ItemOutcome::Failed { file_name, message } => {
                println!("failed {file_name}: {message}");
            }
        }
    }
    println!("{} succeeded, {} failed", report.succeeded(), report.failed());
}

struct StdinPrompt;

impl UpdatePrompt for StdinPrompt {
    fn after_failure(&mut self, release: &ReleaseInfo, error: &AppError) -> UpdateDecision {
        eprintln!("{error}");
        eprint!(
            "Download of {} failed. [r]etry, [s]kip this version, or cancel? ",
            release.tag
        );
        let _ = std::io::stderr().flush();

        let mut answer = String::new();
        if std::io::stdin().lock().read_line(&mut answer).is_err() {
            return UpdateDecision::Cancel;
        }
        parse_decision(&answer)
    }
}

fn parse_decision(answer: &str) -> UpdateDecision {
    match answer.trim().to_ascii_lowercase().as_str() {
        "r" | "retry" => UpdateDecision::RetryAgain,
        "s" | "skip" => UpdateDecision::SkipVersion,
        _ => UpdateDecision::Cancel,
    }
}

async fn self_update(controller: &mut Controller) -> Result<(), AppError> {
    let Some(release) = controller.check_for_app_update().await? else {
        println!("artisync {} is up to date", env!("CARGO_PKG_VERSION"));
        return Ok(());
    };

    println!("Downloading {} ({})", release.tag, release.asset_name);
    let mut last_percent = None;
    let outcome = controller
        .install_app_update(
            &release,
            &mut StdinPrompt,
            |progress: DownloadProgress| {
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let percent = (progress.fraction() * 100.0) as u8;
                if last_percent != Some(percent) && percent % 10 == 0 {
                    eprintln!("  {percent}%");
                    last_percent = Some(percent);
                }
            },
            |path| open::that(path),
        )
        .await?;

    match outcome {
        InstallOutcome::Launched(path) => {
            println!("Started installer {}", path.display());
        }
        InstallOutcome::Skipped { version } => {
            println!("Skipping {version}; run `artisync config clear-skipped` to undo");
        }
    }
    Ok(())
}

fn run_sources(controller: &mut Controller, command: SourcesCommand) -> Result<(), AppError> {
    match command {
        SourcesCommand::List => {
            for (position, source) in controller.sources().sources().iter().enumerate() {
                println!(
                    "{:>2}. {:<16} {}  [{}]",
                    position + 1,
                    source.name,
                    source.address,
                    source.pattern
                );
            }
        }
        SourcesCommand::Add(args) => {
            controller.add_source(to_source(args))?;
            println!("Source added");
        }
        SourcesCommand::Edit { position, source } => {
            controller.edit_source(position, to_source(source))?;
            println!("Source {position} updated");
        }
        SourcesCommand::Remove { position } => {
            let removed = controller.remove_source(position)?;
            println!("Removed {}", removed.name);
        }
    }
    Ok(())
}

fn to_source(args: SourceArgs) -> ArtifactSource {
    ArtifactSource::new(args.name, args.address, args.pattern)
}

fn run_config(controller: &mut Controller, command: ConfigCommand) -> Result<(), AppError> {
    match command {
        ConfigCommand::Show => {
            let rendered = serde_json::to_string_pretty(controller.settings())
                .map_err(|error| AppError::message(error.to_string()))?;
            println!("{rendered}");
            println!("settings file: {}", controller.paths().settings_file().display());
            println!("log file: {}", controller.paths().log_file().display());
            println!("tracked artifacts: {}", controller.ledger().len());
        }
        ConfigCommand::SetTarget { dir } => {
            if !dir.is_dir() {
                return Err(AppError::message(format!(
                    "{} is not a directory",
                    dir.display()
                )));
            }
            let dir = std::fs::canonicalize(&dir).unwrap_or(dir);
            controller.update_settings(|settings| settings.target_dir = Some(dir))?;
        }
        ConfigCommand::SetExtension { extension } => {
            let extension = extension.trim().trim_start_matches('.').to_string();
            if extension.is_empty() {
                return Err(AppError::message("extension must not be empty"));
            }
            controller.update_settings(|settings| settings.artifact_extension = extension)?;
        }
        ConfigCommand::DebugLogging { enabled } => {
            controller.update_settings(|settings| settings.debug_logging = enabled)?;
            logging::set_verbose(enabled);
        }
        ConfigCommand::ClearSkipped => {
            controller.update_settings(|settings| settings.skipped_version = None)?;
        }
    }
    Ok(())
}
