mod app;
mod cli;
mod commands;
mod crash;
mod error;
mod logging;
mod settings;
mod single_instance;

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use log::{error, info, warn};

use artisync_backend::RepositoryClient;
use artisync_platform::AppPaths;

use crate::app::Controller;
use crate::cli::{Cli, Commands};
use crate::settings::AppSettings;
use crate::single_instance::{AcquireError, SingleInstance};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let paths = match AppPaths::new() {
        Ok(paths) => paths,
        Err(error) => {
            eprintln!("artisync: {error}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(error) = paths.ensure_dirs() {
        eprintln!("artisync: failed to create application directories: {error}");
        return ExitCode::FAILURE;
    }

    let settings = AppSettings::load(&paths);
    let log_files = logging::LogFiles::new(&paths, settings.max_log_size_bytes);
    logging::init(&log_files, settings.debug_logging || cli.debug);
    crash::install_panic_hook(&log_files);
    info!("artisync {} starting", env!("CARGO_PKG_VERSION"));

    let _instance = match SingleInstance::acquire(&paths.instance_lock_file()) {
        Ok(guard) => guard,
        Err(AcquireError::AlreadyRunning) => {
            eprintln!("artisync: another artisync process is already running");
            return ExitCode::FAILURE;
        }
        Err(error) => {
            error!("Failed to acquire single-instance lock: {error}");
            eprintln!("artisync: {error}");
            return ExitCode::FAILURE;
        }
    };

    let client = artisync_git::detect_git().map(|git| Arc::new(git) as Arc<dyn RepositoryClient>);
    if client.is_none() {
        warn!("git executable not found; repository scans are unavailable");
    }

    let mut controller = match Controller::new(paths, settings, client) {
        Ok(controller) => controller.with_target_override(cli.target),
        Err(error) => {
            error!("{error}");
            eprintln!("artisync: {error}");
            return ExitCode::FAILURE;
        }
    };

    let command = cli.command.unwrap_or(Commands::Status);
    match commands::run(&mut controller, command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            error!("{error}");
            eprintln!("artisync: {error}");
            ExitCode::FAILURE
        }
    }
}
