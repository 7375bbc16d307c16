//! Where artisync writes its diagnostics: the rolling `debug.log` and the
//! per-panic crash reports, both under the data directory.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use simplelog::{
    ColorChoice, CombinedLogger, ConfigBuilder, LevelFilter, SharedLogger, TermLogger,
    TerminalMode, WriteLogger,
};

use artisync_platform::AppPaths;

const CRASH_REPORTS_KEPT: usize = 5;

/// Log file locations and the size cap applied at startup.
#[derive(Debug, Clone)]
pub struct LogFiles {
    paths: AppPaths,
    max_size: u64,
}

impl LogFiles {
    #[must_use]
    pub fn new(paths: &AppPaths, max_size: u64) -> Self {
        Self {
            paths: paths.clone(),
            max_size,
        }
    }

    #[must_use]
    pub fn log_file(&self) -> PathBuf {
        self.paths.log_file()
    }

    fn rotated_log_file(&self) -> PathBuf {
        self.log_file().with_extension("log.1")
    }

    /// Move an oversized `debug.log` aside so the run starts a fresh file.
    /// The previous rotation is replaced.
    fn rotate_if_oversized(&self) -> io::Result<bool> {
        let log_file = self.log_file();
        let size = match std::fs::metadata(&log_file) {
            Ok(metadata) => metadata.len(),
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(false),
            Err(error) => return Err(error),
        };
        if size <= self.max_size {
            return Ok(false);
        }
        std::fs::rename(&log_file, self.rotated_log_file())?;
        Ok(true)
    }

    /// Write `report` to a new `crash-<timestamp>.log` and return its path.
    pub fn write_crash_report(&self, report: &str) -> io::Result<PathBuf> {
        std::fs::create_dir_all(&self.paths.data_dir)?;
        let timestamp = chrono::Local::now().format("%Y%m%d-%H%M%S").to_string();
        let path = self.paths.crash_log_file(&timestamp);
        std::fs::write(&path, report)?;
        Ok(path)
    }

    /// Delete all but the newest `keep` crash reports. Report names embed a
    /// sortable timestamp, so name order is age order.
    fn prune_crash_reports(&self, keep: usize) -> io::Result<usize> {
        let mut reports: Vec<PathBuf> = std::fs::read_dir(&self.paths.data_dir)?
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| is_crash_report(path))
            .collect();
        reports.sort();
        let excess = reports.len().saturating_sub(keep);
        for path in &reports[..excess] {
            std::fs::remove_file(path)?;
        }
        Ok(excess)
    }
}

fn is_crash_report(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with("crash-") && name.ends_with(".log"))
}

/// Appends to the log file, reopening it when it has been removed.
struct LogSink {
    path: PathBuf,
    file: File,
}

impl LogSink {
    fn open(path: &Path) -> io::Result<Self> {
        Ok(Self {
            path: path.to_path_buf(),
            file: open_append(path)?,
        })
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

impl Write for LogSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if !self.path.exists() {
            self.file = open_append(&self.path)?;
        }
        self.file.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

/// Install the global logger and tidy the log directory.
///
/// Failing to open the log file is not fatal; the run continues with
/// whatever loggers could be built.
pub fn init(files: &LogFiles, verbose: bool) {
    let rotated = files.rotate_if_oversized();
    let pruned = files.prune_crash_reports(CRASH_REPORTS_KEPT);

    let config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .add_filter_allow_str("artisync")
        .build();
    let mut loggers: Vec<Box<dyn SharedLogger>> = Vec::new();

    match LogSink::open(&files.log_file()) {
        Ok(sink) => loggers.push(WriteLogger::new(LevelFilter::Debug, config.clone(), sink)),
        Err(error) => eprintln!(
            "artisync: cannot open {}: {error}",
            files.log_file().display()
        ),
    }
    if cfg!(debug_assertions) {
        loggers.push(TermLogger::new(
            LevelFilter::Debug,
            config,
            TerminalMode::Stderr,
            ColorChoice::Auto,
        ));
    }
    let _ = CombinedLogger::init(loggers);
    set_verbose(verbose);

    match rotated {
        Ok(true) => log::info!("Rotated oversized {}", files.log_file().display()),
        Ok(false) => {}
        Err(error) => log::warn!("Failed to rotate {}: {error}", files.log_file().display()),
    }
    match pruned {
        Ok(0) => {}
        Ok(count) => log::debug!("Removed {count} old crash reports"),
        Err(error) => log::warn!("Failed to prune crash reports: {error}"),
    }
}

/// Warnings and errors always reach the log; `verbose` adds debug detail.
pub fn set_verbose(verbose: bool) {
    log::set_max_level(if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    });
}
