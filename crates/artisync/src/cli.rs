//! Command-line surface of the `artisync` binary.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Track and sync build artifacts published in git repositories
#[derive(Parser, Debug)]
#[command(name = "artisync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Use this directory instead of the configured target directory
    #[arg(short, long, global = true, value_name = "DIR")]
    pub target: Option<PathBuf>,

    /// Record debug detail in the log file for this run
    #[arg(long, global = true)]
    pub debug: bool,

    /// The command to run (defaults to `status`)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Scan every source and show the installed files with their sync state
    Status,

    /// Show the artifacts one source publishes and whether they are synced
    Browse {
        /// Source name or address
        source: String,
    },

    /// Install artifacts from a source into the target directory
    ///
    /// Examples:
    ///   artisync install Fru --all
    ///   artisync install Fru libs/example.jar other.jar
    Install {
        /// Source name or address
        source: String,

        /// Repository paths or file names to install
        artifacts: Vec<String>,

        /// Install everything the source publishes
        #[arg(long, conflicts_with = "artifacts")]
        all: bool,
    },

    /// Re-fetch installed files from the source they match
    Update {
        /// Installed file names to update
        files: Vec<String>,

        /// Update every matched file
        #[arg(long, conflicts_with = "files")]
        all: bool,
    },

    /// Remove installed files and forget their sync state
    Delete {
        /// Installed file names to delete
        #[arg(required = true)]
        files: Vec<String>,
    },

    /// Check whether a newer artisync release is available
    CheckUpdate,

    /// Download and launch the newest artisync installer
    SelfUpdate,

    /// Manage artifact sources
    #[command(subcommand)]
    Sources(SourcesCommand),

    /// Show or change settings
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum SourcesCommand {
    /// List configured sources
    List,

    /// Add a source
    Add(SourceArgs),

    /// Replace the source at a position
    Edit {
        /// One-based position shown by `sources list`
        position: usize,

        #[command(flatten)]
        source: SourceArgs,
    },

    /// Remove the source at a position
    Remove {
        /// One-based position shown by `sources list`
        position: usize,
    },
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct SourceArgs {
    /// Display name
    pub name: String,

    /// Repository address
    pub address: String,

    /// Regular expression over repository paths
    #[arg(short, long, default_value = "")]
    pub pattern: String,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ConfigCommand {
    /// Print the current settings
    Show,

    /// Set the directory artifacts are installed into
    SetTarget { dir: PathBuf },

    /// Set the artifact file extension
    SetExtension { extension: String },

    /// Turn persistent debug logging on or off
    DebugLogging {
        #[arg(action = clap::ArgAction::Set)]
        enabled: bool,
    },

    /// Forget a previously skipped app version
    ClearSkipped,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_means_status() {
        let cli = Cli::try_parse_from(["artisync"]).expect("bare invocation should parse");
        assert!(cli.command.is_none());
        assert!(cli.target.is_none());
    }

    #[test]
    fn install_all_conflicts_with_explicit_artifacts() {
        assert!(Cli::try_parse_from(["artisync", "install", "Fru", "a.jar", "--all"]).is_err());

        let cli = Cli::try_parse_from(["artisync", "install", "Fru", "--all", "-t", "/srv/p"])
            .expect("install --all should parse");
        assert_eq!(cli.target, Some(PathBuf::from("/srv/p")));
        assert_eq!(
            cli.command,
            Some(Commands::Install {
                source: "Fru".to_string(),
                artifacts: Vec::new(),
                all: true,
            })
        );
    }

    #[test]
    fn delete_requires_file_names() {
        assert!(Cli::try_parse_from(["artisync", "delete"]).is_err());
    }

    #[test]
    fn sources_edit_takes_position_and_fields() {
        let cli = Cli::try_parse_from([
            "artisync",
            "sources",
            "edit",
            "2",
            "Mine",
            "https://example.com/mine.git",
            "--pattern",
            r".*\.zip$",
        ])
        .expect("sources edit should parse");

        assert_eq!(
            cli.command,
            Some(Commands::Sources(SourcesCommand::Edit {
                position: 2,
                source: SourceArgs {
                    name: "Mine".to_string(),
                    address: "https://example.com/mine.git".to_string(),
                    pattern: r".*\.zip$".to_string(),
                },
            }))
        );
    }

    #[test]
    fn debug_logging_takes_explicit_bool() {
        let cli = Cli::try_parse_from(["artisync", "config", "debug-logging", "true"])
            .expect("debug-logging should parse");
        assert_eq!(
            cli.command,
            Some(Commands::Config(ConfigCommand::DebugLogging { enabled: true }))
        );
    }
}
