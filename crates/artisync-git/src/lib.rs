//! `git` subprocess implementation of [`artisync_backend::RepositoryClient`].

mod client;
mod command;
mod detection;
mod history;

pub use client::GitClient;
pub use command::HideWindow;
pub use detection::detect_git;
pub use history::{HISTORY_FORMAT, parse_history};
