use artisync_backend::BackendError;
use artisync_core::{SourceError, TransferError, UpdateError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppErrorDetail {
    Message(String),
    Io {
        kind: std::io::ErrorKind,
        message: String,
    },
    Backend(BackendError),
}

impl std::fmt::Display for AppErrorDetail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Message(message) => write!(f, "{message}"),
            Self::Io { kind, message } => write!(f, "{kind}: {message}"),
            Self::Backend(error) => write!(f, "{error}"),
        }
    }
}

impl From<String> for AppErrorDetail {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}

impl From<&str> for AppErrorDetail {
    fn from(value: &str) -> Self {
        Self::Message(value.to_string())
    }
}

impl From<std::io::Error> for AppErrorDetail {
    fn from(error: std::io::Error) -> Self {
        Self::Io {
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

impl From<BackendError> for AppErrorDetail {
    fn from(value: BackendError) -> Self {
        Self::Backend(value)
    }
}

impl From<UpdateError> for AppErrorDetail {
    fn from(value: UpdateError) -> Self {
        Self::Message(value.to_string())
    }
}

impl From<TransferError> for AppErrorDetail {
    fn from(value: TransferError) -> Self {
        Self::Message(value.to_string())
    }
}

impl From<SourceError> for AppErrorDetail {
    fn from(value: SourceError) -> Self {
        Self::Message(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    Message(String),
    GitUnavailable,
    UnknownSource {
        query: String,
    },
    NothingToDo {
        operation: &'static str,
    },
    OperationFailed {
        operation: &'static str,
        details: AppErrorDetail,
    },
    SettingsSaveFailed {
        file: &'static str,
        details: AppErrorDetail,
    },
    SourceEditFailed {
        action: &'static str,
        details: AppErrorDetail,
    },
    ScanFailed {
        source: String,
        details: AppErrorDetail,
    },
    AutoUpdateFailed {
        phase: &'static str,
        details: AppErrorDetail,
    },
    UpdateCheckFailed {
        details: AppErrorDetail,
    },
}

impl AppError {
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }

    pub fn unknown_source(query: impl Into<String>) -> Self {
        Self::UnknownSource {
            query: query.into(),
        }
    }

    pub fn nothing_to_do(operation: &'static str) -> Self {
        Self::NothingToDo { operation }
    }

    pub fn operation_failed(operation: &'static str, details: impl Into<AppErrorDetail>) -> Self {
        Self::OperationFailed {
            operation,
            details: details.into(),
        }
    }

    pub fn settings_save_failed(file: &'static str, details: impl Into<AppErrorDetail>) -> Self {
        Self::SettingsSaveFailed {
            file,
            details: details.into(),
        }
    }

    pub fn source_edit_failed(action: &'static str, details: impl Into<AppErrorDetail>) -> Self {
        Self::SourceEditFailed {
            action,
            details: details.into(),
        }
    }

    pub fn scan_failed(source: impl Into<String>, details: impl Into<AppErrorDetail>) -> Self {
        Self::ScanFailed {
            source: source.into(),
            details: details.into(),
        }
    }

    pub fn auto_update_failed(phase: &'static str, details: impl Into<AppErrorDetail>) -> Self {
        Self::AutoUpdateFailed {
            phase,
            details: details.into(),
        }
    }

    pub fn update_check_failed(details: impl Into<AppErrorDetail>) -> Self {
        Self::UpdateCheckFailed {
            details: details.into(),
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Message(message) => write!(f, "{message}"),
            Self::GitUnavailable => write!(
                f,
                "git was not found on PATH; install git to scan repositories"
            ),
            Self::UnknownSource { query } => write!(f, "No source named {query}"),
            Self::NothingToDo { operation } => write!(f, "Nothing to {operation}"),
            Self::OperationFailed { operation, details } => {
                write!(f, "{operation} failed: {details}")
            }
            Self::SettingsSaveFailed { file, details } => {
                write!(f, "Saving {file} failed: {details}")
            }
            Self::SourceEditFailed { action, details } => {
                write!(f, "Could not {action} source: {details}")
            }
            Self::ScanFailed { source, details } => {
                write!(f, "Scan of {source} failed: {details}")
            }
            Self::AutoUpdateFailed { phase, details } => {
                write!(f, "App update {phase} failed: {details}")
            }
            Self::UpdateCheckFailed { details } => {
                write!(f, "Update check failed: {details}")
            }
        }
    }
}

impl std::error::Error for AppError {}

impl From<String> for AppError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}

impl From<&str> for AppError {
    fn from(value: &str) -> Self {
        Self::Message(value.to_string())
    }
}
