use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("Repository {address} is unreachable: {details}")]
    SourceUnreachable { address: String, details: String },

    #[error("Artifact {path} not found in {address}")]
    ArtifactMissing { address: String, path: String },

    #[error("Invalid artifact pattern {pattern:?}: {details}")]
    InvalidPattern { pattern: String, details: String },

    #[error("Command failed: {stderr}")]
    CommandFailed { stderr: String },

    #[error("Please choose a valid target directory.")]
    TargetDirectoryUnset,

    #[error("IO error ({kind}): {message}")]
    IoError {
        kind: std::io::ErrorKind,
        message: String,
    },
}

impl BackendError {
    pub fn source_unreachable(address: impl Into<String>, details: impl Into<String>) -> Self {
        Self::SourceUnreachable {
            address: address.into(),
            details: details.into(),
        }
    }

    pub fn artifact_missing(address: impl Into<String>, path: impl Into<String>) -> Self {
        Self::ArtifactMissing {
            address: address.into(),
            path: path.into(),
        }
    }

    pub fn invalid_pattern<E>(pattern: impl Into<String>, error: E) -> Self
    where
        E: std::fmt::Display,
    {
        Self::InvalidPattern {
            pattern: pattern.into(),
            details: error.to_string(),
        }
    }

    pub fn io_with_path(context: &str, path: &std::path::Path, error: &std::io::Error) -> Self {
        Self::IoError {
            kind: error.kind(),
            message: format!("{context} {}: {error}", path.display()),
        }
    }
}

impl From<std::io::Error> for BackendError {
    fn from(err: std::io::Error) -> Self {
        BackendError::IoError {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::BackendError;

    #[test]
    fn io_error_conversion_maps_to_io_variant() {
        let mapped = BackendError::from(std::io::Error::other("permission denied"));
        assert!(
            matches!(mapped, BackendError::IoError { kind, ref message } if kind == std::io::ErrorKind::Other && message.contains("permission denied"))
        );
    }

    #[test]
    fn source_unreachable_display_includes_address_and_details() {
        let error = BackendError::source_unreachable(
            "https://example.com/repo.git",
            "git fetch failed: could not resolve host",
        );

        assert_eq!(
            error.to_string(),
            "Repository https://example.com/repo.git is unreachable: git fetch failed: could not resolve host"
        );
    }

    #[test]
    fn invalid_pattern_captures_compiler_message() {
        let error = BackendError::invalid_pattern("(unclosed", "missing )");

        assert!(matches!(
            error,
            BackendError::InvalidPattern { ref pattern, ref details }
                if pattern == "(unclosed" && details == "missing )"
        ));
    }
}
