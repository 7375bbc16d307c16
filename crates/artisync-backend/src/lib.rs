mod error;
mod traits;
mod types;

pub use error::BackendError;
pub use traits::{CheckoutRequest, RepositoryClient};
pub use types::{
    ArtifactMatch, ArtifactSource, ArtifactStatus, CommitRecord, DEFAULT_ARTIFACT_PATTERN,
    Discovery, InstalledArtifact, TrackedArtifact, base_file_name, ledger_key,
};
