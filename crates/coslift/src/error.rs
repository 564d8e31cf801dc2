use coslift_build::{ArchiveError, ExcludeError};
use coslift_cloud::{AuthError, StorageError};

/// Any failure that aborts a pipeline run.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Exclude(#[from] ExcludeError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Archive(#[from] ArchiveError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl PipelineError {
    /// Process exit code for this failure kind.
    ///
    /// | Code | Kind |
    /// |------|------|
    /// | 1 | invalid exclusion pattern (configuration) |
    /// | 2 | no credential, or IAM token exchange failed |
    /// | 3 | source tree missing or archive could not be built |
    /// | 4 | upload failed |
    pub fn exit_code(&self) -> u8 {
        match self {
            PipelineError::Exclude(_) => 1,
            PipelineError::Auth(_) => 2,
            PipelineError::Archive(_) => 3,
            PipelineError::Storage(_) => 4,
        }
    }
}
