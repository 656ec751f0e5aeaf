use rollback_fs::FsError;
use rollback_procedure::{CompensationError, ForwardActionError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Fs(#[from] FsError),

    #[error("rollback stopped before undoing every step")]
    Rollback(#[from] CompensationError<FsError>),

    #[error("procedure failed and was rolled back")]
    RolledBack(#[source] ForwardActionError<FsError>),

    #[error("failed to serialize the actions log")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CliError>;
