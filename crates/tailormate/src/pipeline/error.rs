use thiserror::Error;

use super::run::RunStep;
use crate::error::{ExtractionError, StorageError};
use crate::reconcile::ReconcileError;

/// Failures of an intake run. `Display` is the message shown to the user.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("No active session")]
    NoSession,

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("No documents to process")]
    EmptyBatch,

    #[error("Upload of '{file_name}' failed: {source}")]
    Upload {
        file_name: String,
        #[source]
        source: StorageError,
    },

    #[error("{0}")]
    Extraction(#[from] ExtractionError),

    #[error("{0}")]
    Reconcile(#[from] ReconcileError),

    #[error("Cannot {action} during the {step} step")]
    InvalidStep { action: &'static str, step: RunStep },
}
