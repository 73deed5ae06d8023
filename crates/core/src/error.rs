use crate::store::StoreError;
use crate::transform::CreationError;
use crate::validate::ValidationFailure;

/// Failure taxonomy of the core pipeline.
///
/// Each variant maps to a distinct boundary outcome: validation failures are
/// client errors (422-class), creation and storage failures are server-side
/// and surfaced separately so a caller can tell "your data was rejected" from
/// "your data was valid but not saved". Malformed-payload errors never reach
/// the core; the boundary rejects them before the validator runs.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("input validation failed: {0}")]
    Validation(#[from] ValidationFailure),

    #[error("document creation failed: {0}")]
    Creation(#[from] CreationError),

    #[error("bundle storage failed: {0}")]
    Storage(#[from] StoreError),
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;
