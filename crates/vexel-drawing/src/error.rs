use vexel_batch::BatchError;
use vexel_store::StoreError;

/// Errors from drawing-level operations.
#[derive(Debug, thiserror::Error)]
pub enum DrawingError {
    /// An object or layer operation was rejected by the store rules.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A batch call failed; the store is unchanged.
    #[error(transparent)]
    Batch(#[from] BatchError),

    /// Canvas dimensions must be positive and finite.
    #[error("invalid canvas: {0}")]
    InvalidCanvas(String),
}

impl DrawingError {
    /// The underlying store error, whether raised directly or by a batch call.
    pub fn store_error(&self) -> Option<&StoreError> {
        match self {
            Self::Store(e) | Self::Batch(BatchError::Store(e)) => Some(e),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self.store_error(), Some(StoreError::NotFound(_)))
    }
}

/// Result alias for drawing operations.
pub type DrawingResult<T> = Result<T, DrawingError>;
