use vexel_store::StoreError;
use vexel_types::ObjectType;

/// Errors from batch operations.
#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    /// An underlying store operation failed (unknown handle, bad geometry).
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Pattern generators only know how to lay out some primitive kinds.
    #[error("pattern generation does not support {0}")]
    UnsupportedKind(ObjectType),
}

impl BatchError {
    /// True when the call failed because a handle was unknown.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Store(StoreError::NotFound(_)))
    }
}

/// Result alias for batch operations.
pub type BatchResult<T> = Result<T, BatchError>;
