use vexel_types::{Handle, TypeError};

/// Errors from object store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A dimension was non-positive, a coordinate non-finite, or a point
    /// list too short for its shape.
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    /// A layer, gradient, or pattern id does not name an existing entry.
    #[error("invalid reference: {0}")]
    InvalidReference(String),

    /// The handle was never issued or has been deleted.
    #[error("object not found: {0}")]
    NotFound(Handle),

    /// Linking `child` under `group` would make the hierarchy cyclic.
    #[error("cycle: {child} is {group} or one of its ancestors")]
    Cycle { group: Handle, child: Handle },

    /// The handle is already live; restored records cannot overwrite.
    #[error("handle already in use: {0}")]
    DuplicateHandle(Handle),

    /// A fixed-width index (slot, table id, font id) would overflow.
    #[error("capacity exceeded: {0}")]
    CapacityExceeded(String),

    /// Operation requires a group but the handle names another type.
    #[error("{0} is not a group")]
    NotAGroup(Handle),

    /// Path data could not be parsed.
    #[error("type error: {0}")]
    Type(#[from] TypeError),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
