use thiserror::Error;
use vexel_drawing::DrawingError;
use vexel_store::StoreError;
use vexel_types::TypeError;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("invalid drawing magic: expected {expected}, got {actual}")]
    InvalidMagic { expected: String, actual: String },

    #[error("unsupported drawing format version: {0}")]
    UnsupportedVersion(u32),

    #[error("corrupt drawing data at offset {offset}: {reason}")]
    Corrupt { offset: u64, reason: String },

    /// Well-formed JSON whose content cannot describe a drawing.
    #[error("invalid document: {0}")]
    InvalidDocument(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Decoded content was rejected by the object store.
    #[error("rejected object: {0}")]
    Store(#[from] StoreError),

    #[error("invalid value: {0}")]
    Type(#[from] TypeError),

    /// Decoded layers or canvas did not form a valid drawing.
    #[error("invalid drawing: {0}")]
    Drawing(#[from] DrawingError),
}

impl CodecError {
    /// True when the input was read but its content is unusable.
    pub fn is_format_error(&self) -> bool {
        match self {
            Self::Io(_) => false,
            Self::Json(e) => !e.is_io(),
            _ => true,
        }
    }

    /// True when reading or writing the underlying medium failed.
    pub fn is_io_error(&self) -> bool {
        match self {
            Self::Io(_) => true,
            Self::Json(e) => e.is_io(),
            _ => false,
        }
    }
}

pub type CodecResult<T> = Result<T, CodecError>;
