use kurbo::SvgParseError;
use thiserror::Error;

/// Errors produced while parsing or converting foundation types.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid path data: {0}")]
    InvalidPathData(String),

    #[error("unknown path command: {0:?}")]
    UnknownPathCommand(String),

    #[error("path command {command} expects {expected} parameters, got {actual}")]
    PathArity {
        command: char,
        expected: usize,
        actual: usize,
    },
}

impl From<SvgParseError> for TypeError {
    fn from(err: SvgParseError) -> Self {
        match err {
            SvgParseError::UnknownCommand(c) => Self::UnknownPathCommand(c.to_string()),
            other => Self::InvalidPathData(other.to_string()),
        }
    }
}
