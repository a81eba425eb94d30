use thiserror::Error;

/// Errors raised while parsing data-model values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypeError {
    /// The input was not a valid hex string.
    #[error("digest is not valid hex: {0}")]
    InvalidHex(String),

    /// The decoded digest had the wrong number of bytes.
    #[error("digest must be {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}

/// Result alias for data-model parsing.
pub type TypeResult<T> = Result<T, TypeError>;
