#![forbid(unsafe_code)]

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SchemaError>;

/// Failure to build a schema from external input.
///
/// Malformed leaves never produce this error; they degrade to safe
/// defaults. Only input that cannot be a schema at all does.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[cfg(feature = "serde")]
    #[error("failed to parse schema JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("schema root must be an object, found {found}")]
    NotAnObject { found: &'static str },
}
