use std::path::PathBuf;

use dialkit_core::SchemaError;
use dialkit_runtime::{ConfigError, DialError};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("schema error in {path}: {source}")]
    Schema {
        path: PathBuf,
        #[source]
        source: SchemaError,
    },

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Panel(#[from] DialError),

    #[error("required path does not exist: {path}")]
    MissingPath { path: PathBuf },

    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },
}

impl CliError {
    /// Process exit status: 2 for bad arguments and paths the schema does
    /// not have, 3 for unreadable schema or config input, 1 otherwise.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidArgument { .. } | Self::Panel(_) | Self::MissingPath { .. } => 2,
            Self::Schema { .. } | Self::Config(_) | Self::Json(_) => 3,
            Self::Io(_) => 1,
        }
    }

    #[must_use]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::CliError;
    use dialkit_runtime::{DialError, PanelId};

    #[test]
    fn invalid_argument_exits_two() {
        let error = CliError::invalid("missing '='");
        assert_eq!(error.exit_code(), 2);
        assert_eq!(error.to_string(), "invalid argument: missing '='");
    }

    #[test]
    fn unknown_path_is_a_usage_error() {
        let error: CliError = DialError::UnknownPath {
            panel: PanelId::from_raw("p-1"),
            path: "nope".into(),
        }
        .into();
        assert_eq!(error.exit_code(), 2);
        assert!(error.to_string().contains("nope"));
    }

    #[test]
    fn schema_errors_name_the_file() {
        let source = dialkit_core::DialConfig::from_json_str("[]").unwrap_err();
        let error = CliError::Schema {
            path: "schema.json".into(),
            source,
        };
        assert_eq!(error.exit_code(), 3);
        assert!(error.to_string().starts_with("schema error in schema.json"));
    }
}
