//! Errors raised while loading and checking agent configuration

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read '{path}': {source}")]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// `line` and `column` are 1-based when the parser reports them
    #[error("cannot parse '{path}' (line {}, column {}): {message}",
            .line.unwrap_or(0), .column.unwrap_or(0))]
    ParseError {
        path: String,
        line: Option<usize>,
        column: Option<usize>,
        message: String,
    },

    #[error(transparent)]
    ValidationError(#[from] ValidationError),

    #[error("environment variable '{var}' is not set")]
    EnvVarNotFound { var: String },
}

/// A config value that parsed but cannot be used.
///
/// `field_path` is dotted from the document root, e.g.
/// `transport.provider.base_url`.
#[derive(Debug, Error)]
#[error("invalid config at '{field_path}': {kind}")]
pub struct ValidationError {
    pub field_path: String,
    pub kind: ValidationErrorKind,
}

#[derive(Debug, Error)]
pub enum ValidationErrorKind {
    #[error("value is missing or empty")]
    Missing,

    #[error("{0}")]
    OutOfRange(String),

    /// Unparseable URL, unsupported scheme or unknown protocol name
    #[error("{0}")]
    Invalid(String),
}

impl ValidationError {
    pub fn missing(field_path: impl Into<String>) -> Self {
        Self {
            field_path: field_path.into(),
            kind: ValidationErrorKind::Missing,
        }
    }

    pub fn out_of_range(field_path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field_path: field_path.into(),
            kind: ValidationErrorKind::OutOfRange(reason.into()),
        }
    }

    pub fn invalid(field_path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field_path: field_path.into(),
            kind: ValidationErrorKind::Invalid(reason.into()),
        }
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;
