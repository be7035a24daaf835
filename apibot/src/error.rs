//! Error types for configuration loading and the fetch → decode → render pipeline.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Reported by validation when a required field is missing or empty.
pub const BLANK: &str = "cannot be blank";

/// One invalid configuration field, e.g. `Commands[0].ApiUrl: must be a valid URL`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn join_fields(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Fatal at startup: the bot must not serve commands with a bad config.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config document: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("{}", join_fields(.0))]
    Validation(Vec<FieldError>),

    #[error("{0}")]
    Env(String),
}

impl ConfigError {
    /// Field errors when this is a validation failure, otherwise empty.
    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            ConfigError::Validation(errors) => errors,
            _ => &[],
        }
    }
}

/// Network failure while fetching an API URL. The underlying cause is kept as the source.
#[derive(Error, Debug)]
#[error("GET {url} failed: {source}")]
pub struct TransportError {
    pub url: String,
    #[source]
    pub source: Box<dyn std::error::Error + Send + Sync>,
}

impl TransportError {
    pub fn new(
        url: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self {
            url: url.into(),
            source: source.into(),
        }
    }
}

/// Failure of one command invocation. Non-fatal: the next invocation is independent.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("failed to decode JSON response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error(transparent)]
    Render(#[from] gotemplate::TemplateError),
}
