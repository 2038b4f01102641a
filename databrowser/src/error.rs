use std::path::PathBuf;

use thiserror::Error;

/// The primary error type that can be produced by the data browser query
/// model.
#[derive(Debug, Error)]
pub enum Error {
    #[error("filter parameter \"{0}\" has no \"__\" separator between its field path and lookup")]
    MalformedFilterParam(String),
    #[error("cannot parse field \"{0}\" from the fields specification")]
    MalformedFieldSpec(String),
    #[error("malformed query URL \"{0}\": {1}")]
    MalformedUrl(String, String),
    #[error("cannot resolve \"{segment}\" of field path \"{path}\" on model {model}")]
    UnresolvedPath {
        model: String,
        path: String,
        segment: String,
    },
    #[error("I/O error while reading {0}: {1}")]
    Io(PathBuf, std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("unsupported file type: {0}")]
    UnsupportedFileType(String),
    #[error("cannot determine file type of file: {0}")]
    CannotDetermineFileType(PathBuf),
    #[error("failed to load schema from {0}")]
    FailedToLoadSchema(PathBuf),
    #[error("failed to load configuration from {0}")]
    FailedToLoadConfig(PathBuf),
}

impl Error {
    /// Whether this error indicates that the incoming request itself could
    /// not be parsed into a query.
    pub fn is_malformed_request(&self) -> bool {
        matches!(
            self,
            Self::MalformedFilterParam(_) | Self::MalformedFieldSpec(_) | Self::MalformedUrl(_, _)
        )
    }
}

/// Reasons why a filter's lookup/value combination is not well-formed for a
/// particular kind of field.
///
/// These are ordinary outcomes of validation rather than failures of the
/// query model itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("Bad lookup '{lookup}' expected {expected:?}")]
    UnknownLookup {
        lookup: String,
        expected: Vec<&'static str>,
    },
    #[error("{0}")]
    InvalidValue(String),
}
