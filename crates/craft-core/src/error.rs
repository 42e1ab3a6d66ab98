//! Error types for the document core

use thiserror::Error;

use crate::navigate::NodeKind;

/// Path parsing and navigation failures. All are recoverable.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PathError {
    #[error("malformed path segment '{token}': {reason}")]
    MalformedPath { token: String, reason: String },

    #[error("key not found: {path}")]
    NotFound { path: String },

    #[error("index {index} out of range at {path} (length {len})")]
    IndexOutOfRange {
        path: String,
        index: usize,
        len: usize,
    },

    #[error("expected {expected} at {path}, found {found}")]
    WrongContainerKind {
        path: String,
        expected: NodeKind,
        found: NodeKind,
    },

    #[error("not a list: {path} is {found}")]
    NotAList { path: String, found: NodeKind },

    #[error("operation needs a non-empty path")]
    EmptyPath,
}

/// Failures reported by an edit session transition.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    #[error(transparent)]
    Path(#[from] PathError),

    #[error("nothing to undo")]
    NothingToUndo,
}

/// Loading, saving and backing up documents.
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("not a file: {0}")]
    NotAFile(String),
}

/// Presence/shape check failures for schema templates.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("missing '{0}' key")]
    MissingKey(String),

    #[error("'{key}' must be a {expected}")]
    WrongShape { key: String, expected: &'static str },

    #[error("document must be a mapping at the top level")]
    NotAMapping,

    #[error("unknown schema '{0}'")]
    UnknownSchema(String),
}
