//! Error types for document loading, validation and comparison.

use std::path::PathBuf;
use thiserror::Error;

/// Errors while turning JSON into a typed document or schema.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("{input} is not an OpenAPI document: expected object, got {actual}")]
    NotADocument { input: String, actual: String },

    #[error("{input} is malformed: {source}")]
    Malformed {
        input: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid schema at {path}: {message}")]
    InvalidSchema { path: String, message: String },
}

impl DocumentError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        2
    }
}

/// Errors while loading documents and payloads from files or URLs.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[cfg(feature = "remote")]
    #[error("failed to fetch {url}: {source}")]
    NetworkError {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("invalid JSON: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },
}

impl LoadError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            LoadError::FileNotFound { .. } | LoadError::ReadError { .. } => 3,
            #[cfg(feature = "remote")]
            LoadError::NetworkError { .. } => 3,
            LoadError::InvalidJson { .. } => 2,
        }
    }
}

/// Error from [`crate::loader::load_document`]: either the source couldn't be read or it
/// isn't a document.
#[derive(Debug, Error)]
pub enum DocumentLoadError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Document(#[from] DocumentError),
}

impl DocumentLoadError {
    pub fn exit_code(&self) -> i32 {
        match self {
            DocumentLoadError::Load(e) => e.exit_code(),
            DocumentLoadError::Document(e) => e.exit_code(),
        }
    }
}

/// Errors during validation.
#[derive(Debug, Error)]
pub enum ValidateError {
    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error("schema not found in components: {name}")]
    UnknownSchema { name: String },

    #[error("validation failed with {} error(s)", errors.len())]
    Invalid { errors: Vec<SchemaError> },
}

impl ValidateError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            ValidateError::Document(e) => e.exit_code(),
            ValidateError::UnknownSchema { .. } => 2,
            ValidateError::Invalid { .. } => 1,
        }
    }
}

/// Single validation error with path context.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct SchemaError {
    /// JSON Pointer (RFC 6901) to the invalid value.
    pub path: String,
    /// Human-readable error message.
    pub message: String,
}

impl SchemaError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for SchemaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.path.is_empty() {
            write!(f, "(root): {}", self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}
