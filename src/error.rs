//! Error types for metadata reading, model construction and capability resolution.

use std::path::PathBuf;
use thiserror::Error;

use crate::types::PropertyId;

/// Errors raised by the type registry.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("type {id} is not registered in this model")]
    UnknownType { id: usize },

    #[error("type '{namespace}.{name}' is declared more than once")]
    DuplicateType { namespace: String, name: String },

    #[error("'{name}' is not a class")]
    NotAClass { name: String },

    #[error("property path '{path}' does not resolve on '{class}': no member '{segment}'")]
    PropertyNotFound {
        class: String,
        path: String,
        segment: String,
    },

    #[error("multiple entity containers found: {}", names.join(", "))]
    MultipleEntityContainers { names: Vec<String> },
}

/// Errors raised by the capability resolution engine.
///
/// Three classes of failure exist: configuration errors (the bundled
/// vocabulary is unusable), precondition violations (the caller passed a
/// handle that does not fit) and data-consistency errors (the service
/// metadata itself is malformed). None of them are recoverable locally.
#[derive(Debug, Error)]
pub enum CapabilityError {
    // Configuration errors
    #[error("could not load capabilities vocabulary: {message}")]
    Vocabulary { message: String },

    #[error("capabilities vocabulary does not declare term '{term}'")]
    MissingTerm { term: String },

    // Precondition violations
    #[error("property {property} is not registered in this model")]
    UnknownProperty { property: PropertyId },

    #[error("entity set '{property}' is not typed by a class")]
    NotAClass { property: String },

    // Data-consistency errors
    #[error("malformed {term} annotation on '{property}': {message}")]
    AnnotationShape {
        term: String,
        property: String,
        message: String,
    },

    #[error("{term} annotation on '{property}' names unknown navigation property '{path}'")]
    UnresolvedPath {
        term: String,
        property: String,
        path: String,
        #[source]
        source: ModelError,
    },
}

impl CapabilityError {
    /// True for failures of the bundled vocabulary rather than of service metadata.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Vocabulary { .. } | Self::MissingTerm { .. })
    }

    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        if self.is_configuration() {
            4
        } else {
            2
        }
    }
}

/// Errors while reading service metadata into a model.
#[derive(Debug, Error)]
pub enum ReadError {
    // IO errors (exit code 3)
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

    // Parse errors (exit code 2)
    #[error("invalid JSON: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },

    #[error("service metadata has no document under key '{key}'")]
    MissingDocument { key: String },

    #[error(transparent)]
    Validate(#[from] ValidateError),

    // Model errors (exit code 2)
    #[error("unknown type '{name}' referenced at {path}")]
    UnknownType { name: String, path: String },

    #[error("invalid element at {path}: {message}")]
    InvalidElement { path: String, message: String },

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Capability(#[from] CapabilityError),
}

impl ReadError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            ReadError::FileNotFound { .. } | ReadError::ReadError { .. } => 3,
            #[cfg(feature = "remote")]
            ReadError::NetworkError { .. } => 3,
            ReadError::Validate(e) => e.exit_code(),
            ReadError::Capability(e) => e.exit_code(),
            _ => 2,
        }
    }
}

/// Errors during structural validation of a CSDL document.
#[derive(Debug, Error)]
pub enum ValidateError {
    #[error("invalid CSDL validation schema: {message}")]
    Schema { message: String },

    #[error("CSDL validation failed with {} error(s)", errors.len())]
    Invalid { errors: Vec<SchemaError> },
}

impl ValidateError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            ValidateError::Schema { .. } => 4,
            ValidateError::Invalid { .. } => 1,
        }
    }
}

/// Single validation error with path context.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SchemaError {
    /// JSON Pointer (RFC 6901) to the invalid member.
    pub path: String,
    /// Human-readable error message.
    pub message: String,
}

impl std::fmt::Display for SchemaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}
