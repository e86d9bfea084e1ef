//! Field and path resolution errors.

use thiserror::Error;

/// Result type for catalog lookups.
pub type ResolveResult<T> = Result<T, ResolveError>;

/// Errors raised while resolving a path or field definition against a source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("Field not found: '{path}'")]
    FieldNotFound { path: String },

    #[error("'{segment}' in '{path}' is not a source")]
    NotASource { segment: String, path: String },

    #[error("'{path}' is not a query")]
    NotAQuery { path: String },

    #[error("Cannot derive a schema through '{name}': it does not produce a struct")]
    PipelineNotStruct { name: String },

    #[error("Malformed field '{name}': {reason}")]
    MalformedField { name: String, reason: String },
}
