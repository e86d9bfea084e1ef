//! Errors for structural edits.

use thiserror::Error;

use super::model::StageKind;
use crate::catalog::ResolveError;
use crate::writer::RenderError;

/// Result type for builder operations.
pub type BuilderResult<T> = Result<T, BuilderError>;

/// A structural edit that could not be applied. The query is left as it was
/// before the call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BuilderError {
    #[error("No stage at path {path}")]
    StageNotFound { path: String },

    #[error("Field index {index} out of range: stage has {len} fields")]
    FieldIndexOutOfRange { index: usize, len: usize },

    #[error("Filter index {index} out of range: {len} filters")]
    FilterIndexOutOfRange { index: usize, len: usize },

    #[error("Order-by index {index} out of range: {len} entries")]
    OrderByIndexOutOfRange { index: usize, len: usize },

    #[error("Stage at {path} is a {kind:?} stage and cannot be edited")]
    InvalidStageKind { path: String, kind: StageKind },

    #[error("Field {field_index} is not a nested query")]
    NotANestedQuery { field_index: usize },

    #[error("Field {field_index} is not a field reference")]
    NotAReference { field_index: usize },

    #[error("'{path}' cannot be placed in a query stage")]
    NotRenderable { path: String },

    #[error("Field '{name}' does not take filters")]
    FilterNotSupported { name: String },

    #[error("Invalid field permutation: {reason}")]
    InvalidPermutation { reason: String },

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Render(#[from] RenderError),
}
