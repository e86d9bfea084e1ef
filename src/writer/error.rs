//! Errors raised while rendering a query.

use thiserror::Error;

use crate::catalog::ResolveError;

/// Result type for rendering.
pub type RenderResult<T> = Result<T, RenderError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RenderError {
    #[error("Field '{field}' cannot be rendered: {source}")]
    Field { field: String, source: ResolveError },
}
