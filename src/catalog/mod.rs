//! Schema catalog consumed by the builder and writer.
//!
//! The catalog is produced by an external schema compiler. This crate only
//! reads it: fields are looked up by dotted path and classified by kind.

mod error;
mod source;
mod types;

pub use error::{ResolveError, ResolveResult};
pub use source::{AtomicField, CatalogField, QueryDef, SourceDef};
pub use types::{FieldKind, ScalarType};
