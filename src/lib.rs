//! # Composer
//!
//! Structural editing and source generation for multi-stage analytical
//! queries.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │           Catalog (typed fields from the compiler)       │
//! │   (dimensions, measures, nested sources, named queries)  │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [builder]
//! ┌─────────────────────────────────────────────────────────┐
//! │                  Query (stage pipeline)                  │
//! │   fields, filters, order-by, limit, nested pipelines     │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!              ┌───────────┴───────────┐
//!              ▼ [render]              ▼ [summary]
//! ┌────────────────────────┐ ┌──────────────────────────────┐
//! │      Source text       │ │  QuerySummary (editor view)  │
//! └────────────────────────┘ └──────────────────────────────┘
//! ```
//!
//! Filter predicates move between typed filters and text through the
//! [`filter`] codec.

pub mod catalog;
pub mod config;
pub mod filter;
pub mod query;
pub mod writer;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::catalog::{CatalogField, FieldKind, ScalarType, SourceDef};
    pub use crate::config::Settings;
    pub use crate::filter::{
        decode_filter, filter_to_string, BooleanFilter, Filter, FilterFamily, NumberFilter,
        StringFilter, TimeFilter, TimeGranularity,
    };
    pub use crate::query::{
        BuilderError, FilterCondition, OrderBy, Query, QueryBuilder, QueryFieldDef, SortDir,
        Stage, StagePath,
    };
    pub use crate::writer::{DataStyles, QuerySummary, QueryTarget, QueryWriter, SummaryItem};
}

pub use catalog::{ResolveError, SourceDef};
pub use query::{BuilderError, Query, QueryBuilder, StagePath};
pub use writer::{QueryWriter, RenderError};
