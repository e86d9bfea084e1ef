//! Query model and builder.
//!
//! A [`Query`] is a named, never-empty pipeline of [`Stage`]s. It is edited
//! only through a [`QueryBuilder`], which addresses stages (including stages
//! of nested queries) with a [`StagePath`].

pub mod builder;
pub mod error;
pub mod model;
pub mod resolve;

pub use builder::QueryBuilder;
pub use error::{BuilderError, BuilderResult};
pub use model::{
    last_segment, FilterCondition, OrderBy, OrderByField, Query, QueryFieldDef, SortDir, Stage,
    StageHop, StageKind, StagePath,
};
pub use resolve::{
    pipeline_input, pipeline_output, resolve_field, source_for_stage_at_path, stage_output,
    Located, ResolvedField,
};
