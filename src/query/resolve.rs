//! Stage addressing and schema derivation.
//!
//! Every walk over a [`StagePath`] goes through this module. Locating a stage
//! for editing distinguishes a missing stage (an error) from a nested query
//! that is still a bare reference into the catalog ([`Located::Unmaterialized`]),
//! which the builder materializes and retries.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use super::error::{BuilderError, BuilderResult};
use super::model::{FilterCondition, Query, QueryFieldDef, Stage, StageKind, StagePath};
use crate::catalog::{
    AtomicField, CatalogField, FieldKind, ResolveError, ResolveResult, ScalarType, SourceDef,
};
use crate::filter::{decode_filter, filter_to_string};

// =============================================================================
// Field resolution
// =============================================================================

/// A field entry resolved against the source of its stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedField {
    pub name: String,
    pub kind: FieldKind,
    pub data_type: Option<ScalarType>,
    pub path: Option<String>,
}

fn malformed(name: &str, reason: &str) -> ResolveError {
    ResolveError::MalformedField {
        name: name.into(),
        reason: reason.into(),
    }
}

/// Resolve one entry. Fails when a catalog path is missing, when it names a
/// source, or when an inline definition is malformed.
pub fn resolve_field(source: &SourceDef, field: &QueryFieldDef) -> ResolveResult<ResolvedField> {
    let name = field.output_name();

    let (kind, data_type) = match field {
        QueryFieldDef::Reference { path } => {
            let catalog_field = source.field_at_path(path)?;
            (catalog_field.kind(), catalog_field.data_type())
        }
        QueryFieldDef::Renamed {
            path,
            kind,
            data_type,
            ..
        }
        | QueryFieldDef::Filtered {
            path,
            kind,
            data_type,
            ..
        } => {
            source.field_at_path(path)?;
            (*kind, *data_type)
        }
        QueryFieldDef::Expression {
            code,
            is_calculation,
            data_type,
            ..
        } => {
            if code.trim().is_empty() {
                return Err(malformed(&name, "expression is empty"));
            }
            (FieldKind::from_calculation(*is_calculation), *data_type)
        }
        QueryFieldDef::Nested { pipeline, .. } => {
            if pipeline.is_empty() {
                return Err(malformed(&name, "nested query has no stages"));
            }
            (FieldKind::Query, None)
        }
    };

    if name.trim().is_empty() {
        return Err(malformed(&name, "name is empty"));
    }
    if kind == FieldKind::Source {
        return Err(malformed(&name, "a source cannot be selected as a field"));
    }

    Ok(ResolvedField {
        name,
        kind,
        data_type,
        path: field.path().map(String::from),
    })
}

/// Pipeline of a nested-query entry: inline, or from the catalog for a
/// reference that has not been materialized. A catalog query defined inside
/// a joined source comes back rebased onto the stage's own source.
pub fn nested_pipeline<'a>(
    source: &'a SourceDef,
    field: &'a QueryFieldDef,
) -> ResolveResult<Cow<'a, [Stage]>> {
    match field {
        QueryFieldDef::Nested { pipeline, .. } => Ok(Cow::Borrowed(pipeline)),
        QueryFieldDef::Reference { path } | QueryFieldDef::Renamed { path, .. } => {
            let query = source.query_at_path(path)?;
            Ok(match path.rsplit_once('.') {
                Some((prefix, _)) => Cow::Owned(rebase_pipeline(prefix, &query.pipeline)),
                None => Cow::Borrowed(&query.pipeline),
            })
        }
        _ => Err(ResolveError::PipelineNotStruct {
            name: field.output_name(),
        }),
    }
}

// =============================================================================
// Rebasing
// =============================================================================

fn join_path(prefix: &str, path: &str) -> String {
    if path.is_empty() {
        path.into()
    } else {
        format!("{}.{}", prefix, path)
    }
}

/// Copy of `pipeline` with catalog paths read from the joined source at
/// `prefix`. Only the first stage reads the source; later stages read the
/// output of the stage before them and are left alone. Inline expressions
/// and custom predicates are free text and stay as written.
pub fn rebase_pipeline(prefix: &str, pipeline: &[Stage]) -> Vec<Stage> {
    let mut rebased = pipeline.to_vec();
    if let Some(first) = rebased.first_mut() {
        rebase_stage(prefix, first);
    }
    rebased
}

fn rebase_stage(prefix: &str, stage: &mut Stage) {
    for field in &mut stage.fields {
        rebase_field(prefix, field);
    }
    for filter in &mut stage.filters {
        *filter = rebase_filter(prefix, filter);
    }
}

fn rebase_field(prefix: &str, field: &mut QueryFieldDef) {
    match field {
        QueryFieldDef::Reference { path } | QueryFieldDef::Renamed { path, .. } => {
            *path = join_path(prefix, path);
        }
        QueryFieldDef::Filtered { path, filters, .. } => {
            *path = join_path(prefix, path);
            for filter in filters {
                *filter = rebase_filter(prefix, filter);
            }
        }
        QueryFieldDef::Nested { pipeline, .. } => {
            if let Some(first) = pipeline.first_mut() {
                rebase_stage(prefix, first);
            }
        }
        QueryFieldDef::Expression { .. } => {}
    }
}

fn rebase_filter(prefix: &str, filter: &FilterCondition) -> FilterCondition {
    let decoded = decode_filter(&filter.code);
    let code = match (&decoded.field, decoded.filter.partial()) {
        (Some(field), None) => filter_to_string(&join_path(prefix, field), &decoded.filter),
        _ => filter.code.clone(),
    };
    FilterCondition {
        field: join_path(prefix, &filter.field),
        code,
    }
}

// =============================================================================
// Schema derivation
// =============================================================================

fn dimension(name: &str, data_type: ScalarType) -> CatalogField {
    CatalogField::Dimension(AtomicField {
        name: name.into(),
        data_type,
        expression: None,
    })
}

/// Schema a stage produces from `input`. Entries that fail to resolve are
/// left out so that later stages can still be derived.
pub fn stage_output(input: &SourceDef, stage: &Stage) -> SourceDef {
    let mut output = SourceDef::new(&input.name);

    if stage.kind == StageKind::Index {
        output.fields = vec![
            dimension("fieldName", ScalarType::String),
            dimension("fieldPath", ScalarType::String),
            dimension("fieldType", ScalarType::String),
            dimension("fieldValue", ScalarType::String),
            dimension("weight", ScalarType::Number),
        ];
        return output;
    }

    for field in &stage.fields {
        let resolved = match resolve_field(input, field) {
            Ok(resolved) => resolved,
            Err(err) => {
                tracing::warn!(field = %field.output_name(), error = %err, "skipping field in stage output");
                continue;
            }
        };

        let column = match resolved.kind {
            FieldKind::Query => match nested_pipeline(input, field) {
                Ok(pipeline) => {
                    let mut nested = pipeline_output(input, &pipeline);
                    nested.name = resolved.name;
                    CatalogField::Source(nested)
                }
                Err(err) => {
                    tracing::warn!(field = %resolved.name, error = %err, "skipping nested query in stage output");
                    continue;
                }
            },
            _ => dimension(
                &resolved.name,
                resolved.data_type.unwrap_or(ScalarType::Unsupported),
            ),
        };
        output.fields.push(column);
    }

    output
}

/// Schema at the end of a pipeline.
pub fn pipeline_output(input: &SourceDef, pipeline: &[Stage]) -> SourceDef {
    pipeline_input(input, pipeline, pipeline.len())
}

/// Schema entering stage `stage_index` of a pipeline.
pub fn pipeline_input(input: &SourceDef, pipeline: &[Stage], stage_index: usize) -> SourceDef {
    pipeline
        .iter()
        .take(stage_index)
        .fold(input.clone(), |source, stage| stage_output(&source, stage))
}

/// A copy of the stage at `path` and the schema entering it. Follows nested
/// queries that are still catalog references.
pub fn stage_and_source(
    root: &SourceDef,
    query: &Query,
    path: &StagePath,
) -> BuilderResult<(Stage, SourceDef)> {
    let mut source = root.clone();
    let mut pipeline = query.pipeline.clone();

    for hop in &path.hops {
        let stage = pipeline.get(hop.stage_index).ok_or_else(|| not_found(path))?;
        let field = stage
            .fields
            .get(hop.field_index)
            .ok_or(BuilderError::FieldIndexOutOfRange {
                index: hop.field_index,
                len: stage.fields.len(),
            })?;

        source = pipeline_input(&source, &pipeline, hop.stage_index);
        let nested = nested_pipeline(&source, field)
            .map_err(|_| BuilderError::NotANestedQuery {
                field_index: hop.field_index,
            })?
            .into_owned();
        pipeline = nested;
    }

    let stage = pipeline
        .get(path.stage_index)
        .cloned()
        .ok_or_else(|| not_found(path))?;
    let source = pipeline_input(&source, &pipeline, path.stage_index);
    Ok((stage, source))
}

/// Schema entering the stage at `path`.
pub fn source_for_stage_at_path(
    root: &SourceDef,
    query: &Query,
    path: &StagePath,
) -> BuilderResult<SourceDef> {
    stage_and_source(root, query, path).map(|(_, source)| source)
}

// =============================================================================
// Locating stages for editing
// =============================================================================

/// Outcome of walking a [`StagePath`] over the query itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Located {
    /// The path names an inline stage.
    Stage,
    /// A hop lands on a reference to a catalog query that has not been copied
    /// inline yet.
    Unmaterialized {
        /// Stage holding the reference.
        parent: StagePath,
        field_index: usize,
        path: String,
    },
}

pub(crate) fn not_found(path: &StagePath) -> BuilderError {
    BuilderError::StageNotFound {
        path: path.to_string(),
    }
}

pub fn locate(query: &Query, path: &StagePath) -> BuilderResult<Located> {
    let mut pipeline = &query.pipeline;

    for (depth, hop) in path.hops.iter().enumerate() {
        let stage = pipeline.get(hop.stage_index).ok_or_else(|| not_found(path))?;
        let field = stage
            .fields
            .get(hop.field_index)
            .ok_or(BuilderError::FieldIndexOutOfRange {
                index: hop.field_index,
                len: stage.fields.len(),
            })?;

        match field {
            QueryFieldDef::Nested { pipeline: nested, .. } => pipeline = nested,
            QueryFieldDef::Reference { path: field_path }
            | QueryFieldDef::Renamed {
                path: field_path, ..
            } => {
                return Ok(Located::Unmaterialized {
                    parent: StagePath {
                        hops: path.hops[..depth].to_vec(),
                        stage_index: hop.stage_index,
                    },
                    field_index: hop.field_index,
                    path: field_path.clone(),
                })
            }
            _ => {
                return Err(BuilderError::NotANestedQuery {
                    field_index: hop.field_index,
                })
            }
        }
    }

    if path.stage_index < pipeline.len() {
        Ok(Located::Stage)
    } else {
        Err(not_found(path))
    }
}

/// The pipeline holding the stage at `path`. Every hop must already be inline.
pub fn pipeline_at_path_mut<'a>(
    query: &'a mut Query,
    path: &StagePath,
) -> BuilderResult<&'a mut Vec<Stage>> {
    let mut pipeline = &mut query.pipeline;

    for hop in &path.hops {
        let len = pipeline.len();
        let stage = pipeline
            .get_mut(hop.stage_index)
            .ok_or(BuilderError::StageNotFound {
                path: format!("{} (pipeline has {} stages)", path, len),
            })?;
        let field_count = stage.fields.len();
        match stage.fields.get_mut(hop.field_index) {
            Some(QueryFieldDef::Nested { pipeline: nested, .. }) => pipeline = nested,
            Some(_) => {
                return Err(BuilderError::NotANestedQuery {
                    field_index: hop.field_index,
                })
            }
            None => {
                return Err(BuilderError::FieldIndexOutOfRange {
                    index: hop.field_index,
                    len: field_count,
                })
            }
        }
    }

    Ok(pipeline)
}

/// The stage at `path`. Every hop must already be inline.
pub fn stage_at_path_mut<'a>(query: &'a mut Query, path: &StagePath) -> BuilderResult<&'a mut Stage> {
    let pipeline = pipeline_at_path_mut(query, path)?;
    let stage_index = path.stage_index;
    pipeline.get_mut(stage_index).ok_or_else(|| not_found(path))
}
