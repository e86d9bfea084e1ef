//! Query builder - structural edits on a query pipeline.
//!
//! Every public edit is transactional: the query is snapshotted first and
//! restored if the edit fails, so a rejected edit is never partially visible.
//! Stages inside nested queries that are still catalog references are
//! materialized inline before they are edited.

use std::collections::HashSet;

use super::error::{BuilderError, BuilderResult};
use super::model::{
    FilterCondition, OrderBy, OrderByField, Query, QueryFieldDef, SortDir, Stage, StageKind,
    StagePath,
};
use super::resolve::{
    locate, not_found, pipeline_at_path_mut, rebase_pipeline, resolve_field,
    source_for_stage_at_path, stage_and_source, stage_at_path_mut, Located,
};
use crate::catalog::{AtomicField, CatalogField, FieldKind, SourceDef};
use crate::config::Settings;
use crate::filter::literal::quote_path;
use crate::filter::{decode_filter, Filter, FilterFamily, GenericFilter};
use crate::writer::{DataStyles, QueryWriter};

/// Owns a query and applies edits to it against a source.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    source: SourceDef,
    query: Query,
    settings: Settings,
}

impl QueryBuilder {
    /// A builder holding a blank query over `source`.
    pub fn new(source: SourceDef) -> Self {
        Self {
            source,
            query: Query::new(),
            settings: Settings::default(),
        }
    }

    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    pub fn source(&self) -> &SourceDef {
        &self.source
    }

    pub fn set_source(&mut self, source: SourceDef) {
        self.source = source;
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    /// Replace the whole query. An empty pipeline becomes the blank query.
    /// Positional order-by entries are rewritten as field names.
    pub fn set_query(&mut self, mut query: Query) {
        if query.pipeline.is_empty() {
            query.pipeline.push(Stage::reduce());
        }
        name_positional_order_bys(&mut query.pipeline);
        self.query = query;
    }

    pub fn into_query(self) -> Query {
        self.query
    }

    pub fn clear_query(&mut self) {
        tracing::debug!("clearing query");
        self.query = Query::new();
    }

    pub fn set_name(&mut self, name: &str) {
        self.query.name = name.into();
    }

    pub fn is_empty(&self) -> bool {
        self.query.is_empty()
    }

    /// True when every top-level stage selects something and nothing fails
    /// to resolve.
    pub fn can_run(&self) -> bool {
        !self.is_empty() && self.writer().query_summary(&DataStyles::new()).is_runnable
    }

    /// A writer over the current query.
    pub fn writer(&self) -> QueryWriter<'_> {
        QueryWriter::new(&self.query, &self.source).with_settings(self.settings.writer.clone())
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Run `edit`, restoring the query if it fails. With `verify` set, the
    /// edited query must also render.
    fn transact<T>(
        &mut self,
        op: &str,
        path: Option<&StagePath>,
        verify: bool,
        edit: impl FnOnce(&mut Self) -> BuilderResult<T>,
    ) -> BuilderResult<T> {
        let stage = path.map(ToString::to_string).unwrap_or_default();
        tracing::debug!(op, stage = %stage, "editing query");

        let backup = self.query.clone();
        let result = edit(self).and_then(|value| {
            if verify && self.settings.builder.verify_render {
                self.writer().query_string_for_model()?;
            }
            Ok(value)
        });

        if let Err(err) = &result {
            tracing::warn!(op, stage = %stage, error = %err, "edit rejected, restoring query");
            self.query = backup;
        }
        result
    }

    /// Make every hop of `path` an inline nested query.
    fn expand_stage_at_path(&mut self, path: &StagePath) -> BuilderResult<()> {
        for _ in 0..=path.hops.len() {
            match locate(&self.query, path)? {
                Located::Stage => return Ok(()),
                Located::Unmaterialized {
                    parent,
                    field_index,
                    path: field_path,
                } => {
                    tracing::debug!(stage = %parent, field = %field_path, "materializing nested query");
                    self.materialize(&parent, field_index, None)?;
                }
            }
        }
        Err(not_found(path))
    }

    /// Expand `path` and return the stage with the schema entering it. Only
    /// reduce stages can be edited.
    fn editable(&mut self, path: &StagePath) -> BuilderResult<(&mut Stage, SourceDef)> {
        self.expand_stage_at_path(path)?;
        let source = source_for_stage_at_path(&self.source, &self.query, path)?;
        let stage = stage_at_path_mut(&mut self.query, path)?;
        if stage.kind != StageKind::Reduce {
            return Err(BuilderError::InvalidStageKind {
                path: path.to_string(),
                kind: stage.kind,
            });
        }
        Ok((stage, source))
    }

    /// Swap a reference for its catalog definition.
    fn materialize(
        &mut self,
        path: &StagePath,
        field_index: usize,
        catalog: Option<&SourceDef>,
    ) -> BuilderResult<()> {
        let (stage, source) = self.editable(path)?;
        let field = field_at(stage, field_index)?;

        let (field_path, name) = match field {
            QueryFieldDef::Reference { path } => (path.clone(), field.output_name()),
            QueryFieldDef::Renamed { path, name, .. } => (path.clone(), name.clone()),
            _ => return Err(BuilderError::NotAReference { field_index }),
        };

        let catalog = catalog.unwrap_or(&source);
        let joined = field_path.rsplit_once('.').map(|(prefix, _)| prefix);
        let definition = match catalog.field_at_path(&field_path)? {
            CatalogField::Dimension(atomic) => {
                expression_for(name, &field_path, joined, atomic, false)
            }
            CatalogField::Measure(atomic) => expression_for(name, &field_path, joined, atomic, true),
            CatalogField::Query(query) => {
                let mut pipeline = match joined {
                    Some(prefix) => rebase_pipeline(prefix, &query.pipeline),
                    None => query.pipeline.clone(),
                };
                name_positional_order_bys(&mut pipeline);
                QueryFieldDef::Nested { name, pipeline }
            }
            CatalogField::Source(_) => {
                return Err(BuilderError::NotRenderable { path: field_path })
            }
        };

        stage.fields[field_index] = definition;
        Ok(())
    }

    // =========================================================================
    // Fields
    // =========================================================================

    /// Remove a bare reference to `field_path`, or add one in class order.
    /// Removing also drops order-by entries naming the field.
    pub fn toggle_field(&mut self, path: &StagePath, field_path: &str) -> BuilderResult<()> {
        self.transact("toggle_field", Some(path), false, |b| {
            let (stage, source) = b.editable(path)?;
            let existing = stage
                .fields
                .iter()
                .position(|f| matches!(f, QueryFieldDef::Reference { path } if path == field_path));

            match existing {
                Some(index) => {
                    let removed = stage.fields.remove(index);
                    let name = removed.output_name();
                    stage.order_by.retain(|o| !o.names(&name));
                }
                None => insert_by_class(stage, &source, QueryFieldDef::reference(field_path))?,
            }
            Ok(())
        })
    }

    /// Insert any definition in class order.
    pub fn add_field(&mut self, path: &StagePath, field: QueryFieldDef) -> BuilderResult<()> {
        self.transact("add_field", Some(path), true, |b| {
            let (stage, source) = b.editable(path)?;
            insert_by_class(stage, &source, field)
        })
    }

    /// Insert an inline nested query with one blank stage.
    pub fn add_new_nested_query(&mut self, path: &StagePath, name: &str) -> BuilderResult<()> {
        self.transact("add_new_nested_query", Some(path), false, |b| {
            let (stage, source) = b.editable(path)?;
            insert_by_class(stage, &source, QueryFieldDef::nested(name))
        })
    }

    pub fn remove_field(&mut self, path: &StagePath, field_index: usize) -> BuilderResult<()> {
        self.transact("remove_field", Some(path), false, |b| {
            let (stage, _) = b.editable(path)?;
            field_at(stage, field_index)?;
            let name = stage.fields.remove(field_index).output_name();
            stage.order_by.retain(|o| !o.names(&name));
            Ok(())
        })
    }

    /// Reorder fields; `permutation[i]` is the current index of the field that
    /// moves to position `i`.
    pub fn reorder_fields(&mut self, path: &StagePath, permutation: &[usize]) -> BuilderResult<()> {
        self.transact("reorder_fields", Some(path), false, |b| {
            let (stage, _) = b.editable(path)?;
            let len = stage.fields.len();

            if permutation.len() != len {
                return Err(BuilderError::InvalidPermutation {
                    reason: format!("expected {} indexes, got {}", len, permutation.len()),
                });
            }
            let mut seen = HashSet::new();
            for &index in permutation {
                if index >= len || !seen.insert(index) {
                    return Err(BuilderError::InvalidPermutation {
                        reason: format!("index {} is out of range or repeated", index),
                    });
                }
            }

            stage.fields = permutation
                .iter()
                .map(|&index| stage.fields[index].clone())
                .collect();
            Ok(())
        })
    }

    /// Give a field a new output name. A bare reference becomes a renamed
    /// entry with its kind and type captured now. Order-by entries follow.
    pub fn rename_field(
        &mut self,
        path: &StagePath,
        field_index: usize,
        new_name: &str,
    ) -> BuilderResult<()> {
        self.transact("rename_field", Some(path), true, |b| {
            let (stage, source) = b.editable(path)?;
            let field = field_at(stage, field_index)?;
            let old_name = field.output_name();

            let renamed = match field {
                QueryFieldDef::Reference { path } => {
                    let resolved = resolve_field(&source, field)?;
                    QueryFieldDef::Renamed {
                        path: path.clone(),
                        name: new_name.into(),
                        kind: resolved.kind,
                        data_type: resolved.data_type,
                    }
                }
                other => {
                    let mut other = other.clone();
                    match &mut other {
                        QueryFieldDef::Filtered { name, .. } => *name = Some(new_name.into()),
                        QueryFieldDef::Renamed { name, .. }
                        | QueryFieldDef::Expression { name, .. }
                        | QueryFieldDef::Nested { name, .. } => *name = new_name.into(),
                        QueryFieldDef::Reference { .. } => {}
                    }
                    other
                }
            };

            stage.fields[field_index] = renamed;
            rename_order_bys(stage, &old_name, new_name);
            Ok(())
        })
    }

    /// Replace a reference with an inline copy of its definition, looked up
    /// in `catalog` or in the schema entering the stage.
    pub fn replace_with_definition(
        &mut self,
        path: &StagePath,
        field_index: usize,
        catalog: Option<&SourceDef>,
    ) -> BuilderResult<()> {
        self.transact("replace_with_definition", Some(path), true, |b| {
            b.materialize(path, field_index, catalog)
        })
    }

    /// Swap a field for another definition, keeping its position.
    pub fn edit_field_definition(
        &mut self,
        path: &StagePath,
        field_index: usize,
        field: QueryFieldDef,
    ) -> BuilderResult<()> {
        self.transact("edit_field_definition", Some(path), true, |b| {
            let (stage, source) = b.editable(path)?;
            let old_name = field_at(stage, field_index)?.output_name();
            resolve_field(&source, &field)?;
            let new_name = field.output_name();
            stage.fields[field_index] = field;
            rename_order_bys(stage, &old_name, &new_name);
            Ok(())
        })
    }

    /// Sort fields by name within each class.
    pub fn sort_fields(&mut self, path: &StagePath) -> BuilderResult<()> {
        self.transact("sort_fields", Some(path), false, |b| {
            let (stage, source) = b.editable(path)?;
            stage
                .fields
                .sort_by_cached_key(|f| (field_class(&source, f), f.output_name()));
            Ok(())
        })
    }

    // =========================================================================
    // Filters
    // =========================================================================

    /// Append a stage-level filter.
    pub fn add_filter(&mut self, path: &StagePath, filter: FilterCondition) -> BuilderResult<()> {
        self.transact("add_filter", Some(path), false, |b| {
            let (stage, _) = b.editable(path)?;
            stage.filters.push(filter);
            Ok(())
        })
    }

    /// Attach a filter to one measure, optionally renaming it. Kind and type
    /// are resolved now and frozen into the filtered entry.
    pub fn add_filter_to_field(
        &mut self,
        path: &StagePath,
        field_index: usize,
        filter: FilterCondition,
        new_name: Option<&str>,
    ) -> BuilderResult<()> {
        self.transact("add_filter_to_field", Some(path), true, |b| {
            let (stage, source) = b.editable(path)?;
            let field = field_at(stage, field_index)?;
            let resolved = resolve_field(&source, field)?;
            let old_name = resolved.name.clone();

            if resolved.kind != FieldKind::Measure {
                return Err(BuilderError::FilterNotSupported {
                    name: resolved.name,
                });
            }

            let filtered = match field {
                QueryFieldDef::Reference { path } => QueryFieldDef::Filtered {
                    path: path.clone(),
                    name: new_name.map(String::from),
                    filters: vec![filter],
                    kind: resolved.kind,
                    data_type: resolved.data_type,
                },
                QueryFieldDef::Renamed {
                    path,
                    name,
                    kind,
                    data_type,
                } => QueryFieldDef::Filtered {
                    path: path.clone(),
                    name: Some(new_name.unwrap_or(name.as_str()).to_string()),
                    filters: vec![filter],
                    kind: *kind,
                    data_type: *data_type,
                },
                QueryFieldDef::Filtered {
                    path,
                    name,
                    filters,
                    kind,
                    data_type,
                } => {
                    let mut filters = filters.clone();
                    filters.push(filter);
                    QueryFieldDef::Filtered {
                        path: path.clone(),
                        name: new_name.map(String::from).or_else(|| name.clone()),
                        filters,
                        kind: *kind,
                        data_type: *data_type,
                    }
                }
                QueryFieldDef::Expression { .. } | QueryFieldDef::Nested { .. } => {
                    return Err(BuilderError::FilterNotSupported {
                        name: resolved.name,
                    })
                }
            };

            let new_name = filtered.output_name();
            stage.fields[field_index] = filtered;
            rename_order_bys(stage, &old_name, &new_name);
            Ok(())
        })
    }

    /// Replace a stage filter, or a filter of the field at `field_index`.
    pub fn edit_filter(
        &mut self,
        path: &StagePath,
        filter_index: usize,
        filter: FilterCondition,
        field_index: Option<usize>,
    ) -> BuilderResult<()> {
        self.transact("edit_filter", Some(path), true, |b| {
            let (stage, _) = b.editable(path)?;
            let filters = filters_mut(stage, field_index)?;
            let len = filters.len();
            let slot = filters
                .get_mut(filter_index)
                .ok_or(BuilderError::FilterIndexOutOfRange {
                    index: filter_index,
                    len,
                })?;
            *slot = filter;
            Ok(())
        })
    }

    /// Remove a stage filter, or a filter of the field at `field_index`. A
    /// filtered field left without filters goes back to a plain reference,
    /// keeping its name if it had one.
    pub fn remove_filter(
        &mut self,
        path: &StagePath,
        filter_index: usize,
        field_index: Option<usize>,
    ) -> BuilderResult<()> {
        self.transact("remove_filter", Some(path), false, |b| {
            let (stage, _) = b.editable(path)?;
            let filters = filters_mut(stage, field_index)?;
            if filter_index >= filters.len() {
                return Err(BuilderError::FilterIndexOutOfRange {
                    index: filter_index,
                    len: filters.len(),
                });
            }
            filters.remove(filter_index);

            let Some(field_index) = field_index else {
                return Ok(());
            };
            let reverted = match &stage.fields[field_index] {
                QueryFieldDef::Filtered {
                    path,
                    name,
                    filters,
                    kind,
                    data_type,
                } if filters.is_empty() => Some(match name {
                    Some(name) => QueryFieldDef::Renamed {
                        path: path.clone(),
                        name: name.clone(),
                        kind: *kind,
                        data_type: *data_type,
                    },
                    None => QueryFieldDef::reference(path),
                }),
                _ => None,
            };
            if let Some(reverted) = reverted {
                stage.fields[field_index] = reverted;
            }
            Ok(())
        })
    }

    /// Decode a stored filter for editing, in the family matching the type of
    /// the field it filters.
    pub fn filter_editor_state(
        &self,
        path: &StagePath,
        filter_index: usize,
        field_index: Option<usize>,
    ) -> BuilderResult<Filter> {
        let (stage, source) = stage_and_source(&self.source, &self.query, path)?;

        let filters = match field_index {
            None => &stage.filters,
            Some(index) => match field_at(&stage, index)? {
                QueryFieldDef::Filtered { filters, .. } => filters,
                other => {
                    return Err(BuilderError::FilterNotSupported {
                        name: other.output_name(),
                    })
                }
            },
        };
        let condition = filters
            .get(filter_index)
            .ok_or(BuilderError::FilterIndexOutOfRange {
                index: filter_index,
                len: filters.len(),
            })?;

        let decoded = decode_filter(&condition.code);
        let family = source
            .field_at_path(&condition.field)
            .ok()
            .and_then(CatalogField::data_type)
            .and_then(FilterFamily::for_type);

        Ok(match (family, decoded.filter.family()) {
            (Some(wanted), Some(found)) if wanted != found => Filter::Generic(
                GenericFilter::Custom {
                    partial: condition.code.clone(),
                },
            )
            .into_family(wanted),
            (Some(wanted), _) => decoded.filter.into_family(wanted),
            (None, _) => decoded.filter,
        })
    }

    // =========================================================================
    // Limit and ordering
    // =========================================================================

    pub fn add_limit(&mut self, path: &StagePath, limit: u64) -> BuilderResult<()> {
        self.transact("add_limit", Some(path), false, |b| {
            b.editable(path)?.0.limit = Some(limit);
            Ok(())
        })
    }

    pub fn remove_limit(&mut self, path: &StagePath) -> BuilderResult<()> {
        self.transact("remove_limit", Some(path), false, |b| {
            b.editable(path)?.0.limit = None;
            Ok(())
        })
    }

    /// Sort on the field at `field_index`, recorded by its current name.
    pub fn add_order_by(
        &mut self,
        path: &StagePath,
        field_index: usize,
        dir: Option<SortDir>,
    ) -> BuilderResult<()> {
        self.transact("add_order_by", Some(path), false, |b| {
            let (stage, _) = b.editable(path)?;
            let name = field_at(stage, field_index)?.output_name();
            stage.order_by.push(OrderBy::by_name(&name, dir));
            Ok(())
        })
    }

    pub fn edit_order_by(
        &mut self,
        path: &StagePath,
        order_by_index: usize,
        dir: Option<SortDir>,
    ) -> BuilderResult<()> {
        self.transact("edit_order_by", Some(path), false, |b| {
            let (stage, _) = b.editable(path)?;
            let len = stage.order_by.len();
            let order_by =
                stage
                    .order_by
                    .get_mut(order_by_index)
                    .ok_or(BuilderError::OrderByIndexOutOfRange {
                        index: order_by_index,
                        len,
                    })?;
            order_by.dir = dir;
            Ok(())
        })
    }

    pub fn remove_order_by(&mut self, path: &StagePath, order_by_index: usize) -> BuilderResult<()> {
        self.transact("remove_order_by", Some(path), false, |b| {
            let (stage, _) = b.editable(path)?;
            if order_by_index >= stage.order_by.len() {
                return Err(BuilderError::OrderByIndexOutOfRange {
                    index: order_by_index,
                    len: stage.order_by.len(),
                });
            }
            stage.order_by.remove(order_by_index);
            Ok(())
        })
    }

    // =========================================================================
    // Stages
    // =========================================================================

    /// Append a blank stage and return its path.
    ///
    /// - no path: to the top-level pipeline
    /// - a path: to the pipeline containing that stage
    /// - a path and a field index: to the nested query at that field
    pub fn add_stage(
        &mut self,
        path: Option<&StagePath>,
        field_index: Option<usize>,
    ) -> BuilderResult<StagePath> {
        self.transact("add_stage", path, false, |b| {
            let target = match (path, field_index) {
                (None, _) => StagePath::root(0),
                (Some(path), None) => path.clone(),
                (Some(path), Some(field_index)) => path.nested(field_index, 0),
            };
            b.expand_stage_at_path(&target)?;
            let pipeline = pipeline_at_path_mut(&mut b.query, &target)?;
            pipeline.push(Stage::reduce());
            Ok(target.sibling(pipeline.len() - 1))
        })
    }

    /// Remove a stage. A pipeline is never left empty: removing its only
    /// stage leaves one blank stage.
    pub fn remove_stage(&mut self, path: &StagePath) -> BuilderResult<()> {
        self.transact("remove_stage", Some(path), false, |b| {
            b.expand_stage_at_path(path)?;
            let pipeline = pipeline_at_path_mut(&mut b.query, path)?;
            if path.stage_index >= pipeline.len() {
                return Err(not_found(path));
            }
            pipeline.remove(path.stage_index);
            if pipeline.is_empty() {
                pipeline.push(Stage::reduce());
            }
            Ok(())
        })
    }

    // =========================================================================
    // Loading
    // =========================================================================

    /// Merge a precompiled catalog query into the current one, stage by
    /// stage. Positional order-by entries of the loaded query are rewritten
    /// as field names first.
    pub fn load_query(&mut self, query_path: &str) -> BuilderResult<()> {
        self.transact("load_query", None, false, |b| {
            let mut definition = b.source.query_at_path(query_path)?.clone();
            if b.query.is_empty() || b.query.name.is_empty() {
                b.query.name = definition.name.clone();
            }
            if let Some((prefix, _)) = query_path.rsplit_once('.') {
                definition.pipeline = rebase_pipeline(prefix, &definition.pipeline);
            }
            name_positional_order_bys(&mut definition.pipeline);

            for (index, incoming) in definition.pipeline.into_iter().enumerate() {
                match b.query.pipeline.get_mut(index) {
                    Some(existing) => merge_stage(existing, incoming),
                    None => b.query.pipeline.push(incoming),
                }
            }
            Ok(())
        })
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn field_at(stage: &Stage, index: usize) -> BuilderResult<&QueryFieldDef> {
    stage
        .fields
        .get(index)
        .ok_or(BuilderError::FieldIndexOutOfRange {
            index,
            len: stage.fields.len(),
        })
}

/// Inline definition of a dimension or measure. Fields of a joined source
/// keep their path, since their expressions read the joined source.
fn expression_for(
    name: String,
    path: &str,
    joined: Option<&str>,
    atomic: &AtomicField,
    is_calculation: bool,
) -> QueryFieldDef {
    let code = match (&atomic.expression, joined) {
        (Some(expression), None) => expression.clone(),
        _ => quote_path(path),
    };
    QueryFieldDef::Expression {
        name,
        code,
        is_calculation,
        data_type: Some(atomic.data_type),
    }
}

fn filters_mut(
    stage: &mut Stage,
    field_index: Option<usize>,
) -> BuilderResult<&mut Vec<FilterCondition>> {
    let Some(index) = field_index else {
        return Ok(&mut stage.filters);
    };
    let len = stage.fields.len();
    match stage.fields.get_mut(index) {
        Some(QueryFieldDef::Filtered { filters, .. }) => Ok(filters),
        Some(other) => Err(BuilderError::FilterNotSupported {
            name: other.output_name(),
        }),
        None => Err(BuilderError::FieldIndexOutOfRange { index, len }),
    }
}

/// Sort class of an existing entry. Entries that no longer resolve sort last.
fn field_class(source: &SourceDef, field: &QueryFieldDef) -> FieldKind {
    resolve_field(source, field)
        .map(|resolved| resolved.kind)
        .unwrap_or(FieldKind::Source)
}

/// Insert before the first entry of a strictly greater class.
fn insert_by_class(
    stage: &mut Stage,
    source: &SourceDef,
    field: QueryFieldDef,
) -> BuilderResult<()> {
    let kind = resolve_field(source, &field)?.kind;
    let at = stage
        .fields
        .iter()
        .position(|existing| field_class(source, existing) > kind)
        .unwrap_or(stage.fields.len());
    stage.fields.insert(at, field);
    Ok(())
}

fn rename_order_bys(stage: &mut Stage, old_name: &str, new_name: &str) {
    if old_name == new_name {
        return;
    }
    for order_by in &mut stage.order_by {
        if order_by.names(old_name) {
            order_by.field = OrderByField::Name(new_name.into());
        }
    }
}

/// Rewrite 1-based positional order-by entries as field names, through
/// every nested pipeline, so that later field edits cannot shift what is
/// sorted on. Positions past the end of the field list are left alone.
fn name_positional_order_bys(pipeline: &mut [Stage]) {
    for stage in pipeline {
        for order_by in &mut stage.order_by {
            if let OrderByField::Position(position) = order_by.field {
                let name = position
                    .checked_sub(1)
                    .and_then(|index| stage.fields.get(index))
                    .map(QueryFieldDef::output_name);
                if let Some(name) = name {
                    order_by.field = OrderByField::Name(name);
                }
            }
        }
        for field in &mut stage.fields {
            if let QueryFieldDef::Nested { pipeline, .. } = field {
                name_positional_order_bys(pipeline);
            }
        }
    }
}

fn merge_stage(existing: &mut Stage, incoming: Stage) {
    if *existing == Stage::reduce() {
        *existing = incoming;
        return;
    }

    let incoming_names: HashSet<String> =
        incoming.fields.iter().map(QueryFieldDef::output_name).collect();
    let kept: Vec<QueryFieldDef> = existing
        .fields
        .drain(..)
        .filter(|f| !incoming_names.contains(&f.output_name()))
        .collect();
    existing.fields = incoming.fields;
    existing.fields.extend(kept);

    for filter in incoming.filters {
        if !existing.filters.iter().any(|f| f.code == filter.code) {
            existing.filters.push(filter);
        }
    }
    if incoming.limit.is_some() {
        existing.limit = incoming.limit;
    }
    if !incoming.order_by.is_empty() {
        existing.order_by = incoming.order_by;
    }
}
