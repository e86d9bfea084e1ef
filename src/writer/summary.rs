//! Query summary - a flattened, pre-resolved view of a query for editors.
//!
//! Summaries are always produced. A field that fails to resolve becomes an
//! [`SummaryItem::ErrorField`] and the rest of the stage is still summarized.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::catalog::{FieldKind, ScalarType, SourceDef};
use crate::query::resolve::{nested_pipeline, pipeline_input, resolve_field};
use crate::query::{
    FilterCondition, OrderByField, Query, QueryFieldDef, SortDir, Stage, StageKind, StagePath,
};

/// Display style attached to an output field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataStyle {
    pub renderer: String,
}

/// Styles keyed by output field name.
pub type DataStyles = BTreeMap<String, DataStyle>;

/// One UI-facing element of a stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SummaryItem {
    Field {
        field_index: usize,
        name: String,
        kind: FieldKind,
        data_type: Option<ScalarType>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        path: Option<String>,
        /// Carries its own definition rather than being a bare reference.
        is_refined: bool,
        /// A style is attached by name.
        is_styled: bool,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        filters: Vec<FilterCondition>,
    },
    NestedQueryDefinition {
        field_index: usize,
        name: String,
        is_refined: bool,
        is_styled: bool,
        stages: Vec<StageSummary>,
    },
    ErrorField {
        field_index: usize,
        name: String,
        error: String,
    },
    DataStyle {
        field_index: usize,
        name: String,
        style: DataStyle,
    },
    Filter {
        filter_index: usize,
        field: String,
        code: String,
    },
    OrderBy {
        order_by_index: usize,
        field: OrderByField,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        dir: Option<SortDir>,
        /// Position of the sorted field in the stage, when it is there.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        field_index: Option<usize>,
    },
    Limit {
        limit: u64,
    },
}

/// A field a stage can be sorted on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderByCandidate {
    pub name: String,
    pub field_index: usize,
    pub data_type: Option<ScalarType>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageSummary {
    pub stage_path: StagePath,
    pub kind: StageKind,
    pub items: Vec<SummaryItem>,
    /// Schema entering the stage.
    pub input_source: SourceDef,
    pub order_by_fields: Vec<OrderByCandidate>,
}

impl StageSummary {
    fn has_errors(&self) -> bool {
        self.items.iter().any(|item| match item {
            SummaryItem::ErrorField { .. } => true,
            SummaryItem::NestedQueryDefinition { stages, .. } => {
                stages.iter().any(StageSummary::has_errors)
            }
            _ => false,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuerySummary {
    pub name: String,
    pub stages: Vec<StageSummary>,
    /// Every top-level stage selects a field and nothing failed to resolve.
    pub is_runnable: bool,
}

pub(crate) fn query_summary(source: &SourceDef, query: &Query, styles: &DataStyles) -> QuerySummary {
    let stages = pipeline_summary(source, &query.pipeline, None, styles);
    let is_runnable = query
        .pipeline
        .iter()
        .all(|stage| !stage.fields.is_empty())
        && !stages.iter().any(StageSummary::has_errors);

    QuerySummary {
        name: query.name.clone(),
        stages,
        is_runnable,
    }
}

/// Summaries for each stage of a pipeline. `parent` is the stage and field
/// index holding the pipeline when it is nested.
fn pipeline_summary(
    source: &SourceDef,
    pipeline: &[Stage],
    parent: Option<(&StagePath, usize)>,
    styles: &DataStyles,
) -> Vec<StageSummary> {
    pipeline
        .iter()
        .enumerate()
        .map(|(stage_index, stage)| {
            let stage_path = match parent {
                Some((path, field_index)) => path.nested(field_index, stage_index),
                None => StagePath::root(stage_index),
            };
            let input = pipeline_input(source, pipeline, stage_index);
            stage_summary(stage_path, &input, stage, styles)
        })
        .collect()
}

fn stage_summary(
    stage_path: StagePath,
    input: &SourceDef,
    stage: &Stage,
    styles: &DataStyles,
) -> StageSummary {
    let mut items = vec![];
    let mut order_by_fields = vec![];

    for (field_index, field) in stage.fields.iter().enumerate() {
        let name = field.output_name();
        let resolved = match resolve_field(input, field) {
            Ok(resolved) => resolved,
            Err(err) => {
                tracing::warn!(stage = %stage_path, field = %name, error = %err, "field failed to resolve");
                items.push(SummaryItem::ErrorField {
                    field_index,
                    name,
                    error: err.to_string(),
                });
                continue;
            }
        };
        let style = styles.get(&name);

        if resolved.kind == FieldKind::Query {
            match nested_pipeline(input, field) {
                Ok(pipeline) => items.push(SummaryItem::NestedQueryDefinition {
                    field_index,
                    name: name.clone(),
                    is_refined: field.is_refined(),
                    is_styled: style.is_some(),
                    stages: pipeline_summary(
                        input,
                        &pipeline,
                        Some((&stage_path, field_index)),
                        styles,
                    ),
                }),
                Err(err) => {
                    tracing::warn!(stage = %stage_path, field = %name, error = %err, "nested query failed to resolve");
                    items.push(SummaryItem::ErrorField {
                        field_index,
                        name,
                        error: err.to_string(),
                    });
                    continue;
                }
            }
        } else {
            let filters = match field {
                QueryFieldDef::Filtered { filters, .. } => filters.clone(),
                _ => vec![],
            };
            items.push(SummaryItem::Field {
                field_index,
                name: name.clone(),
                kind: resolved.kind,
                data_type: resolved.data_type,
                path: resolved.path,
                is_refined: field.is_refined(),
                is_styled: style.is_some(),
                filters,
            });
            order_by_fields.push(OrderByCandidate {
                name: name.clone(),
                field_index,
                data_type: resolved.data_type,
            });
        }

        if let Some(style) = style {
            items.push(SummaryItem::DataStyle {
                field_index,
                name,
                style: style.clone(),
            });
        }
    }

    for (filter_index, filter) in stage.filters.iter().enumerate() {
        items.push(SummaryItem::Filter {
            filter_index,
            field: filter.field.clone(),
            code: filter.code.clone(),
        });
    }

    for (order_by_index, order_by) in stage.order_by.iter().enumerate() {
        let field_index = match &order_by.field {
            OrderByField::Name(name) => stage.field_index_by_name(name),
            OrderByField::Position(position) => position
                .checked_sub(1)
                .filter(|index| *index < stage.fields.len()),
        };
        items.push(SummaryItem::OrderBy {
            order_by_index,
            field: order_by.field.clone(),
            dir: order_by.dir,
            field_index,
        });
    }

    if let Some(limit) = stage.limit {
        items.push(SummaryItem::Limit { limit });
    }

    StageSummary {
        stage_path,
        kind: stage.kind,
        items,
        input_source: input.clone(),
        order_by_fields,
    }
}
