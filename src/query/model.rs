//! In-memory query pipeline.

use serde::{Deserialize, Serialize};

use crate::catalog::{FieldKind, ScalarType};
use crate::filter::{filter_to_string, Filter};

// =============================================================================
// Filters and sorting
// =============================================================================

/// A predicate attached to a stage or to a single field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCondition {
    /// Path of the filtered field.
    pub field: String,
    /// Predicate text.
    pub code: String,
}

impl FilterCondition {
    pub fn new(field: &str, code: &str) -> Self {
        Self {
            field: field.into(),
            code: code.into(),
        }
    }

    /// Encode `filter` against `field`.
    pub fn from_filter(field: &str, filter: &Filter) -> Self {
        Self {
            field: field.into(),
            code: filter_to_string(field, filter),
        }
    }
}

/// Sort direction. `None` on an [`OrderBy`] leaves it to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDir {
    Asc,
    Desc,
}

impl SortDir {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDir::Asc => "asc",
            SortDir::Desc => "desc",
        }
    }
}

/// What an order-by entry sorts on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderByField {
    /// Output field name.
    Name(String),
    /// 1-based output column position.
    Position(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    pub field: OrderByField,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<SortDir>,
}

impl OrderBy {
    pub fn by_name(name: &str, dir: Option<SortDir>) -> Self {
        Self {
            field: OrderByField::Name(name.into()),
            dir,
        }
    }

    pub fn names(&self, name: &str) -> bool {
        matches!(&self.field, OrderByField::Name(n) if n == name)
    }
}

// =============================================================================
// Field entries
// =============================================================================

/// One entry in a stage's field list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QueryFieldDef {
    /// A catalog field by dotted path.
    Reference { path: String },

    /// A catalog field under a new name. Kind and type are captured when the
    /// rename happens.
    Renamed {
        path: String,
        name: String,
        kind: FieldKind,
        data_type: Option<ScalarType>,
    },

    /// A catalog measure with field-scoped filters.
    Filtered {
        path: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        filters: Vec<FilterCondition>,
        kind: FieldKind,
        data_type: Option<ScalarType>,
    },

    /// User-authored expression.
    Expression {
        name: String,
        code: String,
        is_calculation: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        data_type: Option<ScalarType>,
    },

    /// Nested query ("turtle") with its own pipeline.
    Nested { name: String, pipeline: Vec<Stage> },
}

impl QueryFieldDef {
    pub fn reference(path: &str) -> Self {
        QueryFieldDef::Reference { path: path.into() }
    }

    pub fn expression(name: &str, code: &str, is_calculation: bool) -> Self {
        QueryFieldDef::Expression {
            name: name.into(),
            code: code.into(),
            is_calculation,
            data_type: None,
        }
    }

    /// A new nested query with one blank stage.
    pub fn nested(name: &str) -> Self {
        QueryFieldDef::Nested {
            name: name.into(),
            pipeline: vec![Stage::reduce()],
        }
    }

    /// Name the field has in the stage output.
    pub fn output_name(&self) -> String {
        match self {
            QueryFieldDef::Reference { path } => last_segment(path).to_string(),
            QueryFieldDef::Filtered { path, name, .. } => name
                .clone()
                .unwrap_or_else(|| last_segment(path).to_string()),
            QueryFieldDef::Renamed { name, .. }
            | QueryFieldDef::Expression { name, .. }
            | QueryFieldDef::Nested { name, .. } => name.clone(),
        }
    }

    /// Catalog path for entries that point at the catalog.
    pub fn path(&self) -> Option<&str> {
        match self {
            QueryFieldDef::Reference { path }
            | QueryFieldDef::Renamed { path, .. }
            | QueryFieldDef::Filtered { path, .. } => Some(path),
            QueryFieldDef::Expression { .. } | QueryFieldDef::Nested { .. } => None,
        }
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, QueryFieldDef::Reference { .. })
    }

    /// Anything other than a bare reference carries its own definition.
    pub fn is_refined(&self) -> bool {
        !self.is_reference()
    }
}

/// Last segment of a dotted path.
pub fn last_segment(path: &str) -> &str {
    path.rsplit('.').next().unwrap_or(path)
}

// =============================================================================
// Stages and queries
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    #[default]
    Reduce,
    /// Search-index stage from a precompiled query. Read-only.
    Index,
}

/// One pipeline segment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    #[serde(default)]
    pub kind: StageKind,
    #[serde(default)]
    pub fields: Vec<QueryFieldDef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<FilterCondition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub order_by: Vec<OrderBy>,
}

impl Stage {
    /// An empty reduce stage.
    pub fn reduce() -> Self {
        Self::default()
    }

    pub fn with_field(mut self, field: QueryFieldDef) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_filter(mut self, filter: FilterCondition) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_order_by(mut self, order_by: OrderBy) -> Self {
        self.order_by.push(order_by);
        self
    }

    /// Index of the first field whose output name is `name`.
    pub fn field_index_by_name(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.output_name() == name)
    }
}

/// A named pipeline. Never has zero stages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub name: String,
    pub pipeline: Vec<Stage>,
}

impl Default for Query {
    fn default() -> Self {
        Self {
            name: String::new(),
            pipeline: vec![Stage::reduce()],
        }
    }
}

impl Query {
    /// A blank query: one empty reduce stage.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn named(name: &str) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// True when the pipeline is exactly the blank sentinel.
    pub fn is_empty(&self) -> bool {
        self.pipeline == [Stage::reduce()]
    }
}

// =============================================================================
// Stage addressing
// =============================================================================

/// One step into a nested query: the stage it lives in, and its field index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StageHop {
    pub stage_index: usize,
    pub field_index: usize,
}

/// Address of a stage, possibly inside nested queries.
///
/// `hops` are walked outermost first; `stage_index` then picks a stage in the
/// innermost pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StagePath {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hops: Vec<StageHop>,
    pub stage_index: usize,
}

impl StagePath {
    /// Top-level stage `stage_index`.
    pub fn root(stage_index: usize) -> Self {
        Self {
            hops: vec![],
            stage_index,
        }
    }

    /// Stage `stage_index` of the nested query at `field_index` of this stage.
    pub fn nested(&self, field_index: usize, stage_index: usize) -> Self {
        let mut hops = self.hops.clone();
        hops.push(StageHop {
            stage_index: self.stage_index,
            field_index,
        });
        Self { hops, stage_index }
    }

    /// Same pipeline, different stage.
    pub fn sibling(&self, stage_index: usize) -> Self {
        Self {
            hops: self.hops.clone(),
            stage_index,
        }
    }

    /// The stage containing the innermost nested query, with its field index.
    pub fn parent(&self) -> Option<(StagePath, usize)> {
        let (last, rest) = self.hops.split_last()?;
        Some((
            StagePath {
                hops: rest.to_vec(),
                stage_index: last.stage_index,
            },
            last.field_index,
        ))
    }
}

impl std::fmt::Display for StagePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for hop in &self.hops {
            write!(f, "{}[{}]/", hop.stage_index, hop.field_index)?;
        }
        write!(f, "{}", self.stage_index)
    }
}
