//! Source definitions - the typed field tree a query runs against.

use serde::{Deserialize, Serialize};

use super::error::{ResolveError, ResolveResult};
use super::types::{FieldKind, ScalarType};
use crate::query::Stage;

/// A dimension or measure in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtomicField {
    pub name: String,
    pub data_type: ScalarType,
    /// Defining expression; `None` for raw columns.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,
}

/// A precompiled named query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryDef {
    pub name: String,
    pub pipeline: Vec<Stage>,
}

/// One entry of a source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CatalogField {
    Dimension(AtomicField),
    Measure(AtomicField),
    Query(QueryDef),
    Source(SourceDef),
}

impl CatalogField {
    pub fn name(&self) -> &str {
        match self {
            CatalogField::Dimension(f) | CatalogField::Measure(f) => &f.name,
            CatalogField::Query(q) => &q.name,
            CatalogField::Source(s) => &s.name,
        }
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            CatalogField::Dimension(_) => FieldKind::Dimension,
            CatalogField::Measure(_) => FieldKind::Measure,
            CatalogField::Query(_) => FieldKind::Query,
            CatalogField::Source(_) => FieldKind::Source,
        }
    }

    /// Scalar type for dimensions and measures.
    pub fn data_type(&self) -> Option<ScalarType> {
        match self {
            CatalogField::Dimension(f) | CatalogField::Measure(f) => Some(f.data_type),
            CatalogField::Query(_) | CatalogField::Source(_) => None,
        }
    }
}

/// A source: a named struct of fields, possibly containing nested sources.
///
/// Sources are produced by the external schema compiler. Stage outputs are
/// also expressed as sources so that pipelines can chain.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceDef {
    pub name: String,
    pub fields: Vec<CatalogField>,
}

impl SourceDef {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.into(),
            fields: vec![],
        }
    }

    /// Add a raw column.
    pub fn with_dimension(mut self, name: &str, data_type: ScalarType) -> Self {
        self.fields.push(CatalogField::Dimension(AtomicField {
            name: name.into(),
            data_type,
            expression: None,
        }));
        self
    }

    /// Add a calculated measure.
    pub fn with_measure(mut self, name: &str, data_type: ScalarType, expression: &str) -> Self {
        self.fields.push(CatalogField::Measure(AtomicField {
            name: name.into(),
            data_type,
            expression: Some(expression.into()),
        }));
        self
    }

    /// Add a precompiled query.
    pub fn with_query(mut self, name: &str, pipeline: Vec<Stage>) -> Self {
        self.fields.push(CatalogField::Query(QueryDef {
            name: name.into(),
            pipeline,
        }));
        self
    }

    /// Add a nested source (join).
    pub fn with_source(mut self, source: SourceDef) -> Self {
        self.fields.push(CatalogField::Source(source));
        self
    }

    pub fn with_field(mut self, field: CatalogField) -> Self {
        self.fields.push(field);
        self
    }

    /// Direct child by name.
    pub fn field(&self, name: &str) -> Option<&CatalogField> {
        self.fields.iter().find(|f| f.name() == name)
    }

    /// Look up a field by dotted path. Every segment but the last must name a
    /// nested source.
    pub fn field_at_path(&self, path: &str) -> ResolveResult<&CatalogField> {
        let mut current = self;
        let mut segments = path.split('.').peekable();

        while let Some(segment) = segments.next() {
            let field = current
                .field(segment)
                .ok_or_else(|| ResolveError::FieldNotFound { path: path.into() })?;

            if segments.peek().is_none() {
                return Ok(field);
            }

            match field {
                CatalogField::Source(source) => current = source,
                _ => {
                    return Err(ResolveError::NotASource {
                        segment: segment.into(),
                        path: path.into(),
                    })
                }
            }
        }

        Err(ResolveError::FieldNotFound { path: path.into() })
    }

    /// Look up a precompiled query by dotted path.
    pub fn query_at_path(&self, path: &str) -> ResolveResult<&QueryDef> {
        match self.field_at_path(path)? {
            CatalogField::Query(query) => Ok(query),
            _ => Err(ResolveError::NotAQuery { path: path.into() }),
        }
    }
}
