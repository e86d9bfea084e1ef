//! Scalar types and field classification.

use serde::{Deserialize, Serialize};

/// Scalar type of a dimension or measure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarType {
    String,
    Number,
    Boolean,
    Date,
    Timestamp,
    Json,
    Unsupported,
}

impl ScalarType {
    /// Check if this type is a date or timestamp.
    pub fn is_temporal(&self) -> bool {
        matches!(self, ScalarType::Date | ScalarType::Timestamp)
    }
}

/// How a field behaves inside a stage.
///
/// Declaration order is the sort-class order used when inserting fields:
/// dimensions first, then measures, nested queries, and sources last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Dimension,
    Measure,
    Query,
    Source,
}

impl FieldKind {
    /// Classify a scalar entry from its calculation flag.
    pub fn from_calculation(is_calculation: bool) -> Self {
        if is_calculation {
            FieldKind::Measure
        } else {
            FieldKind::Dimension
        }
    }
}
