//! Typed filters, one closed union per filter family.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::catalog::ScalarType;

// =============================================================================
// String filters
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StringFilter {
    IsEqualTo { values: Vec<String> },
    IsNotEqualTo { values: Vec<String> },
    StartsWith { values: Vec<String> },
    DoesNotStartWith { values: Vec<String> },
    Contains { values: Vec<String> },
    DoesNotContain { values: Vec<String> },
    EndsWith { values: Vec<String> },
    DoesNotEndWith { values: Vec<String> },
    IsBlank,
    IsNotBlank,
    IsNull,
    IsNotNull,
    Custom { partial: String },
}

/// Variant tags of [`StringFilter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StringFilterType {
    IsEqualTo,
    IsNotEqualTo,
    StartsWith,
    DoesNotStartWith,
    Contains,
    DoesNotContain,
    EndsWith,
    DoesNotEndWith,
    IsBlank,
    IsNotBlank,
    IsNull,
    IsNotNull,
    Custom,
}

impl StringFilter {
    pub fn filter_type(&self) -> StringFilterType {
        match self {
            StringFilter::IsEqualTo { .. } => StringFilterType::IsEqualTo,
            StringFilter::IsNotEqualTo { .. } => StringFilterType::IsNotEqualTo,
            StringFilter::StartsWith { .. } => StringFilterType::StartsWith,
            StringFilter::DoesNotStartWith { .. } => StringFilterType::DoesNotStartWith,
            StringFilter::Contains { .. } => StringFilterType::Contains,
            StringFilter::DoesNotContain { .. } => StringFilterType::DoesNotContain,
            StringFilter::EndsWith { .. } => StringFilterType::EndsWith,
            StringFilter::DoesNotEndWith { .. } => StringFilterType::DoesNotEndWith,
            StringFilter::IsBlank => StringFilterType::IsBlank,
            StringFilter::IsNotBlank => StringFilterType::IsNotBlank,
            StringFilter::IsNull => StringFilterType::IsNull,
            StringFilter::IsNotNull => StringFilterType::IsNotNull,
            StringFilter::Custom { .. } => StringFilterType::Custom,
        }
    }

    /// Operand list for the multi-value variants.
    pub fn values(&self) -> Option<&[String]> {
        match self {
            StringFilter::IsEqualTo { values }
            | StringFilter::IsNotEqualTo { values }
            | StringFilter::StartsWith { values }
            | StringFilter::DoesNotStartWith { values }
            | StringFilter::Contains { values }
            | StringFilter::DoesNotContain { values }
            | StringFilter::EndsWith { values }
            | StringFilter::DoesNotEndWith { values } => Some(values),
            _ => None,
        }
    }
}

// =============================================================================
// Number filters
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NumberFilter {
    IsEqualTo { values: Vec<f64> },
    IsNotEqualTo { values: Vec<f64> },
    IsGreaterThan { value: f64 },
    IsLessThan { value: f64 },
    IsGreaterThanOrEqualTo { value: f64 },
    IsLessThanOrEqualTo { value: f64 },
    IsBetween { lower_bound: f64, upper_bound: f64 },
    IsNull,
    IsNotNull,
    Custom { partial: String },
}

/// Variant tags of [`NumberFilter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumberFilterType {
    IsEqualTo,
    IsNotEqualTo,
    IsGreaterThan,
    IsLessThan,
    IsGreaterThanOrEqualTo,
    IsLessThanOrEqualTo,
    IsBetween,
    IsNull,
    IsNotNull,
    Custom,
}

impl NumberFilter {
    pub fn filter_type(&self) -> NumberFilterType {
        match self {
            NumberFilter::IsEqualTo { .. } => NumberFilterType::IsEqualTo,
            NumberFilter::IsNotEqualTo { .. } => NumberFilterType::IsNotEqualTo,
            NumberFilter::IsGreaterThan { .. } => NumberFilterType::IsGreaterThan,
            NumberFilter::IsLessThan { .. } => NumberFilterType::IsLessThan,
            NumberFilter::IsGreaterThanOrEqualTo { .. } => NumberFilterType::IsGreaterThanOrEqualTo,
            NumberFilter::IsLessThanOrEqualTo { .. } => NumberFilterType::IsLessThanOrEqualTo,
            NumberFilter::IsBetween { .. } => NumberFilterType::IsBetween,
            NumberFilter::IsNull => NumberFilterType::IsNull,
            NumberFilter::IsNotNull => NumberFilterType::IsNotNull,
            NumberFilter::Custom { .. } => NumberFilterType::Custom,
        }
    }
}

// =============================================================================
// Boolean filters
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BooleanFilter {
    IsTrue,
    IsFalse,
    IsTrueOrNull,
    IsFalseOrNull,
    IsNull,
    IsNotNull,
    Custom { partial: String },
}

/// Variant tags of [`BooleanFilter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BooleanFilterType {
    IsTrue,
    IsFalse,
    IsTrueOrNull,
    IsFalseOrNull,
    IsNull,
    IsNotNull,
    Custom,
}

impl BooleanFilter {
    pub fn filter_type(&self) -> BooleanFilterType {
        match self {
            BooleanFilter::IsTrue => BooleanFilterType::IsTrue,
            BooleanFilter::IsFalse => BooleanFilterType::IsFalse,
            BooleanFilter::IsTrueOrNull => BooleanFilterType::IsTrueOrNull,
            BooleanFilter::IsFalseOrNull => BooleanFilterType::IsFalseOrNull,
            BooleanFilter::IsNull => BooleanFilterType::IsNull,
            BooleanFilter::IsNotNull => BooleanFilterType::IsNotNull,
            BooleanFilter::Custom { .. } => BooleanFilterType::Custom,
        }
    }
}

// =============================================================================
// Time filters
// =============================================================================

/// Granularity of a time literal, and unit of a relative duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeGranularity {
    Second,
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Quarter,
    Year,
}

impl TimeGranularity {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeGranularity::Second => "second",
            TimeGranularity::Minute => "minute",
            TimeGranularity::Hour => "hour",
            TimeGranularity::Day => "day",
            TimeGranularity::Week => "week",
            TimeGranularity::Month => "month",
            TimeGranularity::Quarter => "quarter",
            TimeGranularity::Year => "year",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "second" => Some(TimeGranularity::Second),
            "minute" => Some(TimeGranularity::Minute),
            "hour" => Some(TimeGranularity::Hour),
            "day" => Some(TimeGranularity::Day),
            "week" => Some(TimeGranularity::Week),
            "month" => Some(TimeGranularity::Month),
            "quarter" => Some(TimeGranularity::Quarter),
            "year" => Some(TimeGranularity::Year),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TimeFilter {
    IsNull,
    IsNotNull,
    IsInThePast {
        amount: u32,
        unit: TimeGranularity,
    },
    IsInTheNext {
        amount: u32,
        unit: TimeGranularity,
    },
    IsLast {
        granularity: TimeGranularity,
    },
    IsThis {
        granularity: TimeGranularity,
    },
    IsNext {
        granularity: TimeGranularity,
    },
    IsOn {
        date: NaiveDateTime,
        granularity: TimeGranularity,
    },
    IsAfter {
        date: NaiveDateTime,
        granularity: TimeGranularity,
    },
    IsBefore {
        date: NaiveDateTime,
        granularity: TimeGranularity,
    },
    IsBetween {
        start: NaiveDateTime,
        end: NaiveDateTime,
        granularity: TimeGranularity,
    },
    Custom {
        partial: String,
    },
}

/// Variant tags of [`TimeFilter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeFilterType {
    IsNull,
    IsNotNull,
    IsInThePast,
    IsInTheNext,
    IsLast,
    IsThis,
    IsNext,
    IsOn,
    IsAfter,
    IsBefore,
    IsBetween,
    Custom,
}

impl TimeFilter {
    pub fn filter_type(&self) -> TimeFilterType {
        match self {
            TimeFilter::IsNull => TimeFilterType::IsNull,
            TimeFilter::IsNotNull => TimeFilterType::IsNotNull,
            TimeFilter::IsInThePast { .. } => TimeFilterType::IsInThePast,
            TimeFilter::IsInTheNext { .. } => TimeFilterType::IsInTheNext,
            TimeFilter::IsLast { .. } => TimeFilterType::IsLast,
            TimeFilter::IsThis { .. } => TimeFilterType::IsThis,
            TimeFilter::IsNext { .. } => TimeFilterType::IsNext,
            TimeFilter::IsOn { .. } => TimeFilterType::IsOn,
            TimeFilter::IsAfter { .. } => TimeFilterType::IsAfter,
            TimeFilter::IsBefore { .. } => TimeFilterType::IsBefore,
            TimeFilter::IsBetween { .. } => TimeFilterType::IsBetween,
            TimeFilter::Custom { .. } => TimeFilterType::Custom,
        }
    }
}

// =============================================================================
// Family-agnostic filters
// =============================================================================

/// Shapes shared by every family. The decoder produces these when a predicate
/// carries no family-specific operand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GenericFilter {
    IsNull,
    IsNotNull,
    Custom { partial: String },
}

/// Filter family, chosen from the filtered field's scalar type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterFamily {
    String,
    Number,
    Boolean,
    Time,
}

impl FilterFamily {
    pub fn for_type(data_type: ScalarType) -> Option<Self> {
        match data_type {
            ScalarType::String => Some(FilterFamily::String),
            ScalarType::Number => Some(FilterFamily::Number),
            ScalarType::Boolean => Some(FilterFamily::Boolean),
            ScalarType::Date | ScalarType::Timestamp => Some(FilterFamily::Time),
            ScalarType::Json | ScalarType::Unsupported => None,
        }
    }
}

/// A filter of any family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "family", content = "filter", rename_all = "snake_case")]
pub enum Filter {
    String(StringFilter),
    Number(NumberFilter),
    Boolean(BooleanFilter),
    Time(TimeFilter),
    Generic(GenericFilter),
}

impl Filter {
    pub fn family(&self) -> Option<FilterFamily> {
        match self {
            Filter::String(_) => Some(FilterFamily::String),
            Filter::Number(_) => Some(FilterFamily::Number),
            Filter::Boolean(_) => Some(FilterFamily::Boolean),
            Filter::Time(_) => Some(FilterFamily::Time),
            Filter::Generic(_) => None,
        }
    }

    /// Re-home a generic filter into `family`. Family-specific filters are
    /// returned unchanged.
    pub fn into_family(self, family: FilterFamily) -> Filter {
        let generic = match self {
            Filter::Generic(generic) => generic,
            other => return other,
        };

        match (family, generic) {
            (FilterFamily::String, GenericFilter::IsNull) => Filter::String(StringFilter::IsNull),
            (FilterFamily::String, GenericFilter::IsNotNull) => {
                Filter::String(StringFilter::IsNotNull)
            }
            (FilterFamily::String, GenericFilter::Custom { partial }) => {
                Filter::String(StringFilter::Custom { partial })
            }
            (FilterFamily::Number, GenericFilter::IsNull) => Filter::Number(NumberFilter::IsNull),
            (FilterFamily::Number, GenericFilter::IsNotNull) => {
                Filter::Number(NumberFilter::IsNotNull)
            }
            (FilterFamily::Number, GenericFilter::Custom { partial }) => {
                Filter::Number(NumberFilter::Custom { partial })
            }
            (FilterFamily::Boolean, GenericFilter::IsNull) => {
                Filter::Boolean(BooleanFilter::IsNull)
            }
            (FilterFamily::Boolean, GenericFilter::IsNotNull) => {
                Filter::Boolean(BooleanFilter::IsNotNull)
            }
            (FilterFamily::Boolean, GenericFilter::Custom { partial }) => {
                Filter::Boolean(BooleanFilter::Custom { partial })
            }
            (FilterFamily::Time, GenericFilter::IsNull) => Filter::Time(TimeFilter::IsNull),
            (FilterFamily::Time, GenericFilter::IsNotNull) => Filter::Time(TimeFilter::IsNotNull),
            (FilterFamily::Time, GenericFilter::Custom { partial }) => {
                Filter::Time(TimeFilter::Custom { partial })
            }
        }
    }

    /// Raw predicate text for custom filters of any family.
    pub fn partial(&self) -> Option<&str> {
        match self {
            Filter::String(StringFilter::Custom { partial })
            | Filter::Number(NumberFilter::Custom { partial })
            | Filter::Boolean(BooleanFilter::Custom { partial })
            | Filter::Time(TimeFilter::Custom { partial })
            | Filter::Generic(GenericFilter::Custom { partial }) => Some(partial),
            _ => None,
        }
    }
}
