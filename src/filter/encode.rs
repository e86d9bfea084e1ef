//! Typed filter → predicate text.

use super::literal::{
    format_duration, format_number, format_time, make_pattern, quote_path, quote_string,
    PatternShape,
};
use super::types::{BooleanFilter, Filter, GenericFilter, NumberFilter, StringFilter, TimeFilter};

/// Predicate emitted when a multi-value filter has no values.
const ALWAYS: &str = "true";

fn alternation(field: &str, op: &str, joiner: &str, literals: Vec<String>) -> String {
    if literals.is_empty() {
        return ALWAYS.into();
    }
    format!("{} {} {}", field, op, literals.join(joiner))
}

fn patterns(values: &[String], shape: PatternShape) -> Vec<String> {
    values
        .iter()
        .map(|v| quote_string(&make_pattern(v, shape)))
        .collect()
}

pub fn string_filter_to_string(field: &str, filter: &StringFilter) -> String {
    let field = quote_path(field);
    let quoted = |values: &[String]| values.iter().map(|v| quote_string(v)).collect::<Vec<_>>();

    match filter {
        StringFilter::IsEqualTo { values } => alternation(&field, "=", " | ", quoted(values)),
        StringFilter::IsNotEqualTo { values } => alternation(&field, "!=", " & ", quoted(values)),
        StringFilter::StartsWith { values } => {
            alternation(&field, "~", " | ", patterns(values, PatternShape::StartsWith))
        }
        StringFilter::DoesNotStartWith { values } => {
            alternation(&field, "!~", " & ", patterns(values, PatternShape::StartsWith))
        }
        StringFilter::Contains { values } => {
            alternation(&field, "~", " | ", patterns(values, PatternShape::Contains))
        }
        StringFilter::DoesNotContain { values } => {
            alternation(&field, "!~", " & ", patterns(values, PatternShape::Contains))
        }
        StringFilter::EndsWith { values } => {
            alternation(&field, "~", " | ", patterns(values, PatternShape::EndsWith))
        }
        StringFilter::DoesNotEndWith { values } => {
            alternation(&field, "!~", " & ", patterns(values, PatternShape::EndsWith))
        }
        StringFilter::IsBlank => format!("{} = ''", field),
        StringFilter::IsNotBlank => format!("{} != ''", field),
        StringFilter::IsNull => format!("{} = null", field),
        StringFilter::IsNotNull => format!("{} != null", field),
        StringFilter::Custom { partial } => partial.clone(),
    }
}

pub fn number_filter_to_string(field: &str, filter: &NumberFilter) -> String {
    let field = quote_path(field);
    let numbers = |values: &[f64]| values.iter().map(|v| format_number(*v)).collect::<Vec<_>>();

    match filter {
        NumberFilter::IsEqualTo { values } => alternation(&field, "=", " | ", numbers(values)),
        NumberFilter::IsNotEqualTo { values } => alternation(&field, "!=", " & ", numbers(values)),
        NumberFilter::IsGreaterThan { value } => format!("{} > {}", field, format_number(*value)),
        NumberFilter::IsLessThan { value } => format!("{} < {}", field, format_number(*value)),
        NumberFilter::IsGreaterThanOrEqualTo { value } => {
            format!("{} >= {}", field, format_number(*value))
        }
        NumberFilter::IsLessThanOrEqualTo { value } => {
            format!("{} <= {}", field, format_number(*value))
        }
        NumberFilter::IsBetween {
            lower_bound,
            upper_bound,
        } => format!(
            "{}: {} to {}",
            field,
            format_number(*lower_bound),
            format_number(*upper_bound)
        ),
        NumberFilter::IsNull => format!("{} = null", field),
        NumberFilter::IsNotNull => format!("{} != null", field),
        NumberFilter::Custom { partial } => partial.clone(),
    }
}

pub fn boolean_filter_to_string(field: &str, filter: &BooleanFilter) -> String {
    let field = quote_path(field);
    match filter {
        BooleanFilter::IsTrue => format!("{} = true", field),
        BooleanFilter::IsFalse => format!("{} = false", field),
        BooleanFilter::IsTrueOrNull => format!("{} = true | null", field),
        BooleanFilter::IsFalseOrNull => format!("{} = false | null", field),
        BooleanFilter::IsNull => format!("{} = null", field),
        BooleanFilter::IsNotNull => format!("{} != null", field),
        BooleanFilter::Custom { partial } => partial.clone(),
    }
}

pub fn time_filter_to_string(field: &str, filter: &TimeFilter) -> String {
    let field = quote_path(field);
    match filter {
        TimeFilter::IsNull => format!("{} = null", field),
        TimeFilter::IsNotNull => format!("{} != null", field),
        TimeFilter::IsInThePast { amount, unit } => {
            let duration = format_duration(*amount, *unit);
            format!("{}: now - {} for {}", field, duration, duration)
        }
        TimeFilter::IsInTheNext { amount, unit } => {
            format!("{}: now for {}", field, format_duration(*amount, *unit))
        }
        TimeFilter::IsLast { granularity } => {
            let unit = granularity.as_str();
            format!("{}: now.{} - 1 {}", field, unit, unit)
        }
        TimeFilter::IsThis { granularity } => format!("{}: now.{}", field, granularity.as_str()),
        TimeFilter::IsNext { granularity } => {
            let unit = granularity.as_str();
            format!("{}: now.{} + 1 {}", field, unit, unit)
        }
        TimeFilter::IsOn { date, granularity } => {
            format!("{}: {}", field, format_time(date, *granularity))
        }
        TimeFilter::IsAfter { date, granularity } => {
            format!("{} > {}", field, format_time(date, *granularity))
        }
        TimeFilter::IsBefore { date, granularity } => {
            format!("{} < {}", field, format_time(date, *granularity))
        }
        TimeFilter::IsBetween {
            start,
            end,
            granularity,
        } => format!(
            "{}: {} to {}",
            field,
            format_time(start, *granularity),
            format_time(end, *granularity)
        ),
        TimeFilter::Custom { partial } => partial.clone(),
    }
}

/// Encode a filter of any family.
pub fn filter_to_string(field: &str, filter: &Filter) -> String {
    match filter {
        Filter::String(f) => string_filter_to_string(field, f),
        Filter::Number(f) => number_filter_to_string(field, f),
        Filter::Boolean(f) => boolean_filter_to_string(field, f),
        Filter::Time(f) => time_filter_to_string(field, f),
        Filter::Generic(GenericFilter::IsNull) => format!("{} = null", quote_path(field)),
        Filter::Generic(GenericFilter::IsNotNull) => format!("{} != null", quote_path(field)),
        Filter::Generic(GenericFilter::Custom { partial }) => partial.clone(),
    }
}
