//! Predicate text → typed filter.
//!
//! Decoding is a best-effort cascade over fixed predicate shapes: boolean
//! forms, then string, number and time forms, then the generic null/not-null
//! forms. The first family that recognizes the text wins. Anything else
//! becomes a custom filter holding the original text verbatim.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::literal::{
    parse_time, read_pattern, split_numbers, split_strings, unquote_path, PatternShape, NUMBER,
    PATH, STRING, TIME, UNIT,
};
use super::types::{
    BooleanFilter, Filter, GenericFilter, NumberFilter, StringFilter, TimeFilter, TimeGranularity,
};

/// Result of decoding a predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedFilter {
    /// Field named by the predicate; `None` for custom predicates.
    pub field: Option<String>,
    pub filter: Filter,
}

fn pattern(body: &str) -> Regex {
    Regex::new(&format!(r"^{}\s*{}$", PATH, body)).unwrap()
}

fn or_list(atom: &str) -> String {
    format!(r"({a}(?:\s*\|\s*{a})*)", a = atom)
}

fn and_list(atom: &str) -> String {
    format!(r"({a}(?:\s*&\s*{a})*)", a = atom)
}

// Boolean forms
static BOOL_IS: LazyLock<Regex> = LazyLock::new(|| pattern(r"=\s*(true|false)"));
static BOOL_OR_NULL: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"=\s*(true|false)\s*\|\s*null"));

// String forms
static STRING_BLANK: LazyLock<Regex> = LazyLock::new(|| pattern(r"(=|!=)\s*''"));
static STRING_EQ: LazyLock<Regex> =
    LazyLock::new(|| pattern(&format!(r"=\s*{}", or_list(STRING))));
static STRING_NE: LazyLock<Regex> =
    LazyLock::new(|| pattern(&format!(r"!=\s*{}", and_list(STRING))));
static STRING_LIKE: LazyLock<Regex> =
    LazyLock::new(|| pattern(&format!(r"~\s*{}", or_list(STRING))));
static STRING_NOT_LIKE: LazyLock<Regex> =
    LazyLock::new(|| pattern(&format!(r"!~\s*{}", and_list(STRING))));

// Number forms
static NUMBER_EQ: LazyLock<Regex> =
    LazyLock::new(|| pattern(&format!(r"=\s*{}", or_list(NUMBER))));
static NUMBER_NE: LazyLock<Regex> =
    LazyLock::new(|| pattern(&format!(r"!=\s*{}", and_list(NUMBER))));
static NUMBER_CMP: LazyLock<Regex> =
    LazyLock::new(|| pattern(&format!(r"(>=|<=|>|<)\s*({})", NUMBER)));
static NUMBER_BETWEEN: LazyLock<Regex> =
    LazyLock::new(|| pattern(&format!(r":\s*({n})\s+to\s+({n})", n = NUMBER)));

// Time forms
static TIME_CMP: LazyLock<Regex> =
    LazyLock::new(|| pattern(&format!(r"(<|>)\s*({})", TIME)));
static TIME_BETWEEN: LazyLock<Regex> =
    LazyLock::new(|| pattern(&format!(r":\s*({t})\s+to\s+({t})", t = TIME)));
static TIME_ON: LazyLock<Regex> = LazyLock::new(|| pattern(&format!(r":\s*({})", TIME)));
static TIME_PAST: LazyLock<Regex> = LazyLock::new(|| {
    pattern(&format!(
        r":\s*now\s*-\s*(\d+)\s+{u}s?\s+for\s+(\d+)\s+{u}s?",
        u = UNIT
    ))
});
static TIME_NEXT_N: LazyLock<Regex> =
    LazyLock::new(|| pattern(&format!(r":\s*now\s+for\s+(\d+)\s+{}s?", UNIT)));
static TIME_LAST: LazyLock<Regex> =
    LazyLock::new(|| pattern(&format!(r":\s*now\.{u}\s*-\s*1\s+{u}s?", u = UNIT)));
static TIME_THIS: LazyLock<Regex> = LazyLock::new(|| pattern(&format!(r":\s*now\.{}", UNIT)));
static TIME_NEXT: LazyLock<Regex> =
    LazyLock::new(|| pattern(&format!(r":\s*now\.{u}\s*\+\s*1\s+{u}s?", u = UNIT)));

// Generic forms
static IS_NULL: LazyLock<Regex> = LazyLock::new(|| pattern(r"=\s*null"));
static IS_NOT_NULL: LazyLock<Regex> = LazyLock::new(|| pattern(r"!=\s*null"));

fn field_of(caps: &Captures) -> String {
    unquote_path(&caps[1])
}

fn unit_of(caps: &Captures, i: usize) -> Option<TimeGranularity> {
    TimeGranularity::parse(caps.get(i)?.as_str())
}

fn decode_boolean(code: &str) -> Option<(String, BooleanFilter)> {
    if let Some(caps) = BOOL_OR_NULL.captures(code) {
        let filter = match &caps[2] {
            "true" => BooleanFilter::IsTrueOrNull,
            _ => BooleanFilter::IsFalseOrNull,
        };
        return Some((field_of(&caps), filter));
    }
    let caps = BOOL_IS.captures(code)?;
    let filter = match &caps[2] {
        "true" => BooleanFilter::IsTrue,
        _ => BooleanFilter::IsFalse,
    };
    Some((field_of(&caps), filter))
}

/// Every pattern must share one wildcard shape. A bare `%` is an empty
/// starts-with or ends-with value and fits either; a list of nothing else
/// reads as starts-with.
fn like_values(list: &str) -> Option<(PatternShape, Vec<String>)> {
    let mut shape = None;
    let mut bare = false;
    let mut values = vec![];
    for raw in split_strings(list)? {
        if raw == "%" {
            bare = true;
            values.push(String::new());
            continue;
        }
        let (this_shape, value) = read_pattern(&raw)?;
        if shape.is_some_and(|s| s != this_shape) {
            return None;
        }
        shape = Some(this_shape);
        values.push(value);
    }
    match shape {
        Some(PatternShape::Contains) if bare => None,
        Some(shape) => Some((shape, values)),
        None => Some((PatternShape::StartsWith, values)),
    }
}

fn decode_string(code: &str) -> Option<(String, StringFilter)> {
    if let Some(caps) = STRING_BLANK.captures(code) {
        let filter = match &caps[2] {
            "=" => StringFilter::IsBlank,
            _ => StringFilter::IsNotBlank,
        };
        return Some((field_of(&caps), filter));
    }
    if let Some(caps) = STRING_EQ.captures(code) {
        let values = split_strings(&caps[2])?;
        return Some((field_of(&caps), StringFilter::IsEqualTo { values }));
    }
    if let Some(caps) = STRING_NE.captures(code) {
        let values = split_strings(&caps[2])?;
        return Some((field_of(&caps), StringFilter::IsNotEqualTo { values }));
    }
    if let Some(caps) = STRING_LIKE.captures(code) {
        let (shape, values) = like_values(&caps[2])?;
        let filter = match shape {
            PatternShape::StartsWith => StringFilter::StartsWith { values },
            PatternShape::EndsWith => StringFilter::EndsWith { values },
            PatternShape::Contains => StringFilter::Contains { values },
        };
        return Some((field_of(&caps), filter));
    }
    let caps = STRING_NOT_LIKE.captures(code)?;
    let (shape, values) = like_values(&caps[2])?;
    let filter = match shape {
        PatternShape::StartsWith => StringFilter::DoesNotStartWith { values },
        PatternShape::EndsWith => StringFilter::DoesNotEndWith { values },
        PatternShape::Contains => StringFilter::DoesNotContain { values },
    };
    Some((field_of(&caps), filter))
}

fn decode_number(code: &str) -> Option<(String, NumberFilter)> {
    if let Some(caps) = NUMBER_EQ.captures(code) {
        let values = split_numbers(&caps[2])?;
        return Some((field_of(&caps), NumberFilter::IsEqualTo { values }));
    }
    if let Some(caps) = NUMBER_NE.captures(code) {
        let values = split_numbers(&caps[2])?;
        return Some((field_of(&caps), NumberFilter::IsNotEqualTo { values }));
    }
    if let Some(caps) = NUMBER_CMP.captures(code) {
        let value: f64 = caps[3].parse().ok()?;
        let filter = match &caps[2] {
            ">=" => NumberFilter::IsGreaterThanOrEqualTo { value },
            "<=" => NumberFilter::IsLessThanOrEqualTo { value },
            ">" => NumberFilter::IsGreaterThan { value },
            _ => NumberFilter::IsLessThan { value },
        };
        return Some((field_of(&caps), filter));
    }
    let caps = NUMBER_BETWEEN.captures(code)?;
    let filter = NumberFilter::IsBetween {
        lower_bound: caps[2].parse().ok()?,
        upper_bound: caps[3].parse().ok()?,
    };
    Some((field_of(&caps), filter))
}

fn decode_time(code: &str) -> Option<(String, TimeFilter)> {
    if let Some(caps) = TIME_CMP.captures(code) {
        let (date, granularity) = parse_time(&caps[3])?;
        let filter = match &caps[2] {
            "<" => TimeFilter::IsBefore { date, granularity },
            _ => TimeFilter::IsAfter { date, granularity },
        };
        return Some((field_of(&caps), filter));
    }
    if let Some(caps) = TIME_BETWEEN.captures(code) {
        let (start, granularity) = parse_time(&caps[2])?;
        let (end, _) = parse_time(&caps[3])?;
        let filter = TimeFilter::IsBetween {
            start,
            end,
            granularity,
        };
        return Some((field_of(&caps), filter));
    }
    if let Some(caps) = TIME_ON.captures(code) {
        let (date, granularity) = parse_time(&caps[2])?;
        return Some((field_of(&caps), TimeFilter::IsOn { date, granularity }));
    }
    if let Some(caps) = TIME_PAST.captures(code) {
        let amount: u32 = caps[2].parse().ok()?;
        let unit = unit_of(&caps, 3)?;
        // `now - N units for N units` only; other windows stay custom.
        if caps[4].parse::<u32>().ok()? != amount || unit_of(&caps, 5)? != unit {
            return None;
        }
        return Some((field_of(&caps), TimeFilter::IsInThePast { amount, unit }));
    }
    if let Some(caps) = TIME_NEXT_N.captures(code) {
        let amount: u32 = caps[2].parse().ok()?;
        let unit = unit_of(&caps, 3)?;
        return Some((field_of(&caps), TimeFilter::IsInTheNext { amount, unit }));
    }
    if let Some(caps) = TIME_LAST.captures(code) {
        let granularity = unit_of(&caps, 2)?;
        if unit_of(&caps, 3)? != granularity {
            return None;
        }
        return Some((field_of(&caps), TimeFilter::IsLast { granularity }));
    }
    if let Some(caps) = TIME_NEXT.captures(code) {
        let granularity = unit_of(&caps, 2)?;
        if unit_of(&caps, 3)? != granularity {
            return None;
        }
        return Some((field_of(&caps), TimeFilter::IsNext { granularity }));
    }
    let caps = TIME_THIS.captures(code)?;
    let granularity = unit_of(&caps, 2)?;
    Some((field_of(&caps), TimeFilter::IsThis { granularity }))
}

/// Decode a predicate into a typed filter. Never fails: text that
/// matches no known shape becomes [`GenericFilter::Custom`].
pub fn decode_filter(code: &str) -> DecodedFilter {
    let text = code.trim();

    let decoded = decode_boolean(text)
        .map(|(field, f)| (field, Filter::Boolean(f)))
        .or_else(|| decode_string(text).map(|(field, f)| (field, Filter::String(f))))
        .or_else(|| decode_number(text).map(|(field, f)| (field, Filter::Number(f))))
        .or_else(|| decode_time(text).map(|(field, f)| (field, Filter::Time(f))));

    if let Some((field, filter)) = decoded {
        return DecodedFilter {
            field: Some(field),
            filter,
        };
    }

    if let Some(caps) = IS_NULL.captures(text) {
        return DecodedFilter {
            field: Some(field_of(&caps)),
            filter: Filter::Generic(GenericFilter::IsNull),
        };
    }
    if let Some(caps) = IS_NOT_NULL.captures(text) {
        return DecodedFilter {
            field: Some(field_of(&caps)),
            filter: Filter::Generic(GenericFilter::IsNotNull),
        };
    }

    DecodedFilter {
        field: None,
        filter: Filter::Generic(GenericFilter::Custom {
            partial: code.to_string(),
        }),
    }
}
