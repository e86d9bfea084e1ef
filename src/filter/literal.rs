//! Shared lexical rules for filter predicates.
//!
//! Both the encoder and the decoder go through these helpers so that quoting,
//! pattern escaping and literal syntax stay consistent in both directions.

use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use regex::Regex;

use super::types::TimeGranularity;

/// A dotted field path; segments may be backtick-quoted.
pub(crate) const PATH: &str = r"((?:`[^`]+`|[A-Za-z_][A-Za-z0-9_]*)(?:\.(?:`[^`]+`|[A-Za-z_][A-Za-z0-9_]*))*)";

/// A single-quoted string with backslash escapes.
pub(crate) const STRING: &str = r"'(?:[^'\\]|\\.)*'";

pub(crate) const NUMBER: &str = r"-?\d+(?:\.\d+)?(?:[eE][+-]?\d+)?";

pub(crate) const TIME: &str =
    r"@(?:WK\d{4}-\d{2}-\d{2}|\d{4}-Q[1-4]|\d{4}(?:-\d{2}(?:-\d{2}(?: \d{2}(?::\d{2}(?::\d{2})?)?)?)?)?)";

pub(crate) const UNIT: &str = r"(second|minute|hour|day|week|month|quarter|year)";

static STRING_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(STRING).unwrap());

static NUMBER_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(NUMBER).unwrap());

static IDENT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

static TIME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^@(?:WK(\d{4})-(\d{2})-(\d{2})|(\d{4})-Q([1-4])|(\d{4})(?:-(\d{2})(?:-(\d{2})(?: (\d{2})(?::(\d{2})(?::(\d{2}))?)?)?)?)?)$",
    )
    .unwrap()
});

/// Words that must be quoted when used as identifiers.
const RESERVED: &[&str] = &[
    "aggregate", "and", "asc", "desc", "false", "for", "group_by", "index", "is", "limit", "nest",
    "not", "now", "null", "or", "order_by", "query", "source", "to", "true", "where",
];

// =============================================================================
// Identifiers
// =============================================================================

/// Backtick-quote a name unless it is a plain, unreserved identifier.
pub fn quote_identifier(name: &str) -> String {
    if IDENT_PATTERN.is_match(name) && !RESERVED.contains(&name) {
        name.to_string()
    } else {
        format!("`{}`", name)
    }
}

/// Quote each segment of a dotted path.
pub fn quote_path(path: &str) -> String {
    path.split('.')
        .map(quote_identifier)
        .collect::<Vec<_>>()
        .join(".")
}

/// Strip backticks from each segment of a dotted path.
pub fn unquote_path(path: &str) -> String {
    path.split('.')
        .map(|segment| segment.trim_matches('`'))
        .collect::<Vec<_>>()
        .join(".")
}

// =============================================================================
// Strings
// =============================================================================

/// Single-quote a string, escaping `\` and `'`.
pub fn quote_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        if c == '\\' || c == '\'' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('\'');
    out
}

/// Inverse of [`quote_string`]. Returns `None` if `lit` is not a quoted string.
pub fn unquote_string(lit: &str) -> Option<String> {
    let inner = lit.strip_prefix('\'')?.strip_suffix('\'')?;
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            out.push(chars.next()?);
        } else {
            out.push(c);
        }
    }
    Some(out)
}

/// All quoted strings in a `|`/`&`-separated list, unquoted.
pub fn split_strings(list: &str) -> Option<Vec<String>> {
    STRING_PATTERN
        .find_iter(list)
        .map(|m| unquote_string(m.as_str()))
        .collect()
}

/// Double literal `%` so it cannot be read as a wildcard.
pub fn escape_pattern(s: &str) -> String {
    s.replace('%', "%%")
}

/// Inverse of [`escape_pattern`]. Returns `None` if the text contains a lone
/// `%`, i.e. a wildcard.
pub fn unescape_pattern(s: &str) -> Option<String> {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '%' {
            if chars.next() != Some('%') {
                return None;
            }
        }
        out.push(c);
    }
    Some(out)
}

/// Where the wildcards of a `~` pattern sit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternShape {
    StartsWith,
    EndsWith,
    Contains,
}

/// Build the pattern for `value` with the given wildcard placement.
pub fn make_pattern(value: &str, shape: PatternShape) -> String {
    let escaped = escape_pattern(value);
    match shape {
        PatternShape::StartsWith => format!("{}%", escaped),
        PatternShape::EndsWith => format!("%{}", escaped),
        PatternShape::Contains => format!("%{}%", escaped),
    }
}

/// Classify an unquoted pattern. Contains is tried first, then starts-with,
/// then ends-with.
pub fn read_pattern(pattern: &str) -> Option<(PatternShape, String)> {
    if pattern.len() >= 2 && pattern.starts_with('%') && pattern.ends_with('%') {
        if let Some(value) = unescape_pattern(&pattern[1..pattern.len() - 1]) {
            return Some((PatternShape::Contains, value));
        }
    }
    if let Some(head) = pattern.strip_suffix('%') {
        if let Some(value) = unescape_pattern(head) {
            return Some((PatternShape::StartsWith, value));
        }
    }
    if let Some(tail) = pattern.strip_prefix('%') {
        if let Some(value) = unescape_pattern(tail) {
            return Some((PatternShape::EndsWith, value));
        }
    }
    None
}

// =============================================================================
// Numbers
// =============================================================================

/// Format a number literal. Integral values print without a fraction.
pub fn format_number(n: f64) -> String {
    if !n.is_finite() {
        return "null".into();
    }
    if n.fract() == 0.0 && n.abs() < 1e15 {
        return format!("{}", n as i64);
    }
    let mut buffer = ryu::Buffer::new();
    buffer.format(n).to_string()
}

/// All number literals in a `|`/`&`-separated list.
pub fn split_numbers(list: &str) -> Option<Vec<f64>> {
    NUMBER_PATTERN
        .find_iter(list)
        .map(|m| m.as_str().parse::<f64>().ok())
        .collect()
}

// =============================================================================
// Time literals
// =============================================================================

/// Render `date` at `granularity`, dropping finer components.
pub fn format_time(date: &NaiveDateTime, granularity: TimeGranularity) -> String {
    match granularity {
        TimeGranularity::Year => format!("@{:04}", date.year()),
        TimeGranularity::Quarter => {
            format!("@{:04}-Q{}", date.year(), (date.month() - 1) / 3 + 1)
        }
        TimeGranularity::Month => date.format("@%Y-%m").to_string(),
        TimeGranularity::Week => date.format("@WK%Y-%m-%d").to_string(),
        TimeGranularity::Day => date.format("@%Y-%m-%d").to_string(),
        TimeGranularity::Hour => date.format("@%Y-%m-%d %H").to_string(),
        TimeGranularity::Minute => date.format("@%Y-%m-%d %H:%M").to_string(),
        TimeGranularity::Second => date.format("@%Y-%m-%d %H:%M:%S").to_string(),
    }
}

/// Parse a time literal, inferring its granularity from its shape.
pub fn parse_time(lit: &str) -> Option<(NaiveDateTime, TimeGranularity)> {
    let caps = TIME_PATTERN.captures(lit)?;
    let num = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u32>().ok());

    if let (Some(y), Some(m), Some(d)) = (num(1), num(2), num(3)) {
        let date = NaiveDate::from_ymd_opt(y as i32, m, d)?.and_hms_opt(0, 0, 0)?;
        return Some((date, TimeGranularity::Week));
    }

    if let (Some(y), Some(q)) = (num(4), num(5)) {
        let date = NaiveDate::from_ymd_opt(y as i32, (q - 1) * 3 + 1, 1)?.and_hms_opt(0, 0, 0)?;
        return Some((date, TimeGranularity::Quarter));
    }

    let year = num(6)? as i32;
    let (granularity, month, day, hour, minute, second) =
        match (num(7), num(8), num(9), num(10), num(11)) {
            (None, ..) => (TimeGranularity::Year, 1, 1, 0, 0, 0),
            (Some(m), None, ..) => (TimeGranularity::Month, m, 1, 0, 0, 0),
            (Some(m), Some(d), None, ..) => (TimeGranularity::Day, m, d, 0, 0, 0),
            (Some(m), Some(d), Some(h), None, _) => (TimeGranularity::Hour, m, d, h, 0, 0),
            (Some(m), Some(d), Some(h), Some(mi), _) => match num(12) {
                Some(s) => (TimeGranularity::Second, m, d, h, mi, s),
                None => (TimeGranularity::Minute, m, d, h, mi, 0),
            },
        };

    let date = NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, second)?;
    Some((date, granularity))
}

/// Truncate `date` to the start of its `granularity` period. Weeks keep the
/// given day.
pub fn truncate_time(date: &NaiveDateTime, granularity: TimeGranularity) -> NaiveDateTime {
    let lit = format_time(date, granularity);
    parse_time(&lit).map(|(d, _)| d).unwrap_or(*date)
}

/// `3 days`, `1 day`.
pub fn format_duration(amount: u32, unit: TimeGranularity) -> String {
    if amount == 1 {
        format!("1 {}", unit.as_str())
    } else {
        format!("{} {}s", amount, unit.as_str())
    }
}

/// Midnight today, local time.
pub fn today() -> NaiveDateTime {
    let now = chrono::Local::now().naive_local();
    now.date().and_hms_opt(0, 0, 0).unwrap_or(now)
}
