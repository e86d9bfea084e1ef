//! Query source text rendering.
//!
//! Stages render as brace blocks chained with `->`. Inside a stage, fields
//! are grouped under their property keyword as they are encountered: a new
//! group starts whenever the keyword changes, so groups keep the field
//! order of the stage.

use super::codegen::FragmentStream;
use super::error::{RenderError, RenderResult};
use crate::catalog::{FieldKind, SourceDef};
use crate::filter::literal::{quote_identifier, quote_path};
use crate::query::resolve::{resolve_field, stage_output};
use crate::query::{FilterCondition, OrderBy, OrderByField, QueryFieldDef, Stage, StageKind};

/// Property keyword for a field of the given kind.
pub fn property_keyword(kind: FieldKind) -> &'static str {
    match kind {
        FieldKind::Dimension => "group_by",
        FieldKind::Measure => "aggregate",
        FieldKind::Query | FieldKind::Source => "nest",
    }
}

/// Render a pipeline whose first stage reads from `source`.
pub fn pipeline_to_fragments(source: &SourceDef, pipeline: &[Stage]) -> RenderResult<FragmentStream> {
    let mut fs = FragmentStream::new();
    let mut input = source.clone();

    for (index, stage) in pipeline.iter().enumerate() {
        if index > 0 {
            fs.text(" -> ");
        }
        fs.append(&stage_to_fragments(&input, stage)?);
        input = stage_output(&input, stage);
    }

    Ok(fs)
}

/// Render one stage as a brace block.
pub fn stage_to_fragments(input: &SourceDef, stage: &Stage) -> RenderResult<FragmentStream> {
    let mut fs = FragmentStream::new();
    fs.text("{").newline().indent();

    match stage.kind {
        StageKind::Index => {
            let names: Vec<String> = stage
                .fields
                .iter()
                .map(|f| quote_identifier(&f.output_name()))
                .collect();
            if !names.is_empty() {
                fs.text(format!("index: {}", names.join(", "))).newline();
            }
        }
        StageKind::Reduce => {
            for (keyword, values) in field_groups(input, &stage.fields)? {
                property(&mut fs, keyword, &values);
            }
        }
    }

    if !stage.filters.is_empty() {
        property(&mut fs, "where", &filter_values(&stage.filters));
    }

    if !stage.order_by.is_empty() {
        let entries: Vec<String> = stage.order_by.iter().map(order_by_to_string).collect();
        fs.text(format!("order_by: {}", entries.join(", "))).newline();
    }

    if let Some(limit) = stage.limit {
        fs.text(format!("limit: {}", limit)).newline();
    }

    fs.outdent().text("}");
    Ok(fs)
}

/// Split fields into runs sharing a keyword.
fn field_groups(
    input: &SourceDef,
    fields: &[QueryFieldDef],
) -> RenderResult<Vec<(&'static str, Vec<FragmentStream>)>> {
    let mut groups: Vec<(&'static str, Vec<FragmentStream>)> = vec![];

    for field in fields {
        let resolved = resolve_field(input, field).map_err(|source| RenderError::Field {
            field: field.output_name(),
            source,
        })?;
        let keyword = property_keyword(resolved.kind);
        let value = field_to_fragments(input, field)?;

        if let Some((current, values)) = groups.last_mut() {
            if *current == keyword {
                values.push(value);
                continue;
            }
        }
        groups.push((keyword, vec![value]));
    }

    Ok(groups)
}

/// `keyword: value`, or a block with one value per line. Block values are
/// comma-separated only for `where`.
fn property(fs: &mut FragmentStream, keyword: &str, values: &[FragmentStream]) {
    match values {
        [] => {}
        [value] => {
            fs.text(format!("{}: ", keyword)).append(value).newline();
        }
        _ => {
            fs.text(format!("{}:", keyword)).newline().indent();
            let separator = if keyword == "where" { "," } else { "" };
            for (index, value) in values.iter().enumerate() {
                fs.append(value);
                if index + 1 < values.len() {
                    fs.text(separator);
                }
                fs.newline();
            }
            fs.outdent();
        }
    }
}

fn filter_values(filters: &[FilterCondition]) -> Vec<FragmentStream> {
    filters
        .iter()
        .map(|filter| {
            let mut fs = FragmentStream::new();
            fs.text(filter.code.trim());
            fs
        })
        .collect()
}

fn order_by_to_string(order_by: &OrderBy) -> String {
    let field = match &order_by.field {
        OrderByField::Name(name) => quote_identifier(name),
        OrderByField::Position(position) => position.to_string(),
    };
    match order_by.dir {
        Some(dir) => format!("{} {}", field, dir.as_str()),
        None => field,
    }
}

fn field_to_fragments(input: &SourceDef, field: &QueryFieldDef) -> RenderResult<FragmentStream> {
    let mut fs = FragmentStream::new();

    match field {
        QueryFieldDef::Reference { path } => {
            fs.text(quote_path(path));
        }
        QueryFieldDef::Renamed { path, name, .. } => {
            fs.text(format!("{} is {}", quote_identifier(name), quote_path(path)));
        }
        QueryFieldDef::Filtered { path, filters, .. } => {
            let codes: Vec<&str> = filters.iter().map(|f| f.code.trim()).collect();
            fs.text(format!(
                "{} is {} {{ where: {} }}",
                quote_identifier(&field.output_name()),
                quote_path(path),
                codes.join(", ")
            ));
        }
        QueryFieldDef::Expression { name, code, .. } => {
            fs.text(format!("{} is {}", quote_identifier(name), code.trim()));
        }
        QueryFieldDef::Nested { name, pipeline } => {
            fs.text(format!("{} is ", quote_identifier(name)))
                .append(&pipeline_to_fragments(input, pipeline)?);
        }
    }

    Ok(fs)
}
