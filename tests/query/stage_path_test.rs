//! Stage addressing and schema derivation across pipelines.

#[path = "../common/mod.rs"]
mod common;

use composer::catalog::{FieldKind, ScalarType};
use composer::query::resolve::locate;
use composer::query::{
    pipeline_output, source_for_stage_at_path, stage_output, BuilderError, Located, Query,
    QueryBuilder, QueryFieldDef, Stage, StageKind, StagePath,
};

fn query_with_nest() -> Query {
    let mut query = Query::new();
    query.pipeline[0] = Stage::reduce()
        .with_field(QueryFieldDef::reference("region"))
        .with_field(QueryFieldDef::Nested {
            name: "by_status".into(),
            pipeline: vec![
                Stage::reduce()
                    .with_field(QueryFieldDef::reference("status"))
                    .with_field(QueryFieldDef::reference("sales")),
                Stage::reduce().with_field(QueryFieldDef::reference("sales")),
            ],
        })
        .with_field(QueryFieldDef::reference("by_region"));
    query
}

#[test]
fn test_stage_path_display_and_parent() {
    let path = StagePath::root(0).nested(1, 0).nested(2, 1);
    assert_eq!(path.to_string(), "0[1]/0[2]/1");

    let (parent, field_index) = path.parent().unwrap();
    assert_eq!(parent, StagePath::root(0).nested(1, 0));
    assert_eq!(field_index, 2);
    assert_eq!(path.sibling(0).stage_index, 0);
}

#[test]
fn test_stage_path_json() {
    let path = StagePath::root(0).nested(3, 1);
    let json = serde_json::to_value(&path).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "hops": [{"stage_index": 0, "field_index": 3}],
            "stage_index": 1
        })
    );
    let root: StagePath = serde_json::from_value(serde_json::json!({"stage_index": 2})).unwrap();
    assert_eq!(root, StagePath::root(2));
}

#[test]
fn test_locate_inline_and_unmaterialized() {
    let query = query_with_nest();

    assert_eq!(
        locate(&query, &StagePath::root(0).nested(1, 1)).unwrap(),
        Located::Stage
    );
    assert_eq!(
        locate(&query, &StagePath::root(0).nested(2, 0)).unwrap(),
        Located::Unmaterialized {
            parent: StagePath::root(0),
            field_index: 2,
            path: "by_region".into(),
        }
    );
}

#[test]
fn test_locate_errors() {
    let mut query = query_with_nest();

    assert_eq!(
        locate(&query, &StagePath::root(0).nested(7, 0)).unwrap_err(),
        BuilderError::FieldIndexOutOfRange { index: 7, len: 3 }
    );
    assert!(matches!(
        locate(&query, &StagePath::root(0).nested(1, 5)),
        Err(BuilderError::StageNotFound { .. })
    ));

    query.pipeline[0]
        .fields
        .push(QueryFieldDef::expression("total", "sum(amount)", true));
    assert_eq!(
        locate(&query, &StagePath::root(0).nested(3, 0)).unwrap_err(),
        BuilderError::NotANestedQuery { field_index: 3 }
    );
}

#[test]
fn test_source_for_nested_second_stage() {
    let source = common::orders();
    let query = query_with_nest();

    let input = source_for_stage_at_path(&source, &query, &StagePath::root(0).nested(1, 1)).unwrap();
    assert_eq!(input.fields.len(), 2);
    assert_eq!(input.field("sales").unwrap().kind(), FieldKind::Dimension);
    assert_eq!(input.field("status").unwrap().data_type(), Some(ScalarType::String));
}

#[test]
fn test_source_through_catalog_reference() {
    let source = common::orders();
    let query = query_with_nest();

    let input = source_for_stage_at_path(&source, &query, &StagePath::root(0).nested(2, 0)).unwrap();
    assert_eq!(input, source);
}

#[test]
fn test_pipeline_output_nests_become_structs() {
    let source = common::orders();
    let query = query_with_nest();

    let output = pipeline_output(&source, &query.pipeline);
    let names: Vec<&str> = output.fields.iter().map(|f| f.name()).collect();
    assert_eq!(names, vec!["region", "by_status", "by_region"]);
    assert_eq!(output.field("by_status").unwrap().kind(), FieldKind::Source);

    let by_region = output.field_at_path("by_region.sales").unwrap();
    assert_eq!(by_region.data_type(), Some(ScalarType::Number));
}

#[test]
fn test_index_stage_output_schema() {
    let mut stage = Stage::reduce().with_field(QueryFieldDef::reference("region"));
    stage.kind = StageKind::Index;

    let output = stage_output(&common::orders(), &stage);
    let names: Vec<&str> = output.fields.iter().map(|f| f.name()).collect();
    assert_eq!(
        names,
        vec!["fieldName", "fieldPath", "fieldType", "fieldValue", "weight"]
    );
    assert_eq!(output.field("weight").unwrap().data_type(), Some(ScalarType::Number));
}

#[test]
fn test_joined_catalog_query_reads_its_own_source() {
    let source = common::orders();
    let stage = Stage::reduce().with_field(QueryFieldDef::reference("customer.by_state"));

    let output = stage_output(&source, &stage);
    let by_state = output.field_at_path("by_state.avg_age").unwrap();
    assert_eq!(by_state.data_type(), Some(ScalarType::Number));
    assert!(output.field_at_path("by_state.state").is_ok());

    let mut query = Query::new();
    query.pipeline[0] = stage;
    let input = source_for_stage_at_path(&source, &query, &StagePath::root(0).nested(0, 0)).unwrap();
    assert_eq!(input, source);
}

#[test]
fn test_joined_catalog_query_expands_and_renders() {
    let mut builder = QueryBuilder::new(common::orders());
    builder.toggle_field(&StagePath::root(0), "region").unwrap();
    builder
        .toggle_field(&StagePath::root(0), "customer.by_state")
        .unwrap();
    assert!(builder.can_run());

    let nested = StagePath::root(0).nested(1, 0);
    builder.add_limit(&nested, 3).unwrap();
    assert!(builder.can_run());

    let text = builder.writer().query_string_for_model().unwrap();
    assert_eq!(
        text,
        "query: orders -> {\n  group_by: region\n  nest: by_state is {\n    group_by: customer.state\n    aggregate: customer.avg_age\n    where: customer.age > 30\n    order_by: avg_age desc\n    limit: 3\n  }\n}"
    );
}
