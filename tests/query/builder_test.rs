//! Structural edits through the query builder.

#[path = "../common/mod.rs"]
mod common;

use composer::catalog::{FieldKind, ScalarType, SourceDef};
use composer::config::Settings;
use composer::query::{
    BuilderError, FilterCondition, OrderBy, OrderByField, Query, QueryBuilder, QueryFieldDef,
    SortDir, Stage, StageKind, StagePath,
};

fn root() -> StagePath {
    StagePath::root(0)
}

fn names(builder: &QueryBuilder, path: &StagePath) -> Vec<String> {
    let mut pipeline = &builder.query().pipeline;
    for hop in &path.hops {
        match &pipeline[hop.stage_index].fields[hop.field_index] {
            QueryFieldDef::Nested { pipeline: nested, .. } => pipeline = nested,
            other => panic!("not a nested query: {:?}", other),
        }
    }
    pipeline[path.stage_index]
        .fields
        .iter()
        .map(QueryFieldDef::output_name)
        .collect()
}

// ============================================================================
// Rendering the canonical example
// ============================================================================

#[test]
fn test_toggle_and_limit_render() {
    let mut builder = QueryBuilder::new(common::orders());
    builder.toggle_field(&root(), "region").unwrap();
    builder.toggle_field(&root(), "sales").unwrap();
    builder.add_limit(&root(), 10).unwrap();

    let text = builder.writer().query_string_for_model().unwrap();
    assert_eq!(
        text,
        "query: orders -> {\n  group_by: region\n  aggregate: sales\n  limit: 10\n}"
    );
    assert!(builder.can_run());
}

// ============================================================================
// Field insertion and toggling
// ============================================================================

#[test]
fn test_class_order_regardless_of_call_order() {
    let mut builder = QueryBuilder::new(common::orders());
    builder.toggle_field(&root(), "sales").unwrap();
    builder.toggle_field(&root(), "region").unwrap();
    builder.add_new_nested_query(&root(), "by_status").unwrap();
    builder.toggle_field(&root(), "order_count").unwrap();
    builder.toggle_field(&root(), "status").unwrap();

    assert_eq!(
        names(&builder, &root()),
        vec!["region", "status", "sales", "order_count", "by_status"]
    );
}

#[test]
fn test_toggle_twice_restores_fields_not_order_by() {
    let mut builder = QueryBuilder::new(common::orders());
    builder.toggle_field(&root(), "region").unwrap();
    builder.toggle_field(&root(), "sales").unwrap();
    builder.add_order_by(&root(), 1, Some(SortDir::Desc)).unwrap();
    let fields_before = names(&builder, &root());

    builder.toggle_field(&root(), "sales").unwrap();
    builder.toggle_field(&root(), "sales").unwrap();

    assert_eq!(names(&builder, &root()), fields_before);
    assert!(builder.query().pipeline[0].order_by.is_empty());
}

#[test]
fn test_toggle_ignores_refined_entries() {
    let mut builder = QueryBuilder::new(common::orders());
    builder.toggle_field(&root(), "sales").unwrap();
    builder.rename_field(&root(), 0, "revenue").unwrap();
    builder.toggle_field(&root(), "sales").unwrap();

    assert_eq!(names(&builder, &root()), vec!["revenue", "sales"]);
}

#[test]
fn test_toggle_source_is_rejected() {
    let mut builder = QueryBuilder::new(common::orders());
    let err = builder.toggle_field(&root(), "customer").unwrap_err();
    assert!(matches!(err, BuilderError::Resolve(_)));
    assert!(builder.is_empty());
}

// ============================================================================
// Renaming and definitions
// ============================================================================

#[test]
fn test_rename_updates_order_by_and_render() {
    let mut builder = QueryBuilder::new(common::orders());
    builder.toggle_field(&root(), "customer.state").unwrap();
    builder.add_order_by(&root(), 0, None).unwrap();
    builder.rename_field(&root(), 0, "home state").unwrap();

    assert!(builder.query().pipeline[0].order_by[0].names("home state"));
    let text = builder.writer().query_string_for_model().unwrap();
    assert_eq!(
        text,
        "query: orders -> {\n  group_by: `home state` is customer.state\n  order_by: `home state`\n}"
    );
}

#[test]
fn test_replace_with_definition_from_alternate_catalog() {
    let mut builder = QueryBuilder::new(common::orders());
    builder.toggle_field(&root(), "region").unwrap();

    let alternate = SourceDef::new("orders").with_field(composer::catalog::CatalogField::Dimension(
        composer::catalog::AtomicField {
            name: "region".into(),
            data_type: ScalarType::String,
            expression: Some("upper(region_code)".into()),
        },
    ));
    builder
        .replace_with_definition(&root(), 0, Some(&alternate))
        .unwrap();

    assert_eq!(
        builder.query().pipeline[0].fields[0],
        QueryFieldDef::Expression {
            name: "region".into(),
            code: "upper(region_code)".into(),
            is_calculation: false,
            data_type: Some(ScalarType::String),
        }
    );
}

#[test]
fn test_replace_with_definition_of_raw_column_quotes_path() {
    let mut builder = QueryBuilder::new(common::orders());
    builder.toggle_field(&root(), "customer.state").unwrap();
    builder.replace_with_definition(&root(), 0, None).unwrap();

    let text = builder.writer().query_string_for_model().unwrap();
    assert_eq!(text, "query: orders -> {\n  group_by: state is customer.state\n}");
}

#[test]
fn test_replace_with_definition_of_joined_measure_keeps_path() {
    let mut builder = QueryBuilder::new(common::orders());
    builder.toggle_field(&root(), "customer.avg_age").unwrap();
    builder.replace_with_definition(&root(), 0, None).unwrap();

    let text = builder.writer().query_string_for_model().unwrap();
    assert_eq!(text, "query: orders -> {\n  aggregate: avg_age is customer.avg_age\n}");
}

#[test]
fn test_replace_with_definition_of_joined_query_rebases_paths() {
    let mut builder = QueryBuilder::new(common::orders());
    builder.toggle_field(&root(), "customer.by_state").unwrap();
    builder.replace_with_definition(&root(), 0, None).unwrap();

    match &builder.query().pipeline[0].fields[0] {
        QueryFieldDef::Nested { name, pipeline } => {
            assert_eq!(name, "by_state");
            assert_eq!(
                pipeline[0].fields,
                vec![
                    QueryFieldDef::reference("customer.state"),
                    QueryFieldDef::reference("customer.avg_age"),
                ]
            );
            assert_eq!(
                pipeline[0].filters,
                vec![FilterCondition::new("customer.age", "customer.age > 30")]
            );
            assert_eq!(
                pipeline[0].order_by,
                vec![OrderBy::by_name("avg_age", Some(SortDir::Desc))]
            );
        }
        other => panic!("expected inline nested query, got {:?}", other),
    }
    assert!(builder.can_run());
}

#[test]
fn test_replace_with_definition_rejects_sources() {
    let mut builder = QueryBuilder::new(common::orders());
    let mut query = Query::new();
    query.pipeline[0] = Stage::reduce().with_field(QueryFieldDef::reference("customer"));
    builder.set_query(query.clone());

    let err = builder.replace_with_definition(&root(), 0, None).unwrap_err();
    assert_eq!(
        err,
        BuilderError::NotRenderable {
            path: "customer".into()
        }
    );
    assert_eq!(builder.query(), &query);
}

#[test]
fn test_edit_field_definition() {
    let mut builder = QueryBuilder::new(common::orders());
    builder.toggle_field(&root(), "sales").unwrap();
    builder.add_order_by(&root(), 0, Some(SortDir::Desc)).unwrap();
    builder
        .edit_field_definition(
            &root(),
            0,
            QueryFieldDef::expression("avg_sale", "sales / order_count", true),
        )
        .unwrap();

    assert_eq!(names(&builder, &root()), vec!["avg_sale"]);
    assert!(builder.query().pipeline[0].order_by[0].names("avg_sale"));
}

// ============================================================================
// Filters
// ============================================================================

#[test]
fn test_filtered_measure_render() {
    let mut builder = QueryBuilder::new(common::orders());
    builder.toggle_field(&root(), "region").unwrap();
    builder.toggle_field(&root(), "sales").unwrap();
    builder
        .add_filter_to_field(
            &root(),
            1,
            FilterCondition::new("status", "status = 'shipped'"),
            Some("shipped_sales"),
        )
        .unwrap();
    builder
        .add_filter(&root(), FilterCondition::new("region", "region != null"))
        .unwrap();

    match &builder.query().pipeline[0].fields[1] {
        QueryFieldDef::Filtered { kind, data_type, .. } => {
            assert_eq!(*kind, FieldKind::Measure);
            assert_eq!(*data_type, Some(ScalarType::Number));
        }
        other => panic!("expected filtered field, got {:?}", other),
    }

    let text = builder.writer().query_string_for_model().unwrap();
    assert_eq!(
        text,
        "query: orders -> {\n  group_by: region\n  aggregate: shipped_sales is sales { where: status = 'shipped' }\n  where: region != null\n}"
    );
}

#[test]
fn test_edit_and_remove_stage_filter() {
    let mut builder = QueryBuilder::new(common::orders());
    builder
        .add_filter(&root(), FilterCondition::new("status", "status = 'open'"))
        .unwrap();
    builder
        .edit_filter(
            &root(),
            0,
            FilterCondition::new("status", "status = 'closed'"),
            None,
        )
        .unwrap();
    assert_eq!(builder.query().pipeline[0].filters[0].code, "status = 'closed'");

    let err = builder.remove_filter(&root(), 3, None).unwrap_err();
    assert_eq!(err, BuilderError::FilterIndexOutOfRange { index: 3, len: 1 });

    builder.remove_filter(&root(), 0, None).unwrap();
    assert!(builder.is_empty());
}

// ============================================================================
// Stages
// ============================================================================

#[test]
fn test_remove_only_stage_leaves_blank_stage() {
    let mut builder = QueryBuilder::new(common::orders());
    builder.toggle_field(&root(), "region").unwrap();
    builder.add_limit(&root(), 3).unwrap();
    builder.remove_stage(&root()).unwrap();

    assert_eq!(builder.query().pipeline, vec![Stage::reduce()]);
}

#[test]
fn test_multi_stage_pipeline() {
    let mut builder = QueryBuilder::new(common::orders());
    builder.toggle_field(&root(), "region").unwrap();
    builder.toggle_field(&root(), "sales").unwrap();
    let second = builder.add_stage(None, None).unwrap();
    builder.toggle_field(&second, "sales").unwrap();

    let text = builder.writer().query_string_for_model().unwrap();
    assert_eq!(
        text,
        "query: orders -> {\n  group_by: region\n  aggregate: sales\n} -> {\n  group_by: sales\n}"
    );

    builder.remove_stage(&root()).unwrap();
    assert_eq!(builder.query().pipeline.len(), 1);
}

#[test]
fn test_nested_query_editing() {
    let mut builder = QueryBuilder::new(common::orders());
    builder.toggle_field(&root(), "region").unwrap();
    builder.add_new_nested_query(&root(), "by_status").unwrap();
    let nested = root().nested(1, 0);
    builder.toggle_field(&nested, "status").unwrap();

    let text = builder.writer().query_string_for_model().unwrap();
    assert_eq!(
        text,
        "query: orders -> {\n  group_by: region\n  nest: by_status is {\n    group_by: status\n  }\n}"
    );

    let added = builder.add_stage(Some(&root()), Some(1)).unwrap();
    assert_eq!(added, root().nested(1, 1));
}

#[test]
fn test_auto_expand_catalog_query() {
    let mut builder = QueryBuilder::new(common::orders());
    builder.toggle_field(&root(), "top_states").unwrap();
    assert!(builder.query().pipeline[0].fields[0].is_reference());

    let nested = root().nested(0, 0);
    builder.remove_limit(&nested).unwrap();

    match &builder.query().pipeline[0].fields[0] {
        QueryFieldDef::Nested { name, pipeline } => {
            assert_eq!(name, "top_states");
            assert_eq!(pipeline[0].limit, None);
            assert_eq!(pipeline[0].filters.len(), 1);
        }
        other => panic!("expected inline nested query, got {:?}", other),
    }
}

#[test]
fn test_index_stage_rejects_edits() {
    let mut builder = QueryBuilder::new(common::orders());
    let mut query = Query::new();
    query.pipeline[0].kind = StageKind::Index;
    builder.set_query(query.clone());

    let err = builder.toggle_field(&root(), "region").unwrap_err();
    assert_eq!(
        err,
        BuilderError::InvalidStageKind {
            path: "0".into(),
            kind: StageKind::Index
        }
    );
    assert_eq!(builder.query(), &query);
}

// ============================================================================
// Loading and transactions
// ============================================================================

#[test]
fn test_load_query_into_blank() {
    let mut builder = QueryBuilder::new(common::orders());
    builder.load_query("top_states").unwrap();

    assert_eq!(builder.query().name, "top_states");
    assert_eq!(names(&builder, &root()), vec!["state", "order_count"]);
    assert_eq!(builder.query().pipeline[0].limit, Some(5));
}

#[test]
fn test_load_query_merges_filters_and_order() {
    let mut builder = QueryBuilder::new(common::orders());
    builder.toggle_field(&root(), "status").unwrap();
    builder
        .add_filter(&root(), FilterCondition::new("status", "status = 'shipped'"))
        .unwrap();
    builder.load_query("top_states").unwrap();
    builder.load_query("by_region").unwrap();

    let stage = &builder.query().pipeline[0];
    assert_eq!(names(&builder, &root()), vec!["region", "sales", "state", "order_count", "status"]);
    assert_eq!(stage.filters.len(), 1);
    assert_eq!(stage.limit, Some(5));
    assert_eq!(stage.order_by, vec![OrderBy::by_name("sales", Some(SortDir::Desc))]);
}

#[test]
fn test_load_missing_query_fails_cleanly() {
    let mut builder = QueryBuilder::new(common::orders());
    builder.toggle_field(&root(), "region").unwrap();
    let before = builder.query().clone();

    assert!(builder.load_query("region").is_err());
    assert_eq!(builder.query(), &before);
}

#[test]
fn test_failed_render_rolls_back() {
    let mut query = Query::new();
    query.pipeline[0] = Stage::reduce()
        .with_field(QueryFieldDef::reference("region"))
        .with_field(QueryFieldDef::reference("dropped_column"));

    let mut builder = QueryBuilder::new(common::orders());
    builder.set_query(query.clone());
    let err = builder.rename_field(&root(), 0, "area").unwrap_err();
    assert!(matches!(err, BuilderError::Render(_)));
    assert_eq!(builder.query(), &query);

    let mut settings = Settings::default();
    settings.builder.verify_render = false;
    let mut builder = QueryBuilder::new(common::orders()).with_settings(settings);
    builder.set_query(query);
    builder.rename_field(&root(), 0, "area").unwrap();
    assert_eq!(names(&builder, &root()), vec!["area", "dropped_column"]);
}

#[test]
fn test_out_of_range_indexes() {
    let mut builder = QueryBuilder::new(common::orders());
    assert_eq!(
        builder.add_order_by(&root(), 0, None).unwrap_err(),
        BuilderError::FieldIndexOutOfRange { index: 0, len: 0 }
    );
    assert!(matches!(
        builder.add_limit(&StagePath::root(4), 1).unwrap_err(),
        BuilderError::StageNotFound { .. }
    ));
    assert_eq!(
        builder.remove_order_by(&root(), 0).unwrap_err(),
        BuilderError::OrderByIndexOutOfRange { index: 0, len: 0 }
    );
}

#[test]
fn test_clear_and_name() {
    let mut builder = QueryBuilder::new(common::orders());
    builder.set_name("regions");
    builder.toggle_field(&root(), "region").unwrap();
    assert!(!builder.is_empty());
    assert_eq!(builder.query().name, "regions");

    builder.clear_query();
    assert!(builder.is_empty());
    assert!(!builder.can_run());
    assert_eq!(builder.into_query(), Query::new());
}

// ============================================================================
// Field list maintenance
// ============================================================================

#[test]
fn test_reorder_fields() {
    let mut builder = QueryBuilder::new(common::orders());
    builder.toggle_field(&root(), "region").unwrap();
    builder.toggle_field(&root(), "status").unwrap();
    builder.toggle_field(&root(), "sales").unwrap();

    builder.reorder_fields(&root(), &[2, 0, 1]).unwrap();
    assert_eq!(names(&builder, &root()), vec!["sales", "region", "status"]);

    for bad in [&[0, 0, 1][..], &[0, 1], &[0, 1, 3]] {
        assert!(matches!(
            builder.reorder_fields(&root(), bad).unwrap_err(),
            BuilderError::InvalidPermutation { .. }
        ));
    }
    assert_eq!(names(&builder, &root()), vec!["sales", "region", "status"]);
}

#[test]
fn test_add_field_uses_class_order() {
    let mut builder = QueryBuilder::new(common::orders());
    builder
        .add_field(&root(), QueryFieldDef::expression("avg_sales", "avg(amount)", true))
        .unwrap();
    builder.toggle_field(&root(), "region").unwrap();
    assert_eq!(names(&builder, &root()), vec!["region", "avg_sales"]);

    let err = builder
        .add_field(&root(), QueryFieldDef::expression("empty", "", false))
        .unwrap_err();
    assert!(matches!(err, BuilderError::Resolve(_)));
    assert_eq!(names(&builder, &root()), vec!["region", "avg_sales"]);
}

#[test]
fn test_remove_field_drops_its_order_by() {
    let mut builder = QueryBuilder::new(common::orders());
    builder.toggle_field(&root(), "region").unwrap();
    builder.toggle_field(&root(), "sales").unwrap();
    builder.add_order_by(&root(), 0, None).unwrap();
    builder.add_order_by(&root(), 1, Some(SortDir::Desc)).unwrap();

    builder.remove_field(&root(), 1).unwrap();
    assert_eq!(names(&builder, &root()), vec!["region"]);
    assert_eq!(
        builder.query().pipeline[0].order_by,
        vec![OrderBy::by_name("region", None)]
    );
}

#[test]
fn test_edit_order_by_direction() {
    let mut builder = QueryBuilder::new(common::orders());
    builder.toggle_field(&root(), "sales").unwrap();
    builder.add_order_by(&root(), 0, None).unwrap();
    builder.edit_order_by(&root(), 0, Some(SortDir::Asc)).unwrap();
    assert_eq!(
        builder.query().pipeline[0].order_by,
        vec![OrderBy::by_name("sales", Some(SortDir::Asc))]
    );
    assert!(matches!(
        builder.edit_order_by(&root(), 1, None).unwrap_err(),
        BuilderError::OrderByIndexOutOfRange { index: 1, len: 1 }
    ));
}

#[test]
fn test_sort_fields_within_class() {
    let mut builder = QueryBuilder::new(common::orders());
    builder.toggle_field(&root(), "status").unwrap();
    builder
        .add_field(&root(), QueryFieldDef::expression("zeta", "1", false))
        .unwrap();
    builder.toggle_field(&root(), "region").unwrap();
    builder.toggle_field(&root(), "sales").unwrap();
    assert_eq!(
        names(&builder, &root()),
        vec!["status", "zeta", "region", "sales"]
    );

    builder.sort_fields(&root()).unwrap();
    assert_eq!(
        names(&builder, &root()),
        vec!["region", "status", "zeta", "sales"]
    );
}

// ============================================================================
// Positional sorting
// ============================================================================

#[test]
fn test_loaded_positional_order_by_follows_its_field() {
    let mut builder = QueryBuilder::new(common::orders());
    builder.load_query("customer.by_state").unwrap();
    assert_eq!(builder.query().name, "by_state");
    assert_eq!(
        builder.query().pipeline[0].order_by,
        vec![OrderBy::by_name("avg_age", Some(SortDir::Desc))]
    );

    builder.reorder_fields(&root(), &[1, 0]).unwrap();
    assert_eq!(
        builder.query().pipeline[0].order_by,
        vec![OrderBy::by_name("avg_age", Some(SortDir::Desc))]
    );

    builder.remove_field(&root(), 0).unwrap();
    assert!(builder.query().pipeline[0].order_by.is_empty());
}

#[test]
fn test_set_query_names_positional_order_by() {
    let mut query = Query::new();
    query.pipeline[0] = Stage::reduce()
        .with_field(QueryFieldDef::reference("region"))
        .with_field(QueryFieldDef::reference("sales"))
        .with_order_by(OrderBy {
            field: OrderByField::Position(2),
            dir: None,
        })
        .with_order_by(OrderBy {
            field: OrderByField::Position(9),
            dir: None,
        });

    let mut builder = QueryBuilder::new(common::orders());
    builder.set_query(query);
    builder.remove_field(&root(), 0).unwrap();

    assert_eq!(names(&builder, &root()), vec!["sales"]);
    assert_eq!(
        builder.query().pipeline[0].order_by,
        vec![
            OrderBy::by_name("sales", None),
            OrderBy {
                field: OrderByField::Position(9),
                dir: None,
            },
        ]
    );
}
