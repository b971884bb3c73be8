//! Query executor tests against the mock engine.
//!
//! Covers the executor's contract end to end through the public API.

use chrono::Duration;
use opendata_glance::auth::AuthToken;
use opendata_glance::engine::{EngineCall, FailingQueryEngine, MockQueryEngine, QueryResponse};
use opendata_glance::error::OpenDataError;
use opendata_glance::query::{
    CellValue, ExecutionOutcome, Field, ProjectSelector, Query, QueryExecutor, QueryParameter,
};
use pretty_assertions::assert_eq;

fn token() -> AuthToken {
    AuthToken::valid_for("ya29.integration", Duration::minutes(30))
}

fn cells(values: &[Option<&str>]) -> Vec<Option<String>> {
    values.iter().map(|v| v.map(String::from)).collect()
}

#[tokio::test]
async fn test_rows_keep_engine_order() {
    let response = QueryResponse::from_parts(
        &[("id", "INTEGER"), ("name", "STRING")],
        vec![
            cells(&[Some("30"), Some("c")]),
            cells(&[Some("10"), Some("a")]),
            cells(&[Some("20"), Some("b")]),
            cells(&[Some("10"), Some("a")]),
        ],
    );
    let engine = MockQueryEngine::new().with_default_response(response);
    let executor = QueryExecutor::new(&engine, ProjectSelector::FirstAccessible);

    let rows = executor
        .execute(&Query::new("SELECT id, name FROM t"), Some(&token()))
        .await
        .unwrap()
        .into_rows();

    let ids: Vec<i64> = rows.iter().map(|r| r.integer("id").unwrap()).collect();
    assert_eq!(ids, vec![30, 10, 20, 10]);
}

#[tokio::test]
async fn test_row_count_matches_engine_total() {
    let response = QueryResponse::from_parts(
        &[("n", "INTEGER")],
        vec![cells(&[Some("1")]), cells(&[Some("2")]), cells(&[None])],
    );
    let engine = MockQueryEngine::new().with_default_response(response);
    let executor = QueryExecutor::new(&engine, ProjectSelector::FirstAccessible);

    let output = executor
        .execute(&Query::new("SELECT n FROM t"), Some(&token()))
        .await
        .unwrap()
        .completed()
        .unwrap();

    assert_eq!(output.rows.len() as u64, output.total_rows);
    assert!(!output.was_truncated());
    assert_eq!(output.rows[2].get("n"), Some(&CellValue::Null));
}

#[tokio::test]
async fn test_unsupported_columns_are_marked() {
    let response = QueryResponse::from_parts(
        &[("name", "STRING"), ("ratio", "FLOAT"), ("seen", "TIMESTAMP")],
        vec![cells(&[Some("x"), Some("0.25"), Some("1.7E9")])],
    );
    let engine = MockQueryEngine::new().with_default_response(response);
    let executor = QueryExecutor::new(&engine, ProjectSelector::FirstAccessible);

    let rows = executor
        .execute(&Query::new("SELECT * FROM t"), Some(&token()))
        .await
        .unwrap()
        .into_rows();

    let row = &rows[0];
    assert_eq!(row.string("name"), Some("x"));
    assert!(row.get("ratio").is_none());
    assert_eq!(
        row.field("seen"),
        Some(&Field::Unsupported {
            declared_type: "TIMESTAMP".to_string()
        })
    );
    assert_eq!(row.to_json(), serde_json::json!({"name": "x"}));
}

#[tokio::test]
async fn test_unauthenticated_is_distinct_from_empty() {
    let engine = MockQueryEngine::new();
    let executor = QueryExecutor::new(&engine, ProjectSelector::FirstAccessible);
    let query = Query::new("SELECT 1 LIMIT 0");

    let without_token = executor.execute(&query, None).await.unwrap();
    let with_token = executor.execute(&query, Some(&token())).await.unwrap();

    assert_eq!(without_token, ExecutionOutcome::Unauthenticated);
    assert!(matches!(with_token, ExecutionOutcome::Completed(ref o) if o.is_empty()));
    // Only the authenticated call reached the engine: discovery plus query.
    assert_eq!(engine.call_count(), 2);
}

#[tokio::test]
async fn test_request_uses_standard_dialect_and_named_parameters() {
    let engine = MockQueryEngine::new().with_projects(&["hivemp", "other"]);
    let executor = QueryExecutor::new(&engine, ProjectSelector::FirstAccessible);
    let query = Query::new("SELECT * FROM t WHERE id = @id")
        .with_parameter(QueryParameter::integer("id", 33058));

    executor.execute(&query, Some(&token())).await.unwrap();

    let (project, request) = engine.last_query().unwrap();
    assert_eq!(project, "hivemp");
    assert!(!request.use_legacy_sql);
    assert_eq!(request.parameter_mode.as_deref(), Some("NAMED"));
    assert_eq!(request.query_parameters[0].parameter_type.type_tag, "INTEGER");
    assert_eq!(request.query_parameters[0].parameter_value.value, "33058");
}

#[tokio::test]
async fn test_each_execute_rediscovers_project() {
    let engine = MockQueryEngine::new();
    let executor = QueryExecutor::new(&engine, ProjectSelector::FirstAccessible);

    for _ in 0..2 {
        executor
            .execute(&Query::new("SELECT 1"), Some(&token()))
            .await
            .unwrap();
    }

    let discoveries = engine
        .calls()
        .into_iter()
        .filter(|c| matches!(c, EngineCall::ListProjects { .. }))
        .count();
    assert_eq!(discoveries, 2);
}

#[tokio::test]
async fn test_compile_error_surfaces_engine_message() {
    let engine = FailingQueryEngine::new(OpenDataError::engine_with_status(
        400,
        "Query parameter 'id' not found at [1:30]",
        vec!["invalidQuery".to_string()],
    ));
    let executor = QueryExecutor::new(&engine, ProjectSelector::FirstAccessible);

    let err = executor
        .execute(&Query::new("SELECT * FROM t WHERE id = @id"), Some(&token()))
        .await
        .unwrap_err();

    assert_eq!(err.message(), "Query parameter 'id' not found at [1:30]");
    assert_eq!(err.category(), "Engine Error");
}

#[tokio::test]
async fn test_bad_integer_cell_is_decode_error() {
    let response =
        QueryResponse::from_parts(&[("n", "INTEGER")], vec![cells(&[Some("not-a-number")])]);
    let engine = MockQueryEngine::new().with_default_response(response);
    let executor = QueryExecutor::new(&engine, ProjectSelector::FirstAccessible);

    let err = executor
        .execute(&Query::new("SELECT n FROM t"), Some(&token()))
        .await
        .unwrap_err();

    assert_eq!(err.category(), "Decode Error");
}
