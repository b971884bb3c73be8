//! Live query engine tests.
//!
//! These tests talk to the real engine and need a valid access token in
//! OPENDATA_ACCESS_TOKEN. They are skipped otherwise. Set
//! OPENDATA_PROJECT_ID to pin the billing project.

use opendata_glance::auth;
use opendata_glance::config::Config;
use opendata_glance::engine::{self, QueryEngine};
use opendata_glance::query::{CellValue, ProjectSelector, Query, QueryExecutor, QueryParameter};

/// Helper to build the engine and token from the environment.
fn live_setup() -> Option<(Box<dyn QueryEngine>, auth::AuthToken, ProjectSelector)> {
    let token = auth::token_from_env()?;
    let mut config = Config::default();
    config.apply_env_overrides();
    let engine = engine::connect(&config.engine).ok()?;
    Some((engine, token, ProjectSelector::from(config.engine.project_id)))
}

#[tokio::test]
async fn test_live_parameterized_select() {
    let Some((engine, token, project)) = live_setup() else {
        eprintln!("Skipping test: OPENDATA_ACCESS_TOKEN not set");
        return;
    };
    let executor = QueryExecutor::new(engine.as_ref(), project);

    let query = Query::new("SELECT @n AS n, @s AS s, CAST(NULL AS INT64) AS missing")
        .with_parameter(QueryParameter::integer("n", 42))
        .with_parameter(QueryParameter::string("s", "abc"));

    let rows = executor
        .execute(&query, Some(&token))
        .await
        .unwrap()
        .into_rows();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].integer("n"), Some(42));
    assert_eq!(rows[0].string("s"), Some("abc"));
    assert_eq!(rows[0].get("missing"), Some(&CellValue::Null));
}

#[tokio::test]
async fn test_live_syntax_error() {
    let Some((engine, token, project)) = live_setup() else {
        eprintln!("Skipping test: OPENDATA_ACCESS_TOKEN not set");
        return;
    };
    let executor = QueryExecutor::new(engine.as_ref(), project);

    let err = executor
        .execute(&Query::new("SELEC 1"), Some(&token))
        .await
        .unwrap_err();

    assert_eq!(err.category(), "Engine Error");
    assert!(!err.message().is_empty());
}
