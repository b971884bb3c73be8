//! Steam curator dataset tests against the mock engine.

use chrono::{Duration, TimeZone, Utc};
use opendata_glance::auth::AuthToken;
use opendata_glance::curators::{self, CuratorDetail};
use opendata_glance::engine::{EngineCall, MockQueryEngine, QueryResponse};
use opendata_glance::query::{ExecutionOutcome, ProjectSelector, QueryExecutor};
use pretty_assertions::assert_eq;

const LISTING_FIELDS: &[(&str, &str)] = &[
    ("id", "INTEGER"),
    ("name", "STRING"),
    ("followers", "INTEGER"),
    ("negativeReviews", "INTEGER"),
    ("positiveReviews", "INTEGER"),
    ("lastReviewDateUnixMillis", "INTEGER"),
];

const INFO_FIELDS: &[(&str, &str)] = &[
    ("id", "INTEGER"),
    ("url", "STRING"),
    ("name", "STRING"),
    ("description", "STRING"),
    ("avatarUrl", "STRING"),
    ("followers", "INTEGER"),
    ("negativeReviews", "INTEGER"),
    ("positiveReviews", "INTEGER"),
    ("informationalReviews", "INTEGER"),
    ("lastReviewDate", "INTEGER"),
];

const HISTORY_FIELDS: &[(&str, &str)] = &[
    ("date", "INTEGER"),
    ("followers", "INTEGER"),
    ("positiveReviews", "INTEGER"),
    ("negativeReviews", "INTEGER"),
    ("informationalReviews", "INTEGER"),
];

fn token() -> AuthToken {
    AuthToken::valid_for("ya29.integration", Duration::minutes(30))
}

fn row(values: &[&str]) -> Vec<Option<String>> {
    values
        .iter()
        .map(|v| (!v.is_empty()).then(|| v.to_string()))
        .collect()
}

fn listing_response() -> QueryResponse {
    QueryResponse::from_parts(
        LISTING_FIELDS,
        vec![
            row(&["1", "Big Curator", "90000", "10", "90", "1700000000000"]),
            row(&["2", "Quiet Curator", "12", "0", "0", ""]),
        ],
    )
}

#[tokio::test]
async fn test_top_curators() {
    let engine = MockQueryEngine::new().with_response("LIMIT 100", listing_response());
    let executor = QueryExecutor::new(&engine, ProjectSelector::Fixed("hivemp".into()));

    let list = curators::top_curators(&executor, Some(&token()))
        .await
        .unwrap()
        .completed()
        .unwrap();

    assert_eq!(list.len(), 2);
    assert_eq!(list[0].name, "Big Curator");
    assert_eq!(list[0].total_reviews, 100);
    assert!((list[0].percent_favourable - 0.9).abs() < 1e-9);
    assert_eq!(list[1].percent_favourable, 1.0);
    assert_eq!(list[1].last_review, None);
}

#[tokio::test]
async fn test_search_sends_like_pattern() {
    let engine = MockQueryEngine::new().with_response("@input", listing_response());
    let executor = QueryExecutor::new(&engine, ProjectSelector::Fixed("hivemp".into()));

    let list = curators::search_curators(&executor, Some(&token()), "Curator")
        .await
        .unwrap()
        .completed()
        .unwrap();
    assert_eq!(list.len(), 2);

    let (_, request) = engine.last_query().unwrap();
    assert_eq!(request.query_parameters[0].name, "input");
    assert_eq!(request.query_parameters[0].parameter_value.value, "%Curator%");
}

#[tokio::test]
async fn test_short_search_never_reaches_engine() {
    let engine = MockQueryEngine::new();
    let executor = QueryExecutor::new(&engine, ProjectSelector::FirstAccessible);

    let result = curators::search_curators(&executor, Some(&token()), "ab").await;

    assert!(result.is_err());
    assert_eq!(engine.call_count(), 0);
}

#[tokio::test]
async fn test_curator_detail() {
    let engine = MockQueryEngine::new()
        .with_response(
            "LIMIT 1",
            QueryResponse::from_parts(
                INFO_FIELDS,
                vec![row(&[
                    "7",
                    "https://store.steampowered.com/curator/7/",
                    "Seven",
                    "We review things.",
                    "",
                    "700",
                    "3",
                    "30",
                    "5",
                    "",
                ])],
            ),
        )
        .with_response(
            "ORDER BY date ASC",
            QueryResponse::from_parts(
                HISTORY_FIELDS,
                vec![
                    row(&["1696118400000", "650", "28", "3", "5"]),
                    row(&["1696204800000", "700", "30", "3", "5"]),
                ],
            ),
        );
    let executor = QueryExecutor::new(&engine, ProjectSelector::Fixed("hivemp".into()));

    let detail: CuratorDetail = curators::curator_detail(&executor, Some(&token()), 7)
        .await
        .unwrap()
        .completed()
        .unwrap()
        .expect("curator should exist");

    assert_eq!(detail.info.name, "Seven");
    assert_eq!(detail.info.avatar_url, "");
    assert_eq!(detail.info.last_review, None);
    assert_eq!(detail.history.len(), 2);
    assert_eq!(
        detail.history[0].date,
        Utc.timestamp_millis_opt(1_696_118_400_000).unwrap()
    );
    assert_eq!(detail.history[1].followers, 700);

    let queries = engine
        .calls()
        .into_iter()
        .filter(|c| matches!(c, EngineCall::RunQuery { .. }))
        .count();
    assert_eq!(queries, 2);
}

#[tokio::test]
async fn test_unknown_curator() {
    let engine = MockQueryEngine::new();
    let executor = QueryExecutor::new(&engine, ProjectSelector::Fixed("hivemp".into()));

    let outcome = curators::curator_detail(&executor, Some(&token()), 404)
        .await
        .unwrap();

    assert_eq!(outcome, ExecutionOutcome::Completed(None));
}

#[tokio::test]
async fn test_curator_detail_without_token() {
    let engine = MockQueryEngine::new();
    let executor = QueryExecutor::new(&engine, ProjectSelector::FirstAccessible);

    let outcome = curators::curator_detail(&executor, None, 7).await.unwrap();

    assert!(outcome.is_unauthenticated());
    assert_eq!(engine.call_count(), 0);
}
