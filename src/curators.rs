//! Steam curator dataset.
//!
//! Canned queries against the public `SteamCurators_v2` table (one
//! partition per day, one row per curator per snapshot) and typed views
//! of their rows.

use chrono::{DateTime, TimeZone, Utc};

use crate::auth::AuthToken;
use crate::error::{OpenDataError, Result};
use crate::query::{ExecutionOutcome, Query, QueryExecutor, QueryParameter, ResultRow};

/// Fully qualified curator table.
pub const CURATORS_TABLE: &str = "hivemp.public.SteamCurators_v2";

/// Rows returned by the top-curators listing.
pub const TOP_LIMIT: usize = 100;

/// Rows returned by a name search.
pub const SEARCH_LIMIT: usize = 250;

/// Shortest accepted search term, in characters.
pub const MIN_SEARCH_LEN: usize = 3;

/// Latest snapshot per curator from today's partition, by followers.
fn listing_sql(name_filter: bool, limit: usize) -> String {
    let filter = if name_filter {
        "\n    AND name LIKE @input"
    } else {
        ""
    };
    format!(
        "SELECT
  id,
  name,
  followers,
  negativeReviews,
  positiveReviews,
  CASE lastReviewDate
    WHEN NULL THEN NULL
    ELSE UNIX_MILLIS(lastReviewDate)
  END AS lastReviewDateUnixMillis
FROM (
  SELECT
    id,
    name,
    followers,
    negativeReviews,
    positiveReviews,
    lastReviewDate,
    ROW_NUMBER() OVER(PARTITION BY id ORDER BY date) AS firstCreated
  FROM `{CURATORS_TABLE}`
  WHERE _PARTITIONTIME = CAST(CURRENT_DATE() AS TIMESTAMP){filter}
)
WHERE firstCreated = 1
ORDER BY followers DESC
LIMIT {limit}"
    )
}

/// Top curators by follower count.
pub fn top_curators_query() -> Query {
    Query::new(listing_sql(false, TOP_LIMIT))
}

/// Curators whose name contains `name`.
///
/// Terms shorter than three characters are rejected before any query runs.
pub fn search_curators_query(name: &str) -> Result<Query> {
    if name.chars().count() < MIN_SEARCH_LEN {
        return Err(OpenDataError::config(
            "Your search query must be at least 3 characters long.",
        ));
    }
    Ok(Query::new(listing_sql(true, SEARCH_LIMIT))
        .with_parameter(QueryParameter::string("input", format!("%{name}%"))))
}

/// One curator's details from yesterday's (complete) partition.
pub fn curator_info_query(id: i64) -> Query {
    Query::new(format!(
        "SELECT
  id,
  url,
  name,
  description,
  avatarUrl,
  followers,
  negativeReviews,
  positiveReviews,
  informationalReviews,
  CASE lastReviewDate
    WHEN NULL THEN NULL
    ELSE UNIX_MILLIS(lastReviewDate)
  END AS lastReviewDate
FROM `{CURATORS_TABLE}`
WHERE _PARTITIONTIME = CAST(DATE_SUB(CURRENT_DATE(), INTERVAL 1 DAY) AS TIMESTAMP)
  AND id = @id
LIMIT 1"
    ))
    .with_parameter(QueryParameter::integer("id", id))
}

/// One curator's snapshots over time, oldest first.
pub fn curator_history_query(id: i64) -> Query {
    Query::new(format!(
        "SELECT
  UNIX_MILLIS(date) AS date,
  followers,
  positiveReviews,
  negativeReviews,
  informationalReviews
FROM `{CURATORS_TABLE}`
WHERE id = @id
ORDER BY date ASC"
    ))
    .with_parameter(QueryParameter::integer("id", id))
}

/// A row of the curator listing.
#[derive(Debug, Clone, PartialEq)]
pub struct CuratorSummary {
    pub id: i64,
    pub name: String,
    pub followers: i64,
    pub total_reviews: i64,
    /// Share of positive reviews in `0.0..=1.0`; 1.0 when there are none.
    pub percent_favourable: f64,
    pub last_review: Option<DateTime<Utc>>,
}

impl CuratorSummary {
    pub fn from_row(row: &ResultRow) -> Result<Self> {
        let negative = require_int(row, "negativeReviews")?;
        let positive = require_int(row, "positiveReviews")?;
        let total_reviews = negative + positive;

        Ok(Self {
            id: require_int(row, "id")?,
            name: optional_str(row, "name"),
            followers: require_int(row, "followers")?,
            total_reviews,
            percent_favourable: favourable_ratio(positive, total_reviews),
            last_review: optional_millis(row, "lastReviewDateUnixMillis")?,
        })
    }
}

/// Full details of one curator.
#[derive(Debug, Clone, PartialEq)]
pub struct CuratorInfo {
    pub id: i64,
    pub url: String,
    pub name: String,
    pub description: String,
    pub avatar_url: String,
    pub followers: i64,
    pub negative_reviews: i64,
    pub positive_reviews: i64,
    pub informational_reviews: i64,
    pub last_review: Option<DateTime<Utc>>,
}

impl CuratorInfo {
    pub fn from_row(row: &ResultRow) -> Result<Self> {
        Ok(Self {
            id: require_int(row, "id")?,
            url: optional_str(row, "url"),
            name: optional_str(row, "name"),
            description: optional_str(row, "description"),
            avatar_url: optional_str(row, "avatarUrl"),
            followers: require_int(row, "followers")?,
            negative_reviews: require_int(row, "negativeReviews")?,
            positive_reviews: require_int(row, "positiveReviews")?,
            informational_reviews: require_int(row, "informationalReviews")?,
            last_review: optional_millis(row, "lastReviewDate")?,
        })
    }
}

/// One point of a curator's history.
#[derive(Debug, Clone, PartialEq)]
pub struct CuratorSnapshot {
    pub date: DateTime<Utc>,
    pub followers: i64,
    pub positive_reviews: i64,
    pub negative_reviews: i64,
    pub informational_reviews: i64,
}

impl CuratorSnapshot {
    pub fn from_row(row: &ResultRow) -> Result<Self> {
        let date = optional_millis(row, "date")?
            .ok_or_else(|| OpenDataError::decode("column \"date\" is missing or null"))?;

        Ok(Self {
            date,
            followers: require_int(row, "followers")?,
            positive_reviews: require_int(row, "positiveReviews")?,
            negative_reviews: require_int(row, "negativeReviews")?,
            informational_reviews: require_int(row, "informationalReviews")?,
        })
    }
}

/// A curator's details together with their history.
#[derive(Debug, Clone, PartialEq)]
pub struct CuratorDetail {
    pub info: CuratorInfo,
    pub history: Vec<CuratorSnapshot>,
}

/// Positive share of reviews; a curator with no reviews counts as fully favourable.
pub fn favourable_ratio(positive: i64, total: i64) -> f64 {
    if total > 0 {
        positive as f64 / total as f64
    } else {
        1.0
    }
}

/// Headline for a listing of `count` curators.
pub fn search_summary(count: usize, is_top_listing: bool) -> String {
    if count == 0 {
        return "No matching curators were found. Only curators with at least 10 followers are tracked."
            .to_string();
    }
    if is_top_listing {
        return format!("Top {TOP_LIMIT} curators shown.");
    }
    if count >= SEARCH_LIMIT {
        return format!("More than {SEARCH_LIMIT} curators found.");
    }
    format!("{count} curators found.")
}

fn require_int(row: &ResultRow, column: &str) -> Result<i64> {
    row.integer(column).ok_or_else(|| {
        OpenDataError::decode(format!(
            "column \"{column}\" is missing, null or not an integer"
        ))
    })
}

fn optional_str(row: &ResultRow, column: &str) -> String {
    row.string(column).unwrap_or_default().to_string()
}

fn optional_millis(row: &ResultRow, column: &str) -> Result<Option<DateTime<Utc>>> {
    match row.integer(column) {
        None => Ok(None),
        Some(ms) => Utc
            .timestamp_millis_opt(ms)
            .single()
            .map(Some)
            .ok_or_else(|| {
                OpenDataError::decode(format!("column \"{column}\": {ms} is not a valid timestamp"))
            }),
    }
}

fn map_rows<T>(rows: &[ResultRow], f: impl Fn(&ResultRow) -> Result<T>) -> Result<Vec<T>> {
    rows.iter().map(f).collect()
}

/// Loads the top curators listing.
pub async fn top_curators(
    executor: &QueryExecutor<'_>,
    token: Option<&AuthToken>,
) -> Result<ExecutionOutcome<Vec<CuratorSummary>>> {
    executor
        .execute(&top_curators_query(), token)
        .await?
        .try_map(|output| map_rows(&output.rows, CuratorSummary::from_row))
}

/// Searches curators by name.
pub async fn search_curators(
    executor: &QueryExecutor<'_>,
    token: Option<&AuthToken>,
    name: &str,
) -> Result<ExecutionOutcome<Vec<CuratorSummary>>> {
    let query = search_curators_query(name)?;
    executor
        .execute(&query, token)
        .await?
        .try_map(|output| map_rows(&output.rows, CuratorSummary::from_row))
}

/// Loads one curator's details and history.
///
/// Both queries are issued concurrently. `Completed(None)` means the
/// curator does not exist.
pub async fn curator_detail(
    executor: &QueryExecutor<'_>,
    token: Option<&AuthToken>,
    id: i64,
) -> Result<ExecutionOutcome<Option<CuratorDetail>>> {
    let info_query = curator_info_query(id);
    let history_query = curator_history_query(id);

    let (info, history) = tokio::try_join!(
        executor.execute(&info_query, token),
        executor.execute(&history_query, token),
    )?;

    let (ExecutionOutcome::Completed(info), ExecutionOutcome::Completed(history)) =
        (info, history)
    else {
        return Ok(ExecutionOutcome::Unauthenticated);
    };

    let Some(info_row) = info.rows.first() else {
        return Ok(ExecutionOutcome::Completed(None));
    };

    Ok(ExecutionOutcome::Completed(Some(CuratorDetail {
        info: CuratorInfo::from_row(info_row)?,
        history: map_rows(&history.rows, CuratorSnapshot::from_row)?,
    })))
}
