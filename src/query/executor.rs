//! Query execution against the remote engine.
//!
//! Runs one parameterized query end to end: check the token, resolve the
//! project, submit, wait for the job, fetch every page, decode. Nothing is
//! cached between calls.

use std::time::Instant;
use tracing::{debug, info, warn};

use crate::auth::AuthToken;
use crate::engine::{JobReference, QueryEngine, QueryRequest, QueryResponse};
use crate::error::{OpenDataError, Result};
use crate::query::decode::decode_rows;
use crate::query::project::ProjectSelector;
use crate::query::types::{ExecutionOutcome, Query, QueryOutput, RawRow};

/// Upper bound on completion polls for one query. Each poll is held open by
/// the engine while the job runs, so this bounds the wait rather than the
/// request rate.
const MAX_COMPLETION_POLLS: u32 = 30;

/// Executes queries through a [`QueryEngine`].
pub struct QueryExecutor<'a> {
    engine: &'a dyn QueryEngine,
    project: ProjectSelector,
}

impl<'a> QueryExecutor<'a> {
    /// Creates a new query executor.
    pub fn new(engine: &'a dyn QueryEngine, project: ProjectSelector) -> Self {
        Self { engine, project }
    }

    pub fn project(&self) -> &ProjectSelector {
        &self.project
    }

    /// Executes `query` with the caller's token.
    ///
    /// A missing, empty or expired token yields
    /// [`ExecutionOutcome::Unauthenticated`] without contacting the engine.
    /// Engine failures are returned unchanged.
    pub async fn execute(
        &self,
        query: &Query,
        token: Option<&AuthToken>,
    ) -> Result<ExecutionOutcome> {
        let Some(token) = AuthToken::usable(token) else {
            debug!("No usable token; skipping query");
            return Ok(ExecutionOutcome::Unauthenticated);
        };

        let duplicates = query.duplicate_parameter_names();
        if !duplicates.is_empty() {
            warn!(
                "Query has duplicate parameter names {:?}; the engine may reject it",
                duplicates
            );
        }

        let start = Instant::now();

        let project_id = self.project.resolve(self.engine, token).await?;

        let request = QueryRequest::from(query);
        debug!(
            "Submitting query to project {} with {} parameters",
            project_id,
            request.query_parameters.len()
        );
        let response = self.engine.run_query(token, &project_id, &request).await?;
        let response = self.wait_for_completion(token, response).await?;

        let columns = response.column_schema();
        let mut raw_rows = response.raw_rows();
        self.fetch_remaining_pages(token, &response, &mut raw_rows).await?;
        let rows = decode_rows(&columns, &raw_rows)?;
        let execution_time = start.elapsed();

        let output = QueryOutput {
            columns,
            rows,
            total_rows: response.total_rows,
            execution_time,
        };

        info!(
            "Query returned {} of {} rows in {:?}",
            output.rows.len(),
            output.total_rows,
            execution_time
        );
        if let Some(warning) = output.truncation_warning() {
            warn!("{}", warning);
        }

        Ok(ExecutionOutcome::Completed(output))
    }

    /// Polls the job until the engine reports it complete.
    async fn wait_for_completion(
        &self,
        token: &AuthToken,
        mut response: QueryResponse,
    ) -> Result<QueryResponse> {
        let mut polls = 0;
        while !response.job_complete {
            let job = pending_job(&response)?;
            if polls == MAX_COMPLETION_POLLS {
                return Err(OpenDataError::engine(format!(
                    "Query job {} did not complete after {} polls",
                    job.job_id, MAX_COMPLETION_POLLS
                )));
            }
            polls += 1;
            debug!("Job {} still running (poll {})", job.job_id, polls);
            response = self.engine.get_query_results(token, &job, None).await?;
            if response.job_reference.is_none() {
                response.job_reference = Some(job);
            }
        }
        Ok(response)
    }

    /// Follows page tokens until every row the engine reported is fetched.
    async fn fetch_remaining_pages(
        &self,
        token: &AuthToken,
        first: &QueryResponse,
        raw_rows: &mut Vec<RawRow>,
    ) -> Result<()> {
        let mut page_token = first.page_token.clone();
        while let Some(current) = page_token.take() {
            if raw_rows.len() as u64 >= first.total_rows {
                break;
            }
            let Some(job) = &first.job_reference else {
                warn!("Engine returned a page token without a job reference");
                break;
            };

            debug!("Fetching page after {} of {} rows", raw_rows.len(), first.total_rows);
            let page = self
                .engine
                .get_query_results(token, job, Some(&current))
                .await?;
            let page_rows = page.raw_rows();
            if page_rows.is_empty() {
                break;
            }
            raw_rows.extend(page_rows);
            page_token = page.page_token;
        }
        Ok(())
    }
}

/// The job behind an unfinished response; without one it cannot be awaited.
fn pending_job(response: &QueryResponse) -> Result<JobReference> {
    response.job_reference.clone().ok_or_else(|| {
        OpenDataError::engine("Query job did not complete and the engine returned no job reference")
    })
}
