//! Remote query engine boundary.
//!
//! Provides a trait-based interface to the analytical engine so the
//! executor can run against the real REST API or an in-memory stand-in.

mod http;
mod mock;
mod types;

pub use http::HttpQueryEngine;
pub use mock::{EngineCall, FailingQueryEngine, MockQueryEngine};
pub use types::{
    ErrorBody, ErrorDetail, ErrorEnvelope, JobReference, ProjectList, ProjectRef, QueryRequest, QueryResponse,
    WireCell, WireField, WireParameter, WireParameterType, WireParameterValue, WireRow, WireSchema,
};

use crate::auth::AuthToken;
use crate::config::EngineConfig;
use crate::error::Result;
use async_trait::async_trait;

/// Trait defining the calls the executor makes against the engine.
///
/// Every call carries the caller's bearer token; implementations hold no
/// credentials of their own.
#[async_trait]
pub trait QueryEngine: Send + Sync {
    /// Lists projects accessible to the token, at most `max_results`.
    async fn list_projects(&self, token: &AuthToken, max_results: u32) -> Result<Vec<ProjectRef>>;

    /// Runs a query synchronously in `project_id` and returns its first page.
    ///
    /// The engine may answer before the job finishes (`job_complete` false).
    async fn run_query(
        &self,
        token: &AuthToken,
        project_id: &str,
        request: &QueryRequest,
    ) -> Result<QueryResponse>;

    /// Fetches results of a submitted job: its completion state, or the
    /// page starting at `page_token` once complete.
    async fn get_query_results(
        &self,
        token: &AuthToken,
        job: &JobReference,
        page_token: Option<&str>,
    ) -> Result<QueryResponse>;
}

/// Creates the HTTP engine client for the given configuration.
pub fn connect(config: &EngineConfig) -> Result<Box<dyn QueryEngine>> {
    Ok(Box::new(HttpQueryEngine::new(config)?))
}
