//! REST client for the hosted query engine.
//!
//! Implements the `QueryEngine` trait over HTTPS with bearer auth. Every
//! failure is passed back as an engine error carrying the engine's own
//! message; nothing is retried.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use crate::auth::AuthToken;
use crate::config::EngineConfig;
use crate::engine::types::{
    ErrorEnvelope, JobReference, ProjectList, ProjectRef, QueryRequest, QueryResponse,
};
use crate::engine::QueryEngine;
use crate::error::{OpenDataError, Result};

/// How long the engine holds a `getQueryResults` call open waiting for the job.
const RESULTS_WAIT_MS: u32 = 10_000;

/// HTTP query engine client.
#[derive(Debug, Clone)]
pub struct HttpQueryEngine {
    base_url: Url,
    client: Client,
}

impl HttpQueryEngine {
    /// Creates a client for the configured endpoint.
    pub fn new(config: &EngineConfig) -> Result<Self> {
        let base_url = Url::parse(&config.endpoint()?)
            .map_err(|e| OpenDataError::config(format!("Invalid engine URL: {e}")))?;

        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| OpenDataError::internal(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { base_url, client })
    }

    /// Appends path segments to the base URL, escaping each one.
    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                OpenDataError::config(format!("Engine URL cannot be a base: {}", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Reads a response, decoding success bodies as `T`.
    async fn read_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| OpenDataError::engine(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            let error = parse_error(status, &body);
            warn!("Engine returned {}: {}", status, error.message());
            return Err(error);
        }

        serde_json::from_str(&body)
            .map_err(|e| OpenDataError::engine(format!("Failed to parse response: {e}")))
    }
}

/// Converts a non-success response into an engine error.
///
/// The engine's message and reason tags are kept as-is; bodies that are
/// not the engine's error envelope are carried raw.
fn parse_error(status: StatusCode, body: &str) -> OpenDataError {
    if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(body) {
        let reasons = envelope
            .error
            .errors
            .into_iter()
            .filter_map(|d| d.reason)
            .collect();
        return OpenDataError::engine_with_status(status.as_u16(), envelope.error.message, reasons);
    }

    let message = if body.trim().is_empty() {
        status.to_string()
    } else {
        format!("{status}: {body}")
    };
    OpenDataError::engine_with_status(status.as_u16(), message, Vec::new())
}

/// Converts a transport failure into an engine error.
fn request_error(e: reqwest::Error) -> OpenDataError {
    if e.is_timeout() {
        OpenDataError::engine("Request to query engine timed out")
    } else if e.is_connect() {
        OpenDataError::engine(format!("Failed to connect to query engine: {e}"))
    } else {
        OpenDataError::engine(format!("Request failed: {e}"))
    }
}

#[async_trait]
impl QueryEngine for HttpQueryEngine {
    async fn list_projects(&self, token: &AuthToken, max_results: u32) -> Result<Vec<ProjectRef>> {
        let url = self.url(&["projects"])?;
        debug!("GET {} (maxResults={})", url, max_results);

        let response = self
            .client
            .get(url)
            .bearer_auth(token.secret())
            .query(&[("maxResults", max_results)])
            .send()
            .await
            .map_err(request_error)?;

        let list: ProjectList = Self::read_response(response).await?;
        Ok(list.projects)
    }

    async fn run_query(
        &self,
        token: &AuthToken,
        project_id: &str,
        request: &QueryRequest,
    ) -> Result<QueryResponse> {
        let url = self.url(&["projects", project_id, "queries"])?;
        debug!(
            "POST {} ({} parameters)",
            url,
            request.query_parameters.len()
        );

        let response = self
            .client
            .post(url)
            .bearer_auth(token.secret())
            .json(request)
            .send()
            .await
            .map_err(request_error)?;

        Self::read_response(response).await
    }

    async fn get_query_results(
        &self,
        token: &AuthToken,
        job: &JobReference,
        page_token: Option<&str>,
    ) -> Result<QueryResponse> {
        let url = self.url(&["projects", &job.project_id, "queries", &job.job_id])?;
        debug!("GET {} (pageToken={:?})", url, page_token);

        let mut params = vec![("timeoutMs", RESULTS_WAIT_MS.to_string())];
        if let Some(page_token) = page_token {
            params.push(("pageToken", page_token.to_string()));
        }
        if let Some(location) = &job.location {
            params.push(("location", location.clone()));
        }

        let response = self
            .client
            .get(url)
            .bearer_auth(token.secret())
            .query(&params)
            .send()
            .await
            .map_err(request_error)?;

        Self::read_response(response).await
    }
}
