//! Mock query engines for testing.
//!
//! Provides an in-memory engine with canned projects and responses that
//! records every call it receives, plus an engine that always fails.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use crate::auth::AuthToken;
use crate::engine::types::{JobReference, ProjectRef, QueryRequest, QueryResponse};
use crate::engine::QueryEngine;
use crate::error::{OpenDataError, Result};

/// A call received by [`MockQueryEngine`], in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    ListProjects {
        max_results: u32,
    },
    RunQuery {
        project_id: String,
        request: QueryRequest,
    },
    GetQueryResults {
        job_id: String,
        page_token: Option<String>,
    },
}

/// A mock engine that returns predefined results.
#[derive(Debug)]
pub struct MockQueryEngine {
    projects: Vec<ProjectRef>,
    /// Custom response mappings (query text fragment -> response).
    responses: Vec<(String, QueryResponse)>,
    default_response: QueryResponse,
    /// Responses handed out, in order, by `get_query_results`.
    follow_ups: Mutex<VecDeque<QueryResponse>>,
    calls: Mutex<Vec<EngineCall>>,
}

impl MockQueryEngine {
    /// Creates a mock with one accessible project and empty results.
    pub fn new() -> Self {
        Self {
            projects: vec![ProjectRef::new("mock-project")],
            responses: Vec::new(),
            default_response: QueryResponse::default(),
            follow_ups: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Replaces the list of accessible projects.
    pub fn with_projects(mut self, ids: &[&str]) -> Self {
        self.projects = ids.iter().map(|id| ProjectRef::new(*id)).collect();
        self
    }

    /// Adds a custom response mapping.
    ///
    /// When the query text contains `pattern`, the mock returns `response`.
    pub fn with_response(mut self, pattern: impl Into<String>, response: QueryResponse) -> Self {
        self.responses.push((pattern.into(), response));
        self
    }

    /// Sets the response for queries no pattern matches.
    pub fn with_default_response(mut self, response: QueryResponse) -> Self {
        self.default_response = response;
        self
    }

    /// Queues a response for the next `get_query_results` call.
    pub fn with_follow_up(self, response: QueryResponse) -> Self {
        self.follow_ups
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(response);
        self
    }

    fn lock_calls(&self) -> MutexGuard<'_, Vec<EngineCall>> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Returns every call received so far.
    pub fn calls(&self) -> Vec<EngineCall> {
        self.lock_calls().clone()
    }

    /// Returns the number of calls received so far.
    pub fn call_count(&self) -> usize {
        self.lock_calls().len()
    }

    /// Returns the most recent query request and the project it targeted.
    pub fn last_query(&self) -> Option<(String, QueryRequest)> {
        self.lock_calls().iter().rev().find_map(|call| match call {
            EngineCall::RunQuery {
                project_id,
                request,
            } => Some((project_id.clone(), request.clone())),
            _ => None,
        })
    }

    fn response_for(&self, query: &str) -> QueryResponse {
        self.responses
            .iter()
            .find(|(pattern, _)| query.contains(pattern.as_str()))
            .map(|(_, response)| response.clone())
            .unwrap_or_else(|| self.default_response.clone())
    }
}

impl Default for MockQueryEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QueryEngine for MockQueryEngine {
    async fn list_projects(&self, _token: &AuthToken, max_results: u32) -> Result<Vec<ProjectRef>> {
        self.lock_calls()
            .push(EngineCall::ListProjects { max_results });
        Ok(self
            .projects
            .iter()
            .take(max_results as usize)
            .cloned()
            .collect())
    }

    async fn run_query(
        &self,
        _token: &AuthToken,
        project_id: &str,
        request: &QueryRequest,
    ) -> Result<QueryResponse> {
        self.lock_calls().push(EngineCall::RunQuery {
            project_id: project_id.to_string(),
            request: request.clone(),
        });
        Ok(self.response_for(&request.query))
    }

    async fn get_query_results(
        &self,
        _token: &AuthToken,
        job: &JobReference,
        page_token: Option<&str>,
    ) -> Result<QueryResponse> {
        self.lock_calls().push(EngineCall::GetQueryResults {
            job_id: job.job_id.clone(),
            page_token: page_token.map(String::from),
        });
        self.follow_ups
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
            .ok_or_else(|| {
                OpenDataError::engine_with_status(
                    404,
                    format!("Not found: Job {}:{}", job.project_id, job.job_id),
                    vec!["notFound".to_string()],
                )
            })
    }
}

/// An engine whose calls always fail with a fixed error.
#[derive(Debug, Clone)]
pub struct FailingQueryEngine {
    error: OpenDataError,
    fail_discovery: bool,
}

impl FailingQueryEngine {
    /// Fails query execution with `error`; project discovery succeeds.
    pub fn new(error: OpenDataError) -> Self {
        Self {
            error,
            fail_discovery: false,
        }
    }

    /// Also fails project discovery.
    pub fn failing_discovery(mut self) -> Self {
        self.fail_discovery = true;
        self
    }
}

#[async_trait]
impl QueryEngine for FailingQueryEngine {
    async fn list_projects(&self, _token: &AuthToken, _max_results: u32) -> Result<Vec<ProjectRef>> {
        if self.fail_discovery {
            return Err(self.error.clone());
        }
        Ok(vec![ProjectRef::new("mock-project")])
    }

    async fn run_query(
        &self,
        _token: &AuthToken,
        _project_id: &str,
        _request: &QueryRequest,
    ) -> Result<QueryResponse> {
        Err(self.error.clone())
    }

    async fn get_query_results(
        &self,
        _token: &AuthToken,
        _job: &JobReference,
        _page_token: Option<&str>,
    ) -> Result<QueryResponse> {
        Err(self.error.clone())
    }
}
