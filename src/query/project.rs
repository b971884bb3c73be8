//! Project selection.
//!
//! Queries run inside a project. Either the project is configured, or the
//! first project the token can see is used.

use tracing::debug;

use crate::auth::AuthToken;
use crate::engine::QueryEngine;
use crate::error::{OpenDataError, Result};

/// How the executor picks the project to run queries in.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ProjectSelector {
    /// Use this project; the engine is not asked.
    Fixed(String),
    /// Ask the engine for accessible projects and take the first.
    #[default]
    FirstAccessible,
}

impl ProjectSelector {
    /// Resolves the project id, calling the engine only for discovery.
    pub async fn resolve(&self, engine: &dyn QueryEngine, token: &AuthToken) -> Result<String> {
        match self {
            Self::Fixed(id) => Ok(id.clone()),
            Self::FirstAccessible => {
                let projects = engine.list_projects(token, 1).await?;
                let project = projects.into_iter().next().ok_or_else(|| {
                    OpenDataError::engine("No projects are accessible with this token")
                })?;
                debug!("Discovered project {}", project.id);
                Ok(project.id)
            }
        }
    }
}

impl From<Option<String>> for ProjectSelector {
    fn from(project_id: Option<String>) -> Self {
        match project_id {
            Some(id) if !id.is_empty() => Self::Fixed(id),
            _ => Self::FirstAccessible,
        }
    }
}
