//! Wire types for the query engine's REST API.
//!
//! Field names follow the engine's camelCase JSON. Conversion to the core
//! query types lives here so the executor never touches raw JSON.

use serde::{Deserialize, Deserializer, Serialize};

use crate::query::{ColumnSchema, DeclaredType, Query, QueryParameter, RawRow, SchemaField};

/// Body of a `jobs.query` request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    pub query: String,

    /// Always false: queries use the standard dialect.
    pub use_legacy_sql: bool,

    /// `"NAMED"` when parameters are present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameter_mode: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub query_parameters: Vec<WireParameter>,
}

impl From<&Query> for QueryRequest {
    fn from(query: &Query) -> Self {
        let query_parameters: Vec<WireParameter> =
            query.parameters().iter().map(WireParameter::from).collect();
        let parameter_mode = (!query_parameters.is_empty()).then(|| "NAMED".to_string());

        Self {
            query: query.text().to_string(),
            use_legacy_sql: false,
            parameter_mode,
            query_parameters,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireParameter {
    pub name: String,
    pub parameter_type: WireParameterType,
    pub parameter_value: WireParameterValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireParameterType {
    #[serde(rename = "type")]
    pub type_tag: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireParameterValue {
    pub value: String,
}

impl From<&QueryParameter> for WireParameter {
    fn from(p: &QueryParameter) -> Self {
        Self {
            name: p.name.clone(),
            parameter_type: WireParameterType {
                type_tag: p.declared_type.as_str().to_string(),
            },
            parameter_value: WireParameterValue {
                value: p.value.to_wire_string(),
            },
        }
    }
}

/// Body of a `jobs.query` or `jobs.getQueryResults` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResponse {
    /// The job running the query; needed to poll and page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_reference: Option<JobReference>,


    /// Total rows in the result; sent as a decimal string.
    #[serde(default, deserialize_with = "u64_from_string_or_number")]
    pub total_rows: u64,

    /// Absent when the result has no rows.
    #[serde(default)]
    pub schema: Option<WireSchema>,

    #[serde(default)]
    pub rows: Vec<WireRow>,

    /// Present when more rows follow this page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_token: Option<String>,

    #[serde(default = "default_job_complete")]
    pub job_complete: bool,
}

fn default_job_complete() -> bool {
    true
}

impl Default for QueryResponse {
    fn default() -> Self {
        Self {
            job_reference: None,
            total_rows: 0,
            schema: None,
            rows: Vec::new(),
            page_token: None,
            job_complete: true,
        }
    }
}

impl QueryResponse {
    /// Builds a response from column definitions and raw rows.
    pub fn from_parts(fields: &[(&str, &str)], rows: Vec<RawRow>) -> Self {
        Self {
            job_reference: None,
            total_rows: rows.len() as u64,
            schema: Some(WireSchema {
                fields: fields
                    .iter()
                    .map(|(name, tag)| WireField {
                        name: name.to_string(),
                        field_type: tag.to_string(),
                    })
                    .collect(),
            }),
            rows: rows
                .into_iter()
                .map(|cells| WireRow {
                    f: cells
                        .into_iter()
                        .map(|c| WireCell {
                            v: c.map_or(serde_json::Value::Null, serde_json::Value::String),
                        })
                        .collect(),
                })
                .collect(),
            page_token: None,
            job_complete: true,
        }
    }

    /// A response for a job that has not finished yet.
    pub fn pending(job: JobReference) -> Self {
        Self {
            job_reference: Some(job),
            job_complete: false,
            ..Self::default()
        }
    }

    /// Attaches the job that produced this response.
    pub fn with_job(mut self, job: JobReference) -> Self {
        self.job_reference = Some(job);
        self
    }

    /// Marks this response as one page of `total_rows`, continued by `page_token`.
    pub fn with_page(mut self, total_rows: u64, page_token: Option<&str>) -> Self {
        self.total_rows = total_rows;
        self.page_token = page_token.map(String::from);
        self
    }

    /// Converts the wire schema to the core column schema.
    pub fn column_schema(&self) -> ColumnSchema {
        let fields = self
            .schema
            .as_ref()
            .map(|s| {
                s.fields
                    .iter()
                    .map(|f| SchemaField::new(&f.name, DeclaredType::parse(&f.field_type)))
                    .collect()
            })
            .unwrap_or_default();
        ColumnSchema::new(fields)
    }

    /// Converts wire rows to positional raw cells.
    pub fn raw_rows(&self) -> Vec<RawRow> {
        self.rows
            .iter()
            .map(|row| row.f.iter().map(WireCell::as_raw).collect())
            .collect()
    }
}

/// Identifies a query job for `jobs.getQueryResults`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobReference {
    pub project_id: String,
    pub job_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl JobReference {
    pub fn new(project_id: impl Into<String>, job_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            job_id: job_id.into(),
            location: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WireSchema {
    #[serde(default)]
    pub fields: Vec<WireField>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireField {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WireRow {
    #[serde(default)]
    pub f: Vec<WireCell>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WireCell {
    #[serde(default)]
    pub v: serde_json::Value,
}

impl WireCell {
    /// Scalars become text; null and nested values (records, arrays) are absent.
    fn as_raw(&self) -> Option<String> {
        match &self.v {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            serde_json::Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }
}

/// Body of a `projects.list` response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectList {
    #[serde(default)]
    pub projects: Vec<ProjectRef>,
}

/// A project accessible to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRef {
    pub id: String,
    #[serde(default)]
    pub friendly_name: Option<String>,
}

impl ProjectRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            friendly_name: None,
        }
    }
}

/// Error body returned with non-success statuses.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub code: Option<u16>,
    pub message: String,
    #[serde(default)]
    pub errors: Vec<ErrorDetail>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorDetail {
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Accepts `"123"` or `123`.
fn u64_from_string_or_number<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrNumber {
        String(String),
        Number(u64),
    }

    match StringOrNumber::deserialize(deserializer)? {
        StringOrNumber::String(s) => s.parse().map_err(serde::de::Error::custom),
        StringOrNumber::Number(n) => Ok(n),
    }
}
