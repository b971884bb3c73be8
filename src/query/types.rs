//! Core query and result types.
//!
//! A [`Query`] goes out, a [`QueryOutput`] of decoded [`ResultRow`]s comes
//! back. Column types are the engine's declared scalar tags; only INTEGER
//! and STRING are decoded, everything else is kept as an explicit
//! [`Field::Unsupported`] marker.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{OpenDataError, Result};

/// Scalar type tag the engine attaches to a column or parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DeclaredType {
    /// `INTEGER` (or its standard-dialect alias `INT64`).
    Integer,
    /// `STRING`.
    String,
    /// Any other tag (FLOAT, TIMESTAMP, RECORD, ...), kept verbatim.
    Other(String),
}

impl DeclaredType {
    /// Parses an engine type tag. Matching is case-insensitive.
    pub fn parse(tag: &str) -> Self {
        match tag.to_uppercase().as_str() {
            "INTEGER" | "INT64" => Self::Integer,
            "STRING" => Self::String,
            _ => Self::Other(tag.to_string()),
        }
    }

    /// Returns the tag as sent on the wire.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Integer => "INTEGER",
            Self::String => "STRING",
            Self::Other(tag) => tag,
        }
    }

    /// Returns true if values of this type are decoded.
    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl From<String> for DeclaredType {
    fn from(tag: String) -> Self {
        Self::parse(&tag)
    }
}

impl From<DeclaredType> for String {
    fn from(t: DeclaredType) -> Self {
        t.as_str().to_string()
    }
}

impl fmt::Display for DeclaredType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value bound to a query parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParameterValue {
    Integer(i64),
    String(String),
}

impl ParameterValue {
    /// Renders the value the way the engine expects it: always as text.
    pub fn to_wire_string(&self) -> String {
        match self {
            Self::Integer(i) => i.to_string(),
            Self::String(s) => s.clone(),
        }
    }
}

/// A named, typed query parameter (`@name` in the query text).
///
/// The declared type and the value are independent: a mismatch is the
/// engine's to reject, not ours.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryParameter {
    pub name: String,
    pub declared_type: DeclaredType,
    pub value: ParameterValue,
}

impl QueryParameter {
    /// Creates a parameter with an explicit declared type.
    pub fn new(name: impl Into<String>, declared_type: DeclaredType, value: ParameterValue) -> Self {
        Self {
            name: name.into(),
            declared_type,
            value,
        }
    }

    /// Creates an INTEGER parameter.
    pub fn integer(name: impl Into<String>, value: i64) -> Self {
        Self::new(name, DeclaredType::Integer, ParameterValue::Integer(value))
    }

    /// Creates a STRING parameter.
    pub fn string(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(name, DeclaredType::String, ParameterValue::String(value.into()))
    }
}

impl FromStr for QueryParameter {
    type Err = OpenDataError;

    /// Parses `name:TYPE:value`. The value may itself contain colons.
    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.splitn(3, ':');
        let (Some(name), Some(tag), Some(value)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(OpenDataError::config(format!(
                "Invalid parameter '{s}'. Expected name:TYPE:value"
            )));
        };

        if name.is_empty() {
            return Err(OpenDataError::config(format!(
                "Invalid parameter '{s}': name is empty"
            )));
        }

        let declared_type = DeclaredType::parse(tag);
        let value = match declared_type {
            DeclaredType::Integer => ParameterValue::Integer(value.parse().map_err(|_| {
                OpenDataError::config(format!(
                    "Invalid parameter '{name}': '{value}' is not an integer"
                ))
            })?),
            _ => ParameterValue::String(value.to_string()),
        };

        Ok(Self::new(name, declared_type, value))
    }
}

/// An immutable query: text in the engine's dialect plus ordered parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    text: String,
    parameters: Vec<QueryParameter>,
}

impl Query {
    /// Creates a query with no parameters.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            parameters: Vec::new(),
        }
    }

    /// Appends a parameter.
    pub fn with_parameter(mut self, parameter: QueryParameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Appends several parameters, preserving their order.
    pub fn with_parameters(mut self, parameters: impl IntoIterator<Item = QueryParameter>) -> Self {
        self.parameters.extend(parameters);
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn parameters(&self) -> &[QueryParameter] {
        &self.parameters
    }

    /// Returns parameter names that appear more than once, in first-repeat order.
    pub fn duplicate_parameter_names(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        let mut duplicates = Vec::new();
        for p in &self.parameters {
            if !seen.insert(p.name.as_str()) && !duplicates.contains(&p.name.as_str()) {
                duplicates.push(p.name.as_str());
            }
        }
        duplicates
    }
}

/// One column of a result set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaField {
    pub name: String,
    pub declared_type: DeclaredType,
}

impl SchemaField {
    pub fn new(name: impl Into<String>, declared_type: DeclaredType) -> Self {
        Self {
            name: name.into(),
            declared_type,
        }
    }
}

/// Ordered column list describing one result set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSchema {
    pub fields: Vec<SchemaField>,
}

impl ColumnSchema {
    pub fn new(fields: Vec<SchemaField>) -> Self {
        Self { fields }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }
}

/// Raw cells of one row, positionally aligned with a [`ColumnSchema`].
pub type RawRow = Vec<Option<String>>;

/// A decoded cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellValue {
    Null,
    Integer(i64),
    String(String),
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Converts to JSON; integers stay numbers.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::Integer(i) => serde_json::Value::from(*i),
            Self::String(s) => serde_json::Value::from(s.as_str()),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("NULL"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::String(s) => f.write_str(s),
        }
    }
}

/// A decoded field: either a value or a marker for a type we do not decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field {
    Value(CellValue),
    Unsupported { declared_type: String },
}

impl Field {
    /// Returns the value, or `None` for unsupported fields.
    pub fn value(&self) -> Option<&CellValue> {
        match self {
            Self::Value(v) => Some(v),
            Self::Unsupported { .. } => None,
        }
    }
}

/// A decoded row: fields keyed by column name, in schema order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultRow {
    fields: Vec<(String, Field)>,
}

impl ResultRow {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            fields: Vec::with_capacity(capacity),
        }
    }

    pub(crate) fn push(&mut self, name: impl Into<String>, field: Field) {
        self.fields.push((name.into(), field));
    }

    /// Returns the field for `name`, including unsupported markers.
    ///
    /// If a name repeats, the first column wins.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, f)| f)
    }

    /// Returns the decoded value for `name`.
    ///
    /// Unsupported fields behave as if the key were absent.
    pub fn get(&self, name: &str) -> Option<&CellValue> {
        self.field(name).and_then(Field::value)
    }

    /// Returns the integer value of `name`, if present and an integer.
    pub fn integer(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(CellValue::as_integer)
    }

    /// Returns the string value of `name`, if present and a string.
    pub fn string(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(CellValue::as_str)
    }

    /// Returns true if `name` holds a decoded value (possibly null).
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn fields(&self) -> &[(String, Field)] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Converts to a JSON object, omitting unsupported fields.
    pub fn to_json(&self) -> serde_json::Value {
        let map = self
            .fields
            .iter()
            .filter_map(|(name, field)| field.value().map(|v| (name.clone(), v.to_json())))
            .collect::<serde_json::Map<_, _>>();
        serde_json::Value::Object(map)
    }
}

/// Decoded result of one query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryOutput {
    /// Column metadata for the result set.
    pub columns: ColumnSchema,

    /// Decoded rows, in engine order.
    pub rows: Vec<ResultRow>,

    /// Row count the engine reported for the whole result.
    pub total_rows: u64,

    /// Wall time from submission to decoded rows.
    pub execution_time: Duration,
}

impl QueryOutput {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns true if the engine reported more rows than it returned.
    pub fn was_truncated(&self) -> bool {
        (self.rows.len() as u64) < self.total_rows
    }

    /// Returns a truncation warning message if the result was truncated.
    pub fn truncation_warning(&self) -> Option<String> {
        if self.was_truncated() {
            Some(format!(
                "Result truncated: showing {} of {} rows",
                self.rows.len(),
                self.total_rows
            ))
        } else {
            None
        }
    }
}

/// Outcome of an execution that may have been skipped for lack of credentials.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionOutcome<T = QueryOutput> {
    /// No usable token; nothing was sent to the engine.
    Unauthenticated,
    /// The engine answered.
    Completed(T),
}

impl<T> ExecutionOutcome<T> {
    pub fn is_unauthenticated(&self) -> bool {
        matches!(self, Self::Unauthenticated)
    }

    /// Returns the completed value, if any.
    pub fn completed(self) -> Option<T> {
        match self {
            Self::Completed(v) => Some(v),
            Self::Unauthenticated => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ExecutionOutcome<U> {
        match self {
            Self::Completed(v) => ExecutionOutcome::Completed(f(v)),
            Self::Unauthenticated => ExecutionOutcome::Unauthenticated,
        }
    }

    pub fn try_map<U>(self, f: impl FnOnce(T) -> Result<U>) -> Result<ExecutionOutcome<U>> {
        match self {
            Self::Completed(v) => Ok(ExecutionOutcome::Completed(f(v)?)),
            Self::Unauthenticated => Ok(ExecutionOutcome::Unauthenticated),
        }
    }
}

impl ExecutionOutcome<QueryOutput> {
    /// Collapses to a plain row list; unauthenticated yields no rows.
    pub fn into_rows(self) -> Vec<ResultRow> {
        self.completed().map(|o| o.rows).unwrap_or_default()
    }
}
