//! Raw row decoding.
//!
//! Turns the engine's positional string cells into typed [`ResultRow`]s
//! using the declared type of each column. Pure and deterministic.

use crate::error::{OpenDataError, Result};
use crate::query::types::{CellValue, ColumnSchema, DeclaredType, Field, RawRow, ResultRow};

/// Decodes a single cell.
///
/// Null decodes to [`CellValue::Null`] whatever the declared type; types
/// other than INTEGER and STRING become [`Field::Unsupported`]. INTEGER
/// text must parse as a whole `i64`; unlike a lenient prefix parse, a
/// malformed cell is a decode error rather than a silent `NaN` or partial value.
pub fn decode_cell(column: &str, declared_type: &DeclaredType, raw: Option<&str>) -> Result<Field> {
    let Some(raw) = raw else {
        return Ok(Field::Value(CellValue::Null));
    };

    match declared_type {
        DeclaredType::Integer => raw
            .parse::<i64>()
            .map(|i| Field::Value(CellValue::Integer(i)))
            .map_err(|_| {
                OpenDataError::decode(format!(
                    "column \"{column}\": \"{raw}\" is not an integer"
                ))
            }),
        DeclaredType::String => Ok(Field::Value(CellValue::String(raw.to_string()))),
        DeclaredType::Other(tag) => Ok(Field::Unsupported {
            declared_type: tag.clone(),
        }),
    }
}

/// Decodes one raw row against the schema.
pub fn decode_row(schema: &ColumnSchema, raw: &RawRow) -> Result<ResultRow> {
    if raw.len() != schema.len() {
        return Err(OpenDataError::decode(format!(
            "row has {} cells but schema has {} columns",
            raw.len(),
            schema.len()
        )));
    }

    let mut row = ResultRow::with_capacity(schema.len());
    for (field, cell) in schema.fields.iter().zip(raw) {
        let decoded = decode_cell(&field.name, &field.declared_type, cell.as_deref())?;
        row.push(field.name.clone(), decoded);
    }
    Ok(row)
}

/// Decodes rows in order. No reordering, no deduplication.
pub fn decode_rows(schema: &ColumnSchema, raw_rows: &[RawRow]) -> Result<Vec<ResultRow>> {
    raw_rows.iter().map(|raw| decode_row(schema, raw)).collect()
}
