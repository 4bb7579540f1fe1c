//! Reading SQLite rows as JSON objects.

use entity_sql::Row;
use rusqlite::types::ValueRef;
use serde_json::Value;

use crate::error::{Result, SqliteError};

/// Convert one result column to JSON.
///
/// INTEGER and REAL become numbers, TEXT a string, BLOB an array of bytes.
pub(crate) fn column_value(value: ValueRef<'_>) -> Result<Value> {
    Ok(match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(n) => Value::from(n),
        ValueRef::Real(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .ok_or_else(|| SqliteError::Conversion(format!("non-finite real: {f}")))?,
        ValueRef::Text(bytes) => Value::String(
            std::str::from_utf8(bytes)
                .map_err(|e| SqliteError::Conversion(format!("invalid UTF-8 text: {e}")))?
                .to_string(),
        ),
        ValueRef::Blob(bytes) => Value::from(bytes.to_vec()),
    })
}

/// Collect every row of a statement into JSON objects keyed by column name.
pub(crate) fn collect_rows(mut rows: rusqlite::Rows<'_>, columns: &[String]) -> Result<Vec<Row>> {
    let mut collected = Vec::new();
    while let Some(row) = rows.next()? {
        let mut object = Row::new();
        for (index, column) in columns.iter().enumerate() {
            object.insert(column.clone(), column_value(row.get_ref(index)?)?);
        }
        collected.push(object);
    }
    Ok(collected)
}
