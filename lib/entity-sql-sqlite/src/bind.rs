//! Binding engine values to SQLite parameters.

use chrono::SecondsFormat;
use entity_sql::Value;
use rusqlite::ToSql;
use rusqlite::types::ToSqlOutput;

/// A [`Value`] bound as a SQLite parameter.
///
/// Datetimes bind as RFC 3339 text with microsecond precision, which is also
/// what they deserialize from when read back.
pub struct SqlValue<'a>(pub &'a Value);

impl ToSql for SqlValue<'_> {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self.0 {
            Value::Null => ToSqlOutput::Owned(rusqlite::types::Value::Null),
            Value::Int(n) => ToSqlOutput::from(*n),
            Value::UInt(n) => {
                // SQLite integers are signed 64-bit
                let n = i64::try_from(*n)
                    .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
                ToSqlOutput::from(n)
            }
            Value::Float(f) => ToSqlOutput::from(*f),
            Value::Bool(b) => ToSqlOutput::from(*b),
            Value::String(s) => ToSqlOutput::from(s.as_str()),
            Value::Bytes(bytes) => ToSqlOutput::from(bytes.as_slice()),
            Value::Datetime(dt) => ToSqlOutput::from(dt.to_rfc3339_opts(SecondsFormat::Micros, true)),
        })
    }
}

/// Named parameters as rusqlite expects them.
pub(crate) fn named<'a>(values: &'a [(&'a str, SqlValue<'a>)]) -> Vec<(&'a str, &'a dyn ToSql)> {
    values
        .iter()
        .map(|(name, value)| (*name, value as &dyn ToSql))
        .collect()
}
