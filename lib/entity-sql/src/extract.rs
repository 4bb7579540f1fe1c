//! Reading field values out of entity instances.
//!
//! A foreign-key field either holds the key itself or the related entity. In
//! the second case the key is read from the related entity's column that
//! matches the foreign key's target, which may itself be a foreign key, so
//! resolution recurses until a scalar is found. A type already on the
//! resolution path reads as null.

use std::ptr;

use tracing::trace;

use crate::descriptor::ColumnDescriptor;
use crate::metadata::{EntityMetadata, FieldDescriptor};
use crate::resolve::{resolve_table, DataDescriptor, ResolvedField};
use crate::{CommandError, CommandKind, Entity, FieldValue, Value};

/// Value of a field of `entity`; null when the field holds nothing.
pub fn extract(entity: &dyn Entity, field: &ResolvedField<'_>) -> Result<Value, CommandError> {
    let mut path = vec![entity.metadata()];
    match field.data {
        Some(DataDescriptor::Column(_)) | Some(DataDescriptor::CustomColumn(_)) => {
            resolve_column_value(entity.field_value(field.name()), None, &mut path)
        }
        Some(DataDescriptor::ForeignKey(foreign_key)) => resolve_column_value(
            entity.field_value(field.name()),
            foreign_key.target_column(),
            &mut path,
        ),
        _ => Ok(Value::Null),
    }
}

/// Value bound for `column` under `kind`, or `None` when the column does not
/// take part in the command.
pub(crate) fn eligible(column: &ColumnDescriptor, kind: CommandKind, value: Value) -> Option<Value> {
    let value = match (kind, column.default_value()) {
        (CommandKind::Insert | CommandKind::Update, Some(default)) if value.is_null() => {
            default.clone()
        }
        _ => value,
    };
    column.behaviour(kind).admits(&value).then_some(value)
}

fn resolve_column_value(
    value: FieldValue<'_>,
    target: Option<&str>,
    path: &mut Vec<&'static EntityMetadata>,
) -> Result<Value, CommandError> {
    match value {
        FieldValue::Scalar(value) => Ok(value),
        FieldValue::Related(related) => resolve_foreign_key_value(related, target, path),
    }
}

fn resolve_foreign_key_value(
    related: &dyn Entity,
    target: Option<&str>,
    path: &mut Vec<&'static EntityMetadata>,
) -> Result<Value, CommandError> {
    let metadata = related.metadata();
    if path.iter().any(|seen| ptr::eq(*seen, metadata)) {
        trace!(entity = metadata.type_name(), "foreign key revisits its own path");
        return Ok(Value::Null);
    }

    let table = match resolve_table(metadata) {
        Ok(table) => table,
        Err(CommandError::MissingTableMetadata(_)) => {
            trace!(entity = metadata.type_name(), "related type has no table");
            return Ok(Value::Null);
        }
        Err(e) => return Err(e),
    };

    for field in metadata.fields() {
        let Some((column, nested_target)) = field.descriptors().iter().find_map(|d| match d {
            FieldDescriptor::Column(column) => Some((column, None)),
            FieldDescriptor::ForeignKey(foreign_key) => {
                Some((foreign_key.column(), foreign_key.target_column()))
            }
            _ => None,
        }) else {
            continue;
        };

        let alias = column.table_alias().or(table.alias());
        let matches = alias == table.alias()
            && match target {
                Some(target) => column.name() == target,
                None => column.is_primary_key(),
            };
        if !matches {
            continue;
        }

        path.push(metadata);
        let value = resolve_column_value(related.field_value(field.name()), nested_target, path);
        path.pop();
        return value;
    }

    trace!(
        entity = metadata.type_name(),
        target_column = target,
        "related type has no matching column"
    );
    Ok(Value::Null)
}
