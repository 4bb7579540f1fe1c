//! Turning result rows back into entities.

use serde::de::DeserializeOwned;

use crate::metadata::FieldDescriptor;
use crate::{CommandError, Entity, FieldMetadata};

/// A result row keyed by column name (the field name, for generated SELECTs).
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Deserialize a row into `T`.
///
/// Only columns naming a column, custom-column, sorting or grouping field of
/// `T`, or a foreign key holding a plain key, are kept, and nulls are
/// dropped. Fields holding related entities are never populated and must
/// deserialize from absence.
pub fn materialize<T>(row: Row) -> Result<T, CommandError>
where
    T: Entity + DeserializeOwned,
{
    let metadata = T::describe();
    let object: Row = row
        .into_iter()
        .filter(|(name, value)| {
            !value.is_null() && metadata.field(name).is_some_and(is_materialized)
        })
        .collect();
    Ok(serde_json::from_value(serde_json::Value::Object(object))?)
}

fn is_materialized(field: &FieldMetadata) -> bool {
    field.descriptors().iter().any(|descriptor| match descriptor {
        FieldDescriptor::Column(_)
        | FieldDescriptor::CustomColumn(_)
        | FieldDescriptor::Sorting(_)
        | FieldDescriptor::Grouping(_) => true,
        FieldDescriptor::ForeignKey(_) => field.target().is_none(),
        FieldDescriptor::OneToMany(_) | FieldDescriptor::ManyToMany(_) => false,
    })
}
