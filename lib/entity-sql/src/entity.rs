//! The entity contract read by command builders.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::{EntityMetadata, Value};

/// A record type mapped to a table.
///
/// Usually derived with `#[derive(Entity)]`. The trait is object safe so
/// builders and the foreign-key resolver can walk instances of different
/// types through `&dyn Entity`.
pub trait Entity {
    /// Static metadata of the type, declared once.
    fn describe() -> &'static EntityMetadata
    where
        Self: Sized;

    /// Metadata of this instance's type.
    fn metadata(&self) -> &'static EntityMetadata;

    /// Current value of a field. Unknown fields read as null.
    fn field_value(&self, field: &str) -> FieldValue<'_>;
}

/// The runtime value of a field: a scalar, or a related entity whose key is
/// resolved through its own metadata.
pub enum FieldValue<'a> {
    Scalar(Value),
    Related(&'a dyn Entity),
}

impl FieldValue<'_> {
    pub fn null() -> Self {
        FieldValue::Scalar(Value::Null)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Scalar(Value::Null))
    }
}

impl fmt::Debug for FieldValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Scalar(value) => f.debug_tuple("Scalar").field(value).finish(),
            FieldValue::Related(entity) => f
                .debug_tuple("Related")
                .field(&entity.metadata().type_name())
                .finish(),
        }
    }
}

/// Conversion of a field into a [`FieldValue`].
///
/// Implemented for the built-in column types and their `Option`/`Box`
/// wrappers; `#[derive(Entity)]` implements it for entity types so they can
/// be held by foreign-key fields.
pub trait ToFieldValue {
    fn to_field_value(&self) -> FieldValue<'_>;
}

macro_rules! scalar_field {
    ($($ty:ty),*) => {
        $(
            impl ToFieldValue for $ty {
                fn to_field_value(&self) -> FieldValue<'_> {
                    FieldValue::Scalar(Value::from(self.clone()))
                }
            }
        )*
    };
}

scalar_field!(
    i8,
    i16,
    i32,
    i64,
    u8,
    u16,
    u32,
    u64,
    f32,
    f64,
    bool,
    String,
    Vec<u8>,
    DateTime<Utc>
);

impl ToFieldValue for Value {
    fn to_field_value(&self) -> FieldValue<'_> {
        FieldValue::Scalar(self.clone())
    }
}

impl<T: ToFieldValue> ToFieldValue for Option<T> {
    fn to_field_value(&self) -> FieldValue<'_> {
        match self {
            Some(value) => value.to_field_value(),
            None => FieldValue::null(),
        }
    }
}

impl<T: ToFieldValue + ?Sized> ToFieldValue for Box<T> {
    fn to_field_value(&self) -> FieldValue<'_> {
        (**self).to_field_value()
    }
}

/// The entity type a relation field points at.
///
/// Built-in types have no target. `#[derive(Entity)]` implements it for
/// entity types; `Option`, `Box` and `Vec` delegate to their element.
pub trait RelationTarget {
    fn relation_target() -> Option<&'static EntityMetadata>;
}

macro_rules! no_relation_target {
    ($($ty:ty),*) => {
        $(
            impl RelationTarget for $ty {
                fn relation_target() -> Option<&'static EntityMetadata> {
                    None
                }
            }
        )*
    };
}

no_relation_target!(
    i8,
    i16,
    i32,
    i64,
    u8,
    u16,
    u32,
    u64,
    f32,
    f64,
    bool,
    String,
    DateTime<Utc>,
    Value
);

impl<T: RelationTarget> RelationTarget for Option<T> {
    fn relation_target() -> Option<&'static EntityMetadata> {
        T::relation_target()
    }
}

impl<T: RelationTarget> RelationTarget for Box<T> {
    fn relation_target() -> Option<&'static EntityMetadata> {
        T::relation_target()
    }
}

impl<T: RelationTarget> RelationTarget for Vec<T> {
    fn relation_target() -> Option<&'static EntityMetadata> {
        T::relation_target()
    }
}
