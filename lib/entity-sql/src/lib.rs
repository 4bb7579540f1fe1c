//! Entity SQL - Parameterized SQLite commands from declarative entity metadata.
//!
//! Entity types carry descriptors (table, columns, relations, joins, sorting,
//! grouping) declared once per type. Command builders read those descriptors
//! together with an instance's values and produce statement text with `@name`
//! placeholders plus the ordered parameter bindings. Nothing here talks to a
//! database; backends implement [`CommandExecutor`].
//!
//! # Core Concepts
//!
//! - **Descriptor**: an immutable declaration attached to a type or a field.
//! - **Eligibility**: whether a column takes part in a command, decided by its
//!   [`Behaviour`] for that command kind and its current value.
//! - **Foreign key resolution**: a foreign-key field holding a related entity
//!   binds the related entity's key column, read through its own metadata.
//!
//! # Builders
//!
//! - [`Insert`]: `INSERT OR {REPLACE|ROLLBACK} INTO ...`, cycle-checked
//! - [`Update`]: primary keys filter, other columns are assigned
//! - [`Delete`]: primary keys filter, never unfiltered
//! - [`Select`]: projection, joins, filters, grouping, ordering, paging

#![cfg_attr(
    test,
    allow(clippy::unwrap_used, clippy::expect_used, clippy::unwrap_in_result)
)]

mod command;
mod cycle;
mod descriptor;
mod entity;
mod error;
mod executor;
mod extract;
mod metadata;
mod resolve;
mod row;
mod value;

#[cfg(test)]
mod test_fixtures;

pub use command::{Command, CommandKind, Delete, Insert, Parameter, Parameters, Select, Update};
pub use cycle::check_circular_references;
pub use descriptor::{
    Behaviour, Cascade, ColumnDescriptor, CustomColumnDescriptor, ForeignKeyDescriptor,
    GroupingDescriptor, InsertOptions, JoinDescriptor, JoinMode, ManyToManyDescriptor,
    OneToManyDescriptor, SelectOptions, SortDirection, SortingDescriptor, TableDescriptor,
};
pub use entity::{Entity, FieldValue, RelationTarget, ToFieldValue};
pub use error::CommandError;
pub use executor::CommandExecutor;
pub use extract::extract;
pub use metadata::{
    Declaration, EntityMetadata, FieldDescriptor, FieldMetadata, TargetFn, TypeDescriptor,
};
pub use resolve::{resolve, resolve_field, resolve_table, DataDescriptor, ResolvedEntity, ResolvedField};
pub use row::{materialize, Row};
pub use value::Value;

// Re-export derive macro
pub use entity_sql_derive::Entity;
