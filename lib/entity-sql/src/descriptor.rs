//! Descriptors: the immutable declarations attached to entity types and fields.
//!
//! Type-level descriptors ([`TableDescriptor`], [`SelectOptions`],
//! [`InsertOptions`], [`JoinDescriptor`]) describe the backing table and how
//! SELECT/INSERT commands are shaped. Field-level descriptors map a field to a
//! column ([`ColumnDescriptor`], [`ForeignKeyDescriptor`],
//! [`CustomColumnDescriptor`]), to a relation ([`OneToManyDescriptor`],
//! [`ManyToManyDescriptor`]), or mark it for ordering and grouping
//! ([`SortingDescriptor`], [`GroupingDescriptor`]).
//!
//! Required names are checked when a descriptor is constructed, so a blank
//! table or column name never reaches a command builder.

use crate::{CommandError, CommandKind, Value};

fn required(
    value: impl Into<String>,
    descriptor: &'static str,
    property: &'static str,
) -> Result<String, CommandError> {
    let value = value.into();
    if value.trim().is_empty() {
        return Err(CommandError::InvalidDescriptorValue {
            descriptor,
            property,
        });
    }
    Ok(value)
}

fn optional(value: impl Into<String>) -> Option<String> {
    let value = value.into();
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Whether a column takes part in a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Behaviour {
    AlwaysInclude,
    AlwaysIgnore,
    /// Include the column only when its value is not null.
    #[default]
    IgnoreWhenNull,
}

impl Behaviour {
    /// Apply the behaviour to an extracted value.
    pub fn admits(&self, value: &Value) -> bool {
        match self {
            Behaviour::AlwaysInclude => true,
            Behaviour::AlwaysIgnore => false,
            Behaviour::IgnoreWhenNull => !value.is_null(),
        }
    }
}

/// JOIN clause mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoinMode {
    Cross,
    #[default]
    Inner,
    /// Rendered as `LEFT OUTER`.
    Outer,
}

impl JoinMode {
    pub fn as_sql(&self) -> &'static str {
        match self {
            JoinMode::Cross => "CROSS",
            JoinMode::Inner => "INNER",
            JoinMode::Outer => "LEFT OUTER",
        }
    }
}

/// Sort order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Ascending => "ASC",
            SortDirection::Descending => "DESC",
        }
    }
}

/// The backing table of an entity type.
#[derive(Debug, Clone, PartialEq)]
pub struct TableDescriptor {
    name: String,
    alias: Option<String>,
}

impl TableDescriptor {
    pub fn new(name: impl Into<String>) -> Result<Self, CommandError> {
        Ok(Self {
            name: required(name, "TableDescriptor", "name")?,
            alias: None,
        })
    }

    /// Set the alias used to qualify columns and join constraints.
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = optional(alias);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }
}

/// SELECT statement configuration.
///
/// `filter`, `group_by`, `having` and `order_by` are raw SQL fragments that
/// are appended verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectOptions {
    pub filter: Option<String>,
    pub group_by: Option<String>,
    pub having: Option<String>,
    pub order_by: Option<String>,
    pub limit: Option<u64>,
    /// Only rendered when a limit is present.
    pub offset: Option<u64>,
    /// Only primary-key fields of the filter instance become predicates.
    pub primary_key_filter_only: bool,
    /// Render `SELECT DISTINCT`.
    pub remove_duplicates: bool,
}

impl Default for SelectOptions {
    fn default() -> Self {
        Self {
            filter: None,
            group_by: None,
            having: None,
            order_by: None,
            limit: None,
            offset: None,
            primary_key_filter_only: true,
            remove_duplicates: false,
        }
    }
}

/// INSERT statement configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InsertOptions {
    /// `INSERT OR REPLACE` instead of `INSERT OR ROLLBACK`.
    pub replace_on_conflict: bool,
}

/// A JOIN clause declared on the entity type.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinDescriptor {
    table: String,
    alias: Option<String>,
    constraint: String,
    mode: JoinMode,
}

impl JoinDescriptor {
    pub fn new(
        table: impl Into<String>,
        constraint: impl Into<String>,
    ) -> Result<Self, CommandError> {
        Ok(Self {
            table: required(table, "JoinDescriptor", "table")?,
            alias: None,
            constraint: required(constraint, "JoinDescriptor", "constraint")?,
            mode: JoinMode::default(),
        })
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = optional(alias);
        self
    }

    pub fn with_mode(mut self, mode: JoinMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    pub fn constraint(&self) -> &str {
        &self.constraint
    }

    pub fn mode(&self) -> JoinMode {
        self.mode
    }
}

/// Maps a field to a table column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDescriptor {
    name: String,
    primary_key: bool,
    table_alias: Option<String>,
    insert: Behaviour,
    update: Behaviour,
    select: Behaviour,
    delete: Behaviour,
    default_value: Option<Value>,
}

impl ColumnDescriptor {
    pub fn new(name: impl Into<String>) -> Result<Self, CommandError> {
        Ok(Self {
            name: required(name, "ColumnDescriptor", "name")?,
            primary_key: false,
            table_alias: None,
            insert: Behaviour::default(),
            update: Behaviour::default(),
            select: Behaviour::default(),
            delete: Behaviour::default(),
            default_value: None,
        })
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Qualify the column with another table's alias (e.g. a joined table).
    pub fn with_table_alias(mut self, alias: impl Into<String>) -> Self {
        self.table_alias = optional(alias);
        self
    }

    pub fn on_insert(mut self, behaviour: Behaviour) -> Self {
        self.insert = behaviour;
        self
    }

    pub fn on_update(mut self, behaviour: Behaviour) -> Self {
        self.update = behaviour;
        self
    }

    pub fn on_select(mut self, behaviour: Behaviour) -> Self {
        self.select = behaviour;
        self
    }

    pub fn on_delete(mut self, behaviour: Behaviour) -> Self {
        self.delete = behaviour;
        self
    }

    /// Value written by INSERT and UPDATE when the field is null.
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_primary_key(&self) -> bool {
        self.primary_key
    }

    pub fn table_alias(&self) -> Option<&str> {
        self.table_alias.as_deref()
    }

    pub fn behaviour(&self, kind: CommandKind) -> Behaviour {
        match kind {
            CommandKind::Insert => self.insert,
            CommandKind::Update => self.update,
            CommandKind::Select => self.select,
            CommandKind::Delete => self.delete,
        }
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default_value.as_ref()
    }
}

/// Cascade flags of a relation. They are declarations only; propagating a
/// command to related rows is left to the persistence layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cascade {
    pub delete: bool,
    pub insert_or_update: bool,
    pub select: bool,
}

impl Default for Cascade {
    fn default() -> Self {
        Self {
            delete: false,
            insert_or_update: false,
            select: true,
        }
    }
}

/// A column whose value is read from a related entity.
#[derive(Debug, Clone, PartialEq)]
pub struct ForeignKeyDescriptor {
    column: ColumnDescriptor,
    target_column: Option<String>,
    cascade: Cascade,
}

impl ForeignKeyDescriptor {
    pub fn new(column: ColumnDescriptor) -> Self {
        Self {
            column,
            target_column: None,
            cascade: Cascade::default(),
        }
    }

    /// Column of the related table holding the key. Defaults to the related
    /// type's first primary key.
    pub fn with_target_column(mut self, column: impl Into<String>) -> Self {
        self.target_column = optional(column);
        self
    }

    pub fn with_cascade(mut self, cascade: Cascade) -> Self {
        self.cascade = cascade;
        self
    }

    pub fn column(&self) -> &ColumnDescriptor {
        &self.column
    }

    pub fn target_column(&self) -> Option<&str> {
        self.target_column.as_deref()
    }

    pub fn cascade(&self) -> Cascade {
        self.cascade
    }
}

/// Rows of another table pointing back at this one.
#[derive(Debug, Clone, PartialEq)]
pub struct OneToManyDescriptor {
    local_column: Option<String>,
    target_column: String,
    cascade: Cascade,
}

impl OneToManyDescriptor {
    pub fn new(target_column: impl Into<String>) -> Result<Self, CommandError> {
        Ok(Self {
            local_column: None,
            target_column: required(target_column, "OneToManyDescriptor", "target_column")?,
            cascade: Cascade::default(),
        })
    }

    /// Local column the target column refers to. Defaults to the first
    /// primary key of the entity.
    pub fn with_local_column(mut self, column: impl Into<String>) -> Self {
        self.local_column = optional(column);
        self
    }

    pub fn with_cascade(mut self, cascade: Cascade) -> Self {
        self.cascade = cascade;
        self
    }

    pub fn local_column(&self) -> Option<&str> {
        self.local_column.as_deref()
    }

    pub fn target_column(&self) -> &str {
        &self.target_column
    }

    pub fn cascade(&self) -> Cascade {
        self.cascade
    }
}

/// Rows of another table linked through a junction table.
#[derive(Debug, Clone, PartialEq)]
pub struct ManyToManyDescriptor {
    junction_table: String,
    junction_table_column: Option<String>,
    local_column: Option<String>,
    cascade: Cascade,
}

impl ManyToManyDescriptor {
    pub fn new(junction_table: impl Into<String>) -> Result<Self, CommandError> {
        Ok(Self {
            junction_table: required(junction_table, "ManyToManyDescriptor", "junction_table")?,
            junction_table_column: None,
            local_column: None,
            cascade: Cascade::default(),
        })
    }

    pub fn with_junction_table_column(mut self, column: impl Into<String>) -> Self {
        self.junction_table_column = optional(column);
        self
    }

    pub fn with_local_column(mut self, column: impl Into<String>) -> Self {
        self.local_column = optional(column);
        self
    }

    pub fn with_cascade(mut self, cascade: Cascade) -> Self {
        self.cascade = cascade;
        self
    }

    pub fn junction_table(&self) -> &str {
        &self.junction_table
    }

    pub fn junction_table_column(&self) -> Option<&str> {
        self.junction_table_column.as_deref()
    }

    pub fn local_column(&self) -> Option<&str> {
        self.local_column.as_deref()
    }

    pub fn cascade(&self) -> Cascade {
        self.cascade
    }
}

/// A SQL expression or literal selected in place of a column. The text is
/// trusted and emitted verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomColumnDescriptor {
    custom_data: String,
}

impl CustomColumnDescriptor {
    pub fn new(custom_data: impl Into<String>) -> Result<Self, CommandError> {
        Ok(Self {
            custom_data: required(custom_data, "CustomColumnDescriptor", "custom_data")?,
        })
    }

    pub fn custom_data(&self) -> &str {
        &self.custom_data
    }
}

/// ORDER BY entry for a field.
#[derive(Debug, Clone, PartialEq)]
pub struct SortingDescriptor {
    column_name: Option<String>,
    table_alias: Option<String>,
    direction: SortDirection,
    place_nulls_at_end: bool,
    sorting_index: u32,
}

impl Default for SortingDescriptor {
    fn default() -> Self {
        Self {
            column_name: None,
            table_alias: None,
            direction: SortDirection::default(),
            place_nulls_at_end: false,
            sorting_index: u32::MAX,
        }
    }
}

impl SortingDescriptor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Column selected for the field when no other descriptor names one.
    pub fn with_column_name(mut self, column: impl Into<String>) -> Self {
        self.column_name = optional(column);
        self
    }

    pub fn with_table_alias(mut self, alias: impl Into<String>) -> Self {
        self.table_alias = optional(alias);
        self
    }

    pub fn with_direction(mut self, direction: SortDirection) -> Self {
        self.direction = direction;
        self
    }

    pub fn nulls_last(mut self) -> Self {
        self.place_nulls_at_end = true;
        self
    }

    /// Position among the sorting fields; ties keep declaration order.
    pub fn with_index(mut self, index: i64) -> Result<Self, CommandError> {
        self.sorting_index =
            u32::try_from(index).map_err(|_| CommandError::InvalidDescriptorValue {
                descriptor: "SortingDescriptor",
                property: "sorting_index",
            })?;
        Ok(self)
    }

    pub fn column_name(&self) -> Option<&str> {
        self.column_name.as_deref()
    }

    pub fn table_alias(&self) -> Option<&str> {
        self.table_alias.as_deref()
    }

    pub fn direction(&self) -> SortDirection {
        self.direction
    }

    pub fn place_nulls_at_end(&self) -> bool {
        self.place_nulls_at_end
    }

    pub fn sorting_index(&self) -> u32 {
        self.sorting_index
    }
}

/// GROUP BY entry for a field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupingDescriptor {
    column_name: Option<String>,
    table_alias: Option<String>,
}

impl GroupingDescriptor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_column_name(mut self, column: impl Into<String>) -> Self {
        self.column_name = optional(column);
        self
    }

    pub fn with_table_alias(mut self, alias: impl Into<String>) -> Self {
        self.table_alias = optional(alias);
        self
    }

    pub fn column_name(&self) -> Option<&str> {
        self.column_name.as_deref()
    }

    pub fn table_alias(&self) -> Option<&str> {
        self.table_alias.as_deref()
    }
}
