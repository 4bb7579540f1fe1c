use crate::cycle::check_circular_references;
use crate::extract::{eligible, extract};
use crate::resolve::resolve;
use crate::{CommandError, CommandKind, Entity};

use super::{Command, Parameters};

/// An INSERT command builder.
///
/// ```
/// # use entity_sql::{Entity, Insert};
/// # fn example(person: &dyn Entity) -> Result<(), entity_sql::CommandError> {
/// let command = Insert::new(person).replace_on_conflict(true).build()?;
/// # Ok(())
/// # }
/// ```
pub struct Insert<'a> {
    entity: &'a dyn Entity,
    replace_on_conflict: Option<bool>,
}

impl<'a> Insert<'a> {
    pub fn new(entity: &'a dyn Entity) -> Self {
        Self {
            entity,
            replace_on_conflict: None,
        }
    }

    /// Override the type's insert options: `INSERT OR REPLACE` when true,
    /// `INSERT OR ROLLBACK` when false.
    pub fn replace_on_conflict(mut self, replace: bool) -> Self {
        self.replace_on_conflict = Some(replace);
        self
    }

    pub fn build(self) -> Result<Command, CommandError> {
        let metadata = self.entity.metadata();
        let resolved = resolve(metadata)?;
        check_circular_references(metadata)?;

        let mut columns = Vec::new();
        let mut placeholders = Vec::new();
        let mut parameters = Parameters::default();
        for field in &resolved.fields {
            let Some(column) = field.column() else {
                continue;
            };
            let value = extract(self.entity, field)?;
            let Some(value) = eligible(column, CommandKind::Insert, value) else {
                continue;
            };
            columns.push(column.name());
            placeholders.push(parameters.bind(field.name(), value));
        }

        if columns.is_empty() {
            return Err(CommandError::NoEligibleColumns {
                command: CommandKind::Insert,
                entity: resolved.type_name().to_string(),
            });
        }

        let conflict = if self
            .replace_on_conflict
            .unwrap_or(resolved.insert_options.replace_on_conflict)
        {
            "REPLACE"
        } else {
            "ROLLBACK"
        };
        let table = resolved.table.name();
        let text = format!(
            "INSERT OR {conflict} INTO {table} ({}) VALUES ({})",
            columns.join(", "),
            placeholders.join(", ")
        );
        Ok(Command::new(CommandKind::Insert, table, text, parameters))
    }
}
