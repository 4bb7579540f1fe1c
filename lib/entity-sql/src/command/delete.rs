use crate::extract::{eligible, extract};
use crate::resolve::resolve;
use crate::{CommandError, CommandKind, Entity};

use super::{where_clause, Command, Parameters};

/// A DELETE command builder. Only primary keys filter, and a DELETE without
/// any primary-key predicate is refused.
pub struct Delete<'a> {
    entity: &'a dyn Entity,
}

impl<'a> Delete<'a> {
    pub fn new(entity: &'a dyn Entity) -> Self {
        Self { entity }
    }

    pub fn build(self) -> Result<Command, CommandError> {
        let resolved = resolve(self.entity.metadata())?;

        let mut predicates = Vec::new();
        let mut parameters = Parameters::default();
        for field in &resolved.fields {
            let Some(column) = field.column().filter(|column| column.is_primary_key()) else {
                continue;
            };
            let value = extract(self.entity, field)?;
            let Some(value) = eligible(column, CommandKind::Delete, value) else {
                continue;
            };
            let placeholder = parameters.bind(column.name(), value);
            predicates.push(format!("{} = {placeholder}", column.name()));
        }

        if predicates.is_empty() {
            return Err(CommandError::NoEligibleColumns {
                command: CommandKind::Delete,
                entity: resolved.type_name().to_string(),
            });
        }

        let table = resolved.table.name();
        let text = format!("DELETE FROM {table}{}", where_clause(&predicates));
        Ok(Command::new(CommandKind::Delete, table, text, parameters))
    }
}
