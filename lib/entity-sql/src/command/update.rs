use crate::extract::{eligible, extract};
use crate::resolve::resolve;
use crate::{CommandError, CommandKind, Entity};

use super::{where_clause, Command, Parameters};

/// An UPDATE command builder. Primary keys select the row; every other
/// eligible column is assigned.
pub struct Update<'a> {
    entity: &'a dyn Entity,
}

impl<'a> Update<'a> {
    pub fn new(entity: &'a dyn Entity) -> Self {
        Self { entity }
    }

    pub fn build(self) -> Result<Command, CommandError> {
        let resolved = resolve(self.entity.metadata())?;

        let mut assignments = Vec::new();
        let mut predicates = Vec::new();
        let mut parameters = Parameters::default();
        for field in &resolved.fields {
            let Some(column) = field.column() else {
                continue;
            };
            let value = extract(self.entity, field)?;
            let Some(value) = eligible(column, CommandKind::Update, value) else {
                continue;
            };
            let placeholder = parameters.bind(column.name(), value);
            let fragment = format!("{} = {placeholder}", column.name());
            if column.is_primary_key() {
                predicates.push(fragment);
            } else {
                assignments.push(fragment);
            }
        }

        if assignments.is_empty() {
            return Err(CommandError::NoEligibleColumns {
                command: CommandKind::Update,
                entity: resolved.type_name().to_string(),
            });
        }

        let table = resolved.table.name();
        let text = format!(
            "UPDATE OR ROLLBACK {table} SET {}{}",
            assignments.join(", "),
            where_clause(&predicates)
        );
        Ok(Command::new(CommandKind::Update, table, text, parameters))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::*;
    use crate::Value;

    #[test]
    fn null_primary_key_leaves_where_unfiltered() {
        let person = Person {
            id: None,
            name: Some("a".to_string()),
        };
        let command = Update::new(&person).build().unwrap();
        assert_eq!(command.text(), "UPDATE OR ROLLBACK T SET NAME = @NAME WHERE 1 = 1");
        assert_eq!(command.parameters().len(), 1);
    }

    #[test]
    fn primary_key_becomes_predicate() {
        let person = Person {
            id: Some(7),
            name: Some("a".to_string()),
        };
        let command = Update::new(&person).build().unwrap();
        assert_eq!(
            command.text(),
            "UPDATE OR ROLLBACK T SET NAME = @NAME WHERE 1 = 1 AND ID = @ID"
        );
        assert_eq!(command.parameters().get("ID"), Some(&Value::Int(7)));
    }

    #[test]
    fn colliding_column_names_get_suffixes() {
        let membership = Membership {
            group_id: Some(1),
            member_id: Some(2),
            role: Some("owner".to_string()),
            member_role: Some("admin".to_string()),
        };
        let command = Update::new(&membership).build().unwrap();
        assert_eq!(
            command.text(),
            "UPDATE OR ROLLBACK MEMBERSHIP SET ROLE = @ROLE, ROLE = @ROLE_1 \
             WHERE 1 = 1 AND ID = @ID AND ID = @ID_1"
        );
        assert_eq!(command.parameters().get("ID_1"), Some(&Value::Int(2)));
        assert_eq!(
            command.parameters().get("ROLE_1"),
            Some(&Value::from("admin"))
        );
    }

    #[test]
    fn policies_and_defaults() {
        let setting = Setting {
            key: Some("theme".to_string()),
            created: Some("yesterday".to_string()),
            ..Setting::default()
        };
        let command = Update::new(&setting).build().unwrap();
        assert_eq!(
            command.text(),
            "UPDATE OR ROLLBACK SETTING SET STATE = @STATE, REVISION = @REVISION \
             WHERE 1 = 1 AND KEY = @KEY"
        );
        assert_eq!(command.parameters().get("REVISION"), Some(&Value::Null));
    }

    #[test]
    fn only_primary_keys_is_not_an_update() {
        let person = Person {
            id: Some(7),
            name: None,
        };
        assert_eq!(
            Update::new(&person).build().unwrap_err(),
            CommandError::NoEligibleColumns {
                command: CommandKind::Update,
                entity: "Person".to_string(),
            }
        );
        assert!(Update::new(&Person::default()).build().is_err());
    }

    #[test]
    fn missing_table() {
        assert!(matches!(
            Update::new(&Unmapped { id: Some(1) }).build().unwrap_err(),
            CommandError::MissingTableMetadata(_)
        ));
    }
}
