//! The seam between command generation and a database backend.

use serde::de::DeserializeOwned;

use crate::{materialize, Command, CommandError, Delete, Entity, Insert, Row, Select, Update};

/// Runs generated commands.
///
/// Backends implement [`execute`](Self::execute) and [`query`](Self::query);
/// the entity-level operations are provided on top of them.
pub trait CommandExecutor {
    type Error: From<CommandError>;

    /// Run a command that returns no rows; returns the number of rows
    /// affected.
    fn execute(&self, command: &Command) -> Result<usize, Self::Error>;

    /// Run a command and return its rows.
    fn query(&self, command: &Command) -> Result<Vec<Row>, Self::Error>;

    fn insert(&self, entity: &dyn Entity) -> Result<usize, Self::Error> {
        let command = Insert::new(entity).build()?;
        self.execute(&command)
    }

    /// Insert every entity in order, stopping at the first failure.
    fn insert_all<T: Entity>(&self, entities: &[T]) -> Result<usize, Self::Error>
    where
        Self: Sized,
    {
        let mut affected = 0;
        for entity in entities {
            affected += self.insert(entity)?;
        }
        Ok(affected)
    }

    fn update(&self, entity: &dyn Entity) -> Result<usize, Self::Error> {
        let command = Update::new(entity).build()?;
        self.execute(&command)
    }

    fn delete(&self, entity: &dyn Entity) -> Result<usize, Self::Error> {
        let command = Delete::new(entity).build()?;
        self.execute(&command)
    }

    /// Select the rows matching `filter`.
    fn select<T>(&self, filter: &T) -> Result<Vec<T>, Self::Error>
    where
        Self: Sized,
        T: Entity + DeserializeOwned,
    {
        self.select_with(Select::new(filter))
    }

    /// Run a configured SELECT and materialize its rows as `T`.
    fn select_with<T>(&self, select: Select<'_>) -> Result<Vec<T>, Self::Error>
    where
        Self: Sized,
        T: Entity + DeserializeOwned,
    {
        let command = select.build()?;
        self.query(&command)?
            .into_iter()
            .map(|row| materialize(row).map_err(Self::Error::from))
            .collect()
    }

    /// Select at most one row matching `filter`.
    fn select_single<T>(&self, filter: &T) -> Result<Option<T>, Self::Error>
    where
        Self: Sized,
        T: Entity + DeserializeOwned,
    {
        Ok(self
            .select_with(Select::new(filter).limit(1))?
            .into_iter()
            .next())
    }
}
