//! SQLite implementation of CommandExecutor.

use std::ops::Deref;

use entity_sql::{Command, CommandExecutor, Row, Value};
use rusqlite::Connection;
use tracing::{debug, warn};

use crate::bind::{SqlValue, named};
use crate::config::ConnectionConfig;
use crate::error::{Result, SqliteError};
use crate::row::collect_rows;

/// Run a statement on `conn`, returning the number of rows affected.
fn execute_on(conn: &Connection, sql: &str, parameters: &[(&str, &Value)]) -> Result<usize> {
    let values: Vec<_> = parameters
        .iter()
        .map(|(name, value)| (*name, SqlValue(*value)))
        .collect();
    let mut statement = conn.prepare_cached(sql)?;
    let affected = statement.execute(named(&values).as_slice())?;
    debug!(sql, parameters = values.len(), affected, "executed statement");
    Ok(affected)
}

/// Run a query on `conn`, returning its rows keyed by column name.
fn query_on(conn: &Connection, sql: &str, parameters: &[(&str, &Value)]) -> Result<Vec<Row>> {
    let values: Vec<_> = parameters
        .iter()
        .map(|(name, value)| (*name, SqlValue(*value)))
        .collect();
    let mut statement = conn.prepare_cached(sql)?;
    let columns: Vec<String> = statement
        .column_names()
        .into_iter()
        .map(String::from)
        .collect();
    let rows = collect_rows(statement.query(named(&values).as_slice())?, &columns)?;
    debug!(sql, parameters = values.len(), rows = rows.len(), "ran query");
    Ok(rows)
}

/// The error that aborted a transaction. A failure to roll back is logged
/// and never replaces it.
fn rolled_back(error: SqliteError, finished: rusqlite::Result<()>) -> SqliteError {
    match finished {
        Ok(()) => debug!(%error, "transaction rolled back"),
        Err(rollback) => warn!(%error, %rollback, "transaction rollback failed"),
    }
    error
}

fn command_parameters(command: &Command) -> Vec<(&str, &Value)> {
    command
        .parameters()
        .iter()
        .map(|parameter| (parameter.name.as_str(), &parameter.value))
        .collect()
}

/// A SQLite connection that runs generated commands.
///
/// Foreign key enforcement is switched on when the connection is adopted.
#[derive(Debug)]
pub struct SqliteDatabase(Connection);

impl SqliteDatabase {
    /// Open the database described by `config`.
    pub fn open(config: impl Into<ConnectionConfig>) -> Result<Self> {
        let conn = match config.into() {
            ConnectionConfig::Path(path) => {
                debug!(path = %path.display(), "opening database");
                Connection::open(path)?
            }
            ConnectionConfig::Memory => {
                debug!("opening in-memory database");
                Connection::open_in_memory()?
            }
        };
        Self::from_connection(conn)
    }

    /// Adopt an existing connection.
    pub fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(Self(conn))
    }

    /// Get the inner rusqlite::Connection.
    pub fn inner(&self) -> &Connection {
        &self.0
    }

    /// Run caller-written SQL. Parameter names must match the placeholders,
    /// prefix included.
    pub fn execute_raw(&self, sql: &str, parameters: &[(&str, &Value)]) -> Result<usize> {
        execute_on(&self.0, sql, parameters)
    }

    /// Run a caller-written query.
    pub fn query_raw(&self, sql: &str, parameters: &[(&str, &Value)]) -> Result<Vec<Row>> {
        query_on(&self.0, sql, parameters)
    }

    /// Run `work` in a transaction: committed when it returns `Ok`, rolled
    /// back when it returns `Err`.
    pub fn transaction<T, F>(&mut self, work: F) -> Result<T>
    where
        F: FnOnce(&SqliteTransaction<'_>) -> Result<T>,
    {
        let transaction = SqliteTransaction(self.0.transaction()?);
        match work(&transaction) {
            Ok(value) => {
                transaction.0.commit()?;
                debug!("transaction committed");
                Ok(value)
            }
            // a failed OR ROLLBACK statement has already ended the transaction
            Err(e) => Err(rolled_back(e, transaction.0.finish())),
        }
    }
}

impl Deref for SqliteDatabase {
    type Target = Connection;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl CommandExecutor for SqliteDatabase {
    type Error = SqliteError;

    fn execute(&self, command: &Command) -> Result<usize> {
        execute_on(&self.0, command.text(), &command_parameters(command))
    }

    fn query(&self, command: &Command) -> Result<Vec<Row>> {
        query_on(&self.0, command.text(), &command_parameters(command))
    }
}

/// An open transaction; see [`SqliteDatabase::transaction`].
pub struct SqliteTransaction<'a>(rusqlite::Transaction<'a>);

impl SqliteTransaction<'_> {
    pub fn execute_raw(&self, sql: &str, parameters: &[(&str, &Value)]) -> Result<usize> {
        execute_on(&self.0, sql, parameters)
    }

    pub fn query_raw(&self, sql: &str, parameters: &[(&str, &Value)]) -> Result<Vec<Row>> {
        query_on(&self.0, sql, parameters)
    }
}

impl CommandExecutor for SqliteTransaction<'_> {
    type Error = SqliteError;

    fn execute(&self, command: &Command) -> Result<usize> {
        execute_on(&self.0, command.text(), &command_parameters(command))
    }

    fn query(&self, command: &Command) -> Result<Vec<Row>> {
        query_on(&self.0, command.text(), &command_parameters(command))
    }
}
