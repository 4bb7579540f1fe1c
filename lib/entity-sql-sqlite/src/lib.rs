//! SQLite execution for entity-sql.
//!
//! Commands generated by `entity-sql` use `@name` placeholders, which SQLite
//! binds natively. [`SqliteDatabase`] implements
//! [`CommandExecutor`](entity_sql::CommandExecutor), so declared entities can
//! be inserted, updated, deleted and selected directly.
//!
//! # Usage
//!
//! ```text
//! use entity_sql_sqlite::{CommandExecutor, Entity, SqliteDatabase};
//!
//! #[derive(Entity, Default, serde::Deserialize)]
//! #[table(name = "ACCOUNT")]
//! pub struct Account {
//!     #[column(name = "ID", primary_key)]
//!     pub id: Option<i64>,
//!     #[column(name = "OWNER")]
//!     pub owner: Option<String>,
//! }
//!
//! let db = SqliteDatabase::open(":memory:")?;
//! db.execute_batch("CREATE TABLE ACCOUNT (ID INTEGER PRIMARY KEY, OWNER TEXT)")?;
//! db.insert(&Account { id: Some(1), owner: Some("ann".into()) })?;
//! let found = db.select_single(&Account { id: Some(1), ..Default::default() })?;
//! ```

#![cfg_attr(
    test,
    allow(clippy::unwrap_used, clippy::expect_used, clippy::unwrap_in_result)
)]

mod bind;
mod config;
mod error;
mod executor;
mod row;

pub use bind::SqlValue;
pub use config::ConnectionConfig;
pub use error::{Result, SqliteError};
pub use executor::{SqliteDatabase, SqliteTransaction};

// Re-export core types for convenience
pub use entity_sql::{
    Command, CommandError, CommandExecutor, CommandKind, Delete, Entity, Insert, Row, Select,
    Update, Value,
};
