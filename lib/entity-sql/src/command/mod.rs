//! Generated commands and their builders.
//!
//! Each builder resolves the entity's metadata, reads the instance's values,
//! and renders the statement text once from collected fragments. Placeholders
//! are `@name`; the parameter list keeps binding order.

mod delete;
mod insert;
mod select;
mod update;

use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::Value;

pub use delete::Delete;
pub use insert::Insert;
pub use select::Select;
pub use update::Update;

/// The kind of a generated command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CommandKind {
    Insert,
    Update,
    Delete,
    Select,
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CommandKind::Insert => "INSERT",
            CommandKind::Update => "UPDATE",
            CommandKind::Delete => "DELETE",
            CommandKind::Select => "SELECT",
        })
    }
}

/// A named parameter. The name carries the `@` prefix.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Parameter {
    pub name: String,
    pub value: Value,
}

/// Parameters of a command, in binding order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Parameters(Vec<Parameter>);

impl Parameters {
    /// Bind `value` under `base`, suffixing `_1`, `_2`, ... when the name is
    /// taken. Returns the placeholder.
    pub(crate) fn bind(&mut self, base: &str, value: Value) -> String {
        let mut name = format!("@{base}");
        let mut suffix = 0;
        while self.0.iter().any(|parameter| parameter.name == name) {
            suffix += 1;
            name = format!("@{base}_{suffix}");
        }
        self.0.push(Parameter {
            name: name.clone(),
            value,
        });
        name
    }

    /// Value bound under `name`, with or without the `@` prefix.
    pub fn get(&self, name: &str) -> Option<&Value> {
        let name = name.strip_prefix('@').unwrap_or(name);
        self.0
            .iter()
            .find(|parameter| parameter.name.strip_prefix('@') == Some(name))
            .map(|parameter| &parameter.value)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Parameter> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> IntoIterator for &'a Parameters {
    type Item = &'a Parameter;
    type IntoIter = std::slice::Iter<'a, Parameter>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// A ready-to-execute statement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Command {
    kind: CommandKind,
    text: String,
    parameters: Parameters,
}

impl Command {
    fn new(kind: CommandKind, table: &str, text: String, parameters: Parameters) -> Self {
        debug!(
            %kind,
            table,
            parameters = parameters.len(),
            "generated command"
        );
        Self {
            kind,
            text,
            parameters,
        }
    }

    pub fn kind(&self) -> CommandKind {
        self.kind
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// `alias.column`, or `column` without an alias.
fn qualified(alias: Option<&str>, column: &str) -> String {
    match alias {
        Some(alias) => format!("{alias}.{column}"),
        None => column.to_string(),
    }
}

/// `WHERE 1 = 1` followed by one `AND` per predicate.
fn where_clause(predicates: &[String]) -> String {
    let mut clause = String::from(" WHERE 1 = 1");
    for predicate in predicates {
        clause.push_str(" AND ");
        clause.push_str(predicate);
    }
    clause
}
