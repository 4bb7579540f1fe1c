use thiserror::Error;

use crate::CommandKind;

/// Errors raised while declaring entity metadata or generating commands.
///
/// Every variant describes a problem with the entity declaration, never with
/// the data being written, so none of them is worth retrying.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CommandError {
    #[error("Missing table metadata: {0} has no table descriptor")]
    MissingTableMetadata(String),

    #[error("Invalid attribute combination on {entity}: {reason}")]
    InvalidAttributeCombination { entity: String, reason: String },

    #[error("No eligible columns: {command} for {entity} has nothing to bind")]
    NoEligibleColumns {
        command: CommandKind,
        entity: String,
    },

    #[error("Circular reference: {0}")]
    CircularReference(String),

    #[error("Invalid descriptor value: {descriptor}.{property} must not be blank")]
    InvalidDescriptorValue {
        descriptor: &'static str,
        property: &'static str,
    },

    #[error("Deserialization error: {0}")]
    Deserialization(String),
}

impl CommandError {
    pub(crate) fn combination(entity: &str, reason: impl Into<String>) -> Self {
        CommandError::InvalidAttributeCombination {
            entity: entity.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for CommandError {
    fn from(e: serde_json::Error) -> Self {
        CommandError::Deserialization(e.to_string())
    }
}
