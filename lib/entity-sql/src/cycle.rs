//! Cycle detection over the static relation graph of an entity type.

use std::ptr;

use tracing::trace;

use crate::{CommandError, EntityMetadata};

/// Fail with [`CommandError::CircularReference`] when a relation path starting
/// at `root` leads back to a type already on that path. The same type may
/// appear on independent branches.
pub fn check_circular_references(root: &'static EntityMetadata) -> Result<(), CommandError> {
    let mut path = vec![root];
    walk(&mut path)
}

fn walk(path: &mut Vec<&'static EntityMetadata>) -> Result<(), CommandError> {
    let Some(current) = path.last().copied() else {
        return Ok(());
    };

    for field in current.fields().iter().filter(|field| field.is_relation()) {
        let Some(target) = field.target() else {
            continue;
        };
        trace!(
            from = current.type_name(),
            field = field.name(),
            to = target.type_name(),
            "following relation"
        );

        if path.iter().any(|seen| ptr::eq(*seen, target)) {
            let cycle = path
                .iter()
                .map(|metadata| metadata.type_name())
                .chain([target.type_name()])
                .collect::<Vec<_>>()
                .join(" -> ");
            return Err(CommandError::CircularReference(cycle));
        }

        path.push(target);
        walk(path)?;
        path.pop();
    }
    Ok(())
}
