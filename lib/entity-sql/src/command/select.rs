use crate::descriptor::{Behaviour, JoinDescriptor};
use crate::extract::extract;
use crate::resolve::{resolve, DataDescriptor, ResolvedEntity, ResolvedField};
use crate::{CommandError, CommandKind, Entity};

use super::{qualified, where_clause, Command, Parameters};

/// A SELECT command builder.
///
/// The instance doubles as the filter: its populated primary keys (or every
/// populated column, when the type's select options say so) become
/// predicates.
pub struct Select<'a> {
    entity: &'a dyn Entity,
    filter: Option<String>,
    limit: Option<u64>,
}

impl<'a> Select<'a> {
    pub fn new(entity: &'a dyn Entity) -> Self {
        Self {
            entity,
            filter: None,
            limit: None,
        }
    }

    /// Extra raw SQL predicate, appended after the type's own filter.
    pub fn filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = non_blank(Some(filter.into()));
        self
    }

    /// Override the type's row limit.
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn build(self) -> Result<Command, CommandError> {
        let resolved = resolve(self.entity.metadata())?;
        let options = &resolved.select_options;
        let table = resolved.table;

        let root_key = resolved.fields.iter().find_map(|field| {
            field
                .column()
                .filter(|column| column.is_primary_key())
                .map(|column| qualified(column.table_alias().or(table.alias()), column.name()))
        });

        let mut projection = Vec::new();
        for field in &resolved.fields {
            if let Some(expression) = project(&resolved, field, root_key.as_deref())? {
                projection.push(format!("{expression} AS {}", field.name()));
            }
        }
        if projection.is_empty() {
            return Err(CommandError::NoEligibleColumns {
                command: CommandKind::Select,
                entity: resolved.type_name().to_string(),
            });
        }

        let mut predicates = Vec::new();
        let mut parameters = Parameters::default();
        for field in &resolved.fields {
            let Some(column) = field.column() else {
                continue;
            };
            if column.behaviour(CommandKind::Select) == Behaviour::AlwaysIgnore
                || (options.primary_key_filter_only && !column.is_primary_key())
            {
                continue;
            }
            let value = extract(self.entity, field)?;
            if value.is_null() {
                continue;
            }
            let placeholder = parameters.bind(field.name(), value);
            predicates.push(format!(
                "{} = {placeholder}",
                qualified(column.table_alias().or(table.alias()), column.name())
            ));
        }
        for filter in [non_blank(options.filter.clone()), self.filter].into_iter().flatten() {
            predicates.push(format!("({filter})"));
        }

        let mut text = String::from("SELECT ");
        if options.remove_duplicates {
            text.push_str("DISTINCT ");
        }
        text.push_str(&projection.join(", "));
        text.push_str(" FROM ");
        text.push_str(table.name());
        if let Some(alias) = table.alias() {
            text.push_str(&format!(" AS {alias}"));
        }
        for join in &resolved.joins {
            text.push_str(&render_join(join));
        }
        text.push_str(&where_clause(&predicates));

        if let Some(group_by) = group_by(&resolved)? {
            text.push_str(&format!(" GROUP BY {group_by}"));
            if let Some(having) = non_blank(options.having.clone()) {
                text.push_str(&format!(" HAVING {having}"));
            }
        }
        if let Some(order_by) = order_by(&resolved)? {
            text.push_str(&format!(" ORDER BY {order_by}"));
        }
        if let Some(limit) = self.limit.or(options.limit) {
            text.push_str(&format!(" LIMIT {limit}"));
            if let Some(offset) = options.offset {
                text.push_str(&format!(" OFFSET {offset}"));
            }
        }

        Ok(Command::new(
            CommandKind::Select,
            table.name(),
            text,
            parameters,
        ))
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

/// The selected expression of a field, or `None` when it is not selected.
fn project(
    resolved: &ResolvedEntity<'_>,
    field: &ResolvedField<'_>,
    root_key: Option<&str>,
) -> Result<Option<String>, CommandError> {
    let table_alias = resolved.table.alias();
    let relation_column = |local: Option<&str>| match local {
        Some(local) => Ok(Some(qualified(table_alias, local))),
        None => root_key.map(|key| Some(key.to_string())).ok_or_else(|| {
            CommandError::combination(
                resolved.type_name(),
                format!(
                    "relation field `{}` has no local column and the type declares no primary key",
                    field.name()
                ),
            )
        }),
    };

    match field.data {
        Some(DataDescriptor::Column(_)) | Some(DataDescriptor::ForeignKey(_)) => {
            if let Some(column) = field
                .column()
                .filter(|column| column.behaviour(CommandKind::Select) != Behaviour::AlwaysIgnore)
            {
                return Ok(Some(qualified(
                    column.table_alias().or(table_alias),
                    column.name(),
                )));
            }
        }
        Some(DataDescriptor::CustomColumn(custom)) => {
            return Ok(Some(format!("({})", custom.custom_data())));
        }
        Some(DataDescriptor::OneToMany(relation)) => return relation_column(relation.local_column()),
        Some(DataDescriptor::ManyToMany(relation)) => return relation_column(relation.local_column()),
        None => {}
    }

    // sorting and grouping need their column selected even when the field's
    // own column is not
    if field.sorting.is_none() && field.grouping.is_none() {
        return Ok(None);
    }
    let named = field
        .sorting
        .and_then(|s| s.column_name().map(|name| (s.table_alias(), name)))
        .or_else(|| {
            field
                .grouping
                .and_then(|g| g.column_name().map(|name| (g.table_alias(), name)))
        })
        .or_else(|| field.column().map(|column| (column.table_alias(), column.name())));
    match named {
        Some((alias, name)) => Ok(Some(qualified(alias.or(table_alias), name))),
        None => Err(CommandError::combination(
            resolved.type_name(),
            format!(
                "field `{}` sorts or groups without a column name",
                field.name()
            ),
        )),
    }
}

fn render_join(join: &JoinDescriptor) -> String {
    let alias = join
        .alias()
        .map(|alias| format!(" AS {alias}"))
        .unwrap_or_default();
    format!(
        " {} JOIN {}{alias} ON {}",
        join.mode().as_sql(),
        join.table(),
        join.constraint()
    )
}

/// Grouping fields, or the raw GROUP BY string. Never both.
fn group_by(resolved: &ResolvedEntity<'_>) -> Result<Option<String>, CommandError> {
    let fields: Vec<_> = resolved
        .fields
        .iter()
        .filter(|field| field.grouping.is_some())
        .map(ResolvedField::name)
        .collect();
    let raw = non_blank(resolved.select_options.group_by.clone());

    match (fields.is_empty(), raw) {
        (false, Some(_)) => Err(CommandError::combination(
            resolved.type_name(),
            "grouping fields and a raw GROUP BY are both declared",
        )),
        (false, None) => Ok(Some(fields.join(", "))),
        (true, raw) => Ok(raw),
    }
}

/// Sorting fields ordered by index, or the raw ORDER BY string. Never both.
fn order_by(resolved: &ResolvedEntity<'_>) -> Result<Option<String>, CommandError> {
    let mut sorted: Vec<_> = resolved
        .fields
        .iter()
        .filter_map(|field| field.sorting.map(|sorting| (field.name(), sorting)))
        .collect();
    let raw = non_blank(resolved.select_options.order_by.clone());

    if sorted.is_empty() {
        return Ok(raw);
    }
    if raw.is_some() {
        return Err(CommandError::combination(
            resolved.type_name(),
            "sorting fields and a raw ORDER BY are both declared",
        ));
    }

    sorted.sort_by_key(|(_, sorting)| sorting.sorting_index());
    let clauses: Vec<_> = sorted
        .into_iter()
        .map(|(name, sorting)| {
            let nulls = if sorting.place_nulls_at_end() {
                "LAST"
            } else {
                "FIRST"
            };
            format!("{name} {} NULLS {nulls}", sorting.direction().as_sql())
        })
        .collect();
    Ok(Some(clauses.join(", ")))
}
