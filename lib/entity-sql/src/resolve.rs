//! Resolution and validation of entity metadata.
//!
//! Builders never read descriptors directly: they resolve the type first,
//! which checks the structural rules (one table, one data-bearing descriptor
//! per field) and hands back typed views in declaration order.

use tracing::trace;

use crate::descriptor::{
    ColumnDescriptor, CustomColumnDescriptor, ForeignKeyDescriptor, GroupingDescriptor,
    InsertOptions, JoinDescriptor, ManyToManyDescriptor, OneToManyDescriptor, SelectOptions,
    SortingDescriptor, TableDescriptor,
};
use crate::metadata::{EntityMetadata, FieldDescriptor, FieldMetadata, TypeDescriptor};
use crate::CommandError;

/// The single descriptor carrying a field's data.
#[derive(Debug, Clone, Copy)]
pub enum DataDescriptor<'a> {
    Column(&'a ColumnDescriptor),
    CustomColumn(&'a CustomColumnDescriptor),
    ForeignKey(&'a ForeignKeyDescriptor),
    OneToMany(&'a OneToManyDescriptor),
    ManyToMany(&'a ManyToManyDescriptor),
}

impl<'a> DataDescriptor<'a> {
    /// The table column of a column or foreign-key field.
    pub fn column(&self) -> Option<&'a ColumnDescriptor> {
        match self {
            DataDescriptor::Column(column) => Some(column),
            DataDescriptor::ForeignKey(foreign_key) => Some(foreign_key.column()),
            _ => None,
        }
    }
}

/// A field with its descriptors sorted by role.
#[derive(Debug, Clone)]
pub struct ResolvedField<'a> {
    pub field: &'a FieldMetadata,
    pub data: Option<DataDescriptor<'a>>,
    pub sorting: Option<&'a SortingDescriptor>,
    pub grouping: Option<&'a GroupingDescriptor>,
}

impl<'a> ResolvedField<'a> {
    pub fn name(&self) -> &'static str {
        self.field.name()
    }

    pub fn column(&self) -> Option<&'a ColumnDescriptor> {
        self.data.as_ref().and_then(DataDescriptor::column)
    }

    pub fn is_primary_key(&self) -> bool {
        self.column().is_some_and(ColumnDescriptor::is_primary_key)
    }
}

/// An entity type that passed validation.
#[derive(Debug, Clone)]
pub struct ResolvedEntity<'a> {
    pub metadata: &'a EntityMetadata,
    pub table: &'a TableDescriptor,
    pub select_options: SelectOptions,
    pub insert_options: InsertOptions,
    pub joins: Vec<&'a JoinDescriptor>,
    pub fields: Vec<ResolvedField<'a>>,
}

impl ResolvedEntity<'_> {
    pub fn type_name(&self) -> &'static str {
        self.metadata.type_name()
    }
}

/// Resolve and validate an entity type.
pub fn resolve(metadata: &EntityMetadata) -> Result<ResolvedEntity<'_>, CommandError> {
    let table = resolve_table(metadata)?;
    let entity = metadata.type_name();

    let mut select_options = None;
    let mut insert_options = None;
    let mut joins = Vec::new();
    for descriptor in metadata.descriptors() {
        match descriptor {
            TypeDescriptor::Table(_) => {}
            TypeDescriptor::SelectOptions(options) => {
                if select_options.replace(options).is_some() {
                    return Err(CommandError::combination(
                        entity,
                        "more than one select options descriptor",
                    ));
                }
            }
            TypeDescriptor::InsertOptions(options) => {
                if insert_options.replace(options).is_some() {
                    return Err(CommandError::combination(
                        entity,
                        "more than one insert options descriptor",
                    ));
                }
            }
            TypeDescriptor::Join(join) => joins.push(join),
        }
    }

    let fields = metadata
        .fields()
        .iter()
        .map(|field| resolve_field(entity, field))
        .collect::<Result<Vec<_>, _>>()?;

    trace!(
        entity,
        table = table.name(),
        fields = fields.len(),
        joins = joins.len(),
        "resolved entity metadata"
    );

    Ok(ResolvedEntity {
        metadata,
        table,
        select_options: select_options.cloned().unwrap_or_default(),
        insert_options: insert_options.copied().unwrap_or_default(),
        joins,
        fields,
    })
}

/// The table descriptor of an entity type.
pub fn resolve_table(metadata: &EntityMetadata) -> Result<&TableDescriptor, CommandError> {
    if let Some(error) = metadata.declaration_error() {
        return Err(error.clone());
    }

    let mut tables = metadata.descriptors().iter().filter_map(|d| match d {
        TypeDescriptor::Table(table) => Some(table),
        _ => None,
    });
    let table = tables
        .next()
        .ok_or_else(|| CommandError::MissingTableMetadata(metadata.type_name().to_string()))?;
    if tables.next().is_some() {
        return Err(CommandError::combination(
            metadata.type_name(),
            "more than one table descriptor",
        ));
    }
    Ok(table)
}

/// Sort a field's descriptors by role, rejecting duplicates.
pub fn resolve_field<'a>(
    entity: &str,
    field: &'a FieldMetadata,
) -> Result<ResolvedField<'a>, CommandError> {
    let mut resolved = ResolvedField {
        field,
        data: None,
        sorting: None,
        grouping: None,
    };

    for descriptor in field.descriptors() {
        let data = match descriptor {
            FieldDescriptor::Sorting(sorting) => {
                if resolved.sorting.replace(sorting).is_some() {
                    return Err(CommandError::combination(
                        entity,
                        format!("field `{}` has more than one sorting descriptor", field.name()),
                    ));
                }
                continue;
            }
            FieldDescriptor::Grouping(grouping) => {
                if resolved.grouping.replace(grouping).is_some() {
                    return Err(CommandError::combination(
                        entity,
                        format!("field `{}` has more than one grouping descriptor", field.name()),
                    ));
                }
                continue;
            }
            FieldDescriptor::Column(column) => DataDescriptor::Column(column),
            FieldDescriptor::CustomColumn(custom) => DataDescriptor::CustomColumn(custom),
            FieldDescriptor::ForeignKey(foreign_key) => DataDescriptor::ForeignKey(foreign_key),
            FieldDescriptor::OneToMany(relation) => DataDescriptor::OneToMany(relation),
            FieldDescriptor::ManyToMany(relation) => DataDescriptor::ManyToMany(relation),
        };
        if resolved.data.replace(data).is_some() {
            return Err(CommandError::combination(
                entity,
                format!(
                    "field `{}` has more than one column or relation descriptor",
                    field.name()
                ),
            ));
        }
    }

    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::JoinMode;

    fn declare(
        declare: impl FnOnce(&mut crate::Declaration) -> Result<(), CommandError>,
    ) -> EntityMetadata {
        EntityMetadata::declare("Fixture", declare)
    }

    #[test]
    fn missing_table_is_reported() {
        let metadata = declare(|decl| {
            decl.field("id").with(ColumnDescriptor::new("ID")?);
            Ok(())
        });
        assert_eq!(
            resolve(&metadata).unwrap_err(),
            CommandError::MissingTableMetadata("Fixture".to_string())
        );
    }

    #[test]
    fn duplicate_table_is_rejected() {
        let metadata = declare(|decl| {
            decl.describe(TableDescriptor::new("A")?);
            decl.describe(TableDescriptor::new("B")?);
            Ok(())
        });
        assert!(matches!(
            resolve(&metadata).unwrap_err(),
            CommandError::InvalidAttributeCombination { .. }
        ));
    }

    #[test]
    fn duplicate_options_are_rejected() {
        let metadata = declare(|decl| {
            decl.describe(TableDescriptor::new("A")?);
            decl.describe(SelectOptions::default());
            decl.describe(SelectOptions::default());
            Ok(())
        });
        assert!(resolve(&metadata).is_err());
    }

    #[test]
    fn two_data_descriptors_on_one_field_are_rejected() {
        let metadata = declare(|decl| {
            decl.describe(TableDescriptor::new("A")?);
            decl.field("value")
                .with(ColumnDescriptor::new("VALUE")?)
                .with(CustomColumnDescriptor::new("1")?);
            Ok(())
        });
        let err = resolve(&metadata).unwrap_err();
        assert!(err.to_string().contains("field `value`"));
    }

    #[test]
    fn data_descriptor_combines_with_sorting_and_grouping() {
        let metadata = declare(|decl| {
            decl.describe(TableDescriptor::new("A")?);
            decl.field("value")
                .with(ColumnDescriptor::new("VALUE")?)
                .with(SortingDescriptor::new())
                .with(GroupingDescriptor::new());
            Ok(())
        });
        let resolved = resolve(&metadata).unwrap();
        let field = &resolved.fields[0];
        assert!(field.column().is_some());
        assert!(field.sorting.is_some());
        assert!(field.grouping.is_some());
    }

    #[test]
    fn two_sorting_descriptors_are_rejected() {
        let metadata = declare(|decl| {
            decl.describe(TableDescriptor::new("A")?);
            decl.field("value")
                .with(SortingDescriptor::new())
                .with(SortingDescriptor::new());
            Ok(())
        });
        assert!(resolve(&metadata).is_err());
    }

    #[test]
    fn joins_keep_declaration_order() {
        let metadata = declare(|decl| {
            decl.describe(TableDescriptor::new("A")?);
            decl.describe(JoinDescriptor::new("B", "A.ID = B.A_ID")?);
            decl.describe(JoinDescriptor::new("C", "A.ID = C.A_ID")?.with_mode(JoinMode::Outer));
            Ok(())
        });
        let resolved = resolve(&metadata).unwrap();
        let tables: Vec<_> = resolved.joins.iter().map(|join| join.table()).collect();
        assert_eq!(tables, vec!["B", "C"]);
        assert!(resolved.select_options.primary_key_filter_only);
    }

    #[test]
    fn declaration_error_wins() {
        let metadata = declare(|decl| {
            decl.describe(TableDescriptor::new("A")?);
            decl.field("value").with(SortingDescriptor::new().with_index(-3)?);
            Ok(())
        });
        assert!(matches!(
            resolve(&metadata).unwrap_err(),
            CommandError::InvalidDescriptorValue { .. }
        ));
    }
}
