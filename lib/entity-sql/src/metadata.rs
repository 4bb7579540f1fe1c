//! Static metadata of an entity type: its type descriptors and its fields'
//! descriptors, declared once and read by every command builder.

use crate::descriptor::{
    ColumnDescriptor, CustomColumnDescriptor, ForeignKeyDescriptor, GroupingDescriptor,
    InsertOptions, JoinDescriptor, ManyToManyDescriptor, OneToManyDescriptor, SelectOptions,
    SortingDescriptor, TableDescriptor,
};
use crate::{CommandError, RelationTarget};

/// A descriptor attached to an entity type.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeDescriptor {
    Table(TableDescriptor),
    SelectOptions(SelectOptions),
    InsertOptions(InsertOptions),
    Join(JoinDescriptor),
}

/// A descriptor attached to a field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldDescriptor {
    Column(ColumnDescriptor),
    CustomColumn(CustomColumnDescriptor),
    ForeignKey(ForeignKeyDescriptor),
    OneToMany(OneToManyDescriptor),
    ManyToMany(ManyToManyDescriptor),
    Sorting(SortingDescriptor),
    Grouping(GroupingDescriptor),
}

impl FieldDescriptor {
    /// Column, custom column and relation descriptors carry the field's data;
    /// a field holds at most one of them.
    pub fn is_data_bearing(&self) -> bool {
        !matches!(self, FieldDescriptor::Sorting(_) | FieldDescriptor::Grouping(_))
    }

    pub fn is_relation(&self) -> bool {
        matches!(
            self,
            FieldDescriptor::ForeignKey(_)
                | FieldDescriptor::OneToMany(_)
                | FieldDescriptor::ManyToMany(_)
        )
    }
}

macro_rules! descriptor_from {
    ($target:ident, $($variant:ident => $ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for $target {
                fn from(descriptor: $ty) -> Self {
                    $target::$variant(descriptor)
                }
            }
        )*
    };
}

descriptor_from!(TypeDescriptor,
    Table => TableDescriptor,
    SelectOptions => SelectOptions,
    InsertOptions => InsertOptions,
    Join => JoinDescriptor,
);

descriptor_from!(FieldDescriptor,
    Column => ColumnDescriptor,
    CustomColumn => CustomColumnDescriptor,
    ForeignKey => ForeignKeyDescriptor,
    OneToMany => OneToManyDescriptor,
    ManyToMany => ManyToManyDescriptor,
    Sorting => SortingDescriptor,
    Grouping => GroupingDescriptor,
);

/// Static relation target of a field. A function pointer so that a type can
/// name itself (or a type naming it back) while its own metadata is still
/// being initialized.
pub type TargetFn = fn() -> Option<&'static EntityMetadata>;

/// A field of an entity type together with its descriptors.
#[derive(Debug, Clone)]
pub struct FieldMetadata {
    name: &'static str,
    target: Option<TargetFn>,
    descriptors: Vec<FieldDescriptor>,
}

impl FieldMetadata {
    fn new(name: &'static str) -> Self {
        Self {
            name,
            target: None,
            descriptors: Vec::new(),
        }
    }

    /// Attach a descriptor to the field.
    pub fn with(&mut self, descriptor: impl Into<FieldDescriptor>) -> &mut Self {
        self.descriptors.push(descriptor.into());
        self
    }

    /// Record `T` as the type the field relates to. Wrappers (`Option`,
    /// `Box`, `Vec`) are looked through; built-in types have no target.
    pub fn related<T: RelationTarget + ?Sized>(&mut self) -> &mut Self {
        self.target = Some(T::relation_target);
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn descriptors(&self) -> &[FieldDescriptor] {
        &self.descriptors
    }

    /// Metadata of the related entity type, if the field has one.
    pub fn target(&self) -> Option<&'static EntityMetadata> {
        self.target.and_then(|target| target())
    }

    pub fn is_relation(&self) -> bool {
        self.descriptors.iter().any(FieldDescriptor::is_relation)
    }
}

/// Collects descriptors inside [`EntityMetadata::declare`].
#[derive(Debug, Default)]
pub struct Declaration {
    descriptors: Vec<TypeDescriptor>,
    fields: Vec<FieldMetadata>,
}

impl Declaration {
    /// Attach a descriptor to the entity type.
    pub fn describe(&mut self, descriptor: impl Into<TypeDescriptor>) -> &mut Self {
        self.descriptors.push(descriptor.into());
        self
    }

    /// Declare a field, or continue declaring one already named.
    pub fn field(&mut self, name: &'static str) -> &mut FieldMetadata {
        let index = match self.fields.iter().position(|field| field.name == name) {
            Some(index) => index,
            None => {
                self.fields.push(FieldMetadata::new(name));
                self.fields.len() - 1
            }
        };
        &mut self.fields[index]
    }
}

/// Everything known about an entity type.
///
/// Built once per type, usually inside a `OnceLock` in
/// [`Entity::describe`](crate::Entity::describe):
///
/// ```
/// use entity_sql::{ColumnDescriptor, EntityMetadata, TableDescriptor};
///
/// let metadata = EntityMetadata::declare("Person", |decl| {
///     decl.describe(TableDescriptor::new("PERSON")?);
///     decl.field("id").with(ColumnDescriptor::new("ID")?.primary_key());
///     decl.field("name").with(ColumnDescriptor::new("NAME")?);
///     Ok(())
/// });
/// assert_eq!(metadata.fields().len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct EntityMetadata {
    type_name: &'static str,
    descriptors: Vec<TypeDescriptor>,
    fields: Vec<FieldMetadata>,
    declaration_error: Option<CommandError>,
}

impl EntityMetadata {
    /// Run a declaration. A descriptor that fails to construct inside the
    /// closure is kept and reported by every resolution of the type.
    pub fn declare<F>(type_name: &'static str, declare: F) -> Self
    where
        F: FnOnce(&mut Declaration) -> Result<(), CommandError>,
    {
        let mut declaration = Declaration::default();
        let declaration_error = declare(&mut declaration).err();
        Self {
            type_name,
            descriptors: declaration.descriptors,
            fields: declaration.fields,
            declaration_error,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn descriptors(&self) -> &[TypeDescriptor] {
        &self.descriptors
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &[FieldMetadata] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldMetadata> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn declaration_error(&self) -> Option<&CommandError> {
        self.declaration_error.as_ref()
    }
}
