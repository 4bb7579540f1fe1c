use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::ext::IdentExt;
use syn::meta::ParseNestedMeta;
use syn::{
    Attribute, Data, DeriveInput, Expr, Fields, LitBool, LitInt, LitStr, Meta, Token,
    parse_macro_input,
};

/// Run `logic` over the nested keys of an attribute. A bare `#[attr]` has no
/// keys.
fn parse_attr(
    attr: &Attribute,
    logic: impl FnMut(ParseNestedMeta) -> syn::Result<()>,
) -> syn::Result<()> {
    if matches!(attr.meta, Meta::Path(_)) {
        return Ok(());
    }
    attr.parse_nested_meta(logic)
}

fn string(meta: &ParseNestedMeta) -> syn::Result<LitStr> {
    meta.value()?.parse()
}

/// A string value that must not be blank.
fn required(meta: &ParseNestedMeta, what: &str) -> syn::Result<LitStr> {
    let lit = string(meta)?;
    if lit.value().trim().is_empty() {
        return Err(syn::Error::new(
            lit.span(),
            format!("{what} must not be blank"),
        ));
    }
    Ok(lit)
}

/// `key` or `key = true|false`.
fn flag(meta: &ParseNestedMeta) -> syn::Result<bool> {
    if meta.input.peek(Token![=]) {
        Ok(meta.value()?.parse::<LitBool>()?.value)
    } else {
        Ok(true)
    }
}

fn unsigned(meta: &ParseNestedMeta) -> syn::Result<u64> {
    meta.value()?.parse::<LitInt>()?.base10_parse()
}

fn unsupported(meta: &ParseNestedMeta) -> syn::Error {
    let key = meta
        .path
        .get_ident()
        .map(|ident| ident.to_string())
        .unwrap_or_default();
    meta.error(format!("unsupported attribute key `{key}`"))
}

fn optional_string(value: &Option<LitStr>) -> TokenStream2 {
    match value {
        Some(lit) => quote! { ::core::option::Option::Some(::std::string::String::from(#lit)) },
        None => quote! { ::core::option::Option::None },
    }
}

fn optional_u64(value: Option<u64>) -> TokenStream2 {
    match value {
        Some(n) => quote! { ::core::option::Option::Some(#n) },
        None => quote! { ::core::option::Option::None },
    }
}

/// Parse #[table(name = "...", alias = "...")]
fn parse_table(attr: &Attribute) -> syn::Result<TokenStream2> {
    let mut name = None;
    let mut alias = None;
    parse_attr(attr, |meta| {
        if meta.path.is_ident("name") {
            name = Some(required(&meta, "table name")?);
        } else if meta.path.is_ident("alias") {
            alias = Some(string(&meta)?);
        } else {
            return Err(unsupported(&meta));
        }
        Ok(())
    })?;

    let name = name.ok_or_else(|| syn::Error::new_spanned(attr, "#[table] requires `name`"))?;
    let alias = alias.map(|alias| quote! { .with_alias(#alias) });
    Ok(quote! {
        decl.describe(entity_sql::TableDescriptor::new(#name)? #alias);
    })
}

/// Parse #[select_options(...)]
fn parse_select_options(attr: &Attribute) -> syn::Result<TokenStream2> {
    let mut filter = None;
    let mut group_by = None;
    let mut having = None;
    let mut order_by = None;
    let mut limit = None;
    let mut offset = None;
    let mut primary_key_filter_only = true;
    let mut remove_duplicates = false;
    parse_attr(attr, |meta| {
        if meta.path.is_ident("filter") {
            filter = Some(string(&meta)?);
        } else if meta.path.is_ident("group_by") {
            group_by = Some(string(&meta)?);
        } else if meta.path.is_ident("having") {
            having = Some(string(&meta)?);
        } else if meta.path.is_ident("order_by") {
            order_by = Some(string(&meta)?);
        } else if meta.path.is_ident("limit") {
            limit = Some(unsigned(&meta)?);
        } else if meta.path.is_ident("offset") {
            offset = Some(unsigned(&meta)?);
        } else if meta.path.is_ident("primary_key_filter_only") {
            primary_key_filter_only = flag(&meta)?;
        } else if meta.path.is_ident("remove_duplicates") {
            remove_duplicates = flag(&meta)?;
        } else {
            return Err(unsupported(&meta));
        }
        Ok(())
    })?;

    let filter = optional_string(&filter);
    let group_by = optional_string(&group_by);
    let having = optional_string(&having);
    let order_by = optional_string(&order_by);
    let limit = optional_u64(limit);
    let offset = optional_u64(offset);
    Ok(quote! {
        decl.describe(entity_sql::SelectOptions {
            filter: #filter,
            group_by: #group_by,
            having: #having,
            order_by: #order_by,
            limit: #limit,
            offset: #offset,
            primary_key_filter_only: #primary_key_filter_only,
            remove_duplicates: #remove_duplicates,
        });
    })
}

/// Parse #[insert_options(replace_on_conflict)]
fn parse_insert_options(attr: &Attribute) -> syn::Result<TokenStream2> {
    let mut replace_on_conflict = false;
    parse_attr(attr, |meta| {
        if meta.path.is_ident("replace_on_conflict") {
            replace_on_conflict = flag(&meta)?;
            Ok(())
        } else {
            Err(unsupported(&meta))
        }
    })?;
    Ok(quote! {
        decl.describe(entity_sql::InsertOptions {
            replace_on_conflict: #replace_on_conflict,
        });
    })
}

/// Parse #[join(table = "...", alias = "...", constraint = "...", mode = "inner")]
fn parse_join(attr: &Attribute) -> syn::Result<TokenStream2> {
    let mut table = None;
    let mut alias = None;
    let mut constraint = None;
    let mut mode = None;
    parse_attr(attr, |meta| {
        if meta.path.is_ident("table") {
            table = Some(required(&meta, "join table")?);
        } else if meta.path.is_ident("alias") {
            alias = Some(string(&meta)?);
        } else if meta.path.is_ident("constraint") {
            constraint = Some(required(&meta, "join constraint")?);
        } else if meta.path.is_ident("mode") {
            let lit = string(&meta)?;
            mode = Some(match lit.value().as_str() {
                "cross" => quote! { entity_sql::JoinMode::Cross },
                "inner" => quote! { entity_sql::JoinMode::Inner },
                "outer" => quote! { entity_sql::JoinMode::Outer },
                _ => {
                    return Err(syn::Error::new(
                        lit.span(),
                        "join mode must be \"cross\", \"inner\" or \"outer\"",
                    ));
                }
            });
        } else {
            return Err(unsupported(&meta));
        }
        Ok(())
    })?;

    let table = table.ok_or_else(|| syn::Error::new_spanned(attr, "#[join] requires `table`"))?;
    let constraint = constraint
        .ok_or_else(|| syn::Error::new_spanned(attr, "#[join] requires `constraint`"))?;
    let alias = alias.map(|alias| quote! { .with_alias(#alias) });
    let mode = mode.map(|mode| quote! { .with_mode(#mode) });
    Ok(quote! {
        decl.describe(entity_sql::JoinDescriptor::new(#table, #constraint)? #alias #mode);
    })
}

fn behaviour(lit: &LitStr) -> syn::Result<TokenStream2> {
    match lit.value().as_str() {
        "always_include" => Ok(quote! { entity_sql::Behaviour::AlwaysInclude }),
        "always_ignore" => Ok(quote! { entity_sql::Behaviour::AlwaysIgnore }),
        "ignore_when_null" => Ok(quote! { entity_sql::Behaviour::IgnoreWhenNull }),
        _ => Err(syn::Error::new(
            lit.span(),
            "behaviour must be \"always_include\", \"always_ignore\" or \"ignore_when_null\"",
        )),
    }
}

/// Keys shared by #[column] and #[foreign_key].
#[derive(Default)]
struct ColumnArgs {
    name: Option<LitStr>,
    primary_key: bool,
    table_alias: Option<LitStr>,
    behaviours: Vec<TokenStream2>,
    default: Option<Expr>,
}

impl ColumnArgs {
    /// Consume a column key. Returns false for keys that are not column keys.
    fn parse(&mut self, meta: &ParseNestedMeta) -> syn::Result<bool> {
        if meta.path.is_ident("name") {
            self.name = Some(required(meta, "column name")?);
        } else if meta.path.is_ident("primary_key") {
            self.primary_key = flag(meta)?;
        } else if meta.path.is_ident("table_alias") {
            self.table_alias = Some(string(meta)?);
        } else if meta.path.is_ident("default") {
            self.default = Some(meta.value()?.parse()?);
        } else {
            let setter = ["insert", "update", "select", "delete"]
                .into_iter()
                .find(|kind| meta.path.is_ident(kind));
            let Some(setter) = setter else {
                return Ok(false);
            };
            let method = quote::format_ident!("on_{}", setter);
            let behaviour = behaviour(&string(meta)?)?;
            self.behaviours.push(quote! { .#method(#behaviour) });
        }
        Ok(true)
    }

    fn tokens(&self, field_name: &str) -> TokenStream2 {
        let name = match &self.name {
            Some(lit) => quote! { #lit },
            None => quote! { #field_name },
        };
        let primary_key = self.primary_key.then(|| quote! { .primary_key() });
        let table_alias = self
            .table_alias
            .as_ref()
            .map(|alias| quote! { .with_table_alias(#alias) });
        let behaviours = &self.behaviours;
        let default = self
            .default
            .as_ref()
            .map(|value| quote! { .with_default(#value) });
        quote! {
            entity_sql::ColumnDescriptor::new(#name)? #primary_key #table_alias #(#behaviours)* #default
        }
    }
}

/// Cascade keys shared by the relation attributes.
struct CascadeArgs {
    delete: bool,
    insert_or_update: bool,
    select: bool,
    declared: bool,
}

impl Default for CascadeArgs {
    fn default() -> Self {
        Self {
            delete: false,
            insert_or_update: false,
            select: true,
            declared: false,
        }
    }
}

impl CascadeArgs {
    fn parse(&mut self, meta: &ParseNestedMeta) -> syn::Result<bool> {
        if meta.path.is_ident("cascade_delete") {
            self.delete = flag(meta)?;
        } else if meta.path.is_ident("cascade_insert_or_update") {
            self.insert_or_update = flag(meta)?;
        } else if meta.path.is_ident("cascade_select") {
            self.select = flag(meta)?;
        } else {
            return Ok(false);
        }
        self.declared = true;
        Ok(true)
    }

    fn tokens(&self) -> Option<TokenStream2> {
        if !self.declared {
            return None;
        }
        let (delete, insert_or_update, select) = (self.delete, self.insert_or_update, self.select);
        Some(quote! {
            .with_cascade(entity_sql::Cascade {
                delete: #delete,
                insert_or_update: #insert_or_update,
                select: #select,
            })
        })
    }
}

/// Parse #[column(...)]
fn parse_column(attr: &Attribute, field_name: &str) -> syn::Result<TokenStream2> {
    let mut column = ColumnArgs::default();
    parse_attr(attr, |meta| {
        if column.parse(&meta)? {
            Ok(())
        } else {
            Err(unsupported(&meta))
        }
    })?;
    Ok(column.tokens(field_name))
}

/// Parse #[foreign_key(<column keys>, target_column = "...", <cascade keys>)]
fn parse_foreign_key(attr: &Attribute, field_name: &str) -> syn::Result<TokenStream2> {
    let mut column = ColumnArgs::default();
    let mut cascade = CascadeArgs::default();
    let mut target_column = None;
    parse_attr(attr, |meta| {
        if meta.path.is_ident("target_column") {
            target_column = Some(string(&meta)?);
            Ok(())
        } else if column.parse(&meta)? || cascade.parse(&meta)? {
            Ok(())
        } else {
            Err(unsupported(&meta))
        }
    })?;

    let column = column.tokens(field_name);
    let target_column = target_column.map(|target| quote! { .with_target_column(#target) });
    let cascade = cascade.tokens();
    Ok(quote! {
        entity_sql::ForeignKeyDescriptor::new(#column) #target_column #cascade
    })
}

/// Parse #[one_to_many(target_column = "...", local_column = "...", <cascade keys>)]
fn parse_one_to_many(attr: &Attribute) -> syn::Result<TokenStream2> {
    let mut cascade = CascadeArgs::default();
    let mut target_column = None;
    let mut local_column = None;
    parse_attr(attr, |meta| {
        if meta.path.is_ident("target_column") {
            target_column = Some(required(&meta, "target column")?);
        } else if meta.path.is_ident("local_column") {
            local_column = Some(string(&meta)?);
        } else if !cascade.parse(&meta)? {
            return Err(unsupported(&meta));
        }
        Ok(())
    })?;

    let target_column = target_column
        .ok_or_else(|| syn::Error::new_spanned(attr, "#[one_to_many] requires `target_column`"))?;
    let local_column = local_column.map(|local| quote! { .with_local_column(#local) });
    let cascade = cascade.tokens();
    Ok(quote! {
        entity_sql::OneToManyDescriptor::new(#target_column)? #local_column #cascade
    })
}

/// Parse #[many_to_many(junction_table = "...", junction_table_column = "...", local_column = "...", <cascade keys>)]
fn parse_many_to_many(attr: &Attribute) -> syn::Result<TokenStream2> {
    let mut cascade = CascadeArgs::default();
    let mut junction_table = None;
    let mut junction_table_column = None;
    let mut local_column = None;
    parse_attr(attr, |meta| {
        if meta.path.is_ident("junction_table") {
            junction_table = Some(required(&meta, "junction table")?);
        } else if meta.path.is_ident("junction_table_column") {
            junction_table_column = Some(string(&meta)?);
        } else if meta.path.is_ident("local_column") {
            local_column = Some(string(&meta)?);
        } else if !cascade.parse(&meta)? {
            return Err(unsupported(&meta));
        }
        Ok(())
    })?;

    let junction_table = junction_table.ok_or_else(|| {
        syn::Error::new_spanned(attr, "#[many_to_many] requires `junction_table`")
    })?;
    let junction_table_column =
        junction_table_column.map(|column| quote! { .with_junction_table_column(#column) });
    let local_column = local_column.map(|local| quote! { .with_local_column(#local) });
    let cascade = cascade.tokens();
    Ok(quote! {
        entity_sql::ManyToManyDescriptor::new(#junction_table)?
            #junction_table_column #local_column #cascade
    })
}

/// Parse #[custom_column("sql expression")]
fn parse_custom_column(attr: &Attribute) -> syn::Result<TokenStream2> {
    let data: LitStr = attr.parse_args()?;
    if data.value().trim().is_empty() {
        return Err(syn::Error::new(
            data.span(),
            "custom column expression must not be blank",
        ));
    }
    Ok(quote! { entity_sql::CustomColumnDescriptor::new(#data)? })
}

/// Parse #[sorting(column = "...", table_alias = "...", descending, nulls_last, index = 0)]
fn parse_sorting(attr: &Attribute) -> syn::Result<TokenStream2> {
    let mut column = None;
    let mut table_alias = None;
    let mut descending = false;
    let mut nulls_last = false;
    let mut index = None;
    parse_attr(attr, |meta| {
        if meta.path.is_ident("column") {
            column = Some(string(&meta)?);
        } else if meta.path.is_ident("table_alias") {
            table_alias = Some(string(&meta)?);
        } else if meta.path.is_ident("descending") {
            descending = flag(&meta)?;
        } else if meta.path.is_ident("nulls_last") {
            nulls_last = flag(&meta)?;
        } else if meta.path.is_ident("index") {
            let value = meta.value()?;
            if value.peek(Token![-]) {
                return Err(meta.error("sorting index must not be negative"));
            }
            index = Some(value.parse::<LitInt>()?.base10_parse::<u32>()?);
        } else {
            return Err(unsupported(&meta));
        }
        Ok(())
    })?;

    let column = column.map(|column| quote! { .with_column_name(#column) });
    let table_alias = table_alias.map(|alias| quote! { .with_table_alias(#alias) });
    let direction = descending
        .then(|| quote! { .with_direction(entity_sql::SortDirection::Descending) });
    let nulls_last = nulls_last.then(|| quote! { .nulls_last() });
    let index = index.map(|index| {
        let index = i64::from(index);
        quote! { .with_index(#index)? }
    });
    Ok(quote! {
        entity_sql::SortingDescriptor::new() #column #table_alias #direction #nulls_last #index
    })
}

/// Parse #[grouping(column = "...", table_alias = "...")]
fn parse_grouping(attr: &Attribute) -> syn::Result<TokenStream2> {
    let mut column = None;
    let mut table_alias = None;
    parse_attr(attr, |meta| {
        if meta.path.is_ident("column") {
            column = Some(string(&meta)?);
        } else if meta.path.is_ident("table_alias") {
            table_alias = Some(string(&meta)?);
        } else {
            return Err(unsupported(&meta));
        }
        Ok(())
    })?;

    let column = column.map(|column| quote! { .with_column_name(#column) });
    let table_alias = table_alias.map(|alias| quote! { .with_table_alias(#alias) });
    Ok(quote! {
        entity_sql::GroupingDescriptor::new() #column #table_alias
    })
}

/// Derive macro for the `Entity` trait.
///
/// Declares the type's table, options and joins, and each field's column,
/// relation, sorting and grouping descriptors. The metadata is built on first
/// use and cached for the life of the process.
///
/// Also implements `ToFieldValue` and `RelationTarget` so the type can be
/// held by a foreign-key field of another entity.
///
/// ## Type attributes
///
/// - `#[table(name = "...", alias = "...")]`
/// - `#[select_options(filter, group_by, having, order_by, limit, offset,
///   primary_key_filter_only, remove_duplicates)]`
/// - `#[insert_options(replace_on_conflict)]`
/// - `#[join(table = "...", alias = "...", constraint = "...", mode = "cross|inner|outer")]`, repeatable
///
/// ## Field attributes
///
/// - `#[column(name, primary_key, table_alias, insert, update, select, delete, default)]`;
///   behaviours are `"always_include"`, `"always_ignore"` or `"ignore_when_null"`,
///   and `name` defaults to the field name
/// - `#[foreign_key(<column keys>, target_column, cascade_delete,
///   cascade_insert_or_update, cascade_select)]`
/// - `#[one_to_many(target_column, local_column, <cascade keys>)]`
/// - `#[many_to_many(junction_table, junction_table_column, local_column, <cascade keys>)]`
/// - `#[custom_column("sql expression")]`
/// - `#[sorting(column, table_alias, descending, nulls_last, index)]`
/// - `#[grouping(column, table_alias)]`
///
/// ## Example
///
/// ```text
/// #[derive(Entity, Deserialize)]
/// #[table(name = "ORDERS", alias = "o")]
/// struct Order {
///     #[column(name = "ID", primary_key)]
///     id: Option<i64>,
///     #[foreign_key(name = "CUSTOMER_ID")]
///     #[serde(skip)]
///     customer: Option<Box<Customer>>,
///     #[column(name = "PLACED_AT")]
///     #[sorting(descending)]
///     placed_at: Option<DateTime<Utc>>,
/// }
/// ```
#[proc_macro_derive(
    Entity,
    attributes(
        table,
        select_options,
        insert_options,
        join,
        column,
        foreign_key,
        one_to_many,
        many_to_many,
        custom_column,
        sorting,
        grouping
    )
)]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand_entity(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand_entity(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let type_name = name.unraw().to_string();

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Entity cannot be derived for generic types",
        ));
    }
    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    name,
                    "Entity only supports structs with named fields",
                ));
            }
        },
        _ => return Err(syn::Error::new_spanned(name, "Entity only supports structs")),
    };

    let mut type_decls = Vec::new();
    for attr in &input.attrs {
        let path = attr.path();
        if path.is_ident("table") {
            type_decls.push(parse_table(attr)?);
        } else if path.is_ident("select_options") {
            type_decls.push(parse_select_options(attr)?);
        } else if path.is_ident("insert_options") {
            type_decls.push(parse_insert_options(attr)?);
        } else if path.is_ident("join") {
            type_decls.push(parse_join(attr)?);
        }
    }

    let mut field_decls = Vec::new();
    let mut value_names = Vec::new();
    let mut value_idents = Vec::new();
    for field in fields {
        let Some(ident) = &field.ident else {
            continue;
        };
        let field_name = ident.unraw().to_string();
        let ty = &field.ty;

        let mut descriptors = Vec::new();
        // scalar-valued fields get a `field_value` arm; collections do not
        let mut readable = false;
        let mut collection = false;
        let mut relation = false;
        for attr in &field.attrs {
            let path = attr.path();
            if path.is_ident("column") {
                descriptors.push(parse_column(attr, &field_name)?);
                readable = true;
            } else if path.is_ident("foreign_key") {
                descriptors.push(parse_foreign_key(attr, &field_name)?);
                readable = true;
                relation = true;
            } else if path.is_ident("one_to_many") {
                descriptors.push(parse_one_to_many(attr)?);
                collection = true;
                relation = true;
            } else if path.is_ident("many_to_many") {
                descriptors.push(parse_many_to_many(attr)?);
                collection = true;
                relation = true;
            } else if path.is_ident("custom_column") {
                descriptors.push(parse_custom_column(attr)?);
                readable = true;
            } else if path.is_ident("sorting") {
                descriptors.push(parse_sorting(attr)?);
            } else if path.is_ident("grouping") {
                descriptors.push(parse_grouping(attr)?);
            }
        }

        if descriptors.is_empty() {
            continue;
        }
        let related = relation.then(|| quote! { .related::<#ty>() });
        field_decls.push(quote! {
            decl.field(#field_name) #related #(.with(#descriptors))*;
        });
        if readable && !collection {
            value_names.push(field_name);
            value_idents.push(ident);
        }
    }

    Ok(quote! {
        impl entity_sql::Entity for #name {
            fn describe() -> &'static entity_sql::EntityMetadata {
                static METADATA: ::std::sync::OnceLock<entity_sql::EntityMetadata> =
                    ::std::sync::OnceLock::new();
                METADATA.get_or_init(|| {
                    entity_sql::EntityMetadata::declare(#type_name, |decl| {
                        #(#type_decls)*
                        #(#field_decls)*
                        ::core::result::Result::Ok(())
                    })
                })
            }

            fn metadata(&self) -> &'static entity_sql::EntityMetadata {
                <Self as entity_sql::Entity>::describe()
            }

            fn field_value(&self, field: &str) -> entity_sql::FieldValue<'_> {
                match field {
                    #(#value_names => entity_sql::ToFieldValue::to_field_value(&self.#value_idents),)*
                    _ => entity_sql::FieldValue::null(),
                }
            }
        }

        impl entity_sql::ToFieldValue for #name {
            fn to_field_value(&self) -> entity_sql::FieldValue<'_> {
                entity_sql::FieldValue::Related(self)
            }
        }

        impl entity_sql::RelationTarget for #name {
            fn relation_target() -> ::core::option::Option<&'static entity_sql::EntityMetadata> {
                ::core::option::Option::Some(<Self as entity_sql::Entity>::describe())
            }
        }
    })
}
