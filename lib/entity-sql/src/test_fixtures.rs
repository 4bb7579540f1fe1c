//! Hand-declared entities shared by the unit tests.

use std::sync::OnceLock;

use crate::descriptor::*;
use crate::{Entity, EntityMetadata, FieldValue, RelationTarget, ToFieldValue};

/// Implements the entity traits the way `#[derive(Entity)]` does, with the
/// declaration written out by hand.
macro_rules! fixture {
    ($ty:ident, |$decl:ident| $body:block, [$($field:ident),* $(,)?]) => {
        impl Entity for $ty {
            fn describe() -> &'static EntityMetadata {
                static METADATA: OnceLock<EntityMetadata> = OnceLock::new();
                METADATA.get_or_init(|| {
                    EntityMetadata::declare(stringify!($ty), |$decl| {
                        $body
                        Ok(())
                    })
                })
            }

            fn metadata(&self) -> &'static EntityMetadata {
                Self::describe()
            }

            #[allow(unused_variables)]
            fn field_value(&self, field: &str) -> FieldValue<'_> {
                match field {
                    $(stringify!($field) => self.$field.to_field_value(),)*
                    _ => FieldValue::null(),
                }
            }
        }

        impl ToFieldValue for $ty {
            fn to_field_value(&self) -> FieldValue<'_> {
                FieldValue::Related(self)
            }
        }

        impl RelationTarget for $ty {
            fn relation_target() -> Option<&'static EntityMetadata> {
                Some(Self::describe())
            }
        }
    };
}

#[derive(Debug, Default, PartialEq, serde::Deserialize)]
pub struct Person {
    pub id: Option<i64>,
    pub name: Option<String>,
}

fixture!(Person, |decl| {
    decl.describe(TableDescriptor::new("T")?);
    decl.field("id").with(ColumnDescriptor::new("ID")?.primary_key());
    decl.field("name").with(ColumnDescriptor::new("NAME")?);
}, [id, name]);

#[derive(Debug, Default)]
pub struct Unmapped {
    pub id: Option<i64>,
}

fixture!(Unmapped, |decl| {
    decl.field("id").with(ColumnDescriptor::new("ID")?.primary_key());
}, [id]);

#[derive(Debug, Default)]
pub struct Customer {
    pub id: Option<i64>,
    pub name: Option<String>,
}

fixture!(Customer, |decl| {
    decl.describe(TableDescriptor::new("CUSTOMER")?.with_alias("c"));
    decl.field("id").with(ColumnDescriptor::new("ID")?.primary_key());
    decl.field("name").with(ColumnDescriptor::new("NAME")?);
}, [id, name]);

#[derive(Debug, Default)]
pub struct Order {
    pub id: Option<i64>,
    pub customer: Option<Box<Customer>>,
    pub note: Option<String>,
}

fixture!(Order, |decl| {
    decl.describe(TableDescriptor::new("ORDERS")?.with_alias("o"));
    decl.field("id").with(ColumnDescriptor::new("ID")?.primary_key());
    decl.field("customer")
        .related::<Option<Box<Customer>>>()
        .with(ForeignKeyDescriptor::new(ColumnDescriptor::new("CUSTOMER_ID")?));
    decl.field("note").with(ColumnDescriptor::new("NOTE")?);
}, [id, customer, note]);

#[derive(Debug, Default)]
pub struct Shipment {
    pub id: Option<i64>,
    pub order: Option<Order>,
}

fixture!(Shipment, |decl| {
    decl.describe(TableDescriptor::new("SHIPMENT")?);
    decl.field("id").with(ColumnDescriptor::new("ID")?.primary_key());
    decl.field("order").related::<Option<Order>>().with(
        ForeignKeyDescriptor::new(ColumnDescriptor::new("CUSTOMER_ID")?)
            .with_target_column("CUSTOMER_ID"),
    );
}, [id, order]);

#[derive(Debug, Default)]
pub struct Badge {
    pub id: Option<i64>,
    pub holder: Option<Customer>,
}

fixture!(Badge, |decl| {
    decl.describe(TableDescriptor::new("BADGE")?);
    decl.field("id").with(ColumnDescriptor::new("ID")?.primary_key());
    decl.field("holder").related::<Option<Customer>>().with(
        ForeignKeyDescriptor::new(ColumnDescriptor::new("HOLDER_NAME")?).with_target_column("NAME"),
    );
}, [id, holder]);

#[derive(Debug, Default)]
pub struct Audit {
    pub id: Option<i64>,
    pub subject: Option<Customer>,
}

fixture!(Audit, |decl| {
    decl.describe(TableDescriptor::new("AUDIT")?);
    decl.field("id").with(ColumnDescriptor::new("ID")?.primary_key());
    decl.field("subject").related::<Option<Customer>>().with(
        ForeignKeyDescriptor::new(ColumnDescriptor::new("SUBJECT")?).with_target_column("MISSING"),
    );
}, [id, subject]);

#[derive(Debug, Default)]
pub struct Label {
    pub text: Option<String>,
}

fixture!(Label, |decl| {
    decl.field("text").with(ColumnDescriptor::new("TEXT")?.primary_key());
}, [text]);

#[derive(Debug, Default)]
pub struct Tagged {
    pub id: Option<i64>,
    pub label: Option<Label>,
}

fixture!(Tagged, |decl| {
    decl.describe(TableDescriptor::new("TAGGED")?);
    decl.field("id").with(ColumnDescriptor::new("ID")?.primary_key());
    decl.field("label")
        .related::<Option<Label>>()
        .with(ForeignKeyDescriptor::new(ColumnDescriptor::new("LABEL")?));
}, [id, label]);

#[derive(Debug, Default)]
pub struct Node {
    pub id: Option<i64>,
    pub parent: Option<Box<Node>>,
}

fixture!(Node, |decl| {
    decl.describe(TableDescriptor::new("NODE")?);
    decl.field("id").with(ColumnDescriptor::new("ID")?.primary_key());
    decl.field("parent")
        .related::<Option<Box<Node>>>()
        .with(ForeignKeyDescriptor::new(ColumnDescriptor::new("PARENT_ID")?));
}, [id, parent]);

#[derive(Debug, Default)]
pub struct Husband {
    pub id: Option<i64>,
    pub wife: Option<Box<Wife>>,
}

fixture!(Husband, |decl| {
    decl.describe(TableDescriptor::new("HUSBAND")?);
    decl.field("id").with(ColumnDescriptor::new("ID")?.primary_key());
    decl.field("wife")
        .related::<Option<Box<Wife>>>()
        .with(ForeignKeyDescriptor::new(ColumnDescriptor::new("WIFE_ID")?));
}, [id, wife]);

#[derive(Debug, Default)]
pub struct Wife {
    pub id: Option<i64>,
    pub husband: Option<Box<Husband>>,
}

fixture!(Wife, |decl| {
    decl.describe(TableDescriptor::new("WIFE")?);
    decl.field("id").with(ColumnDescriptor::new("ID")?.primary_key());
    decl.field("husband")
        .related::<Option<Box<Husband>>>()
        .with(ForeignKeyDescriptor::new(ColumnDescriptor::new("HUSBAND_ID")?));
}, [id, husband]);

#[derive(Debug, Default)]
pub struct Account {
    pub id: Option<i64>,
}

fixture!(Account, |decl| {
    decl.describe(TableDescriptor::new("ACCOUNT")?);
    decl.field("id").with(ColumnDescriptor::new("ID")?.primary_key());
}, [id]);

#[derive(Debug, Default)]
pub struct Transfer {
    pub id: Option<i64>,
    pub source: Option<Account>,
    pub destination: Option<Account>,
}

fixture!(Transfer, |decl| {
    decl.describe(TableDescriptor::new("TRANSFER")?);
    decl.field("id").with(ColumnDescriptor::new("ID")?.primary_key());
    decl.field("source")
        .related::<Option<Account>>()
        .with(ForeignKeyDescriptor::new(ColumnDescriptor::new("SOURCE_ID")?));
    decl.field("destination")
        .related::<Option<Account>>()
        .with(ForeignKeyDescriptor::new(ColumnDescriptor::new("DESTINATION_ID")?));
}, [id, source, destination]);

#[derive(Debug, Default)]
pub struct Line {
    pub id: Option<i64>,
    pub order_id: Option<i64>,
    pub quantity: Option<i64>,
}

fixture!(Line, |decl| {
    decl.describe(TableDescriptor::new("LINE")?);
    decl.field("id").with(ColumnDescriptor::new("ID")?.primary_key());
    decl.field("order_id")
        .related::<Option<i64>>()
        .with(ForeignKeyDescriptor::new(ColumnDescriptor::new("ORDER_ID")?.primary_key()));
    decl.field("quantity").with(ColumnDescriptor::new("QUANTITY")?);
}, [id, order_id, quantity]);

/// Insert and update policies.
#[derive(Debug, Default)]
pub struct Setting {
    pub key: Option<String>,
    pub value: Option<String>,
    pub state: Option<String>,
    pub revision: Option<i64>,
    pub created: Option<String>,
}

fixture!(Setting, |decl| {
    decl.describe(TableDescriptor::new("SETTING")?);
    decl.describe(InsertOptions {
        replace_on_conflict: true,
    });
    decl.field("key").with(ColumnDescriptor::new("KEY")?.primary_key());
    decl.field("value")
        .with(ColumnDescriptor::new("VALUE")?.on_insert(Behaviour::AlwaysInclude));
    decl.field("state")
        .with(ColumnDescriptor::new("STATE")?.with_default("active"));
    decl.field("revision").with(
        ColumnDescriptor::new("REVISION")?
            .on_insert(Behaviour::AlwaysIgnore)
            .on_update(Behaviour::AlwaysInclude),
    );
    decl.field("created")
        .with(ColumnDescriptor::new("CREATED")?.on_update(Behaviour::AlwaysIgnore));
}, [key, value, state, revision, created]);

/// Update target whose key columns share a name across joined tables.
#[derive(Debug, Default)]
pub struct Membership {
    pub group_id: Option<i64>,
    pub member_id: Option<i64>,
    pub role: Option<String>,
    pub member_role: Option<String>,
}

fixture!(Membership, |decl| {
    decl.describe(TableDescriptor::new("MEMBERSHIP")?);
    decl.field("group_id")
        .with(ColumnDescriptor::new("ID")?.primary_key());
    decl.field("member_id")
        .with(ColumnDescriptor::new("ID")?.primary_key().with_table_alias("m"));
    decl.field("role").with(ColumnDescriptor::new("ROLE")?);
    decl.field("member_role")
        .with(ColumnDescriptor::new("ROLE")?.with_table_alias("m"));
}, [group_id, member_id, role, member_role]);

/// Joins, custom columns, sorting and paging.
#[derive(Debug, Default)]
pub struct Product {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub category: Option<String>,
    pub stock: Option<i64>,
    pub secret: Option<String>,
    pub active: Option<bool>,
}

fixture!(Product, |decl| {
    decl.describe(TableDescriptor::new("PRODUCT")?.with_alias("p"));
    decl.describe(
        JoinDescriptor::new("CATEGORY", "p.CATEGORY_ID = c.ID")?
            .with_alias("c")
            .with_mode(JoinMode::Outer),
    );
    decl.describe(JoinDescriptor::new("TAG", "1 = 1")?.with_mode(JoinMode::Cross));
    decl.describe(SelectOptions {
        filter: Some("p.DELETED = 0".to_string()),
        limit: Some(10),
        offset: Some(20),
        remove_duplicates: true,
        ..SelectOptions::default()
    });
    decl.field("id").with(ColumnDescriptor::new("ID")?.primary_key());
    decl.field("name")
        .with(ColumnDescriptor::new("NAME")?)
        .with(SortingDescriptor::new().with_index(2)?);
    decl.field("category")
        .with(ColumnDescriptor::new("NAME")?.with_table_alias("c"))
        .with(
            SortingDescriptor::new()
                .with_direction(SortDirection::Descending)
                .nulls_last()
                .with_index(1)?,
        );
    decl.field("stock")
        .with(CustomColumnDescriptor::new("SELECT COUNT(*) FROM STOCK s WHERE s.PRODUCT_ID = p.ID")?);
    decl.field("secret")
        .with(ColumnDescriptor::new("SECRET")?.on_select(Behaviour::AlwaysIgnore));
    decl.field("active").with(ColumnDescriptor::new("ACTIVE")?);
}, [id, name, category, stock, secret, active]);

/// Filters on every populated column.
#[derive(Debug, Default)]
pub struct Contact {
    pub id: Option<i64>,
    pub email: Option<String>,
    pub city: Option<String>,
}

fixture!(Contact, |decl| {
    decl.describe(TableDescriptor::new("CONTACT")?);
    decl.describe(SelectOptions {
        primary_key_filter_only: false,
        ..SelectOptions::default()
    });
    decl.field("id").with(ColumnDescriptor::new("ID")?.primary_key());
    decl.field("email").with(ColumnDescriptor::new("EMAIL")?);
    decl.field("city").with(ColumnDescriptor::new("CITY")?);
}, [id, email, city]);

/// Grouping fields with a HAVING clause.
#[derive(Debug, Default)]
pub struct RegionSales {
    pub region: Option<String>,
    pub year: Option<i64>,
    pub total: Option<f64>,
}

fixture!(RegionSales, |decl| {
    decl.describe(TableDescriptor::new("SALES")?.with_alias("s"));
    decl.describe(SelectOptions {
        having: Some("SUM(s.AMOUNT) > 100".to_string()),
        ..SelectOptions::default()
    });
    decl.field("region")
        .with(ColumnDescriptor::new("REGION")?)
        .with(GroupingDescriptor::new());
    decl.field("year")
        .with(GroupingDescriptor::new().with_column_name("YEAR"));
    decl.field("total")
        .with(CustomColumnDescriptor::new("SUM(s.AMOUNT)")?);
}, [region, year, total]);

/// Raw GROUP BY and ORDER BY strings.
#[derive(Debug, Default)]
pub struct Ledger {
    pub region: Option<String>,
    pub total: Option<f64>,
}

fixture!(Ledger, |decl| {
    decl.describe(TableDescriptor::new("LEDGER")?);
    decl.describe(SelectOptions {
        group_by: Some("REGION".to_string()),
        having: Some("COUNT(*) > 1".to_string()),
        order_by: Some("REGION DESC".to_string()),
        ..SelectOptions::default()
    });
    decl.field("region").with(ColumnDescriptor::new("REGION")?);
    decl.field("total").with(CustomColumnDescriptor::new("SUM(AMOUNT)")?);
}, [region, total]);

/// HAVING without any grouping.
#[derive(Debug, Default)]
pub struct Ungrouped {
    pub id: Option<i64>,
}

fixture!(Ungrouped, |decl| {
    decl.describe(TableDescriptor::new("UNGROUPED")?);
    decl.describe(SelectOptions {
        having: Some("COUNT(*) > 1".to_string()),
        ..SelectOptions::default()
    });
    decl.field("id").with(ColumnDescriptor::new("ID")?.primary_key());
}, [id]);

/// Grouping field and raw GROUP BY together.
#[derive(Debug, Default)]
pub struct DoubleGrouped {
    pub region: Option<String>,
}

fixture!(DoubleGrouped, |decl| {
    decl.describe(TableDescriptor::new("SALES")?);
    decl.describe(SelectOptions {
        group_by: Some("REGION".to_string()),
        ..SelectOptions::default()
    });
    decl.field("region")
        .with(ColumnDescriptor::new("REGION")?)
        .with(GroupingDescriptor::new());
}, [region]);

/// Sorting field and raw ORDER BY together.
#[derive(Debug, Default)]
pub struct DoubleSorted {
    pub name: Option<String>,
}

fixture!(DoubleSorted, |decl| {
    decl.describe(TableDescriptor::new("NAMES")?);
    decl.describe(SelectOptions {
        order_by: Some("NAME".to_string()),
        ..SelectOptions::default()
    });
    decl.field("name")
        .with(ColumnDescriptor::new("NAME")?)
        .with(SortingDescriptor::new());
}, [name]);

/// Sorting field with neither a column nor a column name.
#[derive(Debug, Default)]
pub struct Unnamed {
    pub id: Option<i64>,
    pub rank: Option<i64>,
}

fixture!(Unnamed, |decl| {
    decl.describe(TableDescriptor::new("UNNAMED")?);
    decl.field("id").with(ColumnDescriptor::new("ID")?.primary_key());
    decl.field("rank").with(SortingDescriptor::new());
}, [id, rank]);

#[derive(Debug, Default)]
pub struct Book {
    pub id: Option<i64>,
    pub author_id: Option<i64>,
}

fixture!(Book, |decl| {
    decl.describe(TableDescriptor::new("BOOK")?);
    decl.field("id").with(ColumnDescriptor::new("ID")?.primary_key());
    decl.field("author_id")
        .related::<Option<i64>>()
        .with(ForeignKeyDescriptor::new(ColumnDescriptor::new("AUTHOR_ID")?));
}, [id, author_id]);

/// Relation fields with and without a local column.
#[derive(Debug, Default)]
pub struct Author {
    pub books: Vec<Book>,
    pub name: Option<String>,
    pub id: Option<i64>,
    pub awards: Vec<Book>,
}

fixture!(Author, |decl| {
    decl.describe(TableDescriptor::new("AUTHOR")?.with_alias("a"));
    decl.field("books")
        .related::<Vec<Book>>()
        .with(OneToManyDescriptor::new("AUTHOR_ID")?);
    decl.field("name").with(ColumnDescriptor::new("NAME")?);
    decl.field("id").with(ColumnDescriptor::new("ID")?.primary_key());
    decl.field("awards").related::<Vec<Book>>().with(
        ManyToManyDescriptor::new("AUTHOR_AWARD")?
            .with_junction_table_column("AUTHOR_ID")
            .with_local_column("AWARD_LIST_ID"),
    );
}, [name, id]);

/// Relations only, and no primary key to stand in for them.
#[derive(Debug, Default)]
pub struct Shelf {
    pub books: Vec<Book>,
}

fixture!(Shelf, |decl| {
    decl.describe(TableDescriptor::new("SHELF")?);
    decl.field("books")
        .related::<Vec<Book>>()
        .with(ManyToManyDescriptor::new("SHELF_BOOK")?);
}, []);

/// Nothing selectable.
#[derive(Debug, Default)]
pub struct Hidden {
    pub id: Option<i64>,
}

fixture!(Hidden, |decl| {
    decl.describe(TableDescriptor::new("HIDDEN")?);
    decl.field("id")
        .with(ColumnDescriptor::new("ID")?.primary_key().on_select(Behaviour::AlwaysIgnore));
}, [id]);

/// Columns hidden from the projection but still grouped and sorted on.
#[derive(Debug, Default)]
pub struct Territory {
    pub region: Option<String>,
    pub rank: Option<i64>,
    pub total: Option<f64>,
}

fixture!(Territory, |decl| {
    decl.describe(TableDescriptor::new("TERRITORY")?);
    decl.field("region")
        .with(ColumnDescriptor::new("REGION")?.on_select(Behaviour::AlwaysIgnore))
        .with(GroupingDescriptor::new().with_column_name("REGION"));
    decl.field("rank")
        .with(ColumnDescriptor::new("RANK")?.on_select(Behaviour::AlwaysIgnore))
        .with(SortingDescriptor::new().with_direction(SortDirection::Descending));
    decl.field("total")
        .with(CustomColumnDescriptor::new("SUM(AMOUNT)")?);
}, [region, rank, total]);

/// Sorting fields sharing an index.
#[derive(Debug, Default)]
pub struct Roster {
    pub surname: Option<String>,
    pub given_name: Option<String>,
    pub team: Option<String>,
}

fixture!(Roster, |decl| {
    decl.describe(TableDescriptor::new("ROSTER")?);
    decl.field("surname")
        .with(ColumnDescriptor::new("SURNAME")?)
        .with(SortingDescriptor::new().with_index(1)?);
    decl.field("given_name")
        .with(ColumnDescriptor::new("GIVEN_NAME")?)
        .with(SortingDescriptor::new().with_index(1)?);
    decl.field("team")
        .with(ColumnDescriptor::new("TEAM")?)
        .with(SortingDescriptor::new().with_index(0)?);
}, [surname, given_name, team]);
