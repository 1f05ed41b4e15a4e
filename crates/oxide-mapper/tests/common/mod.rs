#![allow(dead_code)]

use std::sync::Arc;

use oxide_mapper::{Registry, SqlBuilder};
use oxide_mapper_derive::Entity;

/// Entity with PascalCase columns, used by the predicate tests.
#[derive(Debug, Entity)]
pub struct Foo {
    #[column(name = "Id")]
    pub id: i64,
    #[column(name = "Value1")]
    pub value1: i32,
    #[column(name = "Value2")]
    pub value2: i32,
    #[column(name = "Baz")]
    pub baz: bool,
    #[column(name = "Bar")]
    pub bar: String,
    #[column(name = "Note")]
    pub note: Option<String>,
}

#[derive(Debug, Entity)]
pub struct Product {
    #[column(generated)]
    pub id: i64,
    pub name: String,
    pub price: f64,
    pub category_id: Option<i64>,
    #[column(navigation)]
    pub category: Option<Box<Category>>,
    #[column(ignore)]
    pub cached_label: String,
    #[column(readonly)]
    pub display_name: String,
}

#[derive(Debug, Entity)]
pub struct Category {
    #[column(generated)]
    pub id: i64,
    pub name: String,
    #[column(navigation)]
    pub products: Vec<Product>,
}

/// Composite key in an explicit, schema-qualified table.
#[derive(Debug, Entity)]
#[table(name = "Orders", schema = "sales")]
pub struct PurchaseOrder {
    #[column(key)]
    pub order_number: String,
    #[column(key)]
    pub line: i32,
    pub quantity: i32,
}

#[derive(Debug, Entity)]
#[table(interface)]
pub struct IUser {
    pub id: i64,
    pub email: String,
}

/// Entity without any key property.
#[derive(Debug, Entity)]
pub struct AuditEntry {
    pub message: String,
}

pub fn registry() -> Registry {
    Registry::new()
}

pub fn dialect(registry: &Registry, connection: &str) -> Arc<dyn SqlBuilder> {
    registry.dialect_for(connection)
}

/// One connection name per built-in dialect.
pub const CONNECTIONS: [&str; 5] = [
    "SqlConnection",
    "SqlCeConnection",
    "NpgsqlConnection",
    "MySqlConnection",
    "SqliteConnection",
];
