//! # oxide-mapper
//!
//! Typed predicates to parameterized SQL, plus CRUD statement text, for
//! several SQL dialects.
//!
//! This crate provides:
//! - Entity metadata, declared with `#[derive(Entity)]` from
//!   `oxide-mapper-derive`
//! - Memoizing resolvers for table, column, key and foreign key names
//! - One [`SqlBuilder`] per database product (SQL Server, SQL Server CE,
//!   PostgreSQL, MySQL, SQLite)
//! - A predicate compiler and the fluent [`SqlExpression`] builder
//! - Statement builders for get, insert, update, delete, count, paging and
//!   joins
//!
//! Nothing is executed: the output is SQL text and a [`Parameters`] list
//! for whatever database driver runs it.
//!
//! ## Quick Start
//!
//! ```rust
//! use oxide_mapper::prelude::*;
//! use oxide_mapper::Registry;
//! use oxide_mapper_derive::Entity;
//!
//! #[derive(Entity)]
//! struct Product {
//!     #[column(key, generated)]
//!     id: i64,
//!     name: String,
//!     price: f64,
//!     discontinued: bool,
//! }
//!
//! let registry = Registry::new();
//! let dialect = registry.dialect_for("SqlConnection");
//! let statements = registry.statements::<Product>(dialect.as_ref());
//!
//! assert_eq!(
//!     statements.insert().unwrap(),
//!     "insert into [Products] ([name], [price], [discontinued]) output inserted.[id] values (@name, @price, @discontinued)"
//! );
//!
//! let (sql, params) = statements
//!     .select(|p| p.price.gt(10.0) & !p.discontinued)
//!     .unwrap();
//! assert_eq!(
//!     sql,
//!     "select * from [Products] where ([price] > @p1 and not ([discontinued] = '1'))"
//! );
//! assert_eq!(params.len(), 1);
//! ```
//!
//! ## Dialects
//!
//! Dialects are looked up by connection type name, case-insensitively.
//! Unknown names fall back to the configured default:
//!
//! ```rust
//! use oxide_mapper::{DialectKind, MapperConfig, Registry};
//!
//! let registry = Registry::from_config(MapperConfig {
//!     default_dialect: DialectKind::Postgres,
//!     ..MapperConfig::default()
//! });
//! assert_eq!(registry.dialect_for("MySqlConnection").name(), "mysql");
//! assert_eq!(registry.dialect_for("SomeOtherConnection").name(), "postgres");
//! ```

pub mod cache;
mod config;
pub mod dialect;
mod error;
pub mod expr;
mod metadata;
mod registry;
pub mod resolvers;
mod statement;
mod value;

pub use config::MapperConfig;
pub use dialect::{DialectKind, SqlBuilder};
pub use error::{MapperError, Result};
pub use expr::{Expr, Parameters, Prop, SqlExpression};
pub use metadata::{Entity, EntityMeta, PropertyMeta, PropertyType, TableAttr};
pub use registry::{Registry, RegistryBuilder};
pub use statement::{QueryCache, QueryKind, Statements};
pub use value::{SqlValue, ToSqlValue};

/// Traits and constructors used when writing predicates.
pub mod prelude {
    pub use crate::expr::{
        captured, captured_list, invoke, list, value, BoolOps, ExprOps, IntoExpr, NullableOps,
        Selection, TextOps,
    };
}
