//! SQL dialect support.
//!
//! Different databases disagree on identifier quoting, parameter markers,
//! pagination and how a generated key is returned from an INSERT. The
//! [`SqlBuilder`] trait captures those differences; one implementation
//! exists per supported product.

mod mysql;
mod postgres;
mod sql_server;
mod sql_server_ce;
mod sqlite;

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

pub use mysql::MySqlSqlBuilder;
pub use postgres::PostgresSqlBuilder;
pub use sql_server::SqlServerSqlBuilder;
pub use sql_server_ce::SqlServerCeSqlBuilder;
pub use sqlite::SqliteSqlBuilder;

/// Trait for SQL dialect-specific behavior.
///
/// All methods are pure functions of their inputs.
pub trait SqlBuilder: fmt::Debug + Send + Sync {
    /// Returns the dialect name.
    ///
    /// The name is part of every cache key, so custom dialects must not
    /// reuse a built-in name.
    fn name(&self) -> &'static str;

    /// Adds the dialect's parameter marker to a parameter name.
    fn prefix_parameter(&self, name: &str) -> String {
        format!("@{name}")
    }

    /// Quotes a single identifier.
    fn quote_identifier(&self, identifier: &str) -> String;

    /// Quotes a possibly schema-qualified name segment by segment.
    fn quote_qualified(&self, name: &str) -> String {
        name.split('.')
            .map(|segment| self.quote_identifier(segment))
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Builds an INSERT statement.
    ///
    /// `generated_keys` holds the (quoted) generated key columns; when it is
    /// non-empty the statement also returns their values.
    fn build_insert(
        &self,
        table: &str,
        columns: &[String],
        parameters: &[String],
        generated_keys: &[String],
    ) -> String;

    /// Builds the paging fragment that follows the WHERE clause.
    ///
    /// `order_by` is the complete ` order by ...` clause. `page_number` is
    /// 1-based; zero or negative pages mean the first page.
    fn build_paging(&self, order_by: &str, page_number: i64, page_size: u32) -> String;

    /// Returns the clause restricting a query to its first `count` rows.
    fn limit_clause(&self, count: u32) -> String {
        format!("limit {count}")
    }

    /// Returns a case-insensitive pattern match of `column` against
    /// `parameter`.
    fn like_expression(&self, column: &str, parameter: &str) -> String {
        format!("lower({column}) like lower({parameter})")
    }
}

/// Returns the row offset of a 1-based page.
#[must_use]
pub fn page_offset(page_number: i64, page_size: u32) -> u64 {
    let page = u64::try_from(page_number.max(1) - 1).unwrap_or(0);
    page.saturating_mul(u64::from(page_size))
}

/// Renders the plain `insert into ... values (...)` part shared by all
/// dialects.
pub(crate) fn insert_into(table: &str, columns: &[String], parameters: &[String]) -> String {
    format!(
        "insert into {table} ({}) values ({})",
        columns.join(", "),
        parameters.join(", ")
    )
}

/// The built-in dialects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialectKind {
    /// Microsoft SQL Server.
    #[default]
    SqlServer,
    /// SQL Server Compact Edition.
    SqlServerCe,
    /// PostgreSQL.
    Postgres,
    /// MySQL / MariaDB.
    MySql,
    /// SQLite.
    Sqlite,
}

impl DialectKind {
    /// Returns a shared instance of the dialect.
    #[must_use]
    pub fn builder(self) -> Arc<dyn SqlBuilder> {
        match self {
            Self::SqlServer => Arc::new(SqlServerSqlBuilder::new()),
            Self::SqlServerCe => Arc::new(SqlServerCeSqlBuilder::new()),
            Self::Postgres => Arc::new(PostgresSqlBuilder::new()),
            Self::MySql => Arc::new(MySqlSqlBuilder::new()),
            Self::Sqlite => Arc::new(SqliteSqlBuilder::new()),
        }
    }

    /// Connection type names served by this dialect out of the box.
    #[must_use]
    pub const fn connection_names(self) -> &'static [&'static str] {
        match self {
            Self::SqlServer => &["mssqlconnection", "mssqlpool", "sqlconnection"],
            Self::SqlServerCe => &["sqlceconnection"],
            Self::Postgres => &["pgconnection", "pgpool", "postgrespool", "npgsqlconnection"],
            Self::MySql => &["mysqlconnection", "mysqlpool"],
            Self::Sqlite => &["sqliteconnection", "sqlitepool"],
        }
    }

    /// All built-in dialects.
    pub const ALL: [Self; 5] = [
        Self::SqlServer,
        Self::SqlServerCe,
        Self::Postgres,
        Self::MySql,
        Self::Sqlite,
    ];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_offset() {
        assert_eq!(page_offset(1, 5), 0);
        assert_eq!(page_offset(0, 5), 0);
        assert_eq!(page_offset(-3, 5), 0);
        assert_eq!(page_offset(3, 5), 10);
        assert_eq!(page_offset(i64::MAX, u32::MAX), u64::MAX);
    }

    #[test]
    fn test_dialect_kind_builder_names() {
        let names: Vec<&str> = DialectKind::ALL.iter().map(|k| k.builder().name()).collect();
        assert_eq!(names, ["sqlserver", "sqlserverce", "postgres", "mysql", "sqlite"]);
    }

    #[test]
    fn test_dialect_kind_serde_names() {
        let kind: DialectKind = serde_json::from_str("\"sqlserverce\"").unwrap();
        assert_eq!(kind, DialectKind::SqlServerCe);
        assert_eq!(serde_json::to_string(&DialectKind::MySql).unwrap(), "\"mysql\"");
    }

    #[test]
    fn test_quote_qualified() {
        let dialect = SqlServerSqlBuilder::new();
        assert_eq!(dialect.quote_qualified("dbo.Products"), "[dbo].[Products]");
        assert_eq!(dialect.quote_qualified("Products"), "[Products]");
    }
}
