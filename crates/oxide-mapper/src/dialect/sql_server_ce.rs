//! SQL Server Compact Edition dialect.

use super::{SqlBuilder, insert_into, page_offset};

/// SQL Server CE dialect.
///
/// Same quoting and paging as SQL Server, but CE has no `output` clause;
/// the generated key is read back with `@@IDENTITY`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SqlServerCeSqlBuilder;

impl SqlServerCeSqlBuilder {
    /// Creates a new SQL Server CE dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl SqlBuilder for SqlServerCeSqlBuilder {
    fn name(&self) -> &'static str {
        "sqlserverce"
    }

    fn quote_identifier(&self, identifier: &str) -> String {
        format!("[{}]", identifier.replace(']', "]]"))
    }

    fn build_insert(
        &self,
        table: &str,
        columns: &[String],
        parameters: &[String],
        generated_keys: &[String],
    ) -> String {
        let insert = insert_into(table, columns, parameters);
        if generated_keys.is_empty() {
            insert
        } else {
            format!("{insert}; select @@IDENTITY")
        }
    }

    fn build_paging(&self, order_by: &str, page_number: i64, page_size: u32) -> String {
        let offset = page_offset(page_number, page_size);
        format!("{order_by} offset {offset} rows fetch next {page_size} rows only")
    }

    fn limit_clause(&self, count: u32) -> String {
        format!("order by 1 offset 0 rows fetch next {count} rows only")
    }
}
