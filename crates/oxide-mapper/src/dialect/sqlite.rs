//! SQLite dialect.

use super::{SqlBuilder, insert_into, page_offset};

/// SQLite dialect.
///
/// Identifiers are emitted as written.
#[derive(Debug, Default, Clone, Copy)]
pub struct SqliteSqlBuilder;

impl SqliteSqlBuilder {
    /// Creates a new SQLite dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl SqlBuilder for SqliteSqlBuilder {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn quote_identifier(&self, identifier: &str) -> String {
        identifier.to_string()
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
            format!("{insert}; select last_insert_rowid() id")
        }
    }

    fn build_paging(&self, order_by: &str, page_number: i64, page_size: u32) -> String {
        let offset = page_offset(page_number, page_size);
        format!("{order_by} limit {offset}, {page_size}")
    }
}
