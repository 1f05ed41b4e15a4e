//! PostgreSQL dialect.

use super::{SqlBuilder, insert_into, page_offset};

/// PostgreSQL dialect.
#[derive(Debug, Default, Clone, Copy)]
pub struct PostgresSqlBuilder;

impl PostgresSqlBuilder {
    /// Creates a new PostgreSQL dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl SqlBuilder for PostgresSqlBuilder {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn quote_identifier(&self, identifier: &str) -> String {
        format!("\"{}\"", identifier.replace('"', "\"\""))
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
            format!("{insert} returning {}", generated_keys.join(", "))
        }
    }

    fn build_paging(&self, order_by: &str, page_number: i64, page_size: u32) -> String {
        let offset = page_offset(page_number, page_size);
        format!("{order_by} offset {offset} limit {page_size}")
    }

    fn like_expression(&self, column: &str, parameter: &str) -> String {
        format!("{column} ilike {parameter}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_postgres_dialect() {
        let dialect = PostgresSqlBuilder::new();
        assert_eq!(dialect.name(), "postgres");
        assert_eq!(dialect.quote_identifier("Name"), "\"Name\"");
        assert_eq!(dialect.like_expression("\"Bar\"", "@p1"), "\"Bar\" ilike @p1");
        assert_eq!(dialect.limit_clause(1), "limit 1");
    }

    #[test]
    fn test_postgres_insert_returning() {
        let sql = PostgresSqlBuilder::new().build_insert(
            "\"Products\"",
            &["\"Name\"".to_string()],
            &["@Name".to_string()],
            &["\"Id\"".to_string()],
        );
        assert_eq!(
            sql,
            "insert into \"Products\" (\"Name\") values (@Name) returning \"Id\""
        );
    }

    #[test]
    fn test_postgres_paging() {
        assert_eq!(
            PostgresSqlBuilder::new().build_paging(" order by \"Id\" asc", 4, 5),
            " order by \"Id\" asc offset 15 limit 5"
        );
    }
}
