//! Microsoft SQL Server dialect.

use super::{SqlBuilder, insert_into, page_offset};

/// SQL Server dialect.
///
/// Identifiers are bracket-quoted and generated keys come back through an
/// `output inserted.<col>` clause.
#[derive(Debug, Default, Clone, Copy)]
pub struct SqlServerSqlBuilder;

impl SqlServerSqlBuilder {
    /// Creates a new SQL Server dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl SqlBuilder for SqlServerSqlBuilder {
    fn name(&self) -> &'static str {
        "sqlserver"
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
        if generated_keys.is_empty() {
            return insert_into(table, columns, parameters);
        }
        let output: Vec<String> = generated_keys
            .iter()
            .map(|key| format!("inserted.{key}"))
            .collect();
        format!(
            "insert into {table} ({}) output {} values ({})",
            columns.join(", "),
            output.join(", "),
            parameters.join(", ")
        )
    }

    fn build_paging(&self, order_by: &str, page_number: i64, page_size: u32) -> String {
        let offset = page_offset(page_number, page_size);
        format!("{order_by} offset {offset} rows fetch next {page_size} rows only")
    }

    fn limit_clause(&self, count: u32) -> String {
        format!("order by 1 offset 0 rows fetch next {count} rows only")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_sql_server_dialect() {
        let dialect = SqlServerSqlBuilder::new();
        assert_eq!(dialect.name(), "sqlserver");
        assert_eq!(dialect.quote_identifier("Name"), "[Name]");
        assert_eq!(dialect.quote_identifier("odd]name"), "[odd]]name]");
        assert_eq!(dialect.prefix_parameter("p1"), "@p1");
        assert_eq!(
            dialect.like_expression("[Bar]", "@p1"),
            "lower([Bar]) like lower(@p1)"
        );
    }

    #[test]
    fn test_insert_outputs_generated_key() {
        let sql = SqlServerSqlBuilder::new().build_insert(
            "[Products]",
            &strings(&["[Name]"]),
            &strings(&["@Name"]),
            &strings(&["[Id]"]),
        );
        assert_eq!(
            sql,
            "insert into [Products] ([Name]) output inserted.[Id] values (@Name)"
        );
    }

    #[test]
    fn test_insert_without_generated_key() {
        let sql = SqlServerSqlBuilder::new().build_insert(
            "[Products]",
            &strings(&["[Id]", "[Name]"]),
            &strings(&["@Id", "@Name"]),
            &[],
        );
        assert_eq!(sql, "insert into [Products] ([Id], [Name]) values (@Id, @Name)");
    }

    #[test]
    fn test_paging() {
        let dialect = SqlServerSqlBuilder::new();
        assert_eq!(
            dialect.build_paging(" order by [Id] asc", 3, 10),
            " order by [Id] asc offset 20 rows fetch next 10 rows only"
        );
        assert_eq!(
            dialect.build_paging(" order by [Id] asc", 0, 5),
            dialect.build_paging(" order by [Id] asc", 1, 5)
        );
    }

    #[test]
    fn test_limit_clause() {
        assert_eq!(
            SqlServerSqlBuilder::new().limit_clause(1),
            "order by 1 offset 0 rows fetch next 1 rows only"
        );
    }
}
