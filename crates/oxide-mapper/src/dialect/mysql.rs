//! MySQL dialect.

use super::{SqlBuilder, insert_into, page_offset};

/// MySQL dialect.
#[derive(Debug, Default, Clone, Copy)]
pub struct MySqlSqlBuilder;

impl MySqlSqlBuilder {
    /// Creates a new MySQL dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl SqlBuilder for MySqlSqlBuilder {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn quote_identifier(&self, identifier: &str) -> String {
        format!("`{}`", identifier.replace('`', "``"))
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
            format!("{insert}; select LAST_INSERT_ID() id")
        }
    }

    fn build_paging(&self, order_by: &str, page_number: i64, page_size: u32) -> String {
        let offset = page_offset(page_number, page_size);
        format!("{order_by} limit {offset}, {page_size}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mysql_dialect() {
        let dialect = MySqlSqlBuilder::new();
        assert_eq!(dialect.name(), "mysql");
        assert_eq!(dialect.quote_identifier("Name"), "`Name`");
        assert_eq!(
            dialect.like_expression("`Bar`", "@p1"),
            "lower(`Bar`) like lower(@p1)"
        );
    }

    #[test]
    fn test_mysql_insert_last_insert_id() {
        let sql = MySqlSqlBuilder::new().build_insert(
            "`Products`",
            &["`Name`".to_string()],
            &["@Name".to_string()],
            &["`Id`".to_string()],
        );
        assert_eq!(
            sql,
            "insert into `Products` (`Name`) values (@Name); select LAST_INSERT_ID() id"
        );
    }

    #[test]
    fn test_mysql_paging() {
        assert_eq!(
            MySqlSqlBuilder::new().build_paging(" order by `Id` asc", 2, 10),
            " order by `Id` asc limit 10, 10"
        );
    }
}
