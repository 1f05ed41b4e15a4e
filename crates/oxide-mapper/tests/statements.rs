//! Statement text per dialect.

mod common;

use common::{dialect, registry, AuditEntry, Category, Product, PurchaseOrder, CONNECTIONS};
use oxide_mapper::prelude::*;
use oxide_mapper::MapperError;

// =============================================================================
// Insert
// =============================================================================

#[test]
fn test_insert_per_dialect() {
    let registry = registry();
    let expected = [
        "insert into [Products] ([name], [price], [category_id]) output inserted.[id] values (@name, @price, @category_id)",
        "insert into [Products] ([name], [price], [category_id]) values (@name, @price, @category_id); select @@IDENTITY",
        "insert into \"Products\" (\"name\", \"price\", \"category_id\") values (@name, @price, @category_id) returning \"id\"",
        "insert into `Products` (`name`, `price`, `category_id`) values (@name, @price, @category_id); select LAST_INSERT_ID() id",
        "insert into Products (name, price, category_id) values (@name, @price, @category_id); select last_insert_rowid() id",
    ];
    for (connection, expected) in CONNECTIONS.iter().zip(expected) {
        let dialect = dialect(&registry, connection);
        let sql = registry.statements::<Product>(dialect.as_ref()).insert().unwrap();
        assert_eq!(sql, expected, "dialect {}", dialect.name());
    }
}

#[test]
fn test_insert_without_generated_key_has_no_fetch_back() {
    let registry = registry();
    let dialect = dialect(&registry, "SqlConnection");
    assert_eq!(
        registry.statements::<PurchaseOrder>(dialect.as_ref()).insert().unwrap(),
        "insert into [sales].[Orders] ([order_number], [line], [quantity]) values (@order_number, @line, @quantity)"
    );
}

// =============================================================================
// Key based statements
// =============================================================================

#[test]
fn test_get_update_delete_by_key() {
    let registry = registry();
    let dialect = dialect(&registry, "SqlConnection");
    let statements = registry.statements::<Product>(dialect.as_ref());
    assert_eq!(statements.get().unwrap(), "select * from [Products] where [id] = @id");
    assert_eq!(
        statements.update().unwrap(),
        "update [Products] set [name] = @name, [price] = @price, [category_id] = @category_id where [id] = @id"
    );
    assert_eq!(statements.delete().unwrap(), "delete from [Products] where [id] = @id");
}

#[test]
fn test_composite_key() {
    let registry = registry();
    let dialect = dialect(&registry, "NpgsqlConnection");
    let statements = registry.statements::<PurchaseOrder>(dialect.as_ref());
    assert_eq!(
        statements.get().unwrap(),
        "select * from \"sales\".\"Orders\" where \"order_number\" = @order_number and \"line\" = @line"
    );
    assert_eq!(
        statements.update().unwrap(),
        "update \"sales\".\"Orders\" set \"quantity\" = @quantity where \"order_number\" = @order_number and \"line\" = @line"
    );
}

#[test]
fn test_missing_key_fails() {
    let registry = registry();
    let dialect = dialect(&registry, "SqlConnection");
    let statements = registry.statements::<AuditEntry>(dialect.as_ref());
    let expected = MapperError::KeyNotFound {
        entity: "AuditEntry".into(),
    };
    assert_eq!(statements.get().unwrap_err(), expected);
    assert_eq!(statements.delete().unwrap_err(), expected);
    assert_eq!(statements.get_all().unwrap(), "select * from [AuditEntries]");
}

// =============================================================================
// Whole-table and predicate statements
// =============================================================================

#[test]
fn test_whole_table_statements() {
    let registry = registry();
    let dialect = dialect(&registry, "MySqlConnection");
    let statements = registry.statements::<Product>(dialect.as_ref());
    assert_eq!(statements.get_all().unwrap(), "select * from `Products`");
    assert_eq!(statements.delete_all().unwrap(), "delete from `Products`");
    assert_eq!(statements.count().unwrap(), "select count(*) from `Products`");
    assert_eq!(statements.any().unwrap(), "select 1 from `Products` limit 1");
    assert_eq!(
        statements.project_all().unwrap(),
        "select `id`, `name`, `price`, `category_id` from `Products`"
    );
}

#[test]
fn test_any_on_sql_server_uses_fetch_next() {
    let registry = registry();
    let dialect = dialect(&registry, "SqlConnection");
    let (sql, params) = registry
        .statements::<Product>(dialect.as_ref())
        .any_where(|p| p.price.lt(1.5_f64))
        .unwrap();
    assert_eq!(
        sql,
        "select 1 from [Products] where ([price] < @p1) order by 1 offset 0 rows fetch next 1 rows only"
    );
    assert_eq!(params.len(), 1);
}

#[test]
fn test_predicate_statements() {
    let registry = registry();
    let dialect = dialect(&registry, "SqlConnection");
    let statements = registry.statements::<Product>(dialect.as_ref());

    let (sql, _) = statements.select(|p| p.name.starts_with("Wid")).unwrap();
    assert_eq!(sql, "select * from [Products] where (lower([name]) like lower(@p1))");

    let (sql, _) = statements.count_where(|p| p.category_id.eq(None)).unwrap();
    assert_eq!(sql, "select count(*) from [Products] where ([category_id] is null)");

    let (sql, params) = statements.delete_where(|p| p.price.gt(100.0_f64)).unwrap();
    assert_eq!(sql, "delete from [Products] where ([price] > @p1)");
    assert_eq!(params.len(), 1);

    let (sql, _) = statements.first(|p| p.price.gt(0.0_f64)).unwrap();
    assert_eq!(
        sql,
        "select * from [Products] where ([price] > @p1) order by [id] asc offset 0 rows fetch next 1 rows only"
    );
}

#[test]
fn test_paged_statements() {
    let registry = registry();
    let dialect = dialect(&registry, "NpgsqlConnection");
    let statements = registry.statements::<Product>(dialect.as_ref());
    assert_eq!(
        statements.paged(3, 10).unwrap(),
        "select * from \"Products\" order by \"id\" asc offset 20 limit 10"
    );
    let (sql, _) = statements
        .select_paged(|p| p.price.gt(5.0_f64), 1, 10)
        .unwrap();
    assert_eq!(
        sql,
        "select * from \"Products\" where (\"price\" > @p1) order by \"id\" asc offset 0 limit 10"
    );
}

#[test]
fn test_project_selected_properties() {
    let registry = registry();
    let dialect = dialect(&registry, "SqlConnection");
    let sql = registry
        .statements::<Product>(dialect.as_ref())
        .project(|p| (p.id, p.name))
        .unwrap();
    assert_eq!(sql, "select [id], [name] from [Products]");
}

// =============================================================================
// Joins
// =============================================================================

#[test]
fn test_join_to_single_related_entity() {
    let registry = registry();
    let dialect = dialect(&registry, "SqlConnection");
    assert_eq!(
        registry
            .statements::<Product>(dialect.as_ref())
            .get_with::<Category>()
            .unwrap(),
        "select * from [Products] left join [Categories] on [Products].[category_id] = [Categories].[id] where [Products].[id] = @id"
    );
}

#[test]
fn test_join_to_related_collection() {
    let registry = registry();
    let dialect = dialect(&registry, "SqliteConnection");
    assert_eq!(
        registry
            .statements::<Category>(dialect.as_ref())
            .get_all_with::<Product>()
            .unwrap(),
        "select * from Categories left join Products on Categories.id = Products.category_id"
    );
}

#[test]
fn test_join_without_relation_fails() {
    let registry = registry();
    let dialect = dialect(&registry, "SqlConnection");
    let err = registry
        .statements::<Product>(dialect.as_ref())
        .get_all_with::<AuditEntry>()
        .unwrap_err();
    assert!(matches!(err, MapperError::ForeignKeyNotFound { .. }));
}

// =============================================================================
// Caching
// =============================================================================

#[test]
fn test_statement_text_is_stable_across_calls() {
    let registry = registry();
    let dialect = dialect(&registry, "SqlConnection");
    let first = registry.statements::<Product>(dialect.as_ref()).insert().unwrap();
    let second = registry.statements::<Product>(dialect.as_ref()).insert().unwrap();
    assert_eq!(first, second);
}
