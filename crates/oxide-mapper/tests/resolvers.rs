//! Metadata resolution over derived entities.

mod common;

use std::sync::Arc;

use common::{dialect, registry, Category, IUser, Product, PurchaseOrder};
use oxide_mapper::resolvers::{
    ColumnNameResolver, ForeignKeyRelation, KeyProperty, KeyPropertyResolver,
};
use oxide_mapper::{
    DialectKind, Entity, EntityMeta, MapperConfig, MapperError, PropertyMeta, Registry,
};

#[test]
fn test_conventional_table_names() {
    let registry = registry();
    let sql = dialect(&registry, "SqlConnection");
    let resolvers = registry.resolvers();
    assert_eq!(resolvers.table(Product::meta(), sql.as_ref()), "[Products]");
    assert_eq!(resolvers.table(Category::meta(), sql.as_ref()), "[Categories]");
    assert_eq!(resolvers.table(IUser::meta(), sql.as_ref()), "[Users]");
    assert_eq!(
        resolvers.table(PurchaseOrder::meta(), sql.as_ref()),
        "[sales].[Orders]"
    );
}

#[test]
fn test_configuration_controls_naming() {
    let registry = Registry::from_config(MapperConfig {
        default_dialect: DialectKind::Postgres,
        quote_identifiers: false,
        pluralize_table_names: false,
    });
    let dialect = registry.default_dialect();
    assert_eq!(
        registry.resolvers().table(Category::meta(), dialect.as_ref()),
        "Category"
    );
    assert_eq!(
        registry
            .statements::<Category>(dialect.as_ref())
            .get()
            .unwrap(),
        "select * from Category where id = @id"
    );
}

#[test]
fn test_key_resolution() {
    let registry = registry();
    let keys = registry.resolvers().key_properties(Product::meta()).unwrap();
    assert_eq!(keys.len(), 1);
    assert_eq!(keys[0].property.name, "id");
    assert!(keys[0].is_generated);

    let keys = registry
        .resolvers()
        .key_properties(PurchaseOrder::meta())
        .unwrap();
    let names: Vec<&str> = keys.iter().map(|k| k.property.name).collect();
    assert_eq!(names, ["order_number", "line"]);
    assert!(keys.iter().all(|k| !k.is_generated));
}

#[test]
fn test_foreign_keys() {
    let registry = registry();
    let to_category = registry
        .resolvers()
        .foreign_key(Product::meta(), Category::meta())
        .unwrap();
    assert_eq!(to_category.property.name, "category_id");
    assert_eq!(to_category.relation, ForeignKeyRelation::OneToOne);

    let to_products = registry
        .resolvers()
        .foreign_key(Category::meta(), Product::meta())
        .unwrap();
    assert_eq!(to_products.property.name, "category_id");
    assert_eq!(to_products.relation, ForeignKeyRelation::OneToMany);
}

#[test]
fn test_mapped_properties() {
    let registry = registry();
    let names: Vec<&str> = registry
        .resolvers()
        .properties(Product::meta())
        .iter()
        .map(|p| p.name)
        .collect();
    assert_eq!(names, ["id", "name", "price", "category_id"]);
}

// =============================================================================
// Custom resolvers
// =============================================================================

#[derive(Debug)]
struct UpperSnakeColumns;

impl ColumnNameResolver for UpperSnakeColumns {
    fn resolve_column_name(&self, property: &PropertyMeta) -> String {
        property.column.unwrap_or(property.name).to_uppercase()
    }
}

/// Treats every property ending in `_number` as the key.
#[derive(Debug)]
struct NumberKeys;

impl KeyPropertyResolver for NumberKeys {
    fn resolve_key_properties(
        &self,
        entity: &'static EntityMeta,
    ) -> oxide_mapper::Result<Vec<KeyProperty>> {
        let keys: Vec<KeyProperty> = entity
            .properties
            .iter()
            .filter(|p| p.name.ends_with("_number"))
            .map(|property| KeyProperty {
                property,
                is_generated: false,
            })
            .collect();
        if keys.is_empty() {
            return Err(MapperError::KeyNotFound {
                entity: entity.name.to_string(),
            });
        }
        Ok(keys)
    }
}

#[test]
fn test_custom_resolvers_are_used() {
    let registry = Registry::builder()
        .column_resolver(Arc::new(UpperSnakeColumns))
        .key_resolver(Arc::new(NumberKeys))
        .build();
    let dialect = registry.dialect_for("SqlConnection");
    assert_eq!(
        registry
            .statements::<PurchaseOrder>(dialect.as_ref())
            .delete()
            .unwrap(),
        "delete from [sales].[Orders] where [ORDER_NUMBER] = @order_number"
    );
    assert!(matches!(
        registry.statements::<Product>(dialect.as_ref()).get(),
        Err(MapperError::KeyNotFound { .. })
    ));
}

#[test]
fn test_resolution_is_shared_across_threads() {
    let registry = Arc::new(registry());
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let registry = Arc::clone(&registry);
            std::thread::spawn(move || {
                let dialect = registry.dialect_for("SqlConnection");
                registry
                    .statements::<Product>(dialect.as_ref())
                    .update()
                    .unwrap()
            })
        })
        .collect();
    let results: Vec<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert!(results.windows(2).all(|w| w[0] == w[1]));
}
