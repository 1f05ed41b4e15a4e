//! Metadata resolvers.
//!
//! Each resolver kind is a pluggable strategy; [`Resolvers`] bundles one of
//! each and memoizes their answers. Table and column names are cached per
//! dialect because quoting differs between dialects; keys, mapped
//! properties and foreign keys do not depend on the dialect.

mod column;
mod foreign_key;
mod key;
mod property;
mod table;

use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::cache::MemoCache;
use crate::dialect::SqlBuilder;
use crate::error::{MapperError, Result};
use crate::metadata::{EntityMeta, PropertyMeta};

pub use column::{ColumnNameResolver, DefaultColumnNameResolver};
pub use foreign_key::{
    DefaultForeignKeyPropertyResolver, ForeignKey, ForeignKeyPropertyResolver, ForeignKeyRelation,
};
pub use key::{DefaultKeyPropertyResolver, KeyProperty, KeyPropertyResolver};
pub use property::{DefaultPropertyResolver, PropertyResolver};
pub use table::{DefaultTableNameResolver, TableNameResolver};

type DialectEntityKey = (&'static str, &'static str);

/// The resolver set plus its caches.
pub struct Resolvers {
    table: Arc<dyn TableNameResolver>,
    column: Arc<dyn ColumnNameResolver>,
    key: Arc<dyn KeyPropertyResolver>,
    foreign_key: Arc<dyn ForeignKeyPropertyResolver>,
    property: Arc<dyn PropertyResolver>,
    quote_identifiers: bool,
    table_cache: MemoCache<DialectEntityKey, String>,
    column_cache: MemoCache<(&'static str, &'static str, &'static str), String>,
    key_cache: MemoCache<&'static str, Vec<KeyProperty>>,
    property_cache: MemoCache<&'static str, Vec<&'static PropertyMeta>>,
    foreign_key_cache: MemoCache<DialectEntityKey, ForeignKey>,
}

impl fmt::Debug for Resolvers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolvers")
            .field("quote_identifiers", &self.quote_identifiers)
            .field("cached_tables", &self.table_cache.len())
            .field("cached_columns", &self.column_cache.len())
            .finish_non_exhaustive()
    }
}

impl Default for Resolvers {
    fn default() -> Self {
        Self::new()
    }
}

impl Resolvers {
    /// Creates the default resolver set with identifier quoting enabled.
    #[must_use]
    pub fn new() -> Self {
        Self {
            table: Arc::new(DefaultTableNameResolver::new()),
            column: Arc::new(DefaultColumnNameResolver),
            key: Arc::new(DefaultKeyPropertyResolver),
            foreign_key: Arc::new(DefaultForeignKeyPropertyResolver),
            property: Arc::new(DefaultPropertyResolver),
            quote_identifiers: true,
            table_cache: MemoCache::new(),
            column_cache: MemoCache::new(),
            key_cache: MemoCache::new(),
            property_cache: MemoCache::new(),
            foreign_key_cache: MemoCache::new(),
        }
    }

    /// Enables or disables identifier quoting.
    #[must_use]
    pub fn quote_identifiers(mut self, quote: bool) -> Self {
        self.quote_identifiers = quote;
        self
    }

    /// Replaces the table name resolver.
    #[must_use]
    pub fn with_table_resolver(mut self, resolver: Arc<dyn TableNameResolver>) -> Self {
        self.table = resolver;
        self
    }

    /// Replaces the column name resolver.
    #[must_use]
    pub fn with_column_resolver(mut self, resolver: Arc<dyn ColumnNameResolver>) -> Self {
        self.column = resolver;
        self
    }

    /// Replaces the key property resolver.
    #[must_use]
    pub fn with_key_resolver(mut self, resolver: Arc<dyn KeyPropertyResolver>) -> Self {
        self.key = resolver;
        self
    }

    /// Replaces the foreign key resolver.
    #[must_use]
    pub fn with_foreign_key_resolver(
        mut self,
        resolver: Arc<dyn ForeignKeyPropertyResolver>,
    ) -> Self {
        self.foreign_key = resolver;
        self
    }

    /// Replaces the mapped property resolver.
    #[must_use]
    pub fn with_property_resolver(mut self, resolver: Arc<dyn PropertyResolver>) -> Self {
        self.property = resolver;
        self
    }

    /// Returns the table name of `entity`, quoted for `dialect` when quoting
    /// is enabled.
    pub fn table(&self, entity: &'static EntityMeta, dialect: &dyn SqlBuilder) -> String {
        self.table_cache
            .get_or_insert_with((dialect.name(), entity.path), || {
                let name = self.table.resolve_table_name(entity);
                trace!(entity = entity.path, dialect = dialect.name(), table = %name, "resolved table name");
                if self.quote_identifiers {
                    dialect.quote_qualified(&name)
                } else {
                    name
                }
            })
    }

    /// Returns the column name of `property`, quoted for `dialect` when
    /// quoting is enabled.
    pub fn column(
        &self,
        entity: &'static EntityMeta,
        property: &'static PropertyMeta,
        dialect: &dyn SqlBuilder,
    ) -> String {
        self.column_cache
            .get_or_insert_with((dialect.name(), entity.path, property.name), || {
                let name = self.column.resolve_column_name(property);
                trace!(entity = entity.path, property = property.name, column = %name, "resolved column name");
                if self.quote_identifiers {
                    dialect.quote_identifier(&name)
                } else {
                    name
                }
            })
    }

    /// Returns the column of the property named `name`.
    pub fn column_by_name(
        &self,
        entity: &'static EntityMeta,
        name: &str,
        dialect: &dyn SqlBuilder,
    ) -> Result<String> {
        let property = entity
            .property(name)
            .ok_or_else(|| MapperError::UnknownProperty {
                entity: entity.name.to_string(),
                property: name.to_string(),
            })?;
        Ok(self.column(entity, property, dialect))
    }

    /// Returns the key properties of `entity`.
    pub fn key_properties(&self, entity: &'static EntityMeta) -> Result<Vec<KeyProperty>> {
        self.key_cache.try_get_or_insert_with(entity.path, || {
            let keys = self.key.resolve_key_properties(entity)?;
            if keys.is_empty() {
                return Err(MapperError::KeyNotFound {
                    entity: entity.name.to_string(),
                });
            }
            trace!(entity = entity.path, keys = keys.len(), "resolved key properties");
            Ok(keys)
        })
    }

    /// Returns the key columns of `entity`, quoted for `dialect`.
    pub fn key_columns(
        &self,
        entity: &'static EntityMeta,
        dialect: &dyn SqlBuilder,
    ) -> Result<Vec<String>> {
        Ok(self
            .key_properties(entity)?
            .iter()
            .map(|key| self.column(entity, key.property, dialect))
            .collect())
    }

    /// Returns the mapped properties of `entity`.
    pub fn properties(&self, entity: &'static EntityMeta) -> Vec<&'static PropertyMeta> {
        self.property_cache
            .get_or_insert_with(entity.path, || self.property.resolve_properties(entity))
    }

    /// Returns the foreign key linking `source` to `related`.
    pub fn foreign_key(
        &self,
        source: &'static EntityMeta,
        related: &'static EntityMeta,
    ) -> Result<ForeignKey> {
        self.foreign_key_cache
            .try_get_or_insert_with((source.path, related.path), || {
                self.foreign_key.resolve_foreign_key(source, related)
            })
    }
}
