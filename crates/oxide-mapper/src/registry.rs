//! The registry tying resolvers, dialects and statement caches together.
//!
//! A registry is built once, before any SQL is generated, and then shared
//! by reference. Replacing a resolver or dialect therefore means building a
//! new registry; the caches of an existing one never see a replaced
//! strategy.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::config::MapperConfig;
use crate::dialect::{DialectKind, SqlBuilder};
use crate::expr::SqlExpression;
use crate::metadata::Entity;
use crate::resolvers::{
    ColumnNameResolver, DefaultTableNameResolver, ForeignKeyPropertyResolver, KeyPropertyResolver,
    PropertyResolver, Resolvers, TableNameResolver,
};
use crate::statement::{QueryCache, Statements};

/// Resolvers, dialects by connection name, and the statement cache.
pub struct Registry {
    resolvers: Resolvers,
    dialects: HashMap<String, Arc<dyn SqlBuilder>>,
    default_dialect: Arc<dyn SqlBuilder>,
    queries: QueryCache,
    config: MapperConfig,
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut connections: Vec<&str> = self.dialects.keys().map(String::as_str).collect();
        connections.sort_unstable();
        f.debug_struct("Registry")
            .field("config", &self.config)
            .field("connections", &connections)
            .field("default_dialect", &self.default_dialect.name())
            .field("cached_queries", &self.queries.len())
            .field("resolvers", &self.resolvers)
            .finish()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// Creates a registry with the built-in dialects and default resolvers.
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Creates a registry from configuration.
    #[must_use]
    pub fn from_config(config: MapperConfig) -> Self {
        Self::builder().config(config).build()
    }

    /// Starts building a customized registry.
    #[must_use]
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// The configuration the registry was built with.
    #[must_use]
    pub const fn config(&self) -> &MapperConfig {
        &self.config
    }

    /// The memoizing resolvers.
    #[must_use]
    pub const fn resolvers(&self) -> &Resolvers {
        &self.resolvers
    }

    /// The dialect used for unknown connection names.
    #[must_use]
    pub fn default_dialect(&self) -> Arc<dyn SqlBuilder> {
        Arc::clone(&self.default_dialect)
    }

    /// Returns the dialect registered for a connection type name, compared
    /// case-insensitively, or the default dialect.
    #[must_use]
    pub fn dialect_for(&self, connection: &str) -> Arc<dyn SqlBuilder> {
        self.dialects
            .get(&connection.to_ascii_lowercase())
            .map_or_else(|| self.default_dialect(), Arc::clone)
    }

    /// Returns the dialect for connection type `C`, looked up by the last
    /// segment of its type name (`sqlx::SqliteConnection` ->
    /// `sqliteconnection`).
    ///
    /// A generic pool is looked up by its database argument joined with
    /// the pool name first (`sqlx::Pool<sqlx::Postgres>` ->
    /// `postgrespool`), then by the pool name alone.
    #[must_use]
    pub fn dialect_for_connection<C: ?Sized>(&self) -> Arc<dyn SqlBuilder> {
        connection_names(std::any::type_name::<C>())
            .iter()
            .find_map(|name| self.dialects.get(&name.to_ascii_lowercase()))
            .map_or_else(|| self.default_dialect(), Arc::clone)
    }

    /// Returns an empty expression builder for `E`.
    #[must_use]
    pub fn expression<'r, E: Entity>(&'r self, dialect: &'r dyn SqlBuilder) -> SqlExpression<'r, E> {
        SqlExpression::new(&self.resolvers, dialect)
    }

    /// Returns the statement builders for `E`.
    #[must_use]
    pub fn statements<'r, E: Entity>(&'r self, dialect: &'r dyn SqlBuilder) -> Statements<'r, E> {
        Statements::new(&self.resolvers, dialect, &self.queries)
    }
}

/// Strips the module path and generic arguments from a type name.
fn last_segment(type_name: &str) -> &str {
    let base = type_name.split('<').next().unwrap_or(type_name).trim();
    base.rsplit("::").next().unwrap_or(base)
}

/// Lookup names for a connection type, most specific first.
fn connection_names(type_name: &str) -> Vec<String> {
    let base = last_segment(type_name);
    let argument = type_name
        .split_once('<')
        .and_then(|(_, rest)| rest.split([',', '>']).next())
        .map(last_segment)
        .filter(|argument| !argument.is_empty());
    match argument {
        Some(argument) => vec![format!("{argument}{base}"), base.to_string()],
        None => vec![base.to_string()],
    }
}

/// Builder for [`Registry`].
#[derive(Default)]
pub struct RegistryBuilder {
    config: MapperConfig,
    dialects: Vec<(String, Arc<dyn SqlBuilder>)>,
    table: Option<Arc<dyn TableNameResolver>>,
    column: Option<Arc<dyn ColumnNameResolver>>,
    key: Option<Arc<dyn KeyPropertyResolver>>,
    foreign_key: Option<Arc<dyn ForeignKeyPropertyResolver>>,
    property: Option<Arc<dyn PropertyResolver>>,
}

impl fmt::Debug for RegistryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryBuilder")
            .field("config", &self.config)
            .field("dialects", &self.dialects)
            .finish_non_exhaustive()
    }
}

impl RegistryBuilder {
    /// Sets the configuration.
    #[must_use]
    pub fn config(mut self, config: MapperConfig) -> Self {
        self.config = config;
        self
    }

    /// Registers a dialect for a connection type name. Later registrations
    /// of the same name win, including over the built-ins.
    #[must_use]
    pub fn dialect(mut self, connection: impl Into<String>, dialect: Arc<dyn SqlBuilder>) -> Self {
        self.dialects.push((connection.into(), dialect));
        self
    }

    /// Replaces the table name resolver.
    #[must_use]
    pub fn table_resolver(mut self, resolver: Arc<dyn TableNameResolver>) -> Self {
        self.table = Some(resolver);
        self
    }

    /// Replaces the column name resolver.
    #[must_use]
    pub fn column_resolver(mut self, resolver: Arc<dyn ColumnNameResolver>) -> Self {
        self.column = Some(resolver);
        self
    }

    /// Replaces the key property resolver.
    #[must_use]
    pub fn key_resolver(mut self, resolver: Arc<dyn KeyPropertyResolver>) -> Self {
        self.key = Some(resolver);
        self
    }

    /// Replaces the foreign key resolver.
    #[must_use]
    pub fn foreign_key_resolver(mut self, resolver: Arc<dyn ForeignKeyPropertyResolver>) -> Self {
        self.foreign_key = Some(resolver);
        self
    }

    /// Replaces the mapped property resolver.
    #[must_use]
    pub fn property_resolver(mut self, resolver: Arc<dyn PropertyResolver>) -> Self {
        self.property = Some(resolver);
        self
    }

    /// Builds the registry.
    #[must_use]
    pub fn build(self) -> Registry {
        let config = self.config;
        let table: Arc<dyn TableNameResolver> = match self.table {
            Some(table) => table,
            None if config.pluralize_table_names => Arc::new(DefaultTableNameResolver::new()),
            None => Arc::new(DefaultTableNameResolver::without_pluralization()),
        };
        let mut resolvers = Resolvers::new()
            .quote_identifiers(config.quote_identifiers)
            .with_table_resolver(table);
        if let Some(column) = self.column {
            resolvers = resolvers.with_column_resolver(column);
        }
        if let Some(key) = self.key {
            resolvers = resolvers.with_key_resolver(key);
        }
        if let Some(foreign_key) = self.foreign_key {
            resolvers = resolvers.with_foreign_key_resolver(foreign_key);
        }
        if let Some(property) = self.property {
            resolvers = resolvers.with_property_resolver(property);
        }

        let mut dialects: HashMap<String, Arc<dyn SqlBuilder>> = HashMap::new();
        for kind in DialectKind::ALL {
            let builder = kind.builder();
            for name in kind.connection_names() {
                dialects.insert((*name).to_string(), Arc::clone(&builder));
            }
        }
        for (name, dialect) in self.dialects {
            dialects.insert(name.to_ascii_lowercase(), dialect);
        }

        debug!(
            connections = dialects.len(),
            default_dialect = ?config.default_dialect,
            quote_identifiers = config.quote_identifiers,
            "built registry"
        );

        Registry {
            resolvers,
            dialects,
            default_dialect: config.default_dialect.builder(),
            queries: QueryCache::new(),
            config,
        }
    }
}
