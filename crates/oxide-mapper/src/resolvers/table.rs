//! Table name resolution.

use crate::metadata::EntityMeta;

/// Resolves the (unquoted) table name of an entity.
pub trait TableNameResolver: Send + Sync {
    /// Returns the table name, schema-qualified with `.` when a schema is
    /// configured.
    fn resolve_table_name(&self, entity: &EntityMeta) -> String;
}

/// Default table naming: an explicit table attribute wins, otherwise the
/// pluralized type name.
#[derive(Debug, Clone, Copy)]
pub struct DefaultTableNameResolver {
    pluralize: bool,
}

impl DefaultTableNameResolver {
    /// Creates a resolver that pluralizes conventional names.
    #[must_use]
    pub const fn new() -> Self {
        Self { pluralize: true }
    }

    /// Creates a resolver that uses type names as they are.
    #[must_use]
    pub const fn without_pluralization() -> Self {
        Self { pluralize: false }
    }
}

impl Default for DefaultTableNameResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl TableNameResolver for DefaultTableNameResolver {
    fn resolve_table_name(&self, entity: &EntityMeta) -> String {
        if let Some(table) = entity.table {
            return match table.schema {
                Some(schema) => format!("{schema}.{}", table.name),
                None => table.name.to_string(),
            };
        }

        let mut name = entity.name;
        if entity.interface {
            name = strip_interface_prefix(name);
        }
        if self.pluralize {
            pluralize(name)
        } else {
            name.to_string()
        }
    }
}

fn strip_interface_prefix(name: &str) -> &str {
    name.strip_prefix('I')
        .filter(|rest| !rest.is_empty())
        .unwrap_or(name)
}

fn pluralize(name: &str) -> String {
    match name.strip_suffix('y') {
        Some(stem) => format!("{stem}ies"),
        None => format!("{name}s"),
    }
}
