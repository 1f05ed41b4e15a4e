//! Column name resolution.

use crate::metadata::PropertyMeta;

/// Resolves the (unquoted) column name of a property.
pub trait ColumnNameResolver: Send + Sync {
    /// Returns the column name.
    fn resolve_column_name(&self, property: &PropertyMeta) -> String;
}

/// Default column naming: the explicit column attribute or the property name.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultColumnNameResolver;

impl ColumnNameResolver for DefaultColumnNameResolver {
    fn resolve_column_name(&self, property: &PropertyMeta) -> String {
        property.column.unwrap_or(property.name).to_string()
    }
}
