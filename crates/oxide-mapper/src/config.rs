//! Registry configuration.

use serde::{Deserialize, Serialize};

use crate::dialect::DialectKind;

/// Settings applied when a [`Registry`](crate::Registry) is built.
///
/// Every field has a default, so a partial document deserializes:
///
/// ```rust
/// use oxide_mapper::{DialectKind, MapperConfig};
///
/// let config: MapperConfig = serde_json::from_str(r#"{"default_dialect": "postgres"}"#).unwrap();
/// assert_eq!(config.default_dialect, DialectKind::Postgres);
/// assert!(config.quote_identifiers);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapperConfig {
    /// Dialect used for connection names nobody registered.
    pub default_dialect: DialectKind,
    /// Quote table and column names.
    pub quote_identifiers: bool,
    /// Pluralize conventional table names (`Product` -> `Products`).
    pub pluralize_table_names: bool,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            default_dialect: DialectKind::SqlServer,
            quote_identifiers: true,
            pluralize_table_names: true,
        }
    }
}
