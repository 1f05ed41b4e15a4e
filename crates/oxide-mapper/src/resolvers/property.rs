//! Mapped property resolution.

use crate::metadata::{EntityMeta, PropertyMeta};

/// Resolves which properties of an entity map to columns.
pub trait PropertyResolver: Send + Sync {
    /// Returns the mapped properties in declaration order.
    fn resolve_properties(&self, entity: &'static EntityMeta) -> Vec<&'static PropertyMeta>;
}

/// Maps every settable property that is neither ignored nor a navigation.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultPropertyResolver;

impl PropertyResolver for DefaultPropertyResolver {
    fn resolve_properties(&self, entity: &'static EntityMeta) -> Vec<&'static PropertyMeta> {
        entity.properties.iter().filter(|p| p.is_mapped()).collect()
    }
}
