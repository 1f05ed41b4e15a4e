//! Key property resolution.

use crate::error::{MapperError, Result};
use crate::metadata::{EntityMeta, PropertyMeta};

/// A resolved key property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyProperty {
    /// The key property.
    pub property: &'static PropertyMeta,
    /// Whether the database assigns the key value.
    pub is_generated: bool,
}

/// Resolves the key properties of an entity.
pub trait KeyPropertyResolver: Send + Sync {
    /// Returns the key properties in declaration order.
    ///
    /// Implementations must fail rather than return an empty list.
    fn resolve_key_properties(&self, entity: &'static EntityMeta) -> Result<Vec<KeyProperty>>;
}

/// Default key resolution: properties marked as key, otherwise the single
/// property named `Id` (case-insensitive).
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultKeyPropertyResolver;

impl KeyPropertyResolver for DefaultKeyPropertyResolver {
    fn resolve_key_properties(&self, entity: &'static EntityMeta) -> Result<Vec<KeyProperty>> {
        let explicit: Vec<KeyProperty> = entity
            .properties
            .iter()
            .filter(|p| p.key)
            .map(|property| KeyProperty {
                property,
                is_generated: property.generated,
            })
            .collect();
        if !explicit.is_empty() {
            return Ok(explicit);
        }

        entity
            .properties
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case("id"))
            .map(|property| {
                vec![KeyProperty {
                    property,
                    is_generated: property.generated,
                }]
            })
            .ok_or_else(|| MapperError::KeyNotFound {
                entity: entity.name.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::PropertyType;

    static CONVENTION_PROPS: [PropertyMeta; 2] = [
        PropertyMeta::new("Name", PropertyType::Text),
        PropertyMeta::new("id", PropertyType::Int).generated(),
    ];
    static CONVENTION: EntityMeta = EntityMeta::new("Product", "tests::Product", &CONVENTION_PROPS);

    static COMPOSITE_PROPS: [PropertyMeta; 3] = [
        PropertyMeta::new("Id", PropertyType::Int),
        PropertyMeta::new("OrderId", PropertyType::Int).key(),
        PropertyMeta::new("LineNo", PropertyType::Int).key(),
    ];
    static COMPOSITE: EntityMeta = EntityMeta::new("OrderLine", "tests::OrderLine", &COMPOSITE_PROPS);

    static KEYLESS_PROPS: [PropertyMeta; 1] = [PropertyMeta::new("Text", PropertyType::Text)];
    static KEYLESS: EntityMeta = EntityMeta::new("Note", "tests::Note", &KEYLESS_PROPS);

    #[test]
    fn test_convention_id_is_case_insensitive() {
        let keys = DefaultKeyPropertyResolver
            .resolve_key_properties(&CONVENTION)
            .unwrap();
        assert_eq!(keys.len(), 1);
        assert_eq!(keys[0].property.name, "id");
        assert!(keys[0].is_generated);
    }

    #[test]
    fn test_explicit_keys_win_over_convention() {
        let keys = DefaultKeyPropertyResolver
            .resolve_key_properties(&COMPOSITE)
            .unwrap();
        let names: Vec<&str> = keys.iter().map(|k| k.property.name).collect();
        assert_eq!(names, ["OrderId", "LineNo"]);
        assert!(keys.iter().all(|k| !k.is_generated));
    }

    #[test]
    fn test_missing_key_is_an_error() {
        let err = DefaultKeyPropertyResolver
            .resolve_key_properties(&KEYLESS)
            .unwrap_err();
        assert_eq!(
            err,
            MapperError::KeyNotFound {
                entity: "Note".to_string()
            }
        );
    }
}
