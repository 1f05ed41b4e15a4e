//! Foreign key resolution between two entities.

use crate::error::{MapperError, Result};
use crate::metadata::{names_match, EntityMeta, PropertyMeta, PropertyType};

/// Cardinality of a resolved relation, seen from the source entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ForeignKeyRelation {
    /// The source holds the foreign key of a single related row.
    OneToOne,
    /// The related entity holds the foreign key back to the source.
    OneToMany,
}

/// A resolved foreign key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForeignKey {
    /// The property holding the key value. It lives on the source entity for
    /// one-to-one relations and on the related entity for one-to-many.
    pub property: &'static PropertyMeta,
    /// The relation kind.
    pub relation: ForeignKeyRelation,
}

/// Resolves how two entities are related.
pub trait ForeignKeyPropertyResolver: Send + Sync {
    /// Returns the foreign key linking `source` to `related`.
    fn resolve_foreign_key(
        &self,
        source: &'static EntityMeta,
        related: &'static EntityMeta,
    ) -> Result<ForeignKey>;
}

/// Default resolution, in order:
///
/// 1. a property on the source named `{Related}Id` (one-to-one),
/// 2. a property on the related entity named `{Source}Id` (one-to-many),
/// 3. a navigation property carrying an explicit foreign key attribute.
///
/// Anything else is an error.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultForeignKeyPropertyResolver;

impl ForeignKeyPropertyResolver for DefaultForeignKeyPropertyResolver {
    fn resolve_foreign_key(
        &self,
        source: &'static EntityMeta,
        related: &'static EntityMeta,
    ) -> Result<ForeignKey> {
        if let Some(property) = find_key_property(source, &format!("{}Id", related.name)) {
            return Ok(ForeignKey {
                property,
                relation: ForeignKeyRelation::OneToOne,
            });
        }

        if let Some(property) = find_key_property(related, &format!("{}Id", source.name)) {
            return Ok(ForeignKey {
                property,
                relation: ForeignKeyRelation::OneToMany,
            });
        }

        if let Some(fk) = from_navigation_attribute(source, related) {
            return Ok(fk);
        }

        Err(MapperError::ForeignKeyNotFound {
            source_type: source.path.to_string(),
            related_type: related.path.to_string(),
        })
    }
}

fn find_key_property(entity: &'static EntityMeta, name: &str) -> Option<&'static PropertyMeta> {
    entity
        .properties
        .iter()
        .find(|p| p.is_mapped() && names_match(p.name, name))
}

fn navigations_to<'a>(
    entity: &'static EntityMeta,
    target: &'a EntityMeta,
) -> impl Iterator<Item = (&'static PropertyMeta, &'static str)> + 'a {
    entity.properties.iter().filter_map(move |p| {
        let related = p.ty.related_type()?;
        let fk = p.foreign_key?;
        names_match(related, target.name).then_some((p, fk))
    })
}

fn from_navigation_attribute(
    source: &'static EntityMeta,
    related: &'static EntityMeta,
) -> Option<ForeignKey> {
    for (navigation, fk) in navigations_to(source, related) {
        let found = match navigation.ty {
            PropertyType::Collection(_) => find_key_property(related, fk)
                .map(|property| (property, ForeignKeyRelation::OneToMany)),
            _ => find_key_property(source, fk)
                .map(|property| (property, ForeignKeyRelation::OneToOne)),
        };
        if let Some((property, relation)) = found {
            return Some(ForeignKey { property, relation });
        }
    }

    navigations_to(related, source).find_map(|(_, fk)| {
        find_key_property(related, fk).map(|property| ForeignKey {
            property,
            relation: ForeignKeyRelation::OneToMany,
        })
    })
}
