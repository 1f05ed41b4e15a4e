//! Entity metadata.
//!
//! Entities describe themselves declaratively instead of being reflected at
//! runtime. `#[derive(Entity)]` from `oxide-mapper-derive` generates the
//! [`Entity`] impl; hand-written `static` descriptors work the same way.
//!
//! Convention first, explicit override wins: a property named `Id` is the
//! key unless some property is marked `key`, the table name is the
//! pluralized type name unless a [`TableAttr`] is present, and so on. The
//! resolvers in [`crate::resolvers`] apply those rules.

/// Trait implemented by every mapped entity type.
pub trait Entity: 'static {
    /// The predicate parameter type: one typed handle per mapped property.
    type Fields: 'static;

    /// Returns the static metadata for this entity.
    fn meta() -> &'static EntityMeta;

    /// Returns the property handles passed to predicate closures.
    fn fields() -> &'static Self::Fields;
}

/// Declared type of a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyType {
    /// `bool`.
    Bool,
    /// Any integer type.
    Int,
    /// `f32` / `f64`.
    Float,
    /// `String` / `&str`.
    Text,
    /// `Vec<u8>`.
    Bytes,
    /// Date, time or timestamp types.
    DateTime,
    /// Any other scalar stored in a single column.
    Other,
    /// Navigation to a single related entity (named by its type name).
    Entity(&'static str),
    /// Navigation to a collection of related entities.
    Collection(&'static str),
}

impl PropertyType {
    /// Returns `true` for navigation properties, which never map to a column.
    #[must_use]
    pub const fn is_navigation(self) -> bool {
        matches!(self, Self::Entity(_) | Self::Collection(_))
    }

    /// Returns the related type name of a navigation property.
    #[must_use]
    pub const fn related_type(self) -> Option<&'static str> {
        match self {
            Self::Entity(name) | Self::Collection(name) => Some(name),
            _ => None,
        }
    }
}

/// Explicit table mapping for an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableAttr {
    /// Table name.
    pub name: &'static str,
    /// Optional schema, joined to the name with `.`.
    pub schema: Option<&'static str>,
}

/// Metadata of a single property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyMeta {
    /// Property name as declared on the entity.
    pub name: &'static str,
    /// Declared type.
    pub ty: PropertyType,
    /// Whether the property is optional.
    pub nullable: bool,
    /// Whether the property can be written back (read-only properties are
    /// never mapped).
    pub settable: bool,
    /// Explicitly marked as (part of) the key.
    pub key: bool,
    /// Value assigned by the database (identity / computed).
    pub generated: bool,
    /// Excluded from mapping.
    pub ignore: bool,
    /// Explicit column name.
    pub column: Option<&'static str>,
    /// Explicit foreign key: on a navigation property, names the property
    /// holding the key value.
    pub foreign_key: Option<&'static str>,
}

impl PropertyMeta {
    /// Creates a mapped, settable, non-key property.
    #[must_use]
    pub const fn new(name: &'static str, ty: PropertyType) -> Self {
        Self {
            name,
            ty,
            nullable: false,
            settable: true,
            key: false,
            generated: false,
            ignore: false,
            column: None,
            foreign_key: None,
        }
    }

    /// Marks the property as part of the key.
    #[must_use]
    pub const fn key(self) -> Self {
        Self { key: true, ..self }
    }

    /// Marks the property as database generated.
    #[must_use]
    pub const fn generated(self) -> Self {
        Self {
            generated: true,
            ..self
        }
    }

    /// Excludes the property from mapping.
    #[must_use]
    pub const fn ignore(self) -> Self {
        Self {
            ignore: true,
            ..self
        }
    }

    /// Marks the property as optional.
    #[must_use]
    pub const fn nullable(self) -> Self {
        Self {
            nullable: true,
            ..self
        }
    }

    /// Marks the property as read-only.
    #[must_use]
    pub const fn readonly(self) -> Self {
        Self {
            settable: false,
            ..self
        }
    }

    /// Overrides the column name.
    #[must_use]
    pub const fn column(self, column: &'static str) -> Self {
        Self {
            column: Some(column),
            ..self
        }
    }

    /// Names the property holding this navigation's foreign key.
    #[must_use]
    pub const fn foreign_key(self, property: &'static str) -> Self {
        Self {
            foreign_key: Some(property),
            ..self
        }
    }

    /// Returns `true` if the property maps to a column.
    #[must_use]
    pub const fn is_mapped(&self) -> bool {
        !self.ignore && self.settable && !self.ty.is_navigation()
    }
}

/// Metadata of an entity type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityMeta {
    /// Nominal type name, e.g. `Product`.
    pub name: &'static str,
    /// Stable identity used in cache keys, e.g. `shop::model::Product`.
    pub path: &'static str,
    /// Explicit table mapping.
    pub table: Option<TableAttr>,
    /// Interface-like entities have a leading `I` stripped from the
    /// conventional table name.
    pub interface: bool,
    /// Properties in declaration order.
    pub properties: &'static [PropertyMeta],
}

impl EntityMeta {
    /// Creates entity metadata with conventional table naming.
    #[must_use]
    pub const fn new(
        name: &'static str,
        path: &'static str,
        properties: &'static [PropertyMeta],
    ) -> Self {
        Self {
            name,
            path,
            table: None,
            interface: false,
            properties,
        }
    }

    /// Maps the entity to an explicit table.
    #[must_use]
    pub const fn table(self, name: &'static str, schema: Option<&'static str>) -> Self {
        Self {
            table: Some(TableAttr { name, schema }),
            ..self
        }
    }

    /// Marks the entity as interface-like.
    #[must_use]
    pub const fn interface(self) -> Self {
        Self {
            interface: true,
            ..self
        }
    }

    /// Looks up a property by its declared name.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&'static PropertyMeta> {
        self.properties.iter().find(|p| p.name == name)
    }
}

/// Compares property or type names ignoring ASCII case and underscores,
/// so `category_id` matches `CategoryId`.
pub(crate) fn names_match(left: &str, right: &str) -> bool {
    let mut l = left.chars().filter(|c| *c != '_');
    let mut r = right.chars().filter(|c| *c != '_');
    loop {
        match (l.next(), r.next()) {
            (None, None) => return true,
            (Some(a), Some(b)) if a.eq_ignore_ascii_case(&b) => {}
            _ => return false,
        }
    }
}
