//! Error types for metadata resolution and SQL generation.

use thiserror::Error;

/// Errors raised while resolving metadata or compiling predicates.
///
/// Every error is reported synchronously at statement-build time. Nothing
/// here is retried: the same input always produces the same error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MapperError {
    /// No key property could be resolved for an entity.
    #[error("could not resolve key properties for entity '{entity}': no property is marked as key and no property is named 'Id'")]
    KeyNotFound {
        /// The entity type name.
        entity: String,
    },

    /// No foreign key relation exists between two entities.
    #[error("could not resolve foreign key property; source type '{source_type}', related type '{related_type}'")]
    ForeignKeyNotFound {
        /// The entity holding the navigation.
        source_type: String,
        /// The entity being joined in.
        related_type: String,
    },

    /// A predicate referenced a property the entity does not declare.
    #[error("property '{property}' is not defined on entity '{entity}'")]
    UnknownProperty {
        /// The entity type name.
        entity: String,
        /// The property name.
        property: String,
    },

    /// An insert or update would have no column to write.
    #[error("entity '{entity}' has no writable columns for {statement}")]
    NoWritableColumns {
        /// The entity type name.
        entity: String,
        /// The statement being built (`insert` or `update`).
        statement: &'static str,
    },

    /// A predicate called a method with no SQL translation.
    #[error("method '{0}' is not supported in predicates")]
    UnsupportedMethod(String),

    /// A predicate node has no SQL translation in its position.
    #[error("unsupported expression: {0}")]
    UnsupportedExpression(String),

    /// `where_` was called on a builder that already has a where clause.
    #[error("where clause already started; use and_where or or_where to extend it")]
    WhereAlreadyStarted,

    /// `and_where`/`or_where` was called before `where_`.
    #[error("where clause not started; call where_ before and_where or or_where")]
    WhereNotStarted,
}

/// Result type alias for mapper operations.
pub type Result<T> = std::result::Result<T, MapperError>;
