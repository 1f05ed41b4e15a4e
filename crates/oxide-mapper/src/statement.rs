//! CRUD statement builders.
//!
//! Fixed statement skeletons (`select * from ...`, the insert for an
//! entity, ...) depend only on the operation, the dialect and the entity,
//! so they are memoized. Anything derived from a caller's predicate is
//! compiled fresh on every call.

use std::fmt;
use std::marker::PhantomData;

use tracing::debug;

use crate::cache::MemoCache;
use crate::dialect::SqlBuilder;
use crate::error::{MapperError, Result};
use crate::expr::{IntoExpr, Parameters, Selection, SqlExpression};
use crate::metadata::{Entity, EntityMeta};
use crate::resolvers::{ForeignKeyRelation, KeyProperty, Resolvers};

/// The statement shapes whose SQL text is memoized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKind {
    /// Select one row by key.
    Get,
    /// Select every row.
    GetAll,
    /// Insert one row.
    Insert,
    /// Update one row by key.
    Update,
    /// Delete one row by key.
    Delete,
    /// Delete every row.
    DeleteAll,
    /// Count every row.
    Count,
    /// Check whether any row exists.
    Any,
    /// Select every mapped column.
    ProjectAll,
    /// Select one row by key joined with a related entity.
    GetJoined,
    /// Select every row joined with a related entity.
    GetAllJoined,
}

type QueryKey = (QueryKind, &'static str, &'static str, Option<&'static str>);

/// Memoized statement text keyed by (kind, dialect, entity, related entity).
pub type QueryCache = MemoCache<QueryKey, String>;

/// Statement builders for entity `E` in one dialect.
///
/// Obtained from [`Registry::statements`](crate::Registry::statements).
/// Statements that filter by key name their parameters after the key
/// properties (`@Id`); predicate parameters are `@p1`, `@p2`, ...
pub struct Statements<'r, E: Entity> {
    resolvers: &'r Resolvers,
    dialect: &'r dyn SqlBuilder,
    cache: &'r QueryCache,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> fmt::Debug for Statements<'_, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Statements")
            .field("entity", &E::meta().name)
            .field("dialect", &self.dialect.name())
            .finish_non_exhaustive()
    }
}

impl<'r, E: Entity> Statements<'r, E> {
    /// Creates statement builders over shared resolvers and cache.
    pub fn new(resolvers: &'r Resolvers, dialect: &'r dyn SqlBuilder, cache: &'r QueryCache) -> Self {
        Self {
            resolvers,
            dialect,
            cache,
            _entity: PhantomData,
        }
    }

    /// Returns an empty expression builder for `E` in this dialect.
    pub fn expression(&self) -> SqlExpression<'r, E> {
        SqlExpression::new(self.resolvers, self.dialect)
    }

    fn table(&self) -> String {
        self.resolvers.table(E::meta(), self.dialect)
    }

    fn cached(
        &self,
        kind: QueryKind,
        related: Option<&'static EntityMeta>,
        build: impl FnOnce() -> Result<String>,
    ) -> Result<String> {
        let key = (kind, self.dialect.name(), E::meta().path, related.map(|r| r.path));
        self.cache.try_get_or_insert_with(key, || {
            let sql = build()?;
            debug!(
                kind = ?kind,
                dialect = self.dialect.name(),
                entity = E::meta().path,
                sql = %sql,
                "built statement"
            );
            Ok(sql)
        })
    }

    /// `col = @Prop` for every key, joined with `and`.
    fn key_condition(&self, qualifier: Option<&str>) -> Result<String> {
        let keys = self.resolvers.key_properties(E::meta())?;
        Ok(keys
            .iter()
            .map(|key| {
                let column = self.resolvers.column(E::meta(), key.property, self.dialect);
                let parameter = self.dialect.prefix_parameter(key.property.name);
                match qualifier {
                    Some(table) => format!("{table}.{column} = {parameter}"),
                    None => format!("{column} = {parameter}"),
                }
            })
            .collect::<Vec<_>>()
            .join(" and "))
    }

    fn with_expression(
        &self,
        head: String,
        predicate: impl FnOnce(&mut SqlExpression<'r, E>) -> Result<()>,
    ) -> Result<(String, Parameters)> {
        let mut expression = self.expression();
        predicate(&mut expression)?;
        let (tail, parameters) = expression.to_sql()?;
        Ok((head + &tail, parameters))
    }

    /// `select * from {table} where {key} = @{Key}`
    pub fn get(&self) -> Result<String> {
        self.cached(QueryKind::Get, None, || {
            Ok(format!("select * from {} where {}", self.table(), self.key_condition(None)?))
        })
    }

    /// `select * from {table}`
    pub fn get_all(&self) -> Result<String> {
        self.cached(QueryKind::GetAll, None, || Ok(format!("select * from {}", self.table())))
    }

    /// Inserts every mapped property except generated ones, fetching back
    /// generated keys the dialect's way.
    pub fn insert(&self) -> Result<String> {
        self.cached(QueryKind::Insert, None, || {
            let entity = E::meta();
            let keys = self.resolvers.key_properties(entity)?;
            let generated_keys: Vec<String> = keys
                .iter()
                .filter(|key| key.is_generated)
                .map(|key| self.resolvers.column(entity, key.property, self.dialect))
                .collect();
            let (columns, parameters): (Vec<String>, Vec<String>) = self
                .resolvers
                .properties(entity)
                .into_iter()
                .filter(|p| !p.generated && !is_generated_key(&keys, p.name))
                .map(|p| {
                    (
                        self.resolvers.column(entity, p, self.dialect),
                        self.dialect.prefix_parameter(p.name),
                    )
                })
                .unzip();
            if columns.is_empty() {
                return Err(no_writable_columns(entity, "insert"));
            }
            Ok(self
                .dialect
                .build_insert(&self.table(), &columns, &parameters, &generated_keys))
        })
    }

    /// Updates every mapped non-key, non-generated property by key.
    pub fn update(&self) -> Result<String> {
        self.cached(QueryKind::Update, None, || {
            let entity = E::meta();
            let keys = self.resolvers.key_properties(entity)?;
            let assignments: Vec<String> = self
                .resolvers
                .properties(entity)
                .into_iter()
                .filter(|p| !p.generated && !keys.iter().any(|k| k.property.name == p.name))
                .map(|p| {
                    format!(
                        "{} = {}",
                        self.resolvers.column(entity, p, self.dialect),
                        self.dialect.prefix_parameter(p.name)
                    )
                })
                .collect();
            if assignments.is_empty() {
                return Err(no_writable_columns(entity, "update"));
            }
            Ok(format!(
                "update {} set {} where {}",
                self.table(),
                assignments.join(", "),
                self.key_condition(None)?
            ))
        })
    }

    /// `delete from {table} where {key} = @{Key}`
    pub fn delete(&self) -> Result<String> {
        self.cached(QueryKind::Delete, None, || {
            Ok(format!("delete from {} where {}", self.table(), self.key_condition(None)?))
        })
    }

    /// `delete from {table}`
    pub fn delete_all(&self) -> Result<String> {
        self.cached(QueryKind::DeleteAll, None, || Ok(format!("delete from {}", self.table())))
    }

    /// Deletes the rows matching `predicate`.
    pub fn delete_where<P: IntoExpr<E, bool>>(
        &self,
        predicate: impl FnOnce(&'static E::Fields) -> P,
    ) -> Result<(String, Parameters)> {
        let head = self.delete_all()?;
        self.with_expression(head, |e| e.where_(predicate).map(drop))
    }

    /// `select count(*) from {table}`
    pub fn count(&self) -> Result<String> {
        self.cached(QueryKind::Count, None, || {
            Ok(format!("select count(*) from {}", self.table()))
        })
    }

    /// Counts the rows matching `predicate`.
    pub fn count_where<P: IntoExpr<E, bool>>(
        &self,
        predicate: impl FnOnce(&'static E::Fields) -> P,
    ) -> Result<(String, Parameters)> {
        let head = self.count()?;
        self.with_expression(head, |e| e.where_(predicate).map(drop))
    }

    /// Selects a single constant row when the table has any row.
    pub fn any(&self) -> Result<String> {
        self.cached(QueryKind::Any, None, || {
            Ok(format!("select 1 from {} {}", self.table(), self.dialect.limit_clause(1)))
        })
    }

    /// Like [`Self::any`], restricted to rows matching `predicate`.
    pub fn any_where<P: IntoExpr<E, bool>>(
        &self,
        predicate: impl FnOnce(&'static E::Fields) -> P,
    ) -> Result<(String, Parameters)> {
        let head = format!("select 1 from {}", self.table());
        let (sql, parameters) = self.with_expression(head, |e| e.where_(predicate).map(drop))?;
        Ok((format!("{sql} {}", self.dialect.limit_clause(1)), parameters))
    }

    /// Selects the rows matching `predicate`.
    pub fn select<P: IntoExpr<E, bool>>(
        &self,
        predicate: impl FnOnce(&'static E::Fields) -> P,
    ) -> Result<(String, Parameters)> {
        let head = self.get_all()?;
        self.with_expression(head, |e| e.where_(predicate).map(drop))
    }

    /// Selects the first row matching `predicate` in key order.
    pub fn first<P: IntoExpr<E, bool>>(
        &self,
        predicate: impl FnOnce(&'static E::Fields) -> P,
    ) -> Result<(String, Parameters)> {
        let head = self.get_all()?;
        self.with_expression(head, |e| {
            e.where_(predicate)?.page(1, 1);
            Ok(())
        })
    }

    /// Selects one page of every row, in key order.
    pub fn paged(&self, page_number: i64, page_size: u32) -> Result<String> {
        let head = self.get_all()?;
        let (sql, _) = self.with_expression(head, |e| {
            e.page(page_number, page_size);
            Ok(())
        })?;
        Ok(sql)
    }

    /// Selects one page of the rows matching `predicate`, in key order.
    pub fn select_paged<P: IntoExpr<E, bool>>(
        &self,
        predicate: impl FnOnce(&'static E::Fields) -> P,
        page_number: i64,
        page_size: u32,
    ) -> Result<(String, Parameters)> {
        let head = self.get_all()?;
        self.with_expression(head, |e| {
            e.where_(predicate)?.page(page_number, page_size);
            Ok(())
        })
    }

    /// Selects every mapped column explicitly instead of `*`.
    pub fn project_all(&self) -> Result<String> {
        self.cached(QueryKind::ProjectAll, None, || {
            let entity = E::meta();
            let columns: Vec<String> = self
                .resolvers
                .properties(entity)
                .into_iter()
                .map(|p| self.resolvers.column(entity, p, self.dialect))
                .collect();
            Ok(format!("select {} from {}", columns.join(", "), self.table()))
        })
    }

    /// Selects only the chosen properties.
    pub fn project<S: Selection<E>>(
        &self,
        selector: impl FnOnce(&'static E::Fields) -> S,
    ) -> Result<String> {
        let mut expression = self.expression();
        expression.select(selector)?;
        Ok(expression.to_sql()?.0)
    }

    /// Selects one row by key, left-joined with its related `R` rows.
    pub fn get_with<R: Entity>(&self) -> Result<String> {
        self.cached(QueryKind::GetJoined, Some(R::meta()), || {
            let table = self.table();
            Ok(format!(
                "{} where {}",
                self.join::<R>()?,
                self.key_condition(Some(&table))?
            ))
        })
    }

    /// Selects every row, left-joined with its related `R` rows.
    pub fn get_all_with<R: Entity>(&self) -> Result<String> {
        self.cached(QueryKind::GetAllJoined, Some(R::meta()), || self.join::<R>())
    }

    fn join<R: Entity>(&self) -> Result<String> {
        let (source, related) = (E::meta(), R::meta());
        let foreign_key = self.resolvers.foreign_key(source, related)?;
        let table = self.table();
        let related_table = self.resolvers.table(related, self.dialect);
        let condition = match foreign_key.relation {
            ForeignKeyRelation::OneToOne => {
                let fk = self.resolvers.column(source, foreign_key.property, self.dialect);
                let key = self.first_key_column(related)?;
                format!("{table}.{fk} = {related_table}.{key}")
            }
            ForeignKeyRelation::OneToMany => {
                let key = self.first_key_column(source)?;
                let fk = self.resolvers.column(related, foreign_key.property, self.dialect);
                format!("{table}.{key} = {related_table}.{fk}")
            }
        };
        Ok(format!("select * from {table} left join {related_table} on {condition}"))
    }

    fn first_key_column(&self, entity: &'static EntityMeta) -> Result<String> {
        let keys = self.resolvers.key_columns(entity, self.dialect)?;
        // key_properties never returns an empty list
        Ok(keys.into_iter().next().unwrap_or_default())
    }
}

fn no_writable_columns(entity: &EntityMeta, statement: &'static str) -> MapperError {
    MapperError::NoWritableColumns {
        entity: entity.name.to_string(),
        statement,
    }
}

fn is_generated_key(keys: &[KeyProperty], name: &str) -> bool {
    keys.iter().any(|k| k.is_generated && k.property.name == name)
}
