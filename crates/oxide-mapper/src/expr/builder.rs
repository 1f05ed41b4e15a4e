//! Fluent WHERE / ORDER BY / paging builder.

use std::fmt;
use std::marker::PhantomData;

use tracing::debug;

use crate::dialect::SqlBuilder;
use crate::error::{MapperError, Result};
use crate::metadata::Entity;
use crate::resolvers::Resolvers;

use super::params::Parameters;
use super::visitor::SqlVisitor;
use super::{BinaryOp, Expr, IntoExpr, Node, Selection, UnaryOp};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Asc,
    Desc,
}

impl Direction {
    const fn sql(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// Builds the condition, ordering and paging tail of a query on `E`.
///
/// Predicates are compiled when they are added, so an unsupported
/// expression fails at the call that introduced it. Parameters are named
/// `p1`, `p2`, ... in the order values are bound.
///
/// ```rust
/// use oxide_mapper::prelude::*;
/// use oxide_mapper::{Entity, EntityMeta, Prop, PropertyMeta, PropertyType, Registry};
///
/// struct Product;
/// struct ProductFields {
///     id: Prop<Product, i64>,
///     name: Prop<Product, String>,
/// }
///
/// static PROPERTIES: [PropertyMeta; 2] = [
///     PropertyMeta::new("Id", PropertyType::Int),
///     PropertyMeta::new("Name", PropertyType::Text),
/// ];
/// static META: EntityMeta = EntityMeta::new("Product", "doc::Product", &PROPERTIES);
/// static FIELDS: ProductFields = ProductFields {
///     id: Prop::new("Id", PropertyType::Int),
///     name: Prop::new("Name", PropertyType::Text),
/// };
///
/// impl Entity for Product {
///     type Fields = ProductFields;
///     fn meta() -> &'static EntityMeta { &META }
///     fn fields() -> &'static ProductFields { &FIELDS }
/// }
///
/// let registry = Registry::new();
/// let dialect = registry.dialect_for("sqlconnection");
/// let mut query = registry.expression::<Product>(dialect.as_ref());
/// query.where_(|p| p.name.eq("Widget")).unwrap();
/// query.order_by(|p| p.id).unwrap();
/// let (sql, params) = query.to_sql().unwrap();
/// assert_eq!(sql, " where ([Name] = @p1) order by [Id] asc");
/// assert_eq!(params.len(), 1);
/// ```
pub struct SqlExpression<'r, E: Entity> {
    resolvers: &'r Resolvers,
    dialect: &'r dyn SqlBuilder,
    select: Option<String>,
    where_clause: String,
    order_by: String,
    paging: Option<(i64, u32)>,
    parameters: Parameters,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> fmt::Debug for SqlExpression<'_, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqlExpression")
            .field("entity", &E::meta().name)
            .field("dialect", &self.dialect.name())
            .field("where_clause", &self.where_clause)
            .field("order_by", &self.order_by)
            .field("paging", &self.paging)
            .field("parameters", &self.parameters)
            .finish_non_exhaustive()
    }
}

impl<'r, E: Entity> SqlExpression<'r, E> {
    /// Creates an empty builder.
    pub fn new(resolvers: &'r Resolvers, dialect: &'r dyn SqlBuilder) -> Self {
        Self {
            resolvers,
            dialect,
            select: None,
            where_clause: String::new(),
            order_by: String::new(),
            paging: None,
            parameters: Parameters::new(),
            _entity: PhantomData,
        }
    }

    /// Starts the where clause.
    ///
    /// Fails with [`MapperError::WhereAlreadyStarted`] on a second call.
    pub fn where_<P: IntoExpr<E, bool>>(
        &mut self,
        predicate: impl FnOnce(&'static E::Fields) -> P,
    ) -> Result<&mut Self> {
        if !self.where_clause.is_empty() {
            return Err(MapperError::WhereAlreadyStarted);
        }
        let node = predicate(E::fields()).into_expr().into_node();
        let sql = self.compile(&node)?;
        self.where_clause = if needs_grouping(&node) {
            format!(" where ({sql})")
        } else {
            format!(" where {sql}")
        };
        Ok(self)
    }

    /// Adds a condition joined with `and`.
    pub fn and_where<P: IntoExpr<E, bool>>(
        &mut self,
        predicate: impl FnOnce(&'static E::Fields) -> P,
    ) -> Result<&mut Self> {
        self.extend_where(BinaryOp::And, predicate(E::fields()).into_expr())
    }

    /// Adds a condition joined with `or`.
    pub fn or_where<P: IntoExpr<E, bool>>(
        &mut self,
        predicate: impl FnOnce(&'static E::Fields) -> P,
    ) -> Result<&mut Self> {
        self.extend_where(BinaryOp::Or, predicate(E::fields()).into_expr())
    }

    fn extend_where(&mut self, op: BinaryOp, predicate: Expr<E, bool>) -> Result<&mut Self> {
        if self.where_clause.is_empty() {
            return Err(MapperError::WhereNotStarted);
        }
        let sql = self.compile(predicate.node())?;
        self.where_clause
            .push_str(&format!(" {} ({sql})", op.sql()));
        Ok(self)
    }

    /// Compiles a condition, rewinding the parameters if it fails.
    fn compile(&mut self, node: &Node) -> Result<String> {
        let bound = self.parameters.len();
        let result = SqlVisitor::new(self.resolvers, self.dialect, E::meta(), &mut self.parameters)
            .condition(node);
        if result.is_err() {
            self.parameters.truncate(bound);
        }
        result
    }

    /// Orders by the selected properties, ascending.
    pub fn order_by<S: Selection<E>>(
        &mut self,
        selector: impl FnOnce(&'static E::Fields) -> S,
    ) -> Result<&mut Self> {
        self.push_order(&selector(E::fields()), Direction::Asc)
    }

    /// Orders by the selected properties, descending.
    pub fn order_by_descending<S: Selection<E>>(
        &mut self,
        selector: impl FnOnce(&'static E::Fields) -> S,
    ) -> Result<&mut Self> {
        self.push_order(&selector(E::fields()), Direction::Desc)
    }

    fn push_order(&mut self, selection: &impl Selection<E>, direction: Direction) -> Result<&mut Self> {
        let columns = selection
            .properties()
            .into_iter()
            .map(|property| {
                self.resolvers
                    .column_by_name(E::meta(), property.name, self.dialect)
            })
            .collect::<Result<Vec<_>>>()?;
        for column in columns {
            if self.order_by.is_empty() {
                self.order_by.push_str(" order by ");
            } else {
                self.order_by.push_str(", ");
            }
            self.order_by
                .push_str(&format!("{column} {}", direction.sql()));
        }
        Ok(self)
    }

    /// Requests one page of results. Pages are 1-based.
    pub fn page(&mut self, page_number: i64, page_size: u32) -> &mut Self {
        self.paging = Some((page_number, page_size));
        self
    }

    /// Selects only the given properties.
    pub fn select<S: Selection<E>>(
        &mut self,
        selector: impl FnOnce(&'static E::Fields) -> S,
    ) -> Result<&mut Self> {
        let columns = selector(E::fields())
            .properties()
            .iter()
            .map(|p| self.resolvers.column_by_name(E::meta(), p.name, self.dialect))
            .collect::<Result<Vec<_>>>()?;
        let table = self.resolvers.table(E::meta(), self.dialect);
        self.select = Some(format!("select {} from {table}", columns.join(", ")));
        Ok(self)
    }

    /// Selects every column.
    pub fn select_all(&mut self) -> &mut Self {
        let table = self.resolvers.table(E::meta(), self.dialect);
        self.select = Some(format!("select * from {table}"));
        self
    }

    /// Returns `true` once a where clause was started.
    #[must_use]
    pub fn has_where(&self) -> bool {
        !self.where_clause.is_empty()
    }

    /// Returns `true` once an ordering was added.
    #[must_use]
    pub fn has_order_by(&self) -> bool {
        !self.order_by.is_empty()
    }

    /// The rendered where clause, including its leading ` where`.
    #[must_use]
    pub fn where_clause(&self) -> &str {
        &self.where_clause
    }

    /// The rendered ordering, including its leading ` order by`.
    #[must_use]
    pub fn order_by_clause(&self) -> &str {
        &self.order_by
    }

    /// The parameters bound so far.
    #[must_use]
    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    /// Renders the query: selection, where clause, then ordering or paging.
    ///
    /// Paging without an explicit ordering orders by the key columns.
    /// Rendering does not consume or alter the builder.
    pub fn to_sql(&self) -> Result<(String, Parameters)> {
        let mut sql = self.select.clone().unwrap_or_default();
        sql.push_str(&self.where_clause);
        match self.paging {
            Some((page_number, page_size)) => {
                let order_by = self.order_or_keys()?;
                sql.push_str(&self.dialect.build_paging(&order_by, page_number, page_size));
            }
            None => sql.push_str(&self.order_by),
        }
        debug!(
            entity = E::meta().name,
            dialect = self.dialect.name(),
            sql = %sql,
            parameters = self.parameters.len(),
            "rendered sql expression"
        );
        Ok((sql, self.parameters.clone()))
    }

    /// The explicit ordering, or ascending key order when none was given.
    pub(crate) fn order_or_keys(&self) -> Result<String> {
        if !self.order_by.is_empty() {
            return Ok(self.order_by.clone());
        }
        let keys = self.resolvers.key_columns(E::meta(), self.dialect)?;
        let keys: Vec<String> = keys.into_iter().map(|k| format!("{k} asc")).collect();
        Ok(format!(" order by {}", keys.join(", ")))
    }
}

/// A where clause is parenthesized unless it is a single boolean property
/// or a negation, both of which render self-contained.
fn needs_grouping(node: &Node) -> bool {
    let node = node.unwrap_invoke();
    !(node.is_bool_column()
        || matches!(
            node,
            Node::Unary {
                op: UnaryOp::Not,
                ..
            }
        ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{MySqlSqlBuilder, SqlServerSqlBuilder};
    use crate::expr::{BoolOps, ExprOps, Prop, TextOps};
    use crate::metadata::{EntityMeta, PropertyMeta, PropertyType};
    use crate::value::SqlValue;

    struct Foo;

    struct FooFields {
        id: Prop<Foo, i64>,
        bar: Prop<Foo, String>,
        baz: Prop<Foo, bool>,
    }

    static PROPS: [PropertyMeta; 3] = [
        PropertyMeta::new("Id", PropertyType::Int),
        PropertyMeta::new("Bar", PropertyType::Text),
        PropertyMeta::new("Baz", PropertyType::Bool),
    ];
    static META: EntityMeta = EntityMeta::new("Foo", "builder::Foo", &PROPS);
    static FIELDS: FooFields = FooFields {
        id: Prop::new("Id", PropertyType::Int),
        bar: Prop::new("Bar", PropertyType::Text),
        baz: Prop::new("Baz", PropertyType::Bool),
    };

    impl Entity for Foo {
        type Fields = FooFields;

        fn meta() -> &'static EntityMeta {
            &META
        }

        fn fields() -> &'static FooFields {
            &FIELDS
        }
    }

    #[test]
    fn test_where_and_or() {
        let resolvers = Resolvers::new();
        let mut query = SqlExpression::<Foo>::new(&resolvers, &SqlServerSqlBuilder);
        query.where_(|f| f.id.eq(1_i64)).unwrap();
        query.and_where(|f| f.bar.eq("x")).unwrap();
        query.or_where(|f| f.baz).unwrap();
        let (sql, params) = query.to_sql().unwrap();
        assert_eq!(
            sql,
            " where ([Id] = @p1) and ([Bar] = @p2) or ([Baz] = '1')"
        );
        assert_eq!(params.get("p2"), Some(&SqlValue::Text("x".into())));
    }

    #[test]
    fn test_bool_and_not_are_not_grouped() {
        let resolvers = Resolvers::new();
        let mut query = SqlExpression::<Foo>::new(&resolvers, &SqlServerSqlBuilder);
        query.where_(|f| f.baz).unwrap();
        assert_eq!(query.where_clause(), " where [Baz] = '1'");

        let mut query = SqlExpression::<Foo>::new(&resolvers, &SqlServerSqlBuilder);
        query.where_(|f| !f.bar.contains("a")).unwrap();
        assert_eq!(query.where_clause(), " where not (lower([Bar]) like lower(@p1))");
    }

    #[test]
    fn test_where_state_errors() {
        let resolvers = Resolvers::new();
        let mut query = SqlExpression::<Foo>::new(&resolvers, &SqlServerSqlBuilder);
        assert_eq!(
            query.and_where(|f| f.baz).unwrap_err(),
            MapperError::WhereNotStarted
        );
        query.where_(|f| f.baz).unwrap();
        assert_eq!(
            query.where_(|f| f.baz).unwrap_err(),
            MapperError::WhereAlreadyStarted
        );
    }

    #[test]
    fn test_ordering() {
        let resolvers = Resolvers::new();
        let mut query = SqlExpression::<Foo>::new(&resolvers, &SqlServerSqlBuilder);
        query.order_by(|f| f.bar).unwrap();
        query.order_by_descending(|f| (f.id, f.baz)).unwrap();
        assert_eq!(
            query.to_sql().unwrap().0,
            " order by [Bar] asc, [Id] desc, [Baz] desc"
        );
    }

    #[test]
    fn test_failed_ordering_leaves_no_partial_clause() {
        static MISSING: Prop<Foo, i64> = Prop::new("Missing", PropertyType::Int);
        let resolvers = Resolvers::new();
        let mut query = SqlExpression::<Foo>::new(&resolvers, &SqlServerSqlBuilder);
        let err = query.order_by(|f| (f.bar, MISSING)).unwrap_err();
        assert!(matches!(err, MapperError::UnknownProperty { .. }));
        assert_eq!(query.order_by_clause(), "");
        assert!(!query.has_order_by());

        query.order_by(|f| f.id).unwrap();
        assert_eq!(query.order_by_clause(), " order by [Id] asc");
    }

    #[test]
    fn test_paging_defaults_to_key_order() {
        let resolvers = Resolvers::new();
        let mut query = SqlExpression::<Foo>::new(&resolvers, &MySqlSqlBuilder);
        query.where_(|f| f.id.gt(3_i64)).unwrap().page(3, 10);
        assert_eq!(
            query.to_sql().unwrap().0,
            " where (`Id` > @p1) order by `Id` asc limit 20, 10"
        );
    }

    #[test]
    fn test_select_and_render_is_repeatable() {
        let resolvers = Resolvers::new();
        let mut query = SqlExpression::<Foo>::new(&resolvers, &SqlServerSqlBuilder);
        query.select(|f| (f.id, f.bar)).unwrap();
        query.where_(|f| f.baz).unwrap();
        let first = query.to_sql().unwrap();
        assert_eq!(first.0, "select [Id], [Bar] from [Foos] where [Baz] = '1'");
        assert_eq!(query.to_sql().unwrap(), first);
    }

    #[test]
    fn test_failed_predicate_leaves_no_parameters() {
        let resolvers = Resolvers::new();
        let mut query = SqlExpression::<Foo>::new(&resolvers, &SqlServerSqlBuilder);
        let err = query
            .where_(|f| f.id.eq(1_i64).and(f.bar.expr().call::<bool>("is_normalized", Vec::new())))
            .unwrap_err();
        assert_eq!(err, MapperError::UnsupportedMethod("is_normalized".into()));
        assert!(query.parameters().is_empty());
        assert!(!query.has_where());
    }
}
