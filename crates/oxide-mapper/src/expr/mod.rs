//! Typed predicate expressions.
//!
//! Predicates are written against an entity's [`Fields`](crate::Entity::Fields)
//! handles and compile to an untyped [`Node`] tree:
//!
//! ```rust
//! use oxide_mapper::expr::{Node, Prop};
//! use oxide_mapper::prelude::*;
//! use oxide_mapper::PropertyType;
//!
//! struct Product;
//!
//! const PRICE: Prop<Product, f64> = Prop::new("Price", PropertyType::Float);
//! const NAME: Prop<Product, String> = Prop::new("Name", PropertyType::Text);
//!
//! let predicate = PRICE.gt(10.0) & NAME.starts_with("Widget");
//! assert!(matches!(predicate.node(), Node::Binary { .. }));
//! ```
//!
//! The type parameters keep predicates honest: comparing a `String`
//! property with an integer, or calling `contains` on a number, does not
//! compile. The tree itself is translated by [`SqlVisitor`].

mod builder;
mod params;
mod visitor;

use std::fmt;
use std::marker::PhantomData;
use std::ops;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};

use crate::metadata::PropertyType;
use crate::value::{SqlValue, ToSqlValue};

pub use builder::SqlExpression;
pub use params::Parameters;
pub use visitor::SqlVisitor;

/// A reference to a property of the predicate's entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyRef {
    /// Property name as declared on the entity.
    pub name: &'static str,
    /// Declared type.
    pub ty: PropertyType,
}

/// A literal value carried by the tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// A single value.
    Scalar(SqlValue),
    /// A collection, used by set membership.
    List(Vec<SqlValue>),
}

/// A closed-over value, evaluated when the predicate is compiled.
#[derive(Clone)]
pub struct Captured(Arc<dyn Fn() -> Literal + Send + Sync>);

impl Captured {
    /// Wraps an evaluation function.
    pub fn new(evaluate: impl Fn() -> Literal + Send + Sync + 'static) -> Self {
        Self(Arc::new(evaluate))
    }

    /// Evaluates the captured value.
    #[must_use]
    pub fn evaluate(&self) -> Literal {
        (self.0)()
    }
}

impl fmt::Debug for Captured {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Captured(..)")
    }
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// `=`
    Eq,
    /// `<>`
    NotEq,
    /// `<`
    Lt,
    /// `<=`
    LtEq,
    /// `>`
    Gt,
    /// `>=`
    GtEq,
    /// Logical `and`.
    And,
    /// Logical `or`.
    Or,
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// Remainder, rendered as `MOD`.
    Mod,
    /// First non-null operand, rendered as `COALESCE`.
    Coalesce,
}

impl BinaryOp {
    /// Returns `true` for `and` / `or`.
    #[must_use]
    pub const fn is_logical(self) -> bool {
        matches!(self, Self::And | Self::Or)
    }

    /// Returns `true` for the six comparison operators.
    #[must_use]
    pub const fn is_comparison(self) -> bool {
        matches!(
            self,
            Self::Eq | Self::NotEq | Self::Lt | Self::LtEq | Self::Gt | Self::GtEq
        )
    }

    /// Returns the SQL spelling of an infix operator.
    #[must_use]
    pub const fn sql(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::NotEq => "<>",
            Self::Lt => "<",
            Self::LtEq => "<=",
            Self::Gt => ">",
            Self::GtEq => ">=",
            Self::And => "and",
            Self::Or => "or",
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Mod => "MOD",
            Self::Coalesce => "COALESCE",
        }
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// Logical negation.
    Not,
    /// Numeric negation.
    Negate,
}

/// Methods callable inside a predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// Substring test on text, membership test on collections.
    Contains,
    /// Prefix test on text.
    StartsWith,
    /// Suffix test on text.
    EndsWith,
    /// Conversion to text.
    ToString,
    /// Any other method; has no SQL translation.
    Other(&'static str),
}

impl Method {
    /// Returns the method name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Contains => "contains",
            Self::StartsWith => "starts_with",
            Self::EndsWith => "ends_with",
            Self::ToString => "to_string",
            Self::Other(name) => name,
        }
    }
}

/// An untyped predicate tree node.
#[derive(Debug, Clone)]
pub enum Node {
    /// A property of the predicate's parameter.
    Column(PropertyRef),
    /// A literal.
    Constant(Literal),
    /// A closed-over value.
    Captured(Captured),
    /// A binary operation.
    Binary {
        /// The operator.
        op: BinaryOp,
        /// Left operand.
        left: Box<Node>,
        /// Right operand.
        right: Box<Node>,
    },
    /// A unary operation.
    Unary {
        /// The operator.
        op: UnaryOp,
        /// The operand.
        operand: Box<Node>,
    },
    /// A method call.
    Call {
        /// The method.
        method: Method,
        /// The receiver (the collection for set membership).
        receiver: Box<Node>,
        /// The arguments.
        arguments: Vec<Node>,
    },
    /// Invocation of a composed expression.
    Invoke(Box<Node>),
}

impl Node {
    /// Strips any number of [`Node::Invoke`] wrappers.
    #[must_use]
    pub fn unwrap_invoke(&self) -> &Self {
        let mut node = self;
        while let Self::Invoke(inner) = node {
            node = inner;
        }
        node
    }

    /// Returns `true` for a boolean property used as a condition.
    #[must_use]
    pub fn is_bool_column(&self) -> bool {
        matches!(
            self.unwrap_invoke(),
            Self::Column(PropertyRef {
                ty: PropertyType::Bool,
                ..
            })
        )
    }

    fn binary(op: BinaryOp, left: Self, right: Self) -> Self {
        Self::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }
}

/// A typed expression over entity `E` producing a `T`.
pub struct Expr<E, T> {
    node: Node,
    _marker: PhantomData<fn() -> (E, T)>,
}

impl<E, T> Clone for Expr<E, T> {
    fn clone(&self) -> Self {
        Self::from_node(self.node.clone())
    }
}

impl<E, T> fmt::Debug for Expr<E, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Expr").field(&self.node).finish()
    }
}

impl<E, T> Expr<E, T> {
    /// Wraps an untyped node. The caller vouches for the type.
    #[must_use]
    pub const fn from_node(node: Node) -> Self {
        Self {
            node,
            _marker: PhantomData,
        }
    }

    /// Returns the untyped node.
    #[must_use]
    pub const fn node(&self) -> &Node {
        &self.node
    }

    /// Consumes the expression into its untyped node.
    #[must_use]
    pub fn into_node(self) -> Node {
        self.node
    }

    /// Calls a method that has no SQL translation. Compiling the result
    /// fails with [`MapperError::UnsupportedMethod`](crate::MapperError).
    #[must_use]
    pub fn call<R>(self, method: &'static str, arguments: Vec<Node>) -> Expr<E, R> {
        Expr::from_node(Node::Call {
            method: Method::Other(method),
            receiver: Box::new(self.node),
            arguments,
        })
    }
}

/// A typed handle to a property of entity `E` with Rust type `T`.
///
/// Handles are what the derive puts in an entity's `Fields` struct; they
/// are `Copy` so a predicate can mention a property more than once.
pub struct Prop<E, T> {
    property: PropertyRef,
    _marker: PhantomData<fn() -> (E, T)>,
}

impl<E, T> Clone for Prop<E, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E, T> Copy for Prop<E, T> {}

impl<E, T> fmt::Debug for Prop<E, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Prop").field(&self.property.name).finish()
    }
}

impl<E, T> Prop<E, T> {
    /// Creates a property handle.
    #[must_use]
    pub const fn new(name: &'static str, ty: PropertyType) -> Self {
        Self {
            property: PropertyRef { name, ty },
            _marker: PhantomData,
        }
    }

    /// Returns the property name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.property.name
    }

    /// Returns the untyped property reference.
    #[must_use]
    pub const fn property(&self) -> PropertyRef {
        self.property
    }

    /// Turns the handle into an expression.
    #[must_use]
    pub const fn expr(self) -> Expr<E, T> {
        Expr::from_node(Node::Column(self.property))
    }
}

/// Conversion into a typed expression.
pub trait IntoExpr<E, T> {
    /// Performs the conversion.
    fn into_expr(self) -> Expr<E, T>;
}

impl<E, T> IntoExpr<E, T> for Expr<E, T> {
    fn into_expr(self) -> Self {
        self
    }
}

impl<E, T> IntoExpr<E, T> for Prop<E, T> {
    fn into_expr(self) -> Expr<E, T> {
        self.expr()
    }
}

fn scalar<E, T>(value: impl ToSqlValue) -> Expr<E, T> {
    Expr::from_node(Node::Constant(Literal::Scalar(value.to_sql_value())))
}

macro_rules! impl_scalar_expr {
    ($($ty:ty),+) => {
        $(
            impl<E> IntoExpr<E, $ty> for $ty {
                fn into_expr(self) -> Expr<E, $ty> {
                    scalar(self)
                }
            }

            impl<E> IntoExpr<E, Option<$ty>> for $ty {
                fn into_expr(self) -> Expr<E, Option<$ty>> {
                    scalar(self)
                }
            }
        )+
    };
}

impl_scalar_expr!(
    bool,
    i8,
    i16,
    i32,
    i64,
    u8,
    u16,
    u32,
    f32,
    f64,
    String,
    Vec<u8>,
    NaiveDate,
    NaiveDateTime
);

impl<E> IntoExpr<E, String> for &str {
    fn into_expr(self) -> Expr<E, String> {
        scalar(self)
    }
}

impl<E> IntoExpr<E, Option<String>> for &str {
    fn into_expr(self) -> Expr<E, Option<String>> {
        scalar(self)
    }
}

impl<E, T: ToSqlValue> IntoExpr<E, Option<T>> for Option<T> {
    fn into_expr(self) -> Expr<E, Option<T>> {
        scalar(self)
    }
}

/// Creates a constant expression.
#[must_use]
pub fn value<E, T: ToSqlValue>(value: T) -> Expr<E, T> {
    scalar(value)
}

/// Creates a closed-over value, evaluated each time the predicate is
/// compiled rather than treated as a column.
pub fn captured<E, T, F>(evaluate: F) -> Expr<E, T>
where
    T: ToSqlValue,
    F: Fn() -> T + Send + Sync + 'static,
{
    Expr::from_node(Node::Captured(Captured::new(move || {
        Literal::Scalar(evaluate().to_sql_value())
    })))
}

/// Creates a constant collection for set membership tests.
pub fn list<E, T: ToSqlValue>(values: impl IntoIterator<Item = T>) -> Expr<E, Vec<T>> {
    Expr::from_node(Node::Constant(Literal::List(
        values.into_iter().map(ToSqlValue::to_sql_value).collect(),
    )))
}

/// Creates a closed-over collection, evaluated at compile time.
pub fn captured_list<E, T, F>(evaluate: F) -> Expr<E, Vec<T>>
where
    T: ToSqlValue,
    F: Fn() -> Vec<T> + Send + Sync + 'static,
{
    Expr::from_node(Node::Captured(Captured::new(move || {
        Literal::List(evaluate().into_iter().map(ToSqlValue::to_sql_value).collect())
    })))
}

/// Invokes a composed expression; the visitor looks straight through it.
pub fn invoke<E, T>(inner: impl IntoExpr<E, T>) -> Expr<E, T> {
    Expr::from_node(Node::Invoke(Box::new(inner.into_expr().into_node())))
}

fn compare<E, T>(
    left: impl IntoExpr<E, T>,
    op: BinaryOp,
    right: impl IntoExpr<E, T>,
) -> Expr<E, bool> {
    Expr::from_node(Node::binary(
        op,
        left.into_expr().into_node(),
        right.into_expr().into_node(),
    ))
}

/// Comparison operators, available on every expression and property.
pub trait ExprOps<E, T>: IntoExpr<E, T> + Sized {
    /// `self = rhs` (`is null` when `rhs` is null).
    fn eq(self, rhs: impl IntoExpr<E, T>) -> Expr<E, bool> {
        compare(self, BinaryOp::Eq, rhs)
    }

    /// `self <> rhs` (`is not null` when `rhs` is null).
    fn not_eq(self, rhs: impl IntoExpr<E, T>) -> Expr<E, bool> {
        compare(self, BinaryOp::NotEq, rhs)
    }

    /// `self < rhs`
    fn lt(self, rhs: impl IntoExpr<E, T>) -> Expr<E, bool> {
        compare(self, BinaryOp::Lt, rhs)
    }

    /// `self <= rhs`
    fn lt_eq(self, rhs: impl IntoExpr<E, T>) -> Expr<E, bool> {
        compare(self, BinaryOp::LtEq, rhs)
    }

    /// `self > rhs`
    fn gt(self, rhs: impl IntoExpr<E, T>) -> Expr<E, bool> {
        compare(self, BinaryOp::Gt, rhs)
    }

    /// `self >= rhs`
    fn gt_eq(self, rhs: impl IntoExpr<E, T>) -> Expr<E, bool> {
        compare(self, BinaryOp::GtEq, rhs)
    }

    /// Converts the value to text (`CAST(... AS CHAR)`).
    fn to_text(self) -> Expr<E, String> {
        Expr::from_node(Node::Call {
            method: Method::ToString,
            receiver: Box::new(self.into_expr().into_node()),
            arguments: Vec::new(),
        })
    }
}

impl<E, T> ExprOps<E, T> for Expr<E, T> {}
impl<E, T> ExprOps<E, T> for Prop<E, T> {}

/// Boolean composition.
pub trait BoolOps<E>: IntoExpr<E, bool> + Sized {
    /// `self and rhs`
    fn and(self, rhs: impl IntoExpr<E, bool>) -> Expr<E, bool> {
        compare(self, BinaryOp::And, rhs)
    }

    /// `self or rhs`
    fn or(self, rhs: impl IntoExpr<E, bool>) -> Expr<E, bool> {
        compare(self, BinaryOp::Or, rhs)
    }
}

impl<E> BoolOps<E> for Expr<E, bool> {}
impl<E> BoolOps<E> for Prop<E, bool> {}

/// Marker for text types.
pub trait Text {}
impl Text for String {}
impl Text for Option<String> {}

/// Marker for numeric types.
pub trait Numeric {}

macro_rules! impl_numeric {
    ($($ty:ty),+) => {
        $(
            impl Numeric for $ty {}
            impl Numeric for Option<$ty> {}
        )+
    };
}

impl_numeric!(i8, i16, i32, i64, u8, u16, u32, f32, f64);

fn text_call<E, T>(receiver: impl IntoExpr<E, T>, method: Method, pattern: Expr<E, String>) -> Expr<E, bool> {
    Expr::from_node(Node::Call {
        method,
        receiver: Box::new(receiver.into_expr().into_node()),
        arguments: vec![pattern.into_node()],
    })
}

/// Pattern tests on text properties, compiled to the dialect's
/// case-insensitive `like`.
pub trait TextOps<E, T: Text>: IntoExpr<E, T> + Sized {
    /// Substring test.
    fn contains(self, needle: impl IntoExpr<E, String>) -> Expr<E, bool> {
        text_call(self, Method::Contains, needle.into_expr())
    }

    /// Prefix test.
    fn starts_with(self, prefix: impl IntoExpr<E, String>) -> Expr<E, bool> {
        text_call(self, Method::StartsWith, prefix.into_expr())
    }

    /// Suffix test.
    fn ends_with(self, suffix: impl IntoExpr<E, String>) -> Expr<E, bool> {
        text_call(self, Method::EndsWith, suffix.into_expr())
    }
}

impl<E, T: Text> TextOps<E, T> for Expr<E, T> {}
impl<E, T: Text> TextOps<E, T> for Prop<E, T> {}

/// Null handling on optional values.
pub trait NullableOps<E, T>: IntoExpr<E, Option<T>> + Sized {
    /// `COALESCE(self, fallback)`
    fn coalesce(self, fallback: impl IntoExpr<E, T>) -> Expr<E, T> {
        Expr::from_node(Node::binary(
            BinaryOp::Coalesce,
            self.into_expr().into_node(),
            fallback.into_expr().into_node(),
        ))
    }
}

impl<E, T> NullableOps<E, T> for Expr<E, Option<T>> {}
impl<E, T> NullableOps<E, T> for Prop<E, Option<T>> {}

impl<E, T> Expr<E, Vec<T>> {
    /// Set membership: `item in (...)`.
    pub fn contains(self, item: impl IntoExpr<E, T>) -> Expr<E, bool> {
        Expr::from_node(Node::Call {
            method: Method::Contains,
            receiver: Box::new(self.node),
            arguments: vec![item.into_expr().into_node()],
        })
    }
}

macro_rules! impl_bool_operators {
    ($ty:ident) => {
        impl<E> ops::Not for $ty<E, bool> {
            type Output = Expr<E, bool>;

            fn not(self) -> Expr<E, bool> {
                Expr::from_node(Node::Unary {
                    op: UnaryOp::Not,
                    operand: Box::new(self.into_expr().into_node()),
                })
            }
        }

        impl<E, R: IntoExpr<E, bool>> ops::BitAnd<R> for $ty<E, bool> {
            type Output = Expr<E, bool>;

            fn bitand(self, rhs: R) -> Expr<E, bool> {
                self.and(rhs)
            }
        }

        impl<E, R: IntoExpr<E, bool>> ops::BitOr<R> for $ty<E, bool> {
            type Output = Expr<E, bool>;

            fn bitor(self, rhs: R) -> Expr<E, bool> {
                self.or(rhs)
            }
        }
    };
}

impl_bool_operators!(Expr);
impl_bool_operators!(Prop);

macro_rules! impl_arithmetic {
    ($ty:ident, $($trait:ident :: $method:ident => $op:ident),+) => {
        $(
            impl<E, T: Numeric, R: IntoExpr<E, T>> ops::$trait<R> for $ty<E, T> {
                type Output = Expr<E, T>;

                fn $method(self, rhs: R) -> Expr<E, T> {
                    Expr::from_node(Node::binary(
                        BinaryOp::$op,
                        self.into_expr().into_node(),
                        rhs.into_expr().into_node(),
                    ))
                }
            }
        )+

        impl<E, T: Numeric> ops::Neg for $ty<E, T> {
            type Output = Expr<E, T>;

            fn neg(self) -> Expr<E, T> {
                Expr::from_node(Node::Unary {
                    op: UnaryOp::Negate,
                    operand: Box::new(self.into_expr().into_node()),
                })
            }
        }
    };
}

impl_arithmetic!(Expr, Add::add => Add, Sub::sub => Sub, Mul::mul => Mul, Div::div => Div, Rem::rem => Mod);
impl_arithmetic!(Prop, Add::add => Add, Sub::sub => Sub, Mul::mul => Mul, Div::div => Div, Rem::rem => Mod);

/// Property selections for `select` and `order_by`.
///
/// Implemented for single properties and tuples of properties.
pub trait Selection<E> {
    /// Returns the selected properties in order.
    fn properties(&self) -> Vec<PropertyRef>;
}

impl<E, T> Selection<E> for Prop<E, T> {
    fn properties(&self) -> Vec<PropertyRef> {
        vec![self.property]
    }
}

macro_rules! impl_selection_tuple {
    ($($idx:tt: $ty:ident),+) => {
        impl<E, $($ty),+> Selection<E> for ($(Prop<E, $ty>,)+) {
            fn properties(&self) -> Vec<PropertyRef> {
                vec![$(self.$idx.property),+]
            }
        }
    };
}

impl_selection_tuple!(0: T0);
impl_selection_tuple!(0: T0, 1: T1);
impl_selection_tuple!(0: T0, 1: T1, 2: T2);
impl_selection_tuple!(0: T0, 1: T1, 2: T2, 3: T3);
impl_selection_tuple!(0: T0, 1: T1, 2: T2, 3: T3, 4: T4);
impl_selection_tuple!(0: T0, 1: T1, 2: T2, 3: T3, 4: T4, 5: T5);
impl_selection_tuple!(0: T0, 1: T1, 2: T2, 3: T3, 4: T4, 5: T5, 6: T6);
impl_selection_tuple!(0: T0, 1: T1, 2: T2, 3: T3, 4: T4, 5: T5, 6: T6, 7: T7);
