//! Predicate tree to SQL translation.

use crate::dialect::SqlBuilder;
use crate::error::{MapperError, Result};
use crate::metadata::EntityMeta;
use crate::resolvers::Resolvers;
use crate::value::SqlValue;

use super::params::Parameters;
use super::{BinaryOp, Literal, Method, Node, PropertyRef, UnaryOp};

/// Result of visiting a node: SQL text, or a value not yet bound because
/// the parent decides how to render it (`is null`, `like` patterns,
/// `in` lists).
#[derive(Debug, Clone, PartialEq)]
enum Fragment {
    Sql(String),
    Value(SqlValue),
    List(Vec<SqlValue>),
}

/// Walks a predicate tree and renders it as a SQL condition.
///
/// Column names come from the resolvers, markers and patterns from the
/// dialect. Every value is bound into `parameters`; nothing is inlined.
pub struct SqlVisitor<'a> {
    resolvers: &'a Resolvers,
    dialect: &'a dyn SqlBuilder,
    entity: &'static EntityMeta,
    parameters: &'a mut Parameters,
}

impl<'a> SqlVisitor<'a> {
    /// Creates a visitor binding into `parameters`.
    pub fn new(
        resolvers: &'a Resolvers,
        dialect: &'a dyn SqlBuilder,
        entity: &'static EntityMeta,
        parameters: &'a mut Parameters,
    ) -> Self {
        Self {
            resolvers,
            dialect,
            entity,
            parameters,
        }
    }

    /// Renders `node` as a condition.
    ///
    /// A bare boolean property becomes `col = '1'` and a constant boolean
    /// becomes `1 = 1` or `1 = 0`.
    pub fn condition(&mut self, node: &Node) -> Result<String> {
        let node = node.unwrap_invoke();
        if let Node::Column(property) = node {
            if node.is_bool_column() {
                return Ok(format!("{} = '1'", self.column(property)?));
            }
        }
        match self.visit(node)? {
            Fragment::Sql(sql) => Ok(sql),
            Fragment::Value(SqlValue::Bool(true)) => Ok("1 = 1".to_string()),
            Fragment::Value(SqlValue::Bool(false)) => Ok("1 = 0".to_string()),
            other => Err(MapperError::UnsupportedExpression(format!(
                "{other:?} is not a condition"
            ))),
        }
    }

    fn visit(&mut self, node: &Node) -> Result<Fragment> {
        match node {
            Node::Column(property) => Ok(Fragment::Sql(self.column(property)?)),
            Node::Constant(literal) => Ok(Self::literal(literal.clone())),
            Node::Captured(captured) => Ok(Self::literal(captured.evaluate())),
            Node::Invoke(inner) => self.visit(inner),
            Node::Binary { op, left, right } => self.visit_binary(*op, left, right),
            Node::Unary { op, operand } => self.visit_unary(*op, operand),
            Node::Call {
                method,
                receiver,
                arguments,
            } => self.visit_call(*method, receiver, arguments),
        }
    }

    fn literal(literal: Literal) -> Fragment {
        match literal {
            Literal::Scalar(value) => Fragment::Value(value),
            Literal::List(values) => Fragment::List(values),
        }
    }

    fn column(&self, property: &PropertyRef) -> Result<String> {
        self.resolvers
            .column_by_name(self.entity, property.name, self.dialect)
    }

    fn bind(&mut self, value: SqlValue) -> String {
        let name = self.parameters.bind(value);
        self.dialect.prefix_parameter(&name)
    }

    /// Renders a fragment in operand position, binding values.
    fn operand(&mut self, fragment: Fragment) -> Result<String> {
        match fragment {
            Fragment::Sql(sql) => Ok(sql),
            Fragment::Value(value) => Ok(self.bind(value)),
            Fragment::List(_) => Err(MapperError::UnsupportedExpression(
                "a collection can only be used with contains".to_string(),
            )),
        }
    }

    fn visit_binary(&mut self, op: BinaryOp, left: &Node, right: &Node) -> Result<Fragment> {
        if op.is_logical() {
            return self.visit_logical(op, left, right);
        }
        let left = self.visit(left)?;
        let right = self.visit(right)?;
        if op.is_comparison() {
            return self.visit_comparison(op, left, right);
        }
        let left = self.operand(left)?;
        let right = self.operand(right)?;
        Ok(Fragment::Sql(match op {
            BinaryOp::Coalesce => format!("COALESCE({left}, {right})"),
            _ => format!("({left} {} {right})", op.sql()),
        }))
    }

    fn visit_logical(&mut self, op: BinaryOp, left: &Node, right: &Node) -> Result<Fragment> {
        let left = self.logical_operand(op, left)?;
        let right = self.logical_operand(op, right)?;
        Ok(Fragment::Sql(format!("{left} {} {right}", op.sql())))
    }

    /// Renders one side of `and` / `or`, grouping a nested operator of the
    /// other kind.
    fn logical_operand(&mut self, parent: BinaryOp, node: &Node) -> Result<String> {
        let node = node.unwrap_invoke();
        let sql = self.condition(node)?;
        match node {
            Node::Binary { op, .. } if op.is_logical() && *op != parent => Ok(format!("({sql})")),
            _ => Ok(sql),
        }
    }

    fn visit_comparison(
        &mut self,
        op: BinaryOp,
        left: Fragment,
        right: Fragment,
    ) -> Result<Fragment> {
        let null_test = match op {
            BinaryOp::Eq => Some("is null"),
            BinaryOp::NotEq => Some("is not null"),
            _ => None,
        };
        if let Some(test) = null_test {
            match (&left, &right) {
                (Fragment::Value(l), Fragment::Value(r)) if l.is_null() && r.is_null() => {
                    return Ok(Fragment::Value(SqlValue::Bool(op == BinaryOp::Eq)));
                }
                (Fragment::Sql(sql), Fragment::Value(value))
                | (Fragment::Value(value), Fragment::Sql(sql))
                    if value.is_null() =>
                {
                    return Ok(Fragment::Sql(format!("{sql} {test}")));
                }
                _ => {}
            }
        }
        let left = self.operand(left)?;
        let right = self.operand(right)?;
        Ok(Fragment::Sql(format!("{left} {} {right}", op.sql())))
    }

    fn visit_unary(&mut self, op: UnaryOp, operand: &Node) -> Result<Fragment> {
        let operand = operand.unwrap_invoke();
        match op {
            UnaryOp::Not => {
                if let Node::Column(property) = operand {
                    if operand.is_bool_column() {
                        return Ok(Fragment::Sql(format!("not ({} = '1')", self.column(property)?)));
                    }
                }
                match self.visit(operand)? {
                    Fragment::Sql(sql) => Ok(Fragment::Sql(format!("not ({sql})"))),
                    Fragment::Value(SqlValue::Bool(b)) => Ok(Fragment::Value(SqlValue::Bool(!b))),
                    other => Err(MapperError::UnsupportedExpression(format!(
                        "cannot negate {other:?}"
                    ))),
                }
            }
            UnaryOp::Negate => match self.visit(operand)? {
                Fragment::Sql(sql) => Ok(Fragment::Sql(format!("-{sql}"))),
                Fragment::Value(SqlValue::Int(n)) => n
                    .checked_neg()
                    .map(|n| Fragment::Value(SqlValue::Int(n)))
                    .ok_or_else(|| {
                        MapperError::UnsupportedExpression(format!("cannot negate {n}"))
                    }),
                Fragment::Value(SqlValue::Float(f)) => Ok(Fragment::Value(SqlValue::Float(-f))),
                other => Err(MapperError::UnsupportedExpression(format!(
                    "cannot negate {other:?}"
                ))),
            },
        }
    }

    fn visit_call(&mut self, method: Method, receiver: &Node, arguments: &[Node]) -> Result<Fragment> {
        match method {
            Method::Contains | Method::StartsWith | Method::EndsWith => {
                let [argument] = arguments else {
                    return Err(MapperError::UnsupportedExpression(format!(
                        "{} expects one argument, got {}",
                        method.name(),
                        arguments.len()
                    )));
                };
                match self.visit(receiver)? {
                    Fragment::List(values) if method == Method::Contains => {
                        self.visit_in(values, argument)
                    }
                    Fragment::Sql(column) => self.visit_like(method, column, argument),
                    other => Err(MapperError::UnsupportedExpression(format!(
                        "{} on {other:?}",
                        method.name()
                    ))),
                }
            }
            Method::ToString => match self.visit(receiver)? {
                Fragment::Sql(sql) => Ok(Fragment::Sql(format!("CAST({sql} AS CHAR)"))),
                Fragment::Value(value) => Ok(Fragment::Value(
                    value.to_text().map_or(SqlValue::Null, SqlValue::Text),
                )),
                Fragment::List(_) => Err(MapperError::UnsupportedExpression(
                    "to_string on a collection".to_string(),
                )),
            },
            Method::Other(name) => Err(MapperError::UnsupportedMethod(name.to_string())),
        }
    }

    fn visit_in(&mut self, values: Vec<SqlValue>, item: &Node) -> Result<Fragment> {
        let item = self.visit(item)?;
        let item = self.operand(item)?;
        if values.is_empty() {
            return Ok(Fragment::Sql(format!("{item} in (null)")));
        }
        let markers: Vec<String> = values.into_iter().map(|v| self.bind(v)).collect();
        Ok(Fragment::Sql(format!("{item} in ({})", markers.join(", "))))
    }

    fn visit_like(&mut self, method: Method, column: String, pattern: &Node) -> Result<Fragment> {
        let text = match self.visit(pattern)? {
            Fragment::Value(value) => value.to_text(),
            _ => None,
        };
        let Some(text) = text else {
            return Err(MapperError::UnsupportedExpression(format!(
                "{} expects a non-null text value",
                method.name()
            )));
        };
        let pattern = match method {
            Method::StartsWith => format!("{text}%"),
            Method::EndsWith => format!("%{text}"),
            _ => format!("%{text}%"),
        };
        let marker = self.bind(SqlValue::Text(pattern));
        Ok(Fragment::Sql(self.dialect.like_expression(&column, &marker)))
    }
}
