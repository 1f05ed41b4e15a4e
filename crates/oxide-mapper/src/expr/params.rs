//! Bound parameter collection.

use crate::value::SqlValue;

/// Parameters bound while compiling predicates, in binding order.
///
/// Names are `p1`, `p2`, ... without the dialect prefix; the SQL text
/// references them through [`SqlBuilder::prefix_parameter`](crate::SqlBuilder::prefix_parameter).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Parameters {
    values: Vec<(String, SqlValue)>,
}

impl Parameters {
    /// Creates an empty parameter list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `value` under the next free name and returns that name.
    pub fn bind(&mut self, value: SqlValue) -> String {
        let name = format!("p{}", self.values.len() + 1);
        self.values.push((name.clone(), value));
        name
    }

    /// Looks up a bound value by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&SqlValue> {
        self.values
            .iter()
            .find(|(bound, _)| bound == name)
            .map(|(_, value)| value)
    }

    /// Iterates over `(name, value)` pairs in binding order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SqlValue)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Number of bound parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` when nothing is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Consumes the list into its pairs.
    #[must_use]
    pub fn into_vec(self) -> Vec<(String, SqlValue)> {
        self.values
    }

    /// Drops everything bound after the first `len` parameters.
    pub(crate) fn truncate(&mut self, len: usize) {
        self.values.truncate(len);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_increase() {
        let mut params = Parameters::new();
        assert_eq!(params.bind(SqlValue::Int(1)), "p1");
        assert_eq!(params.bind(SqlValue::Text("a".into())), "p2");
        assert_eq!(params.get("p2"), Some(&SqlValue::Text("a".into())));
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_truncate_rewinds_names() {
        let mut params = Parameters::new();
        params.bind(SqlValue::Int(1));
        params.bind(SqlValue::Int(2));
        params.truncate(1);
        assert_eq!(params.bind(SqlValue::Int(3)), "p2");
        let names: Vec<&str> = params.iter().map(|(name, _)| name).collect();
        assert_eq!(names, ["p1", "p2"]);
    }
}
