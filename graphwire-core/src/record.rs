//! Transport-neutral result rows.
//!
//! Both transports converge on [`Record`]: the REST transport builds records
//! from JSON row arrays, the Bolt transport from `neo4rs::Row`. Everything
//! downstream (derive-generated code, scalar projection) only sees this type.

use std::collections::HashMap;
use neo4rs::BoltType as Value;
use crate::error::GraphError;

/// One result row: ordered column names and their values.
#[derive(Debug, Clone, Default)]
pub struct Record {
    columns: Vec<String>,
    values: Vec<Value>,
}

impl Record {
    /// Build a record from parallel column and value lists.
    ///
    /// Returns [`GraphError::Mapping`] when the lengths differ.
    pub fn new(columns: Vec<String>, values: Vec<Value>) -> Result<Self, GraphError> {
        if columns.len() != values.len() {
            return Err(GraphError::Mapping(format!(
                "record has {} columns but {} values",
                columns.len(),
                values.len()
            )));
        }
        Ok(Self { columns, values })
    }

    /// Build a record from `(column, value)` pairs, keeping their order.
    pub fn from_pairs<K: Into<String>>(pairs: impl IntoIterator<Item = (K, Value)>) -> Self {
        let (columns, values) = pairs.into_iter().map(|(k, v)| (k.into(), v)).unzip();
        Self { columns, values }
    }

    /// Convert a Bolt row.
    ///
    /// Column order follows the row's own deserialized map, which is not
    /// guaranteed to match the `RETURN` clause; lookups are by name.
    pub fn from_neo4j_row(row: &neo4rs::Row) -> Result<Self, GraphError> {
        let map: HashMap<String, Value> = row
            .to()
            .map_err(|e| GraphError::Mapping(format!("bolt row: {e}")))?;
        Ok(Self::from_pairs(map))
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Look a column up by name: exact match first, then ASCII
    /// case-insensitive.
    pub fn get(&self, key: &str) -> Option<&Value> {
        let idx = self
            .columns
            .iter()
            .position(|c| c == key)
            .or_else(|| self.columns.iter().position(|c| c.eq_ignore_ascii_case(key)))?;
        self.values.get(idx)
    }

    /// The value of a single-column record.
    pub fn single(&self) -> Result<&Value, GraphError> {
        match self.values.as_slice() {
            [only] => Ok(only),
            _ => Err(GraphError::Mapping(format!(
                "expected exactly one column, found {} ({})",
                self.columns.len(),
                self.columns.join(", ")
            ))),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns.iter().map(String::as_str).zip(self.values.iter())
    }
}

/// Read a value from a [`Record`] by column name.
///
/// Returns `None` if the column does not exist in the record.
pub fn get_value(record: &Record, key: &str) -> Option<Value> {
    record.get(key).cloned()
}
