//! Field maps and row filters passed into the provider

use crate::contract;
use rusqlite::types::Value;
use std::collections::BTreeMap;

/// Column name to value map used for inserts and updates.
///
/// A key mapped to [`Value::Null`] is distinct from a missing key: the
/// provider rejects an explicit null name but accepts a missing channel id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContentValues {
    values: BTreeMap<String, Value>,
}

impl ContentValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a column, replacing any previous value
    pub fn put(&mut self, column: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.values.insert(column.into(), value.into());
        self
    }

    /// Set a column to SQL NULL
    pub fn put_null(&mut self, column: impl Into<String>) -> &mut Self {
        self.values.insert(column.into(), Value::Null);
        self
    }

    pub fn remove(&mut self, column: &str) -> Option<Value> {
        self.values.remove(column)
    }

    pub fn contains_key(&self, column: &str) -> bool {
        self.values.contains_key(column)
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.values.get(column)
    }

    /// Value as a string; integers and reals are formatted, null and blobs are `None`
    pub fn get_as_string(&self, column: &str) -> Option<String> {
        match self.values.get(column)? {
            Value::Text(s) => Some(s.clone()),
            Value::Integer(i) => Some(i.to_string()),
            Value::Real(f) => Some(f.to_string()),
            Value::Null | Value::Blob(_) => None,
        }
    }

    /// Value as an integer; text is parsed after trimming, anything else is `None`
    pub fn get_as_integer(&self, column: &str) -> Option<i64> {
        match self.values.get(column)? {
            Value::Integer(i) => Some(*i),
            Value::Text(s) => s.trim().parse().ok(),
            Value::Real(_) | Value::Null | Value::Blob(_) => None,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// A `WHERE` clause with `?` placeholders and the values bound to them.
///
/// The clause is a SQL fragment supplied by the caller and is passed to
/// SQLite as written; only the arguments are bound.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    clause: Option<String>,
    args: Vec<Value>,
}

impl Selection {
    /// No filter: every row
    pub fn all() -> Self {
        Self::default()
    }

    pub fn new(clause: impl Into<String>) -> Self {
        Self {
            clause: Some(clause.into()),
            args: Vec::new(),
        }
    }

    /// `_id = ?` bound to `id`
    pub fn by_id(id: i64) -> Self {
        Self::new(format!("{} = ?", contract::COLUMN_ID)).arg(id)
    }

    /// Bind the next `?` placeholder
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.args.push(value.into());
        self
    }

    pub fn clause(&self) -> Option<&str> {
        self.clause.as_deref()
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }
}
