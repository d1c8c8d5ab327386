//! Query results
//!
//! A [`Cursor`] is a fully materialized row set tagged with the URI it was
//! queried through, so observers know which notifications invalidate it.

use crate::contract::{COLUMN_CHANNEL_ID, COLUMN_ID, COLUMN_NAME};
use crate::uri::ChannelUri;
use crate::{Error, Result};
use rusqlite::types::Value;
use serde::ser::{SerializeSeq, Serializer};
use serde::{Deserialize, Serialize};

/// One row of the channels table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    /// Row id (`_id`)
    pub id: i64,
    pub name: String,
    pub channel_id: i64,
}

impl Channel {
    /// Content URI addressing this row
    pub fn uri(&self) -> ChannelUri {
        crate::contract::channel_uri(self.id)
    }
}

/// Row set returned by a provider query
#[derive(Debug, Clone, Default)]
pub struct Cursor {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
    notification_uri: Option<ChannelUri>,
}

impl Cursor {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self {
            columns,
            rows,
            notification_uri: None,
        }
    }

    /// Tag the cursor with the URI whose changes make it stale
    pub fn set_notification_uri(&mut self, uri: ChannelUri) {
        self.notification_uri = Some(uri);
    }

    pub fn notification_uri(&self) -> Option<&ChannelUri> {
        self.notification_uri.as_ref()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    /// Value at `row` in the named column
    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let index = self.column_index(column)?;
        self.rows.get(row)?.get(index)
    }

    /// Map every row to a [`Channel`]; the cursor must carry all three columns
    pub fn channels(&self) -> Result<Vec<Channel>> {
        let index = |name: &str| {
            self.column_index(name)
                .ok_or_else(|| Error::InvalidArgument(format!("cursor has no column {}", name)))
        };
        let (id_idx, name_idx, channel_idx) = (index(COLUMN_ID)?, index(COLUMN_NAME)?, index(COLUMN_CHANNEL_ID)?);

        self.rows
            .iter()
            .map(|row| {
                Ok(Channel {
                    id: integer_at(row, id_idx, COLUMN_ID)?,
                    name: match cell(row, name_idx, COLUMN_NAME)? {
                        Value::Text(s) => s.clone(),
                        other => return Err(type_mismatch(COLUMN_NAME, other)),
                    },
                    channel_id: integer_at(row, channel_idx, COLUMN_CHANNEL_ID)?,
                })
            })
            .collect()
    }
}

fn cell<'a>(row: &'a [Value], index: usize, column: &str) -> Result<&'a Value> {
    row.get(index)
        .ok_or_else(|| Error::InvalidArgument(format!("row has no value for column {}", column)))
}

fn integer_at(row: &[Value], index: usize, column: &str) -> Result<i64> {
    match cell(row, index, column)? {
        Value::Integer(i) => Ok(*i),
        other => Err(type_mismatch(column, other)),
    }
}

fn type_mismatch(column: &str, value: &Value) -> Error {
    Error::InvalidArgument(format!("unexpected {:?} in column {}", value.data_type(), column))
}

/// Convert a SQLite value to JSON (blobs become arrays of bytes)
pub fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Integer(i) => serde_json::Value::from(*i),
        Value::Real(f) => serde_json::Value::from(*f),
        Value::Text(s) => serde_json::Value::from(s.as_str()),
        Value::Blob(b) => serde_json::Value::from(b.clone()),
    }
}

/// Serializes as a list of `{column: value}` objects
impl Serialize for Cursor {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(self.rows.len()))?;
        for row in &self.rows {
            let object: serde_json::Map<String, serde_json::Value> = self
                .columns
                .iter()
                .cloned()
                .zip(row.iter().map(value_to_json))
                .collect();
            seq.serialize_element(&object)?;
        }
        seq.end()
    }
}
