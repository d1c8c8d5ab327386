//! SQLite storage implementation

use std::path::{Path, PathBuf};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, Transaction};
use crate::cursor::Cursor;
use crate::values::{ContentValues, Selection};
use crate::{Error, Result};
use super::schema;

/// How the caller intends to use the database handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Writes are refused (`PRAGMA query_only`)
    Read,
    Write,
}

#[derive(Debug, Clone)]
enum Location {
    File(PathBuf),
    Memory,
}

/// Owner of the channels database file.
///
/// The connection is opened lazily on the first call to
/// [`DbHelper::database`]; creating the file, the table and recording the
/// schema version all happen then.
pub struct DbHelper {
    location: Location,
    conn: Option<Connection>,
}

impl DbHelper {
    /// Helper for a database file (created on first use if missing)
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            location: Location::File(path.into()),
            conn: None,
        }
    }

    /// Helper for an in-memory database (for testing)
    pub fn in_memory() -> Self {
        Self {
            location: Location::Memory,
            conn: None,
        }
    }

    /// Path of the database file, `None` for in-memory databases
    pub fn path(&self) -> Option<&Path> {
        match &self.location {
            Location::File(path) => Some(path),
            Location::Memory => None,
        }
    }

    /// Whether the connection has been opened yet
    pub fn is_open(&self) -> bool {
        self.conn.is_some()
    }

    /// Get a handle to the database, opening and initializing it if needed
    pub fn database(&mut self, mode: OpenMode) -> Result<&Connection> {
        let conn = match self.conn.take() {
            Some(conn) => conn,
            None => Self::open_connection(&self.location)?,
        };
        let conn = &*self.conn.insert(conn);
        conn.pragma_update(None, "query_only", mode == OpenMode::Read)?;
        Ok(conn)
    }

    /// Drop the connection; the next [`DbHelper::database`] call reopens it
    pub fn close(&mut self) {
        self.conn = None;
    }

    fn open_connection(location: &Location) -> Result<Connection> {
        let conn = match location {
            Location::File(path) => {
                if let Some(parent) = path.parent() {
                    if !parent.as_os_str().is_empty() && !parent.exists() {
                        std::fs::create_dir_all(parent)?;
                    }
                }
                tracing::debug!("opening database {}", path.display());
                Connection::open(path)?
            }
            Location::Memory => Connection::open_in_memory()?,
        };

        let version: i32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
        if version == schema::DATABASE_VERSION {
            return Ok(conn);
        }
        if version > schema::DATABASE_VERSION {
            return Err(Error::Downgrade {
                found: version,
                supported: schema::DATABASE_VERSION,
            });
        }

        let tx = conn.unchecked_transaction()?;
        if version == 0 {
            Self::on_create(&tx)?;
        } else {
            Self::on_upgrade(&tx, version, schema::DATABASE_VERSION)?;
        }
        tx.pragma_update(None, "user_version", schema::DATABASE_VERSION)?;
        tx.commit()?;

        Ok(conn)
    }

    /// Called once when the database has no schema yet
    fn on_create(tx: &Transaction<'_>) -> Result<()> {
        for stmt in schema::all_schema_statements() {
            tx.execute(&stmt, [])?;
        }
        tracing::info!("created channels schema (version {})", schema::DATABASE_VERSION);
        Ok(())
    }

    /// Called when the stored schema version is older than the current one.
    ///
    /// There has only ever been one schema version, so there is nothing to
    /// migrate yet. A schema change must add its migration here.
    fn on_upgrade(_tx: &Transaction<'_>, old_version: i32, new_version: i32) -> Result<()> {
        tracing::warn!(old_version, new_version, "no migration registered, leaving schema unchanged");
        Ok(())
    }

    // ========== Statement Helpers ==========
    //
    // Table and column names are interpolated into SQL and must come from
    // the contract. Selection clauses and sort orders are caller SQL and
    // are passed through; every value is bound as a parameter.

    /// `SELECT columns FROM table [WHERE ..] [ORDER BY ..]`
    pub fn query(
        &mut self,
        table: &str,
        columns: &[&str],
        selection: &Selection,
        sort_order: Option<&str>,
    ) -> Result<Cursor> {
        let mut sql = format!("SELECT {} FROM {}", columns.join(", "), table);
        push_where(&mut sql, selection);
        if let Some(order) = sort_order.filter(|o| !o.trim().is_empty()) {
            sql.push_str(" ORDER BY ");
            sql.push_str(order);
        }
        tracing::debug!(%sql, "query");

        let conn = self.database(OpenMode::Read)?;
        let mut stmt = conn.prepare(&sql)?;
        let width = stmt.column_count();
        let names = stmt.column_names().into_iter().map(String::from).collect();

        let rows = stmt
            .query_map(params_from_iter(selection.args()), |row| {
                (0..width)
                    .map(|i| row.get::<_, Value>(i))
                    .collect::<rusqlite::Result<Vec<Value>>>()
            })?
            .collect::<rusqlite::Result<Vec<Vec<Value>>>>()?;

        Ok(Cursor::new(names, rows))
    }

    /// `INSERT INTO table (..) VALUES (..)`, returning the new row id
    pub fn insert(&mut self, table: &str, values: &ContentValues) -> Result<i64> {
        let sql = if values.is_empty() {
            format!("INSERT INTO {} DEFAULT VALUES", table)
        } else {
            let columns: Vec<&str> = values.keys().collect();
            let placeholders = vec!["?"; columns.len()].join(", ");
            format!("INSERT INTO {} ({}) VALUES ({})", table, columns.join(", "), placeholders)
        };
        tracing::debug!(%sql, "insert");

        let conn = self.database(OpenMode::Write)?;
        conn.execute(&sql, params_from_iter(values.iter().map(|(_, v)| v)))?;
        Ok(conn.last_insert_rowid())
    }

    /// `UPDATE table SET .. [WHERE ..]`, returning the number of rows changed
    pub fn update(&mut self, table: &str, values: &ContentValues, selection: &Selection) -> Result<usize> {
        if values.is_empty() {
            return Ok(0);
        }

        let assignments: Vec<String> = values.keys().map(|c| format!("{} = ?", c)).collect();
        let mut sql = format!("UPDATE {} SET {}", table, assignments.join(", "));
        push_where(&mut sql, selection);
        tracing::debug!(%sql, "update");

        let args = values.iter().map(|(_, v)| v).chain(selection.args());
        let conn = self.database(OpenMode::Write)?;
        Ok(conn.execute(&sql, params_from_iter(args))?)
    }

    /// `DELETE FROM table [WHERE ..]`, returning the number of rows removed
    pub fn delete(&mut self, table: &str, selection: &Selection) -> Result<usize> {
        let mut sql = format!("DELETE FROM {}", table);
        push_where(&mut sql, selection);
        tracing::debug!(%sql, "delete");

        let conn = self.database(OpenMode::Write)?;
        Ok(conn.execute(&sql, params_from_iter(selection.args()))?)
    }

    /// Count rows in a table
    pub fn count(&mut self, table: &str) -> Result<usize> {
        let conn = self.database(OpenMode::Read)?;
        let count: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

fn push_where(sql: &mut String, selection: &Selection) {
    if let Some(clause) = selection.clause().filter(|c| !c.trim().is_empty()) {
        sql.push_str(" WHERE ");
        sql.push_str(clause);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::TABLE_NAME;

    fn channel(name: &str, channel_id: i64) -> ContentValues {
        let mut values = ContentValues::new();
        values.put("name", name.to_string()).put("channel_id", channel_id);
        values
    }

    #[test]
    fn test_lazy_open() {
        let mut helper = DbHelper::in_memory();
        assert!(!helper.is_open());
        helper.database(OpenMode::Read).unwrap();
        assert!(helper.is_open());
    }

    #[test]
    fn test_schema_version_recorded() {
        let mut helper = DbHelper::in_memory();
        let conn = helper.database(OpenMode::Write).unwrap();
        let version: i32 = conn.pragma_query_value(None, "user_version", |row| row.get(0)).unwrap();
        assert_eq!(version, schema::DATABASE_VERSION);
    }

    #[test]
    fn test_insert_query_update_delete() {
        let mut helper = DbHelper::in_memory();

        let first = helper.insert(TABLE_NAME, &channel("News", 9)).unwrap();
        let second = helper.insert(TABLE_NAME, &channel("Sport", 3)).unwrap();
        assert_eq!((first, second), (1, 2));

        let cursor = helper
            .query(TABLE_NAME, &["_id", "name", "channel_id"], &Selection::all(), Some("_id DESC"))
            .unwrap();
        let channels = cursor.channels().unwrap();
        assert_eq!(channels[0].name, "Sport");
        assert_eq!(channels[1].channel_id, 9);

        let mut patch = ContentValues::new();
        patch.put("channel_id", 42);
        assert_eq!(helper.update(TABLE_NAME, &patch, &Selection::by_id(first)).unwrap(), 1);
        assert_eq!(helper.update(TABLE_NAME, &ContentValues::new(), &Selection::all()).unwrap(), 0);

        let cursor = helper
            .query(TABLE_NAME, &["channel_id"], &Selection::by_id(first), None)
            .unwrap();
        assert_eq!(cursor.get(0, "channel_id"), Some(&Value::Integer(42)));

        assert_eq!(helper.delete(TABLE_NAME, &Selection::new("channel_id > ?").arg(10)).unwrap(), 1);
        assert_eq!(helper.count(TABLE_NAME).unwrap(), 1);
    }

    #[test]
    fn test_channel_id_defaults_to_zero() {
        let mut helper = DbHelper::in_memory();
        let mut values = ContentValues::new();
        values.put("name", "Plain".to_string());
        let id = helper.insert(TABLE_NAME, &values).unwrap();

        let cursor = helper.query(TABLE_NAME, &["channel_id"], &Selection::by_id(id), None).unwrap();
        assert_eq!(cursor.get(0, "channel_id"), Some(&Value::Integer(0)));
    }

    #[test]
    fn test_not_null_name_enforced_by_engine() {
        let mut helper = DbHelper::in_memory();
        let mut values = ContentValues::new();
        values.put_null("name");
        assert!(matches!(helper.insert(TABLE_NAME, &values), Err(Error::Storage(_))));
    }

    #[test]
    fn test_read_mode_refuses_writes() {
        let mut helper = DbHelper::in_memory();
        let conn = helper.database(OpenMode::Read).unwrap();
        assert!(conn.execute("INSERT INTO channels (name) VALUES ('x')", []).is_err());

        let conn = helper.database(OpenMode::Write).unwrap();
        assert_eq!(conn.execute("INSERT INTO channels (name) VALUES ('x')", []).unwrap(), 1);
    }

    #[test]
    fn test_reopen_keeps_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(schema::DATABASE_NAME);

        let mut helper = DbHelper::new(&path);
        helper.insert(TABLE_NAME, &channel("Kept", 1)).unwrap();
        helper.close();
        assert!(path.exists());

        let mut reopened = DbHelper::new(&path);
        assert_eq!(reopened.count(TABLE_NAME).unwrap(), 1);
    }

    #[test]
    fn test_unversioned_existing_table_is_adopted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(schema::DATABASE_NAME);
        {
            let conn = Connection::open(&path).unwrap();
            for stmt in schema::all_schema_statements() {
                conn.execute(&stmt, []).unwrap();
            }
            conn.execute("INSERT INTO channels (name) VALUES ('legacy')", []).unwrap();
        }

        // user_version 0 with an existing table: creation is idempotent
        let mut helper = DbHelper::new(&path);
        assert_eq!(helper.count(TABLE_NAME).unwrap(), 1);
    }

    #[test]
    fn test_newer_version_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(schema::DATABASE_NAME);
        {
            let conn = Connection::open(&path).unwrap();
            conn.pragma_update(None, "user_version", schema::DATABASE_VERSION + 1).unwrap();
        }

        let mut helper = DbHelper::new(&path);
        assert!(matches!(
            helper.database(OpenMode::Read),
            Err(Error::Downgrade { found: 2, supported: 1 })
        ));
    }

    #[test]
    fn test_upgrade_hook_keeps_rows() {
        let conn = Connection::open_in_memory().unwrap();
        for stmt in schema::all_schema_statements() {
            conn.execute(&stmt, []).unwrap();
        }
        conn.execute("INSERT INTO channels (name, channel_id) VALUES ('kept', 4)", []).unwrap();

        let tx = conn.unchecked_transaction().unwrap();
        DbHelper::on_upgrade(&tx, 0, schema::DATABASE_VERSION).unwrap();
        tx.commit().unwrap();

        let (name, channel_id): (String, i64) = conn
            .query_row("SELECT name, channel_id FROM channels", [], |row| Ok((row.get(0)?, row.get(1)?)))
            .unwrap();
        assert_eq!((name.as_str(), channel_id), ("kept", 4));
    }
}
