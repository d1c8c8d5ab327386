//! Database schema definitions

use crate::contract::{COLUMN_CHANNEL_ID, COLUMN_ID, COLUMN_NAME, TABLE_NAME};

/// Name of the database file
pub const DATABASE_NAME: &str = "channels.db";

/// Schema version stored in `PRAGMA user_version`.
/// Bump this whenever the DDL below changes.
pub const DATABASE_VERSION: i32 = 1;

/// SQL to create the channels table
pub fn create_channels_table() -> String {
    format!(
        r#"
CREATE TABLE IF NOT EXISTS {TABLE_NAME} (
    {COLUMN_ID} INTEGER PRIMARY KEY AUTOINCREMENT,
    {COLUMN_NAME} TEXT NOT NULL,
    {COLUMN_CHANNEL_ID} INTEGER NOT NULL DEFAULT 0
)
"#
    )
}

/// All schema creation statements
pub fn all_schema_statements() -> Vec<String> {
    vec![create_channels_table()]
}
