//! Storage Layer - SQLite-backed persistence
//!
//! A single table `channels(_id, name, channel_id)` in one database file,
//! owned by [`DbHelper`]. Nothing else opens the file.

pub mod schema;
pub mod sqlite;

pub use sqlite::{DbHelper, OpenMode};
