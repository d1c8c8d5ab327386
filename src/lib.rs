//! # Chanbase - channel records behind a content provider
//!
//! A small SQLite-backed store of channels (a name and a numeric channel id)
//! addressed by content URIs.
//!
//! Chanbase provides:
//! - A contract of table, column and URI constants
//! - A URI matcher routing `channels` and `channels/#` to provider operations
//! - A database helper owning the file, the DDL and the version hook
//! - A provider exposing query, insert, update, delete and type lookup
//! - Change notifications delivered to observers over channels

pub mod contract;
pub mod uri;
pub mod values;
pub mod storage;
pub mod cursor;
pub mod notify;
pub mod provider;
pub mod config;
pub mod ui;

// Re-exports for convenient access
pub use uri::{ChannelUri, Match, UriMatcher};
pub use values::{ContentValues, Selection};
pub use storage::{DbHelper, OpenMode};
pub use cursor::{Channel, Cursor};
pub use notify::{ChangeBus, ChangeNotifier, NoopNotifier};
pub use provider::ChannelProvider;

/// Result type alias for Chanbase operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Chanbase operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid URI: {0}")]
    InvalidUri(String),

    #[error("Unknown URI {0}")]
    UnknownUri(String),

    #[error("{operation} is not supported for {uri}")]
    Unsupported {
        operation: &'static str,
        uri: String,
    },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database version {found} is newer than supported version {supported}")]
    Downgrade { found: i32, supported: i32 },
}
