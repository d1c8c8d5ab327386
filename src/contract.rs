//! Channel contract - names shared by the database helper and the provider
//!
//! Every table, column and URI string used anywhere in the crate comes from
//! here, so the schema and the routing table can never disagree.

use crate::uri::ChannelUri;

/// URI scheme of every content URI
pub const SCHEME: &str = "content";

/// Name of the whole provider, the "domain" part of a content URI
pub const CONTENT_AUTHORITY: &str = "com.example.chanbase";

/// Path segment appended to the authority for channel data
pub const PATH_CHANNELS: &str = "channels";

/// Type tag for a URI addressing the whole channel collection
pub const CONTENT_LIST_TYPE: &str = "vnd.android.cursor.dir/com.example.chanbase/channels";

/// Type tag for a URI addressing a single channel
pub const CONTENT_ITEM_TYPE: &str = "vnd.android.cursor.item/com.example.chanbase/channels";

/// Database table holding one row per channel
pub const TABLE_NAME: &str = "channels";

/// Primary key, assigned by SQLite on insert
///
/// Type: INTEGER
pub const COLUMN_ID: &str = "_id";

/// Display name of the channel
///
/// Type: TEXT, NOT NULL
pub const COLUMN_NAME: &str = "name";

/// Numeric channel id
///
/// Type: INTEGER, NOT NULL, DEFAULT 0
pub const COLUMN_CHANNEL_ID: &str = "channel_id";

/// All columns in table order
pub const ALL_COLUMNS: &[&str] = &[COLUMN_ID, COLUMN_NAME, COLUMN_CHANNEL_ID];

/// Columns a caller may write through insert or update
pub const WRITABLE_COLUMNS: &[&str] = &[COLUMN_NAME, COLUMN_CHANNEL_ID];

/// Base of every URI served by this provider: `content://<authority>`
pub fn base_content_uri() -> ChannelUri {
    ChannelUri::new(CONTENT_AUTHORITY, Vec::<String>::new())
}

/// URI of the channel collection: `content://<authority>/channels`
pub fn content_uri() -> ChannelUri {
    base_content_uri().with_appended_path(PATH_CHANNELS)
}

/// URI of a single channel: `content://<authority>/channels/<id>`
pub fn channel_uri(id: i64) -> ChannelUri {
    content_uri().with_appended_id(id)
}

/// Whether `column` is a column of the channels table
pub fn is_known_column(column: &str) -> bool {
    ALL_COLUMNS.contains(&column)
}
