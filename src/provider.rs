//! Channel provider - URI-routed access to the channels table
//!
//! Every operation takes a [`ChannelUri`], resolves it through the
//! provider's [`UriMatcher`] and runs exactly one statement against the
//! [`DbHelper`]. For `channels/<id>` URIs the caller's selection is
//! replaced by `_id = ?` with the id bound as a parameter.

use std::sync::Arc;
use crate::contract::{self, COLUMN_CHANNEL_ID, COLUMN_ID, COLUMN_NAME, TABLE_NAME};
use crate::cursor::Cursor;
use crate::notify::ChangeNotifier;
use crate::storage::DbHelper;
use crate::uri::{ChannelUri, Match, UriMatcher};
use crate::values::{ContentValues, Selection};
use crate::{Error, Result};

/// Content provider for channel records
pub struct ChannelProvider {
    helper: DbHelper,
    matcher: UriMatcher,
    notifier: Arc<dyn ChangeNotifier>,
}

impl ChannelProvider {
    /// Create a provider over `helper`, reporting writes to `notifier`
    pub fn new(helper: DbHelper, notifier: Arc<dyn ChangeNotifier>) -> Self {
        Self {
            helper,
            matcher: UriMatcher::for_channels(),
            notifier,
        }
    }

    pub fn helper(&self) -> &DbHelper {
        &self.helper
    }

    /// Query the given URI with an optional projection, selection and sort order.
    ///
    /// `projection = None` selects every column. The returned cursor is
    /// tagged with `uri` as its notification URI.
    pub fn query(
        &mut self,
        uri: &ChannelUri,
        projection: Option<&[&str]>,
        selection: Selection,
        sort_order: Option<&str>,
    ) -> Result<Cursor> {
        let selection = match self.matcher.match_uri(uri) {
            Some(Match::Channels) => selection,
            Some(Match::ChannelId(id)) => Selection::by_id(id),
            None => return Err(Error::UnknownUri(uri.to_string())),
        };

        let columns = projection.unwrap_or(contract::ALL_COLUMNS);
        if let Some(unknown) = columns.iter().find(|c| !contract::is_known_column(c)) {
            return Err(Error::InvalidArgument(format!("unknown column {}", unknown)));
        }

        tracing::debug!(%uri, "query");
        let mut cursor = self.helper.query(TABLE_NAME, columns, &selection, sort_order)?;
        cursor.set_notification_uri(uri.clone());
        Ok(cursor)
    }

    /// Insert a channel, returning its URI.
    ///
    /// Only the collection URI accepts inserts. Validation failures are
    /// errors; a failure inside the database is logged and reported as
    /// `Ok(None)`.
    pub fn insert(&mut self, uri: &ChannelUri, values: &ContentValues) -> Result<Option<ChannelUri>> {
        match self.matcher.match_uri(uri) {
            Some(Match::Channels) => self.insert_channel(uri, values),
            Some(Match::ChannelId(_)) | None => Err(Error::Unsupported {
                operation: "Insertion",
                uri: uri.to_string(),
            }),
        }
    }

    fn insert_channel(&mut self, uri: &ChannelUri, values: &ContentValues) -> Result<Option<ChannelUri>> {
        check_columns(values)?;

        if values.get_as_string(COLUMN_NAME).is_none() {
            return Err(Error::InvalidArgument("Channel requires a name".to_string()));
        }
        if values.contains_key(COLUMN_CHANNEL_ID) {
            check_channel_id(values)?;
        }

        let id = match self.helper.insert(TABLE_NAME, values) {
            Ok(id) => id,
            Err(e) => {
                tracing::error!(%uri, error = %e, "failed to insert row");
                return Ok(None);
            }
        };

        self.notifier.notify_change(uri);
        Ok(Some(uri.with_appended_id(id)))
    }

    /// Update the rows selected by `uri` and `selection`, returning how many changed
    pub fn update(&mut self, uri: &ChannelUri, values: &ContentValues, selection: Selection) -> Result<usize> {
        let selection = match self.matcher.match_uri(uri) {
            Some(Match::Channels) => selection,
            Some(Match::ChannelId(id)) => Selection::by_id(id),
            None => {
                return Err(Error::Unsupported {
                    operation: "Update",
                    uri: uri.to_string(),
                });
            }
        };
        self.update_channel(uri, values, &selection)
    }

    fn update_channel(&mut self, uri: &ChannelUri, values: &ContentValues, selection: &Selection) -> Result<usize> {
        check_columns(values)?;

        if values.contains_key(COLUMN_NAME) && values.get_as_string(COLUMN_NAME).is_none() {
            return Err(Error::InvalidArgument("Channel requires a name".to_string()));
        }
        if values.contains_key(COLUMN_CHANNEL_ID) {
            check_channel_id(values)?;
        }

        if values.is_empty() {
            return Ok(0);
        }

        let rows_updated = self.helper.update(TABLE_NAME, values, selection)?;
        tracing::debug!(%uri, rows_updated, "update");
        if rows_updated != 0 {
            self.notifier.notify_change(uri);
        }
        Ok(rows_updated)
    }

    /// Delete the rows selected by `uri` and `selection`, returning how many were removed
    pub fn delete(&mut self, uri: &ChannelUri, selection: Selection) -> Result<usize> {
        let selection = match self.matcher.match_uri(uri) {
            Some(Match::Channels) => selection,
            Some(Match::ChannelId(id)) => Selection::by_id(id),
            None => {
                return Err(Error::Unsupported {
                    operation: "Deletion",
                    uri: uri.to_string(),
                });
            }
        };

        let rows_deleted = self.helper.delete(TABLE_NAME, &selection)?;
        tracing::debug!(%uri, rows_deleted, "delete");
        if rows_deleted != 0 {
            self.notifier.notify_change(uri);
        }
        Ok(rows_deleted)
    }

    /// Type tag of the data behind `uri`
    pub fn get_type(&self, uri: &ChannelUri) -> Result<&'static str> {
        match self.matcher.match_uri(uri) {
            Some(Match::Channels) => Ok(contract::CONTENT_LIST_TYPE),
            Some(Match::ChannelId(_)) => Ok(contract::CONTENT_ITEM_TYPE),
            None => Err(Error::UnknownUri(uri.to_string())),
        }
    }

    /// Number of channels stored
    pub fn count(&mut self) -> Result<usize> {
        self.helper.count(TABLE_NAME)
    }
}

/// Keys become column names in SQL, so only writable contract columns pass
fn check_columns(values: &ContentValues) -> Result<()> {
    for key in values.keys() {
        if key == COLUMN_ID {
            return Err(Error::InvalidArgument(format!("{} is assigned by the database", COLUMN_ID)));
        }
        if !contract::WRITABLE_COLUMNS.contains(&key) {
            return Err(Error::InvalidArgument(format!("unknown column {}", key)));
        }
    }
    Ok(())
}

/// A present channel id must be a non-negative integer
fn check_channel_id(values: &ContentValues) -> Result<()> {
    match values.get_as_integer(COLUMN_CHANNEL_ID) {
        Some(id) if id >= 0 => Ok(()),
        _ => Err(Error::InvalidArgument("Channel requires valid channel id".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::{channel_uri, content_uri};
    use crate::notify::ChangeBus;
    use rusqlite::types::Value;

    fn provider() -> (ChannelProvider, Arc<ChangeBus>) {
        let bus = Arc::new(ChangeBus::new());
        (ChannelProvider::new(DbHelper::in_memory(), bus.clone()), bus)
    }

    fn channel(name: &str, channel_id: i64) -> ContentValues {
        let mut values = ContentValues::new();
        values.put(COLUMN_NAME, name.to_string()).put(COLUMN_CHANNEL_ID, channel_id);
        values
    }

    fn bad_uri() -> ChannelUri {
        ChannelUri::parse("content://com.example.chanbase/channels/abc/def").unwrap()
    }

    #[test]
    fn test_insert_returns_item_uri() {
        let (mut provider, _) = provider();
        let uri = provider.insert(&content_uri(), &channel("My channel", 9)).unwrap();
        assert_eq!(uri, Some(channel_uri(1)));
    }

    #[test]
    fn test_insert_requires_name() {
        let (mut provider, _) = provider();

        let mut missing = ContentValues::new();
        missing.put(COLUMN_CHANNEL_ID, 3);
        assert!(matches!(provider.insert(&content_uri(), &missing), Err(Error::InvalidArgument(_))));

        let mut null = channel("x", 3);
        null.put_null(COLUMN_NAME);
        assert!(matches!(provider.insert(&content_uri(), &null), Err(Error::InvalidArgument(_))));

        assert_eq!(provider.count().unwrap(), 0);
    }

    #[test]
    fn test_insert_rejects_bad_channel_id() {
        let (mut provider, _) = provider();
        assert!(matches!(
            provider.insert(&content_uri(), &channel("neg", -1)),
            Err(Error::InvalidArgument(_))
        ));

        let mut text = ContentValues::new();
        text.put(COLUMN_NAME, "text".to_string()).put(COLUMN_CHANNEL_ID, "seven".to_string());
        assert!(matches!(provider.insert(&content_uri(), &text), Err(Error::InvalidArgument(_))));

        let mut null = channel("null", 0);
        null.put_null(COLUMN_CHANNEL_ID);
        assert!(matches!(provider.insert(&content_uri(), &null), Err(Error::InvalidArgument(_))));

        assert_eq!(provider.count().unwrap(), 0);
    }

    #[test]
    fn test_insert_rejects_unknown_and_id_columns() {
        let (mut provider, _) = provider();

        let mut extra = channel("extra", 1);
        extra.put("owner", "me".to_string());
        assert!(matches!(provider.insert(&content_uri(), &extra), Err(Error::InvalidArgument(_))));

        let mut with_id = channel("with id", 1);
        with_id.put(COLUMN_ID, 10);
        assert!(matches!(provider.insert(&content_uri(), &with_id), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_insert_on_item_uri_is_unsupported() {
        let (mut provider, bus) = provider();
        let rx = bus.register(content_uri(), true);

        let result = provider.insert(&channel_uri(1), &channel("x", 1));
        assert!(matches!(result, Err(Error::Unsupported { operation: "Insertion", .. })));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_query_item_ignores_caller_selection() {
        let (mut provider, _) = provider();
        provider.insert(&content_uri(), &channel("one", 1)).unwrap();
        provider.insert(&content_uri(), &channel("two", 2)).unwrap();

        let cursor = provider
            .query(&channel_uri(2), None, Selection::new("name = ?").arg("one".to_string()), None)
            .unwrap();
        let channels = cursor.channels().unwrap();
        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].name, "two");
        assert_eq!(cursor.notification_uri(), Some(&channel_uri(2)));
    }

    #[test]
    fn test_query_collection_passes_selection_and_sort() {
        let (mut provider, _) = provider();
        for (name, id) in [("a", 5), ("b", 1), ("c", 9)] {
            provider.insert(&content_uri(), &channel(name, id)).unwrap();
        }

        let cursor = provider
            .query(
                &content_uri(),
                Some(&[COLUMN_NAME]),
                Selection::new("channel_id >= ?").arg(2),
                Some("channel_id DESC"),
            )
            .unwrap();
        assert_eq!(cursor.columns(), ["name"]);
        assert_eq!(cursor.get(0, COLUMN_NAME), Some(&Value::Text("c".into())));
        assert_eq!(cursor.get(1, COLUMN_NAME), Some(&Value::Text("a".into())));
        assert_eq!(cursor.len(), 2);
    }

    #[test]
    fn test_query_rejects_unknown_uri_and_column() {
        let (mut provider, _) = provider();
        assert!(matches!(
            provider.query(&bad_uri(), None, Selection::all(), None),
            Err(Error::UnknownUri(_))
        ));
        assert!(matches!(
            provider.query(&content_uri(), Some(&["secret"]), Selection::all(), None),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_update_validation() {
        let (mut provider, _) = provider();
        provider.insert(&content_uri(), &channel("keep", 4)).unwrap();

        let mut null_name = ContentValues::new();
        null_name.put_null(COLUMN_NAME);
        assert!(matches!(
            provider.update(&channel_uri(1), &null_name, Selection::all()),
            Err(Error::InvalidArgument(_))
        ));

        let mut negative = ContentValues::new();
        negative.put(COLUMN_CHANNEL_ID, -5);
        assert!(matches!(
            provider.update(&content_uri(), &negative, Selection::all()),
            Err(Error::InvalidArgument(_))
        ));

        let channels = provider.query(&channel_uri(1), None, Selection::all(), None).unwrap().channels().unwrap();
        assert_eq!(channels[0].name, "keep");
        assert_eq!(channels[0].channel_id, 4);
    }

    #[test]
    fn test_update_empty_values_is_noop() {
        let (mut provider, bus) = provider();
        provider.insert(&content_uri(), &channel("x", 1)).unwrap();
        let rx = bus.register(content_uri(), true);

        assert_eq!(provider.update(&content_uri(), &ContentValues::new(), Selection::all()).unwrap(), 0);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_update_item_scoped_to_id() {
        let (mut provider, bus) = provider();
        provider.insert(&content_uri(), &channel("one", 1)).unwrap();
        provider.insert(&content_uri(), &channel("two", 2)).unwrap();
        let rx = bus.register(channel_uri(2), false);

        let mut patch = ContentValues::new();
        patch.put(COLUMN_CHANNEL_ID, 42);
        let updated = provider.update(&channel_uri(2), &patch, Selection::new("1 = 1")).unwrap();
        assert_eq!(updated, 1);
        assert_eq!(rx.try_recv().unwrap(), channel_uri(2));

        let channels = provider.query(&content_uri(), None, Selection::all(), Some("_id")).unwrap().channels().unwrap();
        assert_eq!(channels[0].channel_id, 1);
        assert_eq!(channels[1].channel_id, 42);
    }

    #[test]
    fn test_update_missing_row_does_not_notify() {
        let (mut provider, bus) = provider();
        let rx = bus.register(content_uri(), true);

        let updated = provider.update(&channel_uri(99), &channel("ghost", 1), Selection::all()).unwrap();
        assert_eq!(updated, 0);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_delete_routes() {
        let (mut provider, bus) = provider();
        for name in ["a", "b", "c"] {
            provider.insert(&content_uri(), &channel(name, 0)).unwrap();
        }
        let rx = bus.register(content_uri(), true);

        assert_eq!(provider.delete(&channel_uri(2), Selection::all()).unwrap(), 1);
        assert_eq!(rx.try_recv().unwrap(), channel_uri(2));

        assert_eq!(provider.delete(&channel_uri(2), Selection::all()).unwrap(), 0);
        assert!(rx.try_recv().is_err());

        assert_eq!(provider.delete(&content_uri(), Selection::all()).unwrap(), 2);
        assert_eq!(rx.try_recv().unwrap(), content_uri());
        assert_eq!(provider.count().unwrap(), 0);
    }

    #[test]
    fn test_write_on_unknown_uri_is_unsupported() {
        let (mut provider, _) = provider();
        assert!(matches!(
            provider.update(&bad_uri(), &channel("x", 1), Selection::all()),
            Err(Error::Unsupported { operation: "Update", .. })
        ));
        assert!(matches!(
            provider.delete(&bad_uri(), Selection::all()),
            Err(Error::Unsupported { operation: "Deletion", .. })
        ));
    }

    #[test]
    fn test_get_type() {
        let (provider, _) = provider();
        assert_eq!(provider.get_type(&content_uri()).unwrap(), contract::CONTENT_LIST_TYPE);
        assert_eq!(provider.get_type(&channel_uri(3)).unwrap(), contract::CONTENT_ITEM_TYPE);
        assert!(matches!(provider.get_type(&bad_uri()), Err(Error::UnknownUri(_))));
    }

    #[test]
    fn test_get_type_does_not_open_database() {
        let (provider, _) = provider();
        provider.get_type(&content_uri()).unwrap();
        assert!(!provider.helper().is_open());
    }

    #[test]
    fn test_insert_storage_failure_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let bus = Arc::new(ChangeBus::new());
        let changes = bus.register(content_uri(), true);
        // A directory cannot be opened as a database file.
        let mut provider = ChannelProvider::new(DbHelper::new(dir.path()), bus.clone());

        assert!(matches!(provider.insert(&content_uri(), &channel("x", 1)), Ok(None)));
        assert!(changes.try_recv().is_err());

        // Validation still runs first and still raises.
        assert!(matches!(
            provider.insert(&content_uri(), &channel("x", -1)),
            Err(Error::InvalidArgument(_))
        ));
    }
}
