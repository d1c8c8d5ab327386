//! Change notification
//!
//! The provider is handed a [`ChangeNotifier`] at construction and calls it
//! after every write that changed at least one row, passing the URI the
//! write went through. [`ChangeBus`] fans those calls out to observers.

use crate::uri::ChannelUri;
use crossbeam::channel::{self, Receiver, Sender};
use std::sync::Mutex;

/// Receiver of "data at this URI changed" signals
pub trait ChangeNotifier: Send + Sync {
    fn notify_change(&self, uri: &ChannelUri);
}

impl<F> ChangeNotifier for F
where
    F: Fn(&ChannelUri) + Send + Sync,
{
    fn notify_change(&self, uri: &ChannelUri) {
        self(uri)
    }
}

/// Drops every notification
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl ChangeNotifier for NoopNotifier {
    fn notify_change(&self, _uri: &ChannelUri) {}
}

struct Observer {
    uri: ChannelUri,
    descendants: bool,
    tx: Sender<ChannelUri>,
}

impl Observer {
    fn wants(&self, changed: &ChannelUri) -> bool {
        // A change to a collection invalidates every item inside it.
        changed.is_prefix_of(&self.uri) || (self.descendants && self.uri.is_prefix_of(changed))
    }
}

/// Observer registry delivering change notifications over channels
#[derive(Default)]
pub struct ChangeBus {
    observers: Mutex<Vec<Observer>>,
}

impl ChangeBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Watch `uri`; with `notify_for_descendants`, changes to URIs beneath it
    /// are delivered too. Dropping the receiver unregisters the observer.
    pub fn register(&self, uri: ChannelUri, notify_for_descendants: bool) -> Receiver<ChannelUri> {
        let (tx, rx) = channel::unbounded();
        self.lock().push(Observer {
            uri,
            descendants: notify_for_descendants,
            tx,
        });
        rx
    }

    /// Number of live observers
    pub fn observer_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Observer>> {
        self.observers.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ChangeNotifier for ChangeBus {
    fn notify_change(&self, uri: &ChannelUri) {
        let mut observers = self.lock();
        observers.retain(|observer| !observer.wants(uri) || observer.tx.send(uri.clone()).is_ok());
        tracing::debug!(%uri, observers = observers.len(), "change delivered");
    }
}
