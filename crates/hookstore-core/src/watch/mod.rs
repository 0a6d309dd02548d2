//! Watch fan-out
//!
//! [`Fanout`] is a [`Listener`] that converts the raw item set into domain
//! values and passes the whole converted set to every registered [`Watch`].
//!
//! Each delivery is a full replacement of the previous set. If any item in a
//! set fails to convert, nothing is delivered for that poll: a partial set
//! would read as "these registrations were removed".

use std::sync::Arc;

use metrics::gauge;
use serde::de::DeserializeOwned;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tracing::{debug, error};

use crate::error::BoxError;
use crate::metrics::{LIST_SIZE, describe};
use crate::model::Item;
use crate::traits::Listener;

/// Observer of the latest converted set
pub trait Watch<T>: Send + Sync {
    /// Handle the latest set
    fn update(&self, values: &[T]);
}

/// Adapter turning a closure into a [`Watch`]
pub struct WatchFn<F>(pub F);

impl<T, F> Watch<T> for WatchFn<F>
where
    F: Fn(&[T]) + Send + Sync,
{
    fn update(&self, values: &[T]) {
        (self.0)(values)
    }
}

type Converter<T> = Box<dyn Fn(&Item) -> Result<T, BoxError> + Send + Sync>;

/// Dispatches each polled set to zero or more watchers
pub struct Fanout<T> {
    convert: Converter<T>,
    watchers: Vec<Arc<dyn Watch<T>>>,
}

impl<T: 'static> Fanout<T> {
    /// Create a fan-out with a custom item converter
    pub fn new<F>(convert: F) -> Self
    where
        F: Fn(&Item) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        Self {
            convert: Box::new(convert),
            watchers: Vec::new(),
        }
    }

    /// Add a watcher
    pub fn with_watch(mut self, watch: Arc<dyn Watch<T>>) -> Self {
        self.watchers.push(watch);
        self
    }

    /// Number of registered watchers
    pub fn watcher_count(&self) -> usize {
        self.watchers.len()
    }

    /// Convert a raw item set, failing on the first bad item
    pub fn convert(&self, items: &[Item]) -> Result<Vec<T>, BoxError> {
        items.iter().map(|item| (self.convert)(item)).collect()
    }

    /// Deliver an already converted set to every watcher
    pub fn dispatch(&self, values: &[T]) {
        for watch in &self.watchers {
            watch.update(values);
        }
    }
}

impl<T: DeserializeOwned + 'static> Fanout<T> {
    /// Create a fan-out that decodes each item's data as `T`
    pub fn json() -> Self {
        Self::new(|item: &Item| {
            serde_json::from_value(serde_json::Value::Object(item.data.clone()))
                .map_err(|e| BoxError::from(format!("item {}: {}", item.id, e)))
        })
    }
}

impl Fanout<Item> {
    /// Create a fan-out that passes items through unchanged
    pub fn items() -> Self {
        Self::new(|item: &Item| Ok(item.clone()))
    }
}

impl<T: 'static> Listener for Fanout<T> {
    fn update(&self, items: &[Item]) {
        match self.convert(items) {
            Ok(values) => {
                debug!(
                    count = values.len(),
                    watchers = self.watchers.len(),
                    "Dispatching item set"
                );
                self.dispatch(&values);
            }
            Err(e) => {
                error!(error = %e, "Failed to convert item set, skipping update");
            }
        }
    }
}

impl<T> std::fmt::Debug for Fanout<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fanout")
            .field("watchers", &self.watchers.len())
            .finish()
    }
}

/// Reports the size of each set on the list-size gauge
#[derive(Debug, Clone, Copy, Default)]
pub struct SizeWatch;

impl<T> Watch<T> for SizeWatch {
    fn update(&self, values: &[T]) {
        describe();
        gauge!(LIST_SIZE).set(values.len() as f64);
    }
}

/// Keeps the latest set for consumers that prefer to pull
#[derive(Debug)]
pub struct LatestSetWatch<T> {
    tx: watch::Sender<Arc<Vec<T>>>,
}

impl<T: Clone + Send + Sync + 'static> LatestSetWatch<T> {
    /// Create a watcher holding an empty set
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Arc::new(Vec::new()));
        Self { tx }
    }

    /// The most recently delivered set
    pub fn latest(&self) -> Arc<Vec<T>> {
        self.tx.borrow().clone()
    }

    /// A receiver notified on every delivery
    pub fn receiver(&self) -> watch::Receiver<Arc<Vec<T>>> {
        self.tx.subscribe()
    }

    /// A stream yielding the current set, then every later delivery
    pub fn subscribe(&self) -> WatchStream<Arc<Vec<T>>> {
        WatchStream::new(self.tx.subscribe())
    }
}

impl<T: Clone + Send + Sync + 'static> Default for LatestSetWatch<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Send + Sync + 'static> Watch<T> for LatestSetWatch<T> {
    fn update(&self, values: &[T]) {
        self.tx.send_replace(Arc::new(values.to_vec()));
    }
}
