//! Test doubles and common utilities for poller contract tests
//!
//! The doubles record every call so tests can assert on what the poller did
//! without a real store.

#![allow(dead_code)]

use async_trait::async_trait;
use hookstore_core::error::Result;
use hookstore_core::traits::{ItemFetcher, Listener};
use hookstore_core::{AtomicPollMetrics, Error, Item, Poller, PollerConfig};
use serde_json::{Map, json};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Two registrations, as a store would hold them
pub fn sample_items() -> Vec<Item> {
    vec![
        item("https://a.example.com/hook"),
        item("https://b.example.com/hook"),
    ]
}

/// An item keyed by the digest of its URL
pub fn item(url: &str) -> Item {
    let mut data = Map::new();
    data.insert("url".to_string(), json!(url));
    data.insert("events".to_string(), json!(["device-status"]));
    Item::new(Item::digest_id(url), data)
}

/// A fetcher serving a fixed set, optionally failing
pub struct StubFetcher {
    items: Mutex<Vec<Item>>,
    failing: AtomicBool,
    delay: Mutex<Option<Duration>>,
    call_count: AtomicUsize,
    owners: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl StubFetcher {
    pub fn new(items: Vec<Item>) -> Self {
        Self {
            items: Mutex::new(items),
            failing: AtomicBool::new(false),
            delay: Mutex::new(None),
            call_count: AtomicUsize::new(0),
            owners: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Make every fetch fail (as a 500 from the store would)
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Make every fetch take this long
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Owner argument of every fetch so far
    pub fn owners(&self) -> Vec<String> {
        self.owners.lock().unwrap().clone()
    }

    /// Highest number of fetches observed running at once
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

/// Decrements the in-flight count even when the fetch future is dropped
struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ItemFetcher for StubFetcher {
    async fn get_items(&self, owner: &str) -> Result<Vec<Item>> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.owners.lock().unwrap().push(owner.to_string());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlight(&self.in_flight);

        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::status(500));
        }
        Ok(self.items.lock().unwrap().clone())
    }
}

/// A listener recording every set it receives
#[derive(Default)]
pub struct RecordingListener {
    updates: Mutex<Vec<Vec<Item>>>,
}

impl RecordingListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update_count(&self) -> usize {
        self.updates.lock().unwrap().len()
    }

    pub fn updates(&self) -> Vec<Vec<Item>> {
        self.updates.lock().unwrap().clone()
    }
}

impl Listener for RecordingListener {
    fn update(&self, items: &[Item]) {
        self.updates.lock().unwrap().push(items.to_vec());
    }
}

/// A listener that blocks its calling thread, counting overlapping calls
pub struct BlockingListener {
    hold: Duration,
    calls: AtomicUsize,
    active: AtomicUsize,
    max_active: AtomicUsize,
}

impl BlockingListener {
    pub fn new(hold: Duration) -> Self {
        Self {
            hold,
            calls: AtomicUsize::new(0),
            active: AtomicUsize::new(0),
            max_active: AtomicUsize::new(0),
        }
    }

    /// Number of calls that have started
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Highest number of calls observed running at once
    pub fn max_active(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }
}

impl Listener for BlockingListener {
    fn update(&self, _items: &[Item]) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now, Ordering::SeqCst);

        std::thread::sleep(self.hold);

        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Everything a poller test needs to observe
pub struct Harness {
    pub poller: Arc<Poller>,
    pub fetcher: Arc<StubFetcher>,
    pub listener: Arc<RecordingListener>,
    pub metrics: Arc<AtomicPollMetrics>,
}

/// Build a stopped poller over a stub fetcher serving `items`
pub fn harness(items: Vec<Item>, interval: Duration) -> Harness {
    let fetcher = Arc::new(StubFetcher::new(items));
    let listener = Arc::new(RecordingListener::new());
    let metrics = Arc::new(AtomicPollMetrics::new());

    let config = PollerConfig::new()
        .with_fetcher(fetcher.clone())
        .with_listener(listener.clone())
        .with_metrics(metrics.clone())
        .with_pull_interval(interval);

    Harness {
        poller: Arc::new(Poller::new(config).expect("poller construction succeeds")),
        fetcher,
        listener,
        metrics,
    }
}
