// # hookstore-core
//
// Core library for hookstore: keeping a local view of webhook registrations
// stored in a remote item store.
//
// ## Architecture Overview
//
// - **Item**: the unit of storage (ID, opaque JSON data, optional TTL)
// - **ItemFetcher**: trait for reading the current item set from a store
// - **Poller**: background loop with a start/stop state machine that fetches
//   the item set on an interval and notifies a Listener
// - **Fanout**: Listener that converts items and dispatches them to Watches
// - **PollMetrics**: sink for per-cycle success/failure outcomes
//
// ## Data Flow
//
// Poller → ItemFetcher (e.g. the HTTP store client) → Listener → Watch fan-out
//
// The write path (push/remove) lives with the transport in `hookstore-http`.

pub mod config;
pub mod error;
pub mod metrics;
pub mod model;
pub mod poller;
pub mod traits;
pub mod watch;

// Re-export core types for convenience
pub use config::{HookstoreConfig, ListenerConfig, StoreConfig};
pub use error::{BoxError, ConfigViolation, Error, Result, StatusClass};
pub use crate::metrics::{AtomicPollMetrics, CounterPollMetrics, PollMetrics, PollOutcome};
pub use model::{Item, PushResult};
pub use poller::{Poller, PollerConfig, PollerState};
pub use traits::{ItemFetcher, Listener, ListenerFn};
pub use watch::{Fanout, LatestSetWatch, SizeWatch, Watch, WatchFn};
