// # hookstore-http
//
// HTTP side of hookstore: talks to the remote item store.
//
// ## Layout
//
// - **auth**: `AuthDecorator` seam plus a static bearer-token decorator
// - **transport**: one request, one attempt; URL layout, owner header,
//   store-error header capture
// - **client**: `StoreClient` with push/fetch/remove over the transport;
//   implements `hookstore_core::ItemFetcher` so it can drive a `Poller`
//
// ## Failure Model
//
// Every failure surfaces as a `hookstore_core::Error`. The transport never
// retries; the poller's next tick is the retry. Non-success statuses are
// classified by `StatusClass`, and the store's error header goes to the log
// only.

pub mod auth;
pub mod client;
pub mod transport;

pub use auth::{AuthDecorator, BearerTokenDecorator};
pub use client::StoreClient;
pub use transport::{OWNER_HEADER, STORE_ERROR_HEADER, StoreResponse, StoreTransport};
