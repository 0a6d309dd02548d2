// # Item Fetcher Trait
//
// The read side of the store, as seen by the poller.
//
// ## Implementations
//
// - HTTP store client: `hookstore-http` crate
// - Test doubles in `tests/common`

use async_trait::async_trait;

use crate::model::Item;

/// Source of the current item set
///
/// # Thread Safety
///
/// Implementations are shared between the poll loop task and any other
/// caller, so they must be `Send + Sync`.
///
/// # Retries
///
/// Implementations make one attempt per call and report failures as errors.
/// The poller retries implicitly on its next tick.
#[async_trait]
pub trait ItemFetcher: Send + Sync {
    /// Fetch all items visible to `owner`
    ///
    /// An empty owner requests the unscoped list; no owner filtering is
    /// applied in that case.
    async fn get_items(&self, owner: &str) -> Result<Vec<Item>, crate::Error>;
}
