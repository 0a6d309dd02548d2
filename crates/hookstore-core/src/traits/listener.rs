//! Listener interface invoked by the poller

use crate::model::Item;

/// Receives the freshly fetched item set
///
/// Called synchronously from the poll loop once per successful fetch. A slow
/// listener delays the next poll, so implementations should return quickly.
/// The same set may be delivered repeatedly; treat each call as a full
/// replacement of the previous set.
pub trait Listener: Send + Sync {
    /// Handle the latest item set
    fn update(&self, items: &[Item]);
}

/// Adapter turning a closure into a [`Listener`]
pub struct ListenerFn<F>(pub F);

impl<F> Listener for ListenerFn<F>
where
    F: Fn(&[Item]) + Send + Sync,
{
    fn update(&self, items: &[Item]) {
        (self.0)(items)
    }
}

impl<F> std::fmt::Debug for ListenerFn<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ListenerFn")
    }
}
