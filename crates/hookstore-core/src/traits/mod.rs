//! Collaborator traits for hookstore
//!
//! - [`ItemFetcher`]: read the current item set from a store
//! - [`Listener`]: receive the item set after each successful poll

pub mod fetcher;
pub mod listener;

pub use fetcher::ItemFetcher;
pub use listener::{Listener, ListenerFn};
