//! Push/fetch client
//!
//! Domain operations over the [`StoreTransport`]:
//!
//! | operation | request | success |
//! |---|---|---|
//! | [`StoreClient::get_items`] | `GET .../{bucket}` | 2xx + JSON item list |
//! | [`StoreClient::push_item`] | `PUT .../{bucket}/{id}` | 201 created, 200 updated |
//! | [`StoreClient::remove_item`] | `DELETE .../{bucket}/{id}` | 2xx + JSON removed item |
//!
//! Non-success statuses become [`Error::Status`]; the store-error header is
//! logged alongside, never embedded in the error.

use std::sync::Arc;

use async_trait::async_trait;
use hookstore_core::traits::ItemFetcher;
use hookstore_core::{Error, Item, PushResult, Result, StoreConfig};
use reqwest::Method;
use tracing::{debug, error, info};

use crate::auth::AuthDecorator;
use crate::transport::{StoreResponse, StoreTransport};

/// Client for one bucket of the remote store
#[derive(Debug, Clone)]
pub struct StoreClient {
    transport: StoreTransport,
    bucket: String,
}

impl StoreClient {
    /// Create a client from configuration
    ///
    /// # Errors
    ///
    /// [`Error::InvalidConfig`] listing every problem with `config`.
    pub fn new(config: &StoreConfig, auth: Option<Arc<dyn AuthDecorator>>) -> Result<Self> {
        let transport = StoreTransport::new(config, auth)?;
        Ok(Self::from_transport(transport, config.bucket.clone()))
    }

    /// Create a client over an existing transport
    pub fn from_transport(transport: StoreTransport, bucket: impl Into<String>) -> Self {
        Self {
            transport,
            bucket: bucket.into(),
        }
    }

    /// Bucket this client reads and writes
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Fetch every item in the bucket
    ///
    /// With a non-empty `owner` the request is attributed to that owner. An
    /// empty owner sends no owner header and asks for the unscoped list; no
    /// owner filtering happens in that mode.
    pub async fn get_items(&self, owner: &str) -> Result<Vec<Item>> {
        let response = self
            .transport
            .send(Method::GET, &[&self.bucket], None, owner)
            .await?;

        if !response.is_success() {
            return Err(self.status_error("get_items", &response));
        }

        let items: Vec<Item> = serde_json::from_slice(&response.body).map_err(Error::Decode)?;
        debug!(bucket = %self.bucket, count = items.len(), "Fetched items");
        Ok(items)
    }

    /// Create or replace an item
    ///
    /// # Errors
    ///
    /// - [`Error::ItemIdEmpty`] / [`Error::ItemDataEmpty`] before any request
    /// - [`Error::Status`] for any status other than 200 or 201
    pub async fn push_item(&self, owner: &str, item: &Item) -> Result<PushResult> {
        item.validate()?;
        let body = serde_json::to_vec(item).map_err(Error::Encode)?;

        let response = self
            .transport
            .send(Method::PUT, &[&self.bucket, &item.id], Some(body), owner)
            .await?;

        match PushResult::from_status(response.status) {
            Some(result) => {
                info!(bucket = %self.bucket, id = %item.id, result = result.as_str(), "Pushed item");
                Ok(result)
            }
            None => Err(self.status_error("push_item", &response)),
        }
    }

    /// Delete an item, returning the item the store removed
    ///
    /// # Errors
    ///
    /// - [`Error::ItemIdEmpty`] before any request
    /// - [`Error::Status`] for a non-success status
    /// - [`Error::Decode`] if the echoed item cannot be decoded
    pub async fn remove_item(&self, id: &str, owner: &str) -> Result<Item> {
        if id.is_empty() {
            return Err(Error::ItemIdEmpty);
        }

        let response = self
            .transport
            .send(Method::DELETE, &[&self.bucket, id], None, owner)
            .await?;

        if !response.is_success() {
            return Err(self.status_error("remove_item", &response));
        }

        let item: Item = serde_json::from_slice(&response.body).map_err(Error::Decode)?;
        info!(bucket = %self.bucket, id = %item.id, "Removed item");
        Ok(item)
    }

    fn status_error(&self, operation: &'static str, response: &StoreResponse) -> Error {
        error!(
            operation,
            bucket = %self.bucket,
            status = response.status,
            store_error = response.store_error.as_deref().unwrap_or(""),
            "Store responded with non-success status"
        );
        Error::status(response.status)
    }
}

#[async_trait]
impl ItemFetcher for StoreClient {
    async fn get_items(&self, owner: &str) -> Result<Vec<Item>> {
        StoreClient::get_items(self, owner).await
    }
}
