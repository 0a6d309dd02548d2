//! Store transport
//!
//! Builds and executes one request against the remote store and captures
//! the raw response. It makes exactly one attempt per call: no retries, no
//! caching, no status interpretation.
//!
//! ## Request Pipeline
//!
//! 1. Build the URL and request (failure: [`Error::RequestBuild`])
//! 2. Attach the owner header when an owner is given
//! 3. Run the auth decorator, if any (failure: [`Error::AuthDecoration`],
//!    nothing is sent)
//! 4. Execute (failure: [`Error::Transport`])
//! 5. Capture status, store-error header and the full body
//!    (body failure: [`Error::ReadBody`])
//!
//! Dropping the returned future cancels the request; every request is also
//! bounded by the configured timeout.

use std::sync::Arc;

use hookstore_core::{Error, Result, StoreConfig};
use reqwest::Method;
use reqwest::header::CONTENT_TYPE;
use tracing::debug;

use crate::auth::AuthDecorator;

/// Header carrying the owner a request is attributed to
pub const OWNER_HEADER: &str = "X-Store-Owner";

/// Header the store uses for a human-readable error detail
pub const STORE_ERROR_HEADER: &str = "X-Store-Error";

/// Path segments between the store address and the bucket
pub const STORE_API_PATH: [&str; 3] = ["api", "v1", "store"];

/// Raw outcome of one store request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreResponse {
    /// HTTP status code
    pub status: u16,

    /// Value of the store-error header, if present
    pub store_error: Option<String>,

    /// Complete response body
    pub body: Vec<u8>,
}

impl StoreResponse {
    /// True for 2xx statuses
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Executes single requests against the store
///
/// Cloning is cheap and shares the underlying connection pool.
#[derive(Clone)]
pub struct StoreTransport {
    client: reqwest::Client,
    address: String,
    auth: Option<Arc<dyn AuthDecorator>>,
}

impl StoreTransport {
    /// Create a transport with its own HTTP client
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidConfig`] if the store configuration is invalid
    /// - [`Error::RequestBuild`] if the HTTP client cannot be built
    pub fn new(config: &StoreConfig, auth: Option<Arc<dyn AuthDecorator>>) -> Result<Self> {
        config.validate()?;

        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(Error::request_build)?;

        Ok(Self::with_client(client, &config.address, auth))
    }

    /// Create a transport over an existing HTTP client
    pub fn with_client(
        client: reqwest::Client,
        address: impl Into<String>,
        auth: Option<Arc<dyn AuthDecorator>>,
    ) -> Self {
        Self {
            client,
            address: address.into(),
            auth,
        }
    }

    /// Build the URL for `{address}/api/v1/store/{segments...}`
    ///
    /// Segments are percent-encoded, so item IDs can never escape their
    /// bucket.
    pub fn url(&self, segments: &[&str]) -> Result<reqwest::Url> {
        let mut url = reqwest::Url::parse(&self.address).map_err(Error::request_build)?;
        url.path_segments_mut()
            .map_err(|_| Error::request_build("store address cannot be a base URL"))?
            .pop_if_empty()
            .extend(STORE_API_PATH)
            .extend(segments);
        Ok(url)
    }

    /// Send one request and capture the response
    ///
    /// An empty `owner` sends no owner header.
    pub async fn send(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<Vec<u8>>,
        owner: &str,
    ) -> Result<StoreResponse> {
        let url = self.url(segments)?;
        debug!(%method, %url, "Sending store request");

        let mut builder = self.client.request(method, url);
        if !owner.is_empty() {
            builder = builder.header(OWNER_HEADER, owner);
        }
        if let Some(body) = body {
            builder = builder.header(CONTENT_TYPE, "application/json").body(body);
        }
        let mut request = builder.build().map_err(Error::request_build)?;

        if let Some(auth) = &self.auth {
            auth.decorate(&mut request)
                .await
                .map_err(Error::AuthDecoration)?;
        }

        let response = self
            .client
            .execute(request)
            .await
            .map_err(Error::transport)?;

        let status = response.status().as_u16();
        let store_error = response
            .headers()
            .get(STORE_ERROR_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await.map_err(Error::read_body)?.to_vec();

        debug!(status, body_len = body.len(), "Store responded");
        Ok(StoreResponse {
            status,
            store_error,
            body,
        })
    }
}

impl std::fmt::Debug for StoreTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreTransport")
            .field("address", &self.address)
            .field("auth", &self.auth.as_ref().map(|_| "<configured>"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transport(address: &str) -> StoreTransport {
        StoreTransport::with_client(reqwest::Client::new(), address, None)
    }

    #[test]
    fn test_url_layout() {
        let t = transport("http://store.local:6600");
        assert_eq!(
            t.url(&["webhooks"]).unwrap().as_str(),
            "http://store.local:6600/api/v1/store/webhooks"
        );
        assert_eq!(
            t.url(&["webhooks", "abc"]).unwrap().as_str(),
            "http://store.local:6600/api/v1/store/webhooks/abc"
        );
    }

    #[test]
    fn test_url_keeps_address_prefix() {
        let t = transport("https://gw.example.com/argus/");
        assert_eq!(
            t.url(&["webhooks"]).unwrap().as_str(),
            "https://gw.example.com/argus/api/v1/store/webhooks"
        );
    }

    #[test]
    fn test_url_segments_are_escaped() {
        let t = transport("http://store.local");
        let url = t.url(&["webhooks", "../other/x"]).unwrap();
        assert_eq!(
            url.as_str(),
            "http://store.local/api/v1/store/webhooks/..%2Fother%2Fx"
        );
    }

    #[test]
    fn test_malformed_address_is_request_build_error() {
        let t = transport("not a url");
        assert!(matches!(t.url(&["webhooks"]), Err(Error::RequestBuild(_))));

        let t = transport("mailto:someone@example.com");
        assert!(matches!(t.url(&["webhooks"]), Err(Error::RequestBuild(_))));
    }

    #[test]
    fn test_new_validates_config() {
        let err = StoreTransport::new(&StoreConfig::new(""), None).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn test_new_rejects_unparseable_address() {
        let err = StoreTransport::new(&StoreConfig::new("http://exa mple"), None).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)), "got {err:?}");
    }

    #[test]
    fn test_success_range() {
        let response = |status| StoreResponse {
            status,
            store_error: None,
            body: Vec::new(),
        };
        assert!(response(200).is_success());
        assert!(response(201).is_success());
        assert!(!response(302).is_success());
        assert!(!response(404).is_success());
    }

    #[test]
    fn test_auth_redacted_in_debug() {
        let t = StoreTransport::with_client(
            reqwest::Client::new(),
            "http://store.local",
            Some(Arc::new(crate::BearerTokenDecorator::new("secret_token"))),
        );
        let debug = format!("{:?}", t);
        assert!(!debug.contains("secret_token"));
        assert!(debug.contains("<configured>"));
    }
}
