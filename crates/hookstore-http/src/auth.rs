//! Request authorization
//!
//! An [`AuthDecorator`] adds credentials to an outgoing store request just
//! before it is sent. A decorator failure aborts the request; nothing goes
//! over the network.

use async_trait::async_trait;
use hookstore_core::BoxError;
use reqwest::header::{AUTHORIZATION, HeaderValue};

/// Adds credentials to outgoing store requests
#[async_trait]
pub trait AuthDecorator: Send + Sync {
    /// Decorate `request` in place
    async fn decorate(&self, request: &mut reqwest::Request) -> Result<(), BoxError>;
}

/// Sends a static bearer token
///
/// The Debug implementation does NOT expose the token.
pub struct BearerTokenDecorator {
    token: String,
}

impl BearerTokenDecorator {
    /// Create a decorator for `token`
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl std::fmt::Debug for BearerTokenDecorator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BearerTokenDecorator")
            .field("token", &"<REDACTED>")
            .finish()
    }
}

#[async_trait]
impl AuthDecorator for BearerTokenDecorator {
    async fn decorate(&self, request: &mut reqwest::Request) -> Result<(), BoxError> {
        if self.token.is_empty() {
            return Err("bearer token is empty".into());
        }

        let mut value = HeaderValue::from_str(&format!("Bearer {}", self.token))
            .map_err(|_| BoxError::from("bearer token contains invalid header characters"))?;
        value.set_sensitive(true);

        request.headers_mut().insert(AUTHORIZATION, value);
        Ok(())
    }
}
