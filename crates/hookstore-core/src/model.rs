//! Item model shared by the client and the poller
//!
//! An [`Item`] is the unit of storage in the remote store: a stable ID,
//! an opaque JSON payload and an optional time-to-live in seconds.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

/// A stored key-value record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Stable, content-derived identifier
    pub id: String,

    /// Serialized registration payload
    #[serde(default)]
    pub data: Map<String, Value>,

    /// Seconds to live; `None` means the client enforces no expiry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<i64>,
}

impl Item {
    /// Create an item without a TTL
    pub fn new(id: impl Into<String>, data: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            data,
            ttl: None,
        }
    }

    /// Derive an item ID from a registration URL
    ///
    /// The ID is the lowercase hex SHA-256 digest of the URL, so the same
    /// registration always lands on the same item.
    pub fn digest_id(url: &str) -> String {
        hex::encode(Sha256::digest(url.as_bytes()))
    }

    /// Set the TTL in seconds, clamping negative values to zero
    pub fn with_ttl(mut self, secs: i64) -> Self {
        self.ttl = Some(secs.max(0));
        self
    }

    /// Set the TTL from an expiry instant
    ///
    /// The TTL is the whole number of seconds between `now` and `until`,
    /// or zero if `until` is already past.
    pub fn with_expiry(mut self, until: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        self.ttl = Some(until.signed_duration_since(now).num_seconds().max(0));
        self
    }

    /// Check the preconditions for pushing this item
    pub fn validate(&self) -> Result<()> {
        if self.id.is_empty() {
            return Err(Error::ItemIdEmpty);
        }
        if self.data.is_empty() {
            return Err(Error::ItemDataEmpty);
        }
        Ok(())
    }
}

/// Outcome of a successful push
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PushResult {
    /// The store had no item with this ID
    Created,
    /// An existing item was replaced
    Updated,
}

impl PushResult {
    /// Map a success status from the store to a push result
    pub fn from_status(status: u16) -> Option<Self> {
        match status {
            201 => Some(Self::Created),
            200 => Some(Self::Updated),
            _ => None,
        }
    }

    /// Name used in logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
        }
    }
}
