//! Shared fixtures for store client contract tests
//!
//! Every test gets its own wiremock server. `MemoryStore` behaves like a
//! tiny item store so push/fetch/remove can be exercised end to end.

#![allow(dead_code)]

use hookstore_core::{Item, StoreConfig};
use hookstore_http::StoreClient;
use serde_json::{Map, json};
use std::collections::BTreeMap;
use std::sync::Mutex;
use wiremock::{MockServer, Request, Respond, ResponseTemplate};

pub const BUCKET: &str = "webhooks";
pub const BUCKET_PATH: &str = "/api/v1/store/webhooks";

/// A registration keyed by the digest of its URL
pub fn item(url: &str) -> Item {
    let mut data = Map::new();
    data.insert("url".to_string(), json!(url));
    data.insert("events".to_string(), json!(["device-status"]));
    Item::new(Item::digest_id(url), data)
}

pub fn sample_items() -> Vec<Item> {
    vec![
        item("https://a.example.com/hook"),
        item("https://b.example.com/hook"),
    ]
}

/// Client pointed at the mock server with a short timeout
pub fn client_for(server: &MockServer) -> StoreClient {
    StoreClient::new(&store_config(&server.uri()), None).expect("valid store config")
}

pub fn store_config(address: &str) -> StoreConfig {
    StoreConfig::new(address)
        .with_bucket(BUCKET)
        .with_timeout_secs(5)
}

/// Header value from a recorded request, if present
pub fn header<'a>(request: &'a Request, name: &str) -> Option<&'a str> {
    request.headers.get(name).and_then(|v| v.to_str().ok())
}

/// In-memory item store answering PUT/GET/DELETE under the bucket path
#[derive(Default)]
pub struct MemoryStore {
    items: Mutex<BTreeMap<String, Item>>,
}

impl MemoryStore {
    fn item_id(request: &Request) -> Option<String> {
        request
            .url
            .path()
            .strip_prefix(BUCKET_PATH)
            .and_then(|rest| rest.strip_prefix('/'))
            .filter(|id| !id.is_empty())
            .map(str::to_string)
    }
}

impl Respond for MemoryStore {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let mut items = self.items.lock().unwrap();
        match (request.method.as_str(), Self::item_id(request)) {
            ("GET", None) => {
                let all: Vec<&Item> = items.values().collect();
                ResponseTemplate::new(200).set_body_json(all)
            }
            ("PUT", Some(id)) => {
                let Ok(item) = serde_json::from_slice::<Item>(&request.body) else {
                    return ResponseTemplate::new(400).insert_header("X-Store-Error", "bad item");
                };
                if item.id != id {
                    return ResponseTemplate::new(400).insert_header("X-Store-Error", "id mismatch");
                }
                match items.insert(id, item) {
                    Some(_) => ResponseTemplate::new(200),
                    None => ResponseTemplate::new(201),
                }
            }
            ("DELETE", Some(id)) => match items.remove(&id) {
                Some(item) => ResponseTemplate::new(200).set_body_json(item),
                None => ResponseTemplate::new(404).insert_header("X-Store-Error", "no such item"),
            },
            _ => ResponseTemplate::new(405),
        }
    }
}
