//! The `Fetcher` collaborator: retrieves the JSON-LD entity at a URL.
//!
//! Kept object-safe and async so the root crate can plug in a live
//! `reqwest`-backed client while tests use an in-memory map.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::Result;

/// Retrieves the JSON object at a given absolute HTTP URL.
///
/// Errors are opaque to `policy-core`; implementations should wrap
/// transport/decoding failures as [`crate::PolicyError::External`].
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch and parse the entity at `url` into a JSON object.
    async fn fetch(&self, url: &str) -> Result<Map<String, Value>>;
}
