//! The live PASS/Fedora HTTP client: a [`policy_core::Fetcher`] backed by
//! `reqwest`, translating public-facing URIs to the internal base before
//! dereferencing them.

use std::time::Duration;

use async_trait::async_trait;
use policy_core::error::{PolicyError, Result as PolicyResult};
use policy_core::{BaseUris, Fetcher};
use reqwest::header::ACCEPT;
use reqwest::Client;
use serde_json::{Map, Value};
use tracing::debug;

/// Fetches JSON-LD entities from the internal PASS/Fedora repository,
/// rewriting any public-facing URI it is asked to fetch to its private
/// equivalent first.
pub struct ReqwestFetcher {
    client: Client,
    baseuris: BaseUris,
    basic_auth: Option<(String, String)>,
}

impl ReqwestFetcher {
    /// Build a fetcher bound to `baseuris`, with an optional HTTP basic-auth
    /// credential pair, and `timeout` applied to every request.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying `reqwest::Client` cannot be built.
    pub fn new(
        baseuris: BaseUris,
        basic_auth: Option<(String, String)>,
        timeout: Duration,
    ) -> reqwest::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            baseuris,
            basic_auth,
        })
    }
}

#[async_trait]
impl Fetcher for ReqwestFetcher {
    async fn fetch(&self, url: &str) -> PolicyResult<Map<String, Value>> {
        let (internal_url, _) = self.baseuris.public_with_private(url);
        debug!(url = %internal_url, "fetching entity");

        let mut request = self
            .client
            .get(&internal_url)
            .header(ACCEPT, "application/ld+json, application/json");

        if let Some((username, password)) = &self.basic_auth {
            request = request.basic_auth(username, Some(password));
        }

        let response = request
            .send()
            .await
            .map_err(|e| PolicyError::External(format!("fetching {internal_url}: {e}")))?;

        let response = response.error_for_status().map_err(|e| {
            PolicyError::External(format!("fetching {internal_url}: {e}"))
        })?;

        response
            .json::<Map<String, Value>>()
            .await
            .map_err(|e| PolicyError::External(format!("decoding {internal_url}: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetcher_builds_with_basic_auth() {
        let fetcher = ReqwestFetcher::new(
            BaseUris::new("http://example.org/public", "http://fcrepo:8080/rest"),
            Some(("user".to_string(), "pass".to_string())),
            Duration::from_secs(5),
        );
        assert!(fetcher.is_ok());
    }
}
