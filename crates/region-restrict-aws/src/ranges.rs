//! Published address ranges over HTTP

use async_trait::async_trait;
use region_restrict::{Error, RangeSource, Result};
use tracing::debug;

/// [`RangeSource`] fetching `ip-ranges.json` with a plain GET
#[derive(Clone, Debug)]
pub struct HttpRangeSource {
    client: reqwest::Client,
    url: String,
}

impl HttpRangeSource {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        HttpRangeSource {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl RangeSource for HttpRangeSource {
    async fn fetch(&self) -> Result<String> {
        debug!("Fetching address ranges from {}", self.url);

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| Error::Resolution(format!("GET {}: {}", self.url, e)))?;

        response
            .text()
            .await
            .map_err(|e| Error::Resolution(format!("reading {}: {}", self.url, e)))
    }
}
