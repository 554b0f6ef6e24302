// HEAD-probe validation of candidate download links

use async_trait::async_trait;
use reqwest::header::CONTENT_LENGTH;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::debug;

use super::config::ResolverConfig;
use super::traits::LinkProbe;

/// Checks existence and size of a link without transferring the body.
///
/// Backends sometimes answer "success" with a tiny placeholder or error page;
/// anything not larger than `min_content_length` is rejected.
#[derive(Clone)]
pub struct HttpLinkProbe {
    client: Client,
    timeout: Duration,
    min_content_length: u64,
}

impl HttpLinkProbe {
    pub fn new(client: Client, timeout: Duration, min_content_length: u64) -> Self {
        Self {
            client,
            timeout,
            min_content_length,
        }
    }

    pub fn from_config(client: Client, config: &ResolverConfig) -> Self {
        Self::new(client, config.probe_timeout, config.min_content_length)
    }
}

#[async_trait]
impl LinkProbe for HttpLinkProbe {
    async fn is_usable(&self, url: &str) -> bool {
        let response = match self.client.head(url).timeout(self.timeout).send().await {
            Ok(r) => r,
            Err(e) => {
                debug!("Probe of {} failed: {}", url, e);
                return false;
            }
        };

        if response.status() != StatusCode::OK {
            debug!("Probe of {} returned {}", url, response.status());
            return false;
        }

        let size = response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(0);

        debug!("Probe of {}: {} bytes", url, size);
        size > self.min_content_length
    }
}
