// Helper functions shared by backends, the cache and the CLI

use regex::Regex;
use reqwest::Client;
use std::time::Duration;
use time::OffsetDateTime;
use tracing::{debug, warn};

pub(crate) const DEFAULT_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36";

/// Longest file stem produced by [`clean_file_name`]
pub const MAX_FILE_NAME_CHARS: usize = 50;

/// Build the shared HTTP client, routed through `proxy` when it parses.
///
/// Per-request timeouts are set by callers; this only caps connect time.
pub fn build_http_client(proxy: Option<&str>) -> Result<Client, reqwest::Error> {
    let mut builder = Client::builder()
        .user_agent(DEFAULT_UA)
        .connect_timeout(Duration::from_secs(10));

    if let Some(proxy_url) = proxy {
        match reqwest::Proxy::all(proxy_url) {
            Ok(proxy) => {
                debug!("Routing requests through proxy {}", proxy_url);
                builder = builder.proxy(proxy);
            }
            Err(e) => {
                // Fall back to a direct connection rather than refusing to start
                warn!("Invalid proxy URL {}: {}", proxy_url, e);
            }
        }
    }

    builder.build()
}

/// Strip characters that are unsafe in file names and cap the length
pub fn clean_file_name(name: &str) -> String {
    lazy_static::lazy_static! {
        static ref UNSAFE_RE: Regex = Regex::new(r#"[<>:"/\\|?*]"#).unwrap();
    }

    UNSAFE_RE
        .replace_all(name, "")
        .chars()
        .take(MAX_FILE_NAME_CHARS)
        .collect()
}

/// Download a whole payload. Any failure yields an empty buffer.
pub async fn fetch_bytes(client: &Client, url: &str, timeout: Duration) -> Vec<u8> {
    let response = match client.get(url).timeout(timeout).send().await {
        Ok(r) => r,
        Err(e) => {
            warn!("Fetching {} failed: {}", url, e);
            return Vec::new();
        }
    };

    if !response.status().is_success() {
        warn!("Fetching {} returned {}", url, response.status());
        return Vec::new();
    }

    match response.bytes().await {
        Ok(bytes) => bytes.to_vec(),
        Err(e) => {
            warn!("Reading body of {} failed: {}", url, e);
            Vec::new()
        }
    }
}

/// Current wall-clock time in unix milliseconds
pub fn now_millis() -> i64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}
