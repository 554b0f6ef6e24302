use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::downloader::config::ResolverConfig;
use crate::downloader::errors::{BackendError, ResolutionError};
use crate::downloader::models::{MediaKind, ResolutionResult};
use crate::downloader::traits::{LinkProbe, ResolverBackend};

const SUBMIT_TIMEOUT: Duration = Duration::from_secs(20);
const POLL_TIMEOUT: Duration = Duration::from_secs(15);
const PREFERRED_VIDEO_RES: &str = "360";

#[derive(Debug, Deserialize)]
struct ProxyResponse {
    api: Option<ProxyApi>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProxyApi {
    #[serde(default)]
    media_items: Vec<MediaItem>,
    file_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MediaItem {
    // Only the selected item has to be complete; siblings may carry nulls
    #[serde(rename = "type", default)]
    media_type: Option<String>,
    /// Sent either as "360" or 360
    media_res: Option<serde_json::Value>,
    #[serde(default)]
    media_url: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

impl MediaItem {
    fn is_kind(&self, kind: MediaKind) -> bool {
        self.media_type
            .as_deref()
            .is_some_and(|t| t.eq_ignore_ascii_case(kind.as_str()))
    }

    fn has_resolution(&self, res: &str) -> bool {
        match &self.media_res {
            Some(serde_json::Value::String(s)) => s == res,
            Some(serde_json::Value::Number(n)) => n.to_string() == res,
            _ => false,
        }
    }
}

/// Pick the audio item, or the 360p video (falling back to the first video)
fn select_item(items: &[MediaItem], kind: MediaKind) -> Option<&MediaItem> {
    match kind {
        MediaKind::Audio => items.iter().find(|it| it.is_kind(MediaKind::Audio)),
        MediaKind::Video => items
            .iter()
            .find(|it| it.is_kind(MediaKind::Video) && it.has_resolution(PREFERRED_VIDEO_RES))
            .or_else(|| items.iter().find(|it| it.is_kind(MediaKind::Video))),
    }
}

/// YTDown: submit the locator, then poll until the conversion hands back a file
pub struct YtDownBackend {
    client: Client,
    probe: Arc<dyn LinkProbe>,
    proxy_url: String,
    poll_attempts: u32,
    poll_interval: Duration,
}

impl YtDownBackend {
    pub fn new(client: Client, probe: Arc<dyn LinkProbe>, config: &ResolverConfig) -> Self {
        Self {
            client,
            probe,
            proxy_url: format!("{}/proxy.php", config.endpoints.ytdown.trim_end_matches('/')),
            poll_attempts: config.poll_attempts,
            poll_interval: config.poll_interval,
        }
    }

    async fn post_proxy(&self, url: &str, timeout: Duration) -> Result<ProxyResponse, BackendError> {
        let response = self
            .client
            .post(&self.proxy_url)
            .header("X-Requested-With", "XMLHttpRequest")
            .form(&[("url", url)])
            .timeout(timeout)
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json::<ProxyResponse>().await?)
    }

    async fn run(&self, locator: &str, kind: MediaKind) -> Result<ResolutionResult, BackendError> {
        let info = self.post_proxy(locator, SUBMIT_TIMEOUT).await?;
        let items = info
            .api
            .map(|api| api.media_items)
            .ok_or_else(|| BackendError::UnexpectedResponse("missing api.mediaItems".to_string()))?;

        let item = select_item(&items, kind).ok_or(BackendError::NoMatchingMedia(kind.as_str()))?;
        let media_url = item
            .media_url
            .as_deref()
            .filter(|u| !u.is_empty())
            .ok_or_else(|| BackendError::UnexpectedResponse("selected item has no mediaUrl".to_string()))?;
        let title = item.name.clone().unwrap_or_default();
        debug!("[YTDown] Selected {} item '{}'", kind, title);

        for attempt in 1..=self.poll_attempts {
            let status = self.post_proxy(media_url, POLL_TIMEOUT).await?;
            let file_url = status.api.and_then(|api| api.file_url).filter(|u| !u.is_empty());

            if let Some(file_url) = file_url {
                if self.probe.is_usable(&file_url).await {
                    return Ok(ResolutionResult {
                        download_url: file_url,
                        title,
                        source_label: format!("YTDown {}", kind),
                    });
                }
                debug!("[YTDown] Attempt {}: file not ready yet", attempt);
            } else {
                debug!("[YTDown] Attempt {}: no file url", attempt);
            }

            if attempt < self.poll_attempts {
                tokio::time::sleep(self.poll_interval).await;
            }
        }

        Err(BackendError::RetriesExhausted(self.poll_attempts))
    }
}

#[async_trait]
impl ResolverBackend for YtDownBackend {
    fn name(&self) -> &'static str {
        "YTDown"
    }

    fn supports(&self, _kind: MediaKind) -> bool {
        true
    }

    async fn resolve(&self, locator: &str, kind: MediaKind) -> Result<ResolutionResult, ResolutionError> {
        self.run(locator, kind).await.map_err(|e| {
            debug!("[YTDown] {} {} failed: {}", kind, locator, e);
            ResolutionError::new(self.name())
        })
    }
}
