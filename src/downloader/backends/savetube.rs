use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, KeyIvInit};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::downloader::config::ResolverConfig;
use crate::downloader::errors::{BackendError, ResolutionError};
use crate::downloader::models::{MediaKind, ResolutionResult};
use crate::downloader::traits::{LinkProbe, ResolverBackend};

const INFO_TIMEOUT: Duration = Duration::from_secs(10);
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(15);

/// Fixed key the service encrypts its info payload with
const SESSION_KEY_HEX: &str = "C5D58EF67A7584E4A29F6C35BBC4EB12";

type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;

/// Decrypted info payload
#[derive(Debug, Deserialize)]
struct SessionInfo {
    key: String,
    #[serde(default)]
    title: String,
}

/// Canonical video id from watch, youtu.be and shorts URLs, else the last path segment
fn extract_video_id(locator: &str) -> Option<String> {
    lazy_static::lazy_static! {
        static ref ID_RE: Regex = Regex::new(r"(?:[?&]v=|youtu\.be/|shorts/)([^&#?/]+)").unwrap();
    }

    if let Some(caps) = ID_RE.captures(locator) {
        return caps.get(1).map(|m| m.as_str().to_string());
    }

    locator
        .split(['?', '#'])
        .next()
        .and_then(|path| path.trim_end_matches('/').rsplit('/').next())
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

/// Base64 payload = 16-byte IV followed by AES-128-CBC ciphertext
fn decrypt_session(payload: &str) -> Result<SessionInfo, BackendError> {
    let raw = STANDARD
        .decode(payload.trim())
        .map_err(|e| BackendError::Decrypt(format!("base64: {}", e)))?;
    if raw.len() <= 16 {
        return Err(BackendError::Decrypt(format!("payload too short: {} bytes", raw.len())));
    }
    let (iv, content) = raw.split_at(16);

    let mut key = [0u8; 16];
    hex::decode_to_slice(SESSION_KEY_HEX, &mut key).map_err(|e| BackendError::Decrypt(e.to_string()))?;

    let plain = Aes128CbcDec::new_from_slices(&key, iv)
        .map_err(|e| BackendError::Decrypt(e.to_string()))?
        .decrypt_padded_vec_mut::<Pkcs7>(content)
        .map_err(|e| BackendError::Decrypt(e.to_string()))?;

    Ok(serde_json::from_slice(&plain)?)
}

/// Savetube: encrypted info exchange, then a keyed download request
pub struct SavetubeBackend {
    client: Client,
    probe: Arc<dyn LinkProbe>,
    base_url: String,
}

impl SavetubeBackend {
    pub fn new(client: Client, probe: Arc<dyn LinkProbe>, config: &ResolverConfig) -> Self {
        Self {
            client,
            probe,
            base_url: config.endpoints.savetube.trim_end_matches('/').to_string(),
        }
    }

    async fn post_json(&self, path: &str, body: Value, timeout: Duration) -> Result<Value, BackendError> {
        let response = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .json(&body)
            .timeout(timeout)
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json::<Value>().await?)
    }

    async fn run(&self, locator: &str, kind: MediaKind) -> Result<ResolutionResult, BackendError> {
        let id = extract_video_id(locator).ok_or_else(|| BackendError::InvalidLocator(locator.to_string()))?;

        let info = self
            .post_json(
                "/api/v2/info",
                json!({ "url": format!("https://www.youtube.com/watch?v={}", id) }),
                INFO_TIMEOUT,
            )
            .await?;

        let encrypted = info["data"]["data"]
            .as_str()
            .or_else(|| info["data"].as_str())
            .ok_or_else(|| BackendError::UnexpectedResponse("missing encrypted data".to_string()))?;
        let session = decrypt_session(encrypted)?;
        debug!("[Savetube] Session established for '{}'", session.title);

        let quality = match kind {
            MediaKind::Audio => "128",
            MediaKind::Video => "360",
        };
        let dl = self
            .post_json(
                "/api/download",
                json!({ "id": id, "downloadType": kind.as_str(), "quality": quality, "key": session.key }),
                DOWNLOAD_TIMEOUT,
            )
            .await?;

        let link = dl["data"]["downloadUrl"]
            .as_str()
            .or_else(|| dl["downloadUrl"].as_str())
            .ok_or_else(|| BackendError::UnexpectedResponse("missing downloadUrl".to_string()))?;

        if !self.probe.is_usable(link).await {
            return Err(BackendError::UnusableLink(link.to_string()));
        }

        Ok(ResolutionResult {
            download_url: link.to_string(),
            title: session.title,
            source_label: format!("Savetube {}", kind),
        })
    }
}

#[async_trait]
impl ResolverBackend for SavetubeBackend {
    fn name(&self) -> &'static str {
        "Savetube"
    }

    fn supports(&self, _kind: MediaKind) -> bool {
        true
    }

    async fn resolve(&self, locator: &str, kind: MediaKind) -> Result<ResolutionResult, ResolutionError> {
        self.run(locator, kind).await.map_err(|e| {
            debug!("[Savetube] {} {} failed: {}", kind, locator, e);
            ResolutionError::new(self.name())
        })
    }
}
