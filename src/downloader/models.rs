// Common data models for the resolver

use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Requested output type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Audio,
    Video,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Audio => "audio",
            Self::Video => "video",
        }
    }

    pub fn is_audio(&self) -> bool {
        matches!(self, Self::Audio)
    }

    /// File extension used when saving a fetched payload
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Audio => "mp3",
            Self::Video => "mp4",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One resolution call: what to resolve and in which form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionRequest {
    pub locator: String,
    pub kind: MediaKind,
}

impl ResolutionRequest {
    pub fn new(locator: impl Into<String>, kind: MediaKind) -> Self {
        Self {
            locator: locator.into(),
            kind,
        }
    }

    /// Cache fingerprint: hex MD5 of `"{locator}_{is_audio}"`
    pub fn cache_key(&self) -> String {
        let digest = Md5::digest(format!("{}_{}", self.locator, self.kind.is_audio()).as_bytes());
        hex::encode(digest)
    }
}

/// A verified direct link produced by the winning backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionResult {
    pub download_url: String,
    pub title: String,
    /// Which backend produced it, e.g. "Savetube audio"
    pub source_label: String,
}

/// A cached result and when it was stored (unix millis)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub result: ResolutionResult,
    pub created_at: i64,
}

/// Top match returned by the text search collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub video_id: String,
    pub title: String,
    pub url: String,
    pub author: Option<String>,
    /// Display duration such as "3:45"
    pub duration: Option<String>,
    pub thumbnail: Option<String>,
}
