// Trait seams: backends, link probing and text search

use async_trait::async_trait;

use super::errors::ResolutionError;
use super::models::{MediaKind, ResolutionResult, SearchResult};

/// One third-party resolution service with its own protocol
#[async_trait]
pub trait ResolverBackend: Send + Sync {
    /// Name of the backend (for logging)
    fn name(&self) -> &'static str;

    /// Whether this backend can produce the requested kind
    fn supports(&self, kind: MediaKind) -> bool;

    /// Turn a locator into a validated direct link
    async fn resolve(&self, locator: &str, kind: MediaKind) -> Result<ResolutionResult, ResolutionError>;
}

/// Decides whether a candidate link is worth handing out
#[async_trait]
pub trait LinkProbe: Send + Sync {
    async fn is_usable(&self, url: &str) -> bool;
}

/// Free-text lookup against a video index
#[async_trait]
pub trait SearchIndex: Send + Sync {
    /// `query` is already normalised (trimmed, lowercase)
    async fn top_match(&self, query: &str) -> Option<SearchResult>;
}
