// Resolver facade: cache first, race on miss, write back on success

use parking_lot::RwLock;
use reqwest::Client;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::backends::default_backends;
use super::cache::ResolutionCache;
use super::config::ResolverConfig;
use super::models::{MediaKind, ResolutionRequest, ResolutionResult, SearchResult};
use super::orchestrator::RaceOrchestrator;
use super::search::YoutubeSearch;
use super::traits::{LinkProbe, SearchIndex};
use super::utils::{build_http_client, fetch_bytes};
use super::validator::HttpLinkProbe;

/// Single entry point for callers.
///
/// Failures never surface as errors: an unresolvable locator is `None`.
pub struct LinkResolver {
    cache: ResolutionCache,
    orchestrator: RaceOrchestrator,
    probe: Arc<dyn LinkProbe>,
    search: Arc<dyn SearchIndex>,
    // Per normalised query, for the life of the process
    search_cache: RwLock<HashMap<String, SearchResult>>,
    client: Client,
    config: ResolverConfig,
}

impl LinkResolver {
    /// Wire the production probe, backends, search and cache from `config`
    pub fn from_config(config: ResolverConfig) -> Result<Self, reqwest::Error> {
        let client = build_http_client(config.proxy.as_deref())?;
        let probe: Arc<dyn LinkProbe> = Arc::new(HttpLinkProbe::from_config(client.clone(), &config));
        let orchestrator = RaceOrchestrator::with_backends(default_backends(&client, probe.clone(), &config));
        let search = Arc::new(YoutubeSearch::new(client.clone(), &config.endpoints.search));
        let cache = ResolutionCache::load(&config.cache_path, config.cache_ttl);

        Ok(Self::with_parts(cache, orchestrator, probe, search, client, config))
    }

    pub fn with_parts(
        cache: ResolutionCache,
        orchestrator: RaceOrchestrator,
        probe: Arc<dyn LinkProbe>,
        search: Arc<dyn SearchIndex>,
        client: Client,
        config: ResolverConfig,
    ) -> Self {
        Self {
            cache,
            orchestrator,
            probe,
            search,
            search_cache: RwLock::new(HashMap::new()),
            client,
            config,
        }
    }

    pub fn cache(&self) -> &ResolutionCache {
        &self.cache
    }

    /// Resolve `locator` to a verified direct link
    pub async fn resolve(&self, locator: &str, kind: MediaKind) -> Option<ResolutionResult> {
        let request = ResolutionRequest::new(locator, kind);
        let key = request.cache_key();

        if let Some(entry) = self.cache.lookup(&key).await {
            if self.probe.is_usable(&entry.result.download_url).await {
                info!("Served from cache: {} ({})", entry.result.title, entry.result.source_label);
                return Some(entry.result);
            }
            debug!("Cached link for {} no longer valid, re-resolving", locator);
            self.cache.evict(&key).await;
        }

        match self.orchestrator.race(&request.locator, request.kind).await {
            Ok(result) => {
                info!("Resolved {} via {}", locator, result.source_label);
                self.cache.store(&key, result.clone()).await;
                Some(result)
            }
            Err(e) => {
                warn!("Could not resolve {} ({}): {}", locator, kind, e);
                None
            }
        }
    }

    /// Top video for a free-text query; hits are remembered per normalised query
    pub async fn search_top_match(&self, query: &str) -> Option<SearchResult> {
        let normalized = query.trim().to_lowercase();
        if normalized.is_empty() {
            return None;
        }

        if let Some(hit) = self.search_cache.read().get(&normalized) {
            return Some(hit.clone());
        }

        let found = self.search.top_match(&normalized).await?;
        self.search_cache.write().insert(normalized, found.clone());
        Some(found)
    }

    /// Download the payload behind a resolved link. Empty on failure.
    pub async fn fetch(&self, result: &ResolutionResult) -> Vec<u8> {
        fetch_bytes(&self.client, &result.download_url, self.config.fetch_timeout).await
    }
}
