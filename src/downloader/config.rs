// Resolver configuration: timeouts, cache location, backend endpoints

use std::path::PathBuf;
use std::time::Duration;

/// Base URLs of the third-party services each backend talks to
#[derive(Debug, Clone)]
pub struct BackendEndpoints {
    /// YTDown proxy root (proxy.php lives under it)
    pub ytdown: String,
    /// Savetube API root
    pub savetube: String,
    /// Turnstile bypass service used before Ezconv
    pub captcha_bypass: String,
    /// Ezconv conversion API root
    pub ezconv: String,
    /// Video index used by text search
    pub search: String,
}

impl Default for BackendEndpoints {
    fn default() -> Self {
        Self {
            ytdown: "https://ytdown.to".to_string(),
            savetube: "https://media.savetube.me".to_string(),
            captcha_bypass: "https://anabot.my.id/api/tools/bypass".to_string(),
            ezconv: "https://ds1.ezsrv.net".to_string(),
            search: "https://www.youtube.com".to_string(),
        }
    }
}

impl BackendEndpoints {
    /// Point every backend at one host (mock servers in tests)
    pub fn all_at(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            ytdown: base.to_string(),
            savetube: base.to_string(),
            captcha_bypass: format!("{}/api/tools/bypass", base),
            ezconv: base.to_string(),
            search: base.to_string(),
        }
    }
}

/// Configuration for the resolver and its collaborators
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// JSON file mirroring the resolution cache
    pub cache_path: PathBuf,
    /// Maximum entry age
    pub cache_ttl: Duration,
    /// SOCKS5/HTTP proxy URL for every outgoing request
    pub proxy: Option<String>,
    /// HEAD probe timeout
    pub probe_timeout: Duration,
    /// Links at or below this size are treated as placeholder pages
    pub min_content_length: u64,
    /// YTDown polling ceiling
    pub poll_attempts: u32,
    pub poll_interval: Duration,
    /// Timeout for raw payload downloads
    pub fetch_timeout: Duration,
    pub endpoints: BackendEndpoints,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            cache_path: PathBuf::from("lib").join("ytcache.json"),
            cache_ttl: Duration::from_secs(8 * 24 * 60 * 60),
            proxy: None,
            probe_timeout: Duration::from_millis(2500),
            min_content_length: 102_400,
            poll_attempts: 10,
            poll_interval: Duration::from_millis(1500),
            fetch_timeout: Duration::from_secs(120),
            endpoints: BackendEndpoints::default(),
        }
    }
}

impl ResolverConfig {
    /// Defaults overridden by `RESOLVER_CACHE_PATH`, `RESOLVER_CACHE_TTL_SECS`
    /// and `RESOLVER_PROXY` when set.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(path) = std::env::var("RESOLVER_CACHE_PATH") {
            if !path.trim().is_empty() {
                config.cache_path = PathBuf::from(path);
            }
        }

        if let Ok(secs) = std::env::var("RESOLVER_CACHE_TTL_SECS") {
            match secs.trim().parse::<u64>() {
                Ok(secs) => config.cache_ttl = Duration::from_secs(secs),
                Err(_) => tracing::warn!("Ignoring invalid RESOLVER_CACHE_TTL_SECS={}", secs),
            }
        }

        if let Ok(proxy) = std::env::var("RESOLVER_PROXY") {
            if !proxy.trim().is_empty() {
                config.proxy = Some(proxy);
            }
        }

        config
    }

    pub fn with_cache_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_path = path.into();
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn with_proxy(mut self, proxy: Option<String>) -> Self {
        self.proxy = proxy;
        self
    }

    pub fn with_poll(mut self, attempts: u32, interval: Duration) -> Self {
        self.poll_attempts = attempts;
        self.poll_interval = interval;
        self
    }

    pub fn with_endpoints(mut self, endpoints: BackendEndpoints) -> Self {
        self.endpoints = endpoints;
        self
    }
}
