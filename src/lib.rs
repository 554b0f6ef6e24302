pub mod downloader;

pub use downloader::utils::clean_file_name;
pub use downloader::{LinkResolver, MediaKind, ResolutionResult, ResolverConfig, SearchResult};

use tracing_subscriber::EnvFilter;

/// Install the fmt subscriber; `RUST_LOG` overrides the default `info` level
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
