// Resolver module: race third-party backends for a verified direct link

pub mod backends;
pub mod cache;
pub mod config;
pub mod errors;
pub mod models;
pub mod orchestrator;
pub mod resolver;
pub mod search;
pub mod traits;
pub mod utils;
pub mod validator;

#[cfg(test)]
pub(crate) mod testing;

pub use cache::ResolutionCache;
pub use config::{BackendEndpoints, ResolverConfig};
pub use errors::{AllBackendsFailed, BackendError, PersistenceError, ResolutionError};
pub use models::{CacheEntry, MediaKind, ResolutionRequest, ResolutionResult, SearchResult};
pub use orchestrator::RaceOrchestrator;
pub use resolver::LinkResolver;
pub use traits::{LinkProbe, ResolverBackend, SearchIndex};
pub use validator::HttpLinkProbe;
