// Resolver backends

pub mod ezconv;
pub mod savetube;
pub mod ytdown;

pub use ezconv::EzconvBackend;
pub use savetube::SavetubeBackend;
pub use ytdown::YtDownBackend;

use reqwest::Client;
use std::sync::Arc;

use super::config::ResolverConfig;
use super::traits::{LinkProbe, ResolverBackend};

/// All production backends in launch order
pub fn default_backends(
    client: &Client,
    probe: Arc<dyn LinkProbe>,
    config: &ResolverConfig,
) -> Vec<Arc<dyn ResolverBackend>> {
    vec![
        Arc::new(YtDownBackend::new(client.clone(), probe.clone(), config)),
        Arc::new(EzconvBackend::new(client.clone(), probe.clone(), config)),
        Arc::new(SavetubeBackend::new(client.clone(), probe, config)),
    ]
}
