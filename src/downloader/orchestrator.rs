// Race orchestrator: first validated success wins

use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use super::errors::AllBackendsFailed;
use super::models::{MediaKind, ResolutionResult};
use super::traits::ResolverBackend;

/// Launches every applicable backend at once and returns the first success.
///
/// Losing backends are not cancelled: their tasks are detached and run to
/// completion in the background, and whatever they produce is dropped.
pub struct RaceOrchestrator {
    backends: Vec<Arc<dyn ResolverBackend>>,
}

impl RaceOrchestrator {
    pub fn new() -> Self {
        Self {
            backends: Vec::new(),
        }
    }

    pub fn with_backends(backends: Vec<Arc<dyn ResolverBackend>>) -> Self {
        Self { backends }
    }

    pub fn add_backend(&mut self, backend: Arc<dyn ResolverBackend>) {
        self.backends.push(backend);
    }

    /// Backends able to produce `kind`, in registration order
    pub fn backends_for(&self, kind: MediaKind) -> Vec<Arc<dyn ResolverBackend>> {
        self.backends
            .iter()
            .filter(|b| b.supports(kind))
            .cloned()
            .collect()
    }

    pub async fn race(&self, locator: &str, kind: MediaKind) -> Result<ResolutionResult, AllBackendsFailed> {
        let selected = self.backends_for(kind);
        let attempted = selected.len();
        if attempted == 0 {
            warn!("[Race] No backend supports {}", kind);
            return Err(AllBackendsFailed { attempted });
        }

        debug!(
            "[Race] Launching {} backends for {} {}",
            attempted,
            kind,
            locator
        );
        let started = Instant::now();

        let mut pending: FuturesUnordered<_> = selected
            .into_iter()
            .map(|backend| {
                let locator = locator.to_string();
                tokio::spawn(async move { backend.resolve(&locator, kind).await })
            })
            .collect();

        while let Some(joined) = pending.next().await {
            match joined {
                Ok(Ok(result)) => {
                    info!(
                        "[Race] Winner: {} after {:?}",
                        result.source_label,
                        started.elapsed()
                    );
                    // Dropping the remaining JoinHandles detaches those tasks
                    return Ok(result);
                }
                Ok(Err(e)) => debug!("[Race] {}", e),
                Err(e) => warn!("[Race] Backend task aborted: {}", e),
            }
        }

        warn!("[Race] All {} backends failed for {} {}", attempted, kind, locator);
        Err(AllBackendsFailed { attempted })
    }
}

impl Default for RaceOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::downloader::testing::FakeBackend;
    use std::time::Duration;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[tokio::test]
    async fn test_first_success_wins_over_earlier_failures() {
        let orchestrator = RaceOrchestrator::with_backends(vec![
            Arc::new(FakeBackend::failing("fast-fail", ms(5))),
            Arc::new(FakeBackend::succeeding("slow-ok", "https://x/slow.mp3", ms(300))),
            Arc::new(FakeBackend::succeeding("quick-ok", "https://x/quick.mp3", ms(40))),
        ]);

        let result = orchestrator.race("abc", MediaKind::Audio).await.unwrap();
        assert_eq!(result.download_url, "https://x/quick.mp3");
    }

    #[tokio::test]
    async fn test_does_not_wait_for_stragglers() {
        let orchestrator = RaceOrchestrator::with_backends(vec![
            Arc::new(FakeBackend::succeeding("stuck", "https://x/never.mp3", Duration::from_secs(30))),
            Arc::new(FakeBackend::succeeding("ok", "https://x/y.mp3", ms(10))),
        ]);

        let result = tokio::time::timeout(Duration::from_secs(2), orchestrator.race("abc", MediaKind::Video))
            .await
            .expect("race should return as soon as one backend succeeds")
            .unwrap();
        assert_eq!(result.source_label, "ok");
    }

    #[tokio::test]
    async fn test_all_failures_collapse_into_one_error() {
        let orchestrator = RaceOrchestrator::with_backends(vec![
            Arc::new(FakeBackend::failing("a", ms(5))),
            Arc::new(FakeBackend::failing("b", ms(15))),
            Arc::new(FakeBackend::failing("c", ms(1))),
        ]);

        let err = orchestrator.race("abc", MediaKind::Audio).await.unwrap_err();
        assert_eq!(err, AllBackendsFailed { attempted: 3 });
    }

    #[tokio::test]
    async fn test_video_skips_audio_only_backends() {
        let audio_only = Arc::new(FakeBackend::succeeding("audio", "https://x/a.mp3", ms(1)).audio_only());
        let both = Arc::new(FakeBackend::succeeding("both", "https://x/v.mp4", ms(20)));
        let mut orchestrator = RaceOrchestrator::new();
        orchestrator.add_backend(audio_only.clone());
        orchestrator.add_backend(both.clone());

        assert_eq!(orchestrator.backends_for(MediaKind::Audio).len(), 2);
        assert_eq!(orchestrator.backends_for(MediaKind::Video).len(), 1);

        let result = orchestrator.race("abc", MediaKind::Video).await.unwrap();
        assert_eq!(result.download_url, "https://x/v.mp4");
        assert_eq!(audio_only.calls(), 0);
        assert_eq!(both.calls(), 1);
    }

    #[tokio::test]
    async fn test_no_applicable_backend_fails() {
        let orchestrator = RaceOrchestrator::with_backends(vec![Arc::new(
            FakeBackend::succeeding("audio", "https://x/a.mp3", ms(1)).audio_only(),
        )]);
        let err = orchestrator.race("abc", MediaKind::Video).await.unwrap_err();
        assert_eq!(err.attempted, 0);
    }
}
