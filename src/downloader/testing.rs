// Test doubles shared by the unit tests

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use super::errors::ResolutionError;
use super::models::{MediaKind, ResolutionResult, SearchResult};
use super::traits::{LinkProbe, ResolverBackend, SearchIndex};

/// Probe that answers `false` for the first `failures` calls, then `usable`
pub struct ScriptedProbe {
    failures: usize,
    usable: bool,
    calls: AtomicUsize,
}

impl ScriptedProbe {
    pub fn always(usable: bool) -> Self {
        Self {
            failures: 0,
            usable,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn usable_after(failures: usize) -> Self {
        Self {
            failures,
            usable: true,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LinkProbe for ScriptedProbe {
    async fn is_usable(&self, _url: &str) -> bool {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        n >= self.failures && self.usable
    }
}

pub fn result(url: &str, label: &str) -> ResolutionResult {
    ResolutionResult {
        download_url: url.to_string(),
        title: "Test Track".to_string(),
        source_label: label.to_string(),
    }
}

/// Backend that sleeps, then succeeds with a fixed result or fails
pub struct FakeBackend {
    name: &'static str,
    audio_only: bool,
    delay: Duration,
    outcome: Option<ResolutionResult>,
    calls: AtomicUsize,
}

impl FakeBackend {
    pub fn succeeding(name: &'static str, url: &str, delay: Duration) -> Self {
        Self {
            name,
            audio_only: false,
            delay,
            outcome: Some(result(url, name)),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(name: &'static str, delay: Duration) -> Self {
        Self {
            name,
            audio_only: false,
            delay,
            outcome: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn audio_only(mut self) -> Self {
        self.audio_only = true;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ResolverBackend for FakeBackend {
    fn name(&self) -> &'static str {
        self.name
    }

    fn supports(&self, kind: MediaKind) -> bool {
        !self.audio_only || kind.is_audio()
    }

    async fn resolve(&self, _locator: &str, _kind: MediaKind) -> Result<ResolutionResult, ResolutionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.outcome.clone().ok_or(ResolutionError::new(self.name))
    }
}

/// Search index that counts lookups and matches any query containing `needle`
pub struct FakeSearch {
    pub needle: &'static str,
    pub calls: AtomicUsize,
}

impl FakeSearch {
    pub fn new(needle: &'static str) -> Self {
        Self {
            needle,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SearchIndex for FakeSearch {
    async fn top_match(&self, query: &str) -> Option<SearchResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        query.contains(self.needle).then(|| SearchResult {
            video_id: "abc".to_string(),
            title: query.to_string(),
            url: "https://www.youtube.com/watch?v=abc".to_string(),
            author: None,
            duration: None,
            thumbnail: None,
        })
    }
}
