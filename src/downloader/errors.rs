// Error types for resolver backends, the race and the cache mirror

use thiserror::Error;

/// Everything that can go wrong inside a single backend protocol.
///
/// Never leaves the backend that produced it: adapters log it and collapse it
/// into a [`ResolutionError`].
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Response parsed but did not have the expected shape
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("decryption failed: {0}")]
    Decrypt(String),

    #[error("no {0} media offered")]
    NoMatchingMedia(&'static str),

    #[error("link failed validation: {0}")]
    UnusableLink(String),

    #[error("no usable link after {0} attempts")]
    RetriesExhausted(u32),

    #[error("captcha bypass failed: {0}")]
    CaptchaBypass(String),

    #[error("invalid locator: {0}")]
    InvalidLocator(String),
}

/// Opaque failure of one backend. Carries nothing but the backend's name.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{backend} could not resolve the locator")]
pub struct ResolutionError {
    pub backend: &'static str,
}

impl ResolutionError {
    pub fn new(backend: &'static str) -> Self {
        Self { backend }
    }
}

/// Every launched backend failed (or none applied to the requested kind).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("all {attempted} backends failed")]
pub struct AllBackendsFailed {
    pub attempted: usize,
}

/// Reading or writing the on-disk cache mirror failed.
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed cache file: {0}")]
    Malformed(#[from] serde_json::Error),
}
