use axum::body::Bytes;
use chrono::{DateTime, Utc};
use reqwest::Method;
use thiserror::Error;
use url::Url;

/// A request as seen by the cache router.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub method: Method,
    pub url: Url,
    /// Top-level page navigation (eligible for the offline document).
    pub navigate: bool,
    pub headers: Vec<(String, String)>,
    pub body: Option<Bytes>,
}

impl FetchRequest {
    pub fn get(url: Url) -> Self {
        Self {
            method: Method::GET,
            url,
            navigate: false,
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn navigation(url: Url) -> Self {
        Self {
            navigate: true,
            ..Self::get(url)
        }
    }

    /// Cache key: the URL without its fragment.
    pub fn cache_key(&self) -> String {
        cache_key(&self.url)
    }
}

pub(crate) fn cache_key(url: &Url) -> String {
    let mut url = url.clone();
    url.set_fragment(None);
    url.to_string()
}

/// A response that can be stored and replayed.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
    pub stored_at: DateTime<Utc>,
}

impl CachedResponse {
    pub fn new(status: u16, headers: Vec<(String, String)>, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
            stored_at: Utc::now(),
        }
    }

    /// Whether the response counts as a success worth caching (2xx).
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Why a request could not be answered.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Network request failed: {0}")]
    Network(String),

    #[error("Precaching {url} failed with status {status}")]
    Precache { url: String, status: u16 },

    #[error("Invalid upstream URL: {0}")]
    Url(#[from] url::ParseError),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        Self::Network(e.to_string())
    }
}
