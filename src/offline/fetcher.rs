use async_trait::async_trait;
use reqwest::{redirect, Client};
use url::Url;

use super::request::{CachedResponse, FetchError, FetchRequest};

/// The network side of the cache router.
#[async_trait]
pub trait Fetcher: Send + Sync + 'static {
    /// Perform the request. Any HTTP status is a successful fetch; only
    /// transport failures are errors.
    async fn fetch(&self, request: &FetchRequest) -> Result<CachedResponse, FetchError>;
}

/// Headers that describe one hop and must not be replayed.
const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
    "host",
    "content-length",
];

pub(crate) fn is_hop_by_hop(name: &str) -> bool {
    HOP_BY_HOP.iter().any(|h| h.eq_ignore_ascii_case(name))
}

/// Fetches over HTTP, sending same-origin requests to the upstream site.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    origin: Url,
    upstream: Url,
}

impl HttpFetcher {
    /// Redirects are returned to the caller, never followed.
    pub fn new(origin: Url, upstream: Url) -> Self {
        let client = Client::builder()
            .redirect(redirect::Policy::none())
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Falling back to default HTTP client: {}", e);
                Client::new()
            });
        Self {
            client,
            origin,
            upstream,
        }
    }

    /// Map a public URL to where it is actually fetched from.
    pub fn target(&self, url: &Url) -> Result<Url, FetchError> {
        if url.origin() != self.origin.origin() {
            return Ok(url.clone());
        }
        let mut path = url.path().to_string();
        if let Some(query) = url.query() {
            path.push('?');
            path.push_str(query);
        }
        Ok(self.upstream.join(&path)?)
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<CachedResponse, FetchError> {
        let target = self.target(&request.url)?;
        tracing::debug!("Fetching {} {}", request.method, target);

        let mut builder = self.client.request(request.method.clone(), target);
        for (name, value) in &request.headers {
            if !is_hop_by_hop(name) {
                builder = builder.header(name.as_str(), value.as_str());
            }
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter(|(name, _)| !is_hop_by_hop(name.as_str()))
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response.bytes().await?;

        Ok(CachedResponse::new(status, headers, body))
    }
}
