//! Offline caching layer.
//!
//! A [`CacheRouter`] sits between readers and the site. Each request is
//! matched against an ordered route table and answered with one of four
//! strategies over named, versioned cache partitions. [`create_proxy`]
//! exposes the router as an axum service so the site can be browsed
//! through it.

mod fetcher;
mod proxy;
mod request;
mod router;
mod routes;
mod storage;

pub use fetcher::{Fetcher, HttpFetcher};
pub use proxy::{create_proxy, CACHE_SOURCE_HEADER};
pub use request::{CachedResponse, FetchError, FetchRequest};
pub use router::{CacheRouter, Served, PRECACHE_PARTITION, RUNTIME_PARTITION};
pub use routes::{default_routes, match_route, Route};
pub use storage::{CacheNames, CacheStorage, PartitionInfo};

/// How a route answers requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Serve from cache; fetch and store only on a miss.
    CacheFirst,
    /// Fetch; fall back to cache, then to the offline document.
    NetworkFirst,
    /// Serve from cache and refresh in the background.
    StaleWhileRevalidate,
    /// Always fetch, never store.
    NetworkOnly,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CacheFirst => "cache-first",
            Self::NetworkFirst => "network-first",
            Self::StaleWhileRevalidate => "stale-while-revalidate",
            Self::NetworkOnly => "network-only",
        }
    }
}

/// Where a served response came from, reported in `x-cache-source`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServedFrom {
    Cache,
    Network,
    Offline,
}

impl ServedFrom {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cache => "cache",
            Self::Network => "network",
            Self::Offline => "offline",
        }
    }
}
