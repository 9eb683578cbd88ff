use std::sync::Arc;

use reqwest::Method;
use tokio::task::JoinHandle;
use url::Url;

use crate::config::OfflineConfig;

use super::fetcher::Fetcher;
use super::request::{cache_key, CachedResponse, FetchError, FetchRequest};
use super::routes::{match_route, Route};
use super::storage::{CacheNames, CacheStorage};
use super::{ServedFrom, Strategy};

/// Logical partition for same-origin requests no route matched.
pub const RUNTIME_PARTITION: &str = "runtime";
/// Logical partition filled on install.
pub const PRECACHE_PARTITION: &str = "precache";

/// A routed response plus, for stale-while-revalidate hits, the background
/// refresh that was started.
#[derive(Debug)]
pub struct Served {
    pub response: CachedResponse,
    pub source: ServedFrom,
    pub revalidation: Option<JoinHandle<()>>,
}

impl Served {
    fn new(response: CachedResponse, source: ServedFrom) -> Self {
        Self {
            response,
            source,
            revalidation: None,
        }
    }
}

/// Routes requests to caching strategies over versioned partitions.
pub struct CacheRouter {
    routes: Vec<Route>,
    names: CacheNames,
    storage: Arc<CacheStorage>,
    fetcher: Arc<dyn Fetcher>,
    origin: Url,
    offline_url: Url,
    precache: Vec<String>,
}

impl CacheRouter {
    pub fn new(
        routes: Vec<Route>,
        names: CacheNames,
        storage: Arc<CacheStorage>,
        fetcher: Arc<dyn Fetcher>,
        origin: Url,
        offline_path: &str,
    ) -> Result<Self, FetchError> {
        let offline_url = origin.join(offline_path)?;
        Ok(Self {
            routes,
            names,
            storage,
            fetcher,
            origin,
            offline_url,
            precache: Vec::new(),
        })
    }

    /// Build a router from proxy settings.
    pub fn from_config(
        config: &OfflineConfig,
        fetcher: Arc<dyn Fetcher>,
        storage: Arc<CacheStorage>,
    ) -> Result<Self, FetchError> {
        let router = Self::new(
            config.routes.clone(),
            CacheNames::new(&config.cache_prefix, &config.cache_version),
            storage,
            fetcher,
            config.origin.clone(),
            &config.offline_path,
        )?;
        Ok(router.with_precache(config.precache.clone()))
    }

    pub fn with_precache(mut self, paths: Vec<String>) -> Self {
        self.precache = paths;
        self
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }

    pub fn names(&self) -> &CacheNames {
        &self.names
    }

    pub fn storage(&self) -> &Arc<CacheStorage> {
        &self.storage
    }

    // ============================================================
    // Lifecycle
    // ============================================================

    /// Fetch every precache path into the precache partition.
    ///
    /// Fails on the first transport error or non-2xx response; nothing
    /// after the failing path is fetched.
    pub async fn install(&self) -> Result<usize, FetchError> {
        let partition = self.names.full(PRECACHE_PARTITION);
        for path in &self.precache {
            let url = self.origin.join(path)?;
            let response = self.fetcher.fetch(&FetchRequest::get(url.clone())).await?;
            if !response.is_ok() {
                return Err(FetchError::Precache {
                    url: url.to_string(),
                    status: response.status,
                });
            }
            self.storage.store(&partition, &cache_key(&url), response);
        }
        tracing::info!("Precached {} URLs into {}", self.precache.len(), partition);
        Ok(self.precache.len())
    }

    /// Logical partitions this router writes to.
    fn partitions(&self) -> Vec<&str> {
        let mut partitions: Vec<&str> = self.routes.iter().map(|r| r.partition.as_str()).collect();
        partitions.extend([RUNTIME_PARTITION, PRECACHE_PARTITION]);
        partitions.sort_unstable();
        partitions.dedup();
        partitions
    }

    /// Delete partitions left behind by other versions of this prefix.
    ///
    /// Only names built from this router's own logical partitions are
    /// candidates; anything else sharing the prefix text is left alone.
    pub fn activate(&self) -> Vec<String> {
        let partitions = self.partitions();
        let stale: Vec<String> = self
            .storage
            .names()
            .into_iter()
            .filter(|name| self.names.is_stale(name, &partitions))
            .collect();

        for name in &stale {
            self.storage.delete(name);
            tracing::info!("Deleted stale cache partition {}", name);
        }
        stale
    }

    // ============================================================
    // Routing
    // ============================================================

    /// Pick the strategy and partition for a request.
    pub fn resolve(&self, request: &FetchRequest) -> (Strategy, Option<String>) {
        if request.method != Method::GET {
            return (Strategy::NetworkOnly, None);
        }
        if let Some(route) = match_route(&self.routes, &request.url) {
            return (route.strategy, Some(self.names.full(&route.partition)));
        }
        if request.url.origin() == self.origin.origin() {
            (
                Strategy::NetworkFirst,
                Some(self.names.full(RUNTIME_PARTITION)),
            )
        } else {
            (Strategy::NetworkOnly, None)
        }
    }

    pub async fn handle(&self, request: FetchRequest) -> Result<Served, FetchError> {
        let (strategy, partition) = self.resolve(&request);
        tracing::debug!(
            "{} {} -> {:?} ({})",
            request.method,
            request.url,
            strategy,
            partition.as_deref().unwrap_or("no cache")
        );

        match (strategy, partition) {
            (Strategy::CacheFirst, Some(partition)) => {
                self.cache_first(&partition, &request).await
            }
            (Strategy::NetworkFirst, Some(partition)) => {
                self.network_first(&partition, &request).await
            }
            (Strategy::StaleWhileRevalidate, Some(partition)) => {
                self.stale_while_revalidate(&partition, &request).await
            }
            _ => self.network_only(&request).await,
        }
    }

    // ============================================================
    // Strategies
    // ============================================================

    async fn cache_first(
        &self,
        partition: &str,
        request: &FetchRequest,
    ) -> Result<Served, FetchError> {
        let key = request.cache_key();
        if let Some(cached) = self.storage.lookup(partition, &key) {
            tracing::debug!("Cache HIT {} in {}", key, partition);
            return Ok(Served::new(cached, ServedFrom::Cache));
        }

        tracing::debug!("Cache MISS {} in {}", key, partition);
        self.fetch_and_store(partition, &key, request).await
    }

    async fn network_first(
        &self,
        partition: &str,
        request: &FetchRequest,
    ) -> Result<Served, FetchError> {
        let key = request.cache_key();
        match self.fetcher.fetch(request).await {
            Ok(response) => {
                self.store_if_ok(partition, &key, &response);
                Ok(Served::new(response, ServedFrom::Network))
            }
            Err(e) => {
                if let Some(cached) = self.storage.lookup(partition, &key) {
                    tracing::info!("Network failed for {}, serving cached copy: {}", key, e);
                    return Ok(Served::new(cached, ServedFrom::Cache));
                }
                self.offline_fallback(request, &key, e)
            }
        }
    }

    async fn stale_while_revalidate(
        &self,
        partition: &str,
        request: &FetchRequest,
    ) -> Result<Served, FetchError> {
        let key = request.cache_key();
        let Some(cached) = self.storage.lookup(partition, &key) else {
            tracing::debug!("Cache MISS {} in {}", key, partition);
            return self.fetch_and_store(partition, &key, request).await;
        };

        tracing::debug!("Cache HIT {} in {}, revalidating", key, partition);
        let fetcher = Arc::clone(&self.fetcher);
        let storage = Arc::clone(&self.storage);
        let partition = partition.to_string();
        let request = request.clone();
        let revalidation = tokio::spawn(async move {
            match fetcher.fetch(&request).await {
                Ok(response) if response.is_ok() => {
                    storage.store(&partition, &key, response);
                    tracing::debug!("Revalidated {} in {}", key, partition);
                }
                Ok(response) => {
                    tracing::debug!("Revalidation of {} returned {}", key, response.status)
                }
                Err(e) => tracing::debug!("Revalidation of {} failed: {}", key, e),
            }
        });

        Ok(Served {
            response: cached,
            source: ServedFrom::Cache,
            revalidation: Some(revalidation),
        })
    }

    async fn network_only(&self, request: &FetchRequest) -> Result<Served, FetchError> {
        let response = self.fetcher.fetch(request).await?;
        Ok(Served::new(response, ServedFrom::Network))
    }

    /// Fetch on a cache miss, storing a 2xx response. A failed fetch falls
    /// back to the offline document for navigations.
    async fn fetch_and_store(
        &self,
        partition: &str,
        key: &str,
        request: &FetchRequest,
    ) -> Result<Served, FetchError> {
        match self.fetcher.fetch(request).await {
            Ok(response) => {
                self.store_if_ok(partition, key, &response);
                Ok(Served::new(response, ServedFrom::Network))
            }
            Err(e) => self.offline_fallback(request, key, e),
        }
    }

    fn offline_fallback(
        &self,
        request: &FetchRequest,
        key: &str,
        error: FetchError,
    ) -> Result<Served, FetchError> {
        if request.navigate {
            if let Some(offline) = self.offline_document() {
                tracing::info!("Network failed for {}, serving offline page: {}", key, error);
                return Ok(Served::new(offline, ServedFrom::Offline));
            }
        }
        tracing::warn!("Network failed for {} with no fallback: {}", key, error);
        Err(error)
    }

    fn store_if_ok(&self, partition: &str, key: &str, response: &CachedResponse) {
        if response.is_ok() {
            self.storage.store(partition, key, response.clone());
            tracing::debug!("Stored {} in {}", key, partition);
        }
    }

    fn offline_document(&self) -> Option<CachedResponse> {
        self.storage.lookup(
            &self.names.full(PRECACHE_PARTITION),
            &cache_key(&self.offline_url),
        )
    }
}
