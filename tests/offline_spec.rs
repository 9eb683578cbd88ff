use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::http::{header, HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use fsd_site::config::OfflineConfig;
use fsd_site::offline::*;
use serde_json::Value;
use tokio_test::assert_ok;
use url::Url;

const ORIGIN: &str = "http://127.0.0.1:3001";
const OFFLINE_HTML: &str = "<h1>You're offline</h1>";

/// In-memory network: responses keyed by path, with switches for going
/// offline and for never answering.
#[derive(Default)]
struct ScriptedFetcher {
    responses: Mutex<HashMap<String, (u16, String)>>,
    calls: AtomicUsize,
    offline: AtomicBool,
    hang: AtomicBool,
}

impl ScriptedFetcher {
    fn with_site() -> Arc<Self> {
        let fetcher = Arc::new(Self::default());
        fetcher.respond("/", 200, "<h1>Curriculum</h1>");
        fetcher.respond("/offline", 200, OFFLINE_HTML);
        fetcher.respond("/manifest.webmanifest", 200, "{}");
        fetcher
    }

    fn respond(&self, path: &str, status: u16, body: &str) {
        self.responses
            .lock()
            .unwrap()
            .insert(path.to_string(), (status, body.to_string()));
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn go_offline(&self) {
        self.offline.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<CachedResponse, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.hang.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.offline.load(Ordering::SeqCst) {
            return Err(FetchError::Network("connection refused".to_string()));
        }

        let scripted = self.responses.lock().unwrap().get(request.url.path()).cloned();
        let (status, body) = scripted.unwrap_or((404, "not found".to_string()));
        Ok(CachedResponse::new(
            status,
            vec![("content-type".to_string(), "text/html".to_string())],
            body,
        ))
    }
}

fn setup() -> (Arc<CacheRouter>, Arc<ScriptedFetcher>) {
    let fetcher = ScriptedFetcher::with_site();
    let router = router_with(fetcher.clone(), Arc::new(CacheStorage::new()), "v1");
    (Arc::new(router), fetcher)
}

fn router_with(fetcher: Arc<ScriptedFetcher>, storage: Arc<CacheStorage>, version: &str) -> CacheRouter {
    let mut config = OfflineConfig::new(
        Url::parse(ORIGIN).unwrap(),
        Url::parse("http://127.0.0.1:3000").unwrap(),
    );
    config.cache_version = version.to_string();
    CacheRouter::from_config(&config, fetcher, storage).expect("Failed to build router")
}

fn url(path: &str) -> Url {
    Url::parse(ORIGIN).unwrap().join(path).unwrap()
}

fn body(served: &Served) -> &str {
    std::str::from_utf8(&served.response.body).unwrap()
}

mod cache_first {
    use super::*;

    #[tokio::test]
    async fn serves_a_stored_response_without_refetching() {
        let (router, fetcher) = setup();
        fetcher.respond("/static/app.js", 200, "console.log(1)");

        let first = router.handle(FetchRequest::get(url("/static/app.js"))).await.unwrap();
        let second = router.handle(FetchRequest::get(url("/static/app.js#main"))).await.unwrap();

        assert_eq!(first.source, ServedFrom::Network);
        assert_eq!(second.source, ServedFrom::Cache);
        assert_eq!(body(&second), "console.log(1)");
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn does_not_store_error_responses() {
        let (router, fetcher) = setup();

        let first = router.handle(FetchRequest::get(url("/static/missing.js"))).await.unwrap();
        let second = router.handle(FetchRequest::get(url("/static/missing.js"))).await.unwrap();

        assert_eq!(first.response.status, 404);
        assert_eq!(second.source, ServedFrom::Network);
        assert_eq!(fetcher.calls(), 2);
    }

    #[tokio::test]
    async fn offline_navigation_miss_gets_the_offline_page() {
        let (router, fetcher) = setup();
        router.install().await.unwrap();
        fetcher.go_offline();

        let served = router
            .handle(FetchRequest::navigation(url("/static/guide.html")))
            .await
            .unwrap();

        assert_eq!(served.source, ServedFrom::Offline);
        assert_eq!(body(&served), OFFLINE_HTML);
    }
}

mod network_first {
    use super::*;

    #[tokio::test]
    async fn prefers_fresh_data_and_serves_stale_only_on_failure() {
        let (router, fetcher) = setup();
        fetcher.respond("/api/v1/topics", 200, "v1");
        router.handle(FetchRequest::get(url("/api/v1/topics"))).await.unwrap();

        fetcher.respond("/api/v1/topics", 200, "v2");
        let fresh = router.handle(FetchRequest::get(url("/api/v1/topics"))).await.unwrap();
        assert_eq!(fresh.source, ServedFrom::Network);
        assert_eq!(body(&fresh), "v2");

        fetcher.go_offline();
        let stale = router.handle(FetchRequest::get(url("/api/v1/topics"))).await.unwrap();
        assert_eq!(stale.source, ServedFrom::Cache);
        assert_eq!(body(&stale), "v2");
    }

    #[tokio::test]
    async fn falls_back_to_the_offline_document_for_navigations() {
        let (router, fetcher) = setup();
        assert_ok!(router.install().await);
        fetcher.go_offline();

        let served = router.handle(FetchRequest::navigation(url("/about"))).await.unwrap();
        assert_eq!(served.source, ServedFrom::Offline);
        assert_eq!(body(&served), OFFLINE_HTML);

        let result = router.handle(FetchRequest::get(url("/about"))).await;
        assert!(matches!(result, Err(FetchError::Network(_))));
    }
}

mod stale_while_revalidate {
    use super::*;

    #[tokio::test]
    async fn never_blocks_on_the_network_when_cached() {
        let (router, fetcher) = setup();
        fetcher.respond("/topics/caching", 200, "cached page");
        let miss = router.handle(FetchRequest::get(url("/topics/caching"))).await.unwrap();
        assert_eq!(miss.source, ServedFrom::Network);
        assert!(miss.revalidation.is_none());

        fetcher.hang.store(true, Ordering::SeqCst);
        let hit = tokio::time::timeout(
            Duration::from_secs(1),
            router.handle(FetchRequest::get(url("/topics/caching"))),
        )
        .await
        .expect("served without waiting for the network")
        .unwrap();

        assert_eq!(hit.source, ServedFrom::Cache);
        assert_eq!(body(&hit), "cached page");
        let revalidation = hit.revalidation.expect("background refresh started");
        assert!(!revalidation.is_finished());
        revalidation.abort();
    }

    #[tokio::test]
    async fn refreshes_the_cache_in_the_background() {
        let (router, fetcher) = setup();
        fetcher.respond("/topics/caching", 200, "old");
        router.handle(FetchRequest::get(url("/topics/caching"))).await.unwrap();

        fetcher.respond("/topics/caching", 200, "new");
        let hit = router.handle(FetchRequest::get(url("/topics/caching"))).await.unwrap();
        assert_eq!(body(&hit), "old");
        hit.revalidation.unwrap().await.unwrap();

        let next = router.handle(FetchRequest::get(url("/topics/caching"))).await.unwrap();
        assert_eq!(next.source, ServedFrom::Cache);
        assert_eq!(body(&next), "new");
    }

    #[tokio::test]
    async fn unvisited_navigation_falls_back_to_the_offline_page() {
        let (router, fetcher) = setup();
        router.install().await.unwrap();
        fetcher.go_offline();

        let served = router
            .handle(FetchRequest::navigation(url("/topics/never-visited")))
            .await
            .unwrap();

        assert_eq!(served.source, ServedFrom::Offline);
        assert_eq!(body(&served), OFFLINE_HTML);
        assert!(served.revalidation.is_none());
    }

    #[tokio::test]
    async fn unvisited_subresource_still_fails_offline() {
        let (router, fetcher) = setup();
        router.install().await.unwrap();
        fetcher.go_offline();

        let result = router.handle(FetchRequest::get(url("/topics/never-visited"))).await;

        assert!(matches!(result, Err(FetchError::Network(_))));
    }
}

mod bypass {
    use super::*;

    #[tokio::test]
    async fn non_get_requests_go_to_the_network_only() {
        let (router, fetcher) = setup();
        fetcher.respond("/static/app.js", 200, "posted");

        let mut request = FetchRequest::get(url("/static/app.js"));
        request.method = reqwest::Method::POST;
        router.handle(request.clone()).await.unwrap();
        let second = router.handle(request).await.unwrap();

        assert_eq!(second.source, ServedFrom::Network);
        assert_eq!(fetcher.calls(), 2);
        assert!(!router.storage().has_partition("fsd-static-v1"));
    }

    #[tokio::test]
    async fn unmatched_cross_origin_requests_are_not_cached() {
        let (router, fetcher) = setup();
        let feed = Url::parse("https://news.example/feed").unwrap();

        let served = router.handle(FetchRequest::get(feed.clone())).await.unwrap();
        assert_eq!(served.source, ServedFrom::Network);
        assert!(router.storage().names().is_empty());

        fetcher.go_offline();
        assert!(router.handle(FetchRequest::navigation(feed)).await.is_err());
    }

    #[tokio::test]
    async fn unmatched_same_origin_requests_use_the_runtime_cache() {
        let (router, fetcher) = setup();
        fetcher.respond("/about", 200, "about us");
        router.handle(FetchRequest::get(url("/about"))).await.unwrap();

        assert!(router.storage().has_partition("fsd-runtime-v1"));
        fetcher.go_offline();
        let served = router.handle(FetchRequest::get(url("/about"))).await.unwrap();
        assert_eq!(served.source, ServedFrom::Cache);
    }
}

mod lifecycle {
    use super::*;

    #[tokio::test]
    async fn install_precaches_the_shell() {
        let (router, _fetcher) = setup();

        let count = router.install().await.unwrap();

        assert_eq!(count, 3);
        let info = router.storage().info();
        assert_eq!(info, vec![PartitionInfo { name: "fsd-precache-v1".into(), entries: 3 }]);
    }

    #[tokio::test]
    async fn install_fails_on_a_non_success_response() {
        let (router, fetcher) = setup();
        fetcher.respond("/manifest.webmanifest", 500, "boom");

        let err = router.install().await.unwrap_err();

        assert!(matches!(err, FetchError::Precache { status: 500, .. }));
    }

    #[tokio::test]
    async fn activate_removes_only_older_versions_of_this_prefix() {
        let fetcher = ScriptedFetcher::with_site();
        let storage = Arc::new(CacheStorage::new());

        let old = router_with(fetcher.clone(), storage.clone(), "v1");
        old.install().await.unwrap();
        storage.store("other-static-v1", "k", CachedResponse::new(200, vec![], "x"));

        let new = router_with(fetcher, storage.clone(), "v2");
        new.install().await.unwrap();
        let deleted = new.activate();

        assert_eq!(deleted, vec!["fsd-precache-v1"]);
        assert_eq!(storage.names(), vec!["fsd-precache-v2", "other-static-v1"]);
    }

    #[tokio::test]
    async fn activate_keeps_unknown_partitions_sharing_the_prefix() {
        let fetcher = ScriptedFetcher::with_site();
        let storage = Arc::new(CacheStorage::new());
        storage.store("fsd-admin-pages-v9", "k", CachedResponse::new(200, vec![], "x"));
        storage.store("fsd-pages-v1", "k", CachedResponse::new(200, vec![], "x"));

        let router = router_with(fetcher, storage.clone(), "v2");
        let deleted = router.activate();

        assert_eq!(deleted, vec!["fsd-pages-v1"]);
        assert_eq!(storage.names(), vec!["fsd-admin-pages-v9"]);
    }
}

mod proxy {
    use super::*;

    fn server() -> (TestServer, Arc<ScriptedFetcher>) {
        let (router, fetcher) = setup();
        let server = TestServer::new(create_proxy(router)).expect("Failed to create test server");
        (server, fetcher)
    }

    fn source(response: &axum_test::TestResponse) -> String {
        response.headers()[CACHE_SOURCE_HEADER]
            .to_str()
            .unwrap()
            .to_string()
    }

    #[tokio::test]
    async fn reports_where_responses_came_from() {
        let (server, fetcher) = server();
        fetcher.respond("/static/site.css", 200, "body{}");

        let first = server.get("/static/site.css").await;
        first.assert_status_ok();
        assert_eq!(source(&first), "network");

        let second = server.get("/static/site.css").await;
        second.assert_text("body{}");
        assert_eq!(source(&second), "cache");
    }

    #[tokio::test]
    async fn reports_partitions() {
        let (server, fetcher) = server();
        fetcher.respond("/static/site.css", 200, "body{}");
        server.get("/static/site.css").await;

        let status: Value = server.get("/__cache").await.json();

        assert_eq!(status["version"], "v1");
        assert_eq!(status["partitions"][0]["name"], "fsd-static-v1");
        assert_eq!(status["partitions"][0]["entries"], 1);
    }

    #[tokio::test]
    async fn offline_navigation_without_fallback_is_504() {
        let (server, fetcher) = server();
        fetcher.go_offline();

        let response = server
            .get("/about")
            .add_header(header::ACCEPT, HeaderValue::from_static("text/html"))
            .await;

        response.assert_status(StatusCode::GATEWAY_TIMEOUT);
    }

    #[tokio::test]
    async fn offline_navigation_gets_the_offline_page_after_install() {
        let (router, fetcher) = setup();
        router.install().await.unwrap();
        let server = TestServer::new(create_proxy(router)).expect("Failed to create test server");
        fetcher.go_offline();

        let response = server
            .get("/about")
            .add_header(
                HeaderName::from_static("sec-fetch-mode"),
                HeaderValue::from_static("navigate"),
            )
            .await;

        response.assert_status_ok();
        response.assert_text(OFFLINE_HTML);
        assert_eq!(source(&response), "offline");
    }
}
