use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tower_http::trace::TraceLayer;
use url::Url;

use super::fetcher::is_hop_by_hop;
use super::request::{CachedResponse, FetchError, FetchRequest};
use super::router::CacheRouter;
use super::storage::PartitionInfo;
use super::ServedFrom;

pub const CACHE_SOURCE_HEADER: &str = "x-cache-source";

/// Build the caching reverse proxy. Every request except `GET /__cache`
/// goes through the router.
pub fn create_proxy(router: Arc<CacheRouter>) -> Router {
    Router::new()
        .route("/__cache", get(cache_status))
        .fallback(proxy)
        .layer(TraceLayer::new_for_http())
        .with_state(router)
}

#[derive(Serialize)]
struct CacheStatus {
    version: String,
    partitions: Vec<PartitionInfo>,
}

async fn cache_status(State(router): State<Arc<CacheRouter>>) -> Json<CacheStatus> {
    Json(CacheStatus {
        version: router.names().version().to_string(),
        partitions: router.storage().info(),
    })
}

async fn proxy(
    State(router): State<Arc<CacheRouter>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let request = match to_fetch_request(router.origin(), method, &uri, &headers, body) {
        Ok(request) => request,
        Err(e) => {
            tracing::warn!("Rejected request for {}: {}", uri, e);
            return (StatusCode::BAD_REQUEST, "Bad request URL").into_response();
        }
    };

    match router.handle(request).await {
        Ok(served) => to_response(served.response, served.source),
        Err(FetchError::Url(e)) => {
            tracing::warn!("Bad upstream URL for {}: {}", uri, e);
            (StatusCode::BAD_GATEWAY, "Bad gateway").into_response()
        }
        Err(_) => (
            StatusCode::GATEWAY_TIMEOUT,
            "Offline: this page is not available without a connection",
        )
            .into_response(),
    }
}

/// Whether the request is a top-level page load.
pub(crate) fn is_navigation(method: &Method, headers: &HeaderMap) -> bool {
    let header_str = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string()
    };

    if header_str("sec-fetch-mode").eq_ignore_ascii_case("navigate") {
        return true;
    }
    *method == Method::GET && header_str(header::ACCEPT.as_str()).contains("text/html")
}

fn to_fetch_request(
    origin: &Url,
    method: Method,
    uri: &Uri,
    headers: &HeaderMap,
    body: Bytes,
) -> Result<FetchRequest, url::ParseError> {
    // Every target is resolved against the configured origin, whatever
    // authority the client put on the request line.
    let path = uri.path_and_query().map(|p| p.as_str()).unwrap_or("/");
    let url = origin.join(path)?;

    let forwarded = headers
        .iter()
        .filter(|(name, _)| !is_hop_by_hop(name.as_str()))
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect();

    Ok(FetchRequest {
        navigate: is_navigation(&method, headers),
        method,
        url,
        headers: forwarded,
        body: (!body.is_empty()).then_some(body),
    })
}

fn to_response(cached: CachedResponse, source: ServedFrom) -> Response {
    let status = StatusCode::from_u16(cached.status).unwrap_or(StatusCode::BAD_GATEWAY);

    let mut headers = HeaderMap::new();
    for (name, value) in &cached.headers {
        if is_hop_by_hop(name) {
            continue;
        }
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            headers.append(name, value);
        }
    }
    headers.insert(
        HeaderName::from_static(CACHE_SOURCE_HEADER),
        HeaderValue::from_static(source.as_str()),
    );

    (status, headers, cached.body).into_response()
}
