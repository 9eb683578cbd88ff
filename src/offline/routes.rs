use regex::Regex;
use url::Url;

use super::Strategy;

/// One entry of the route table: requests whose URL matches `pattern` use
/// `strategy` against the logical `partition`.
#[derive(Debug, Clone)]
pub struct Route {
    pub pattern: Regex,
    pub strategy: Strategy,
    pub partition: String,
}

impl Route {
    pub fn new(pattern: &str, strategy: Strategy, partition: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
            strategy,
            partition: partition.to_string(),
        })
    }

    pub fn matches(&self, url: &Url) -> bool {
        self.pattern.is_match(url.as_str())
    }
}

/// First route in table order that matches `url`.
pub fn match_route<'a>(routes: &'a [Route], url: &Url) -> Option<&'a Route> {
    routes.iter().find(|route| route.matches(url))
}

/// The built-in table: hashed build output and static files, images, the
/// JSON API, then content pages.
pub fn default_routes() -> Vec<Route> {
    const TABLE: &[(&str, Strategy, &str)] = &[
        (r"/_next/static/", Strategy::CacheFirst, "static"),
        (r"/static/", Strategy::CacheFirst, "static"),
        (r"\.(?:js|css|woff2?)(?:\?.*)?$", Strategy::CacheFirst, "static"),
        (r"\.(?:png|jpe?g|gif|svg|webp|ico)(?:\?.*)?$", Strategy::CacheFirst, "images"),
        (r"/api/", Strategy::NetworkFirst, "api"),
        (r"/(?:topics|pages)/", Strategy::StaleWhileRevalidate, "pages"),
    ];

    TABLE
        .iter()
        .filter_map(|(pattern, strategy, partition)| {
            Route::new(pattern, *strategy, partition)
                .map_err(|e| tracing::error!("Bad built-in route {}: {}", pattern, e))
                .ok()
        })
        .collect()
}
