//! Runtime configuration loaded from environment variables.
//!
//! Every setting has a default so the site runs without any environment at
//! all; CLI flags in `main.rs` override what is read here.

use std::path::PathBuf;

use anyhow::{Context, Result};
use url::Url;

use crate::offline::{default_routes, Route};

const DEFAULT_SITE_NAME: &str = "Frontend System Design";
const DEFAULT_UPSTREAM: &str = "http://127.0.0.1:3000";
const DEFAULT_CACHE_PREFIX: &str = "fsd";
const DEFAULT_CACHE_VERSION: &str = "v1";

/// Whether the site runs for authors (diagnostics visible) or readers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Development,
    Production,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Some(Self::Development),
            "production" | "prod" => Some(Self::Production),
            _ => None,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

/// Settings for the content site (API and page routes).
#[derive(Debug, Clone)]
pub struct SiteConfig {
    /// Title used in page headers and the web app manifest (from FSD_SITE_NAME)
    pub site_name: String,
    /// Development or production (from FSD_ENV)
    pub mode: Mode,
    /// Explicit content database path (from FSD_DB_PATH)
    pub db_path: Option<PathBuf>,
    /// Theme color advertised in the manifest and `<meta name="theme-color">`
    pub theme_color: String,
}

impl SiteConfig {
    /// Load site configuration from environment variables.
    pub fn from_env() -> Self {
        let site_name =
            std::env::var("FSD_SITE_NAME").unwrap_or_else(|_| DEFAULT_SITE_NAME.to_string());

        let mode = std::env::var("FSD_ENV")
            .ok()
            .and_then(|s| Mode::from_str(&s))
            .unwrap_or_default();

        let db_path = std::env::var("FSD_DB_PATH").ok().map(PathBuf::from);

        Self {
            site_name,
            mode,
            db_path,
            theme_color: "#0f172a".to_string(),
        }
    }

    /// Development defaults, ignoring the environment (for tests).
    pub fn development() -> Self {
        Self {
            site_name: DEFAULT_SITE_NAME.to_string(),
            mode: Mode::Development,
            db_path: None,
            theme_color: "#0f172a".to_string(),
        }
    }

    /// Production defaults, ignoring the environment (for tests).
    pub fn production() -> Self {
        Self {
            mode: Mode::Production,
            ..Self::development()
        }
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Settings for the offline-caching proxy.
#[derive(Debug, Clone)]
pub struct OfflineConfig {
    /// Partition name prefix (from FSD_CACHE_PREFIX)
    pub cache_prefix: String,
    /// Partition version; bumping it drops older partitions on activate (from FSD_CACHE_VERSION)
    pub cache_version: String,
    /// Where requests are actually fetched from (from FSD_UPSTREAM)
    pub upstream: Url,
    /// Public origin of the proxy; same-origin checks compare against it
    pub origin: Url,
    /// Path of the document served to navigations that fail while offline
    pub offline_path: String,
    /// Paths fetched into the precache partition on install
    pub precache: Vec<String>,
    /// Ordered route table
    pub routes: Vec<Route>,
}

impl OfflineConfig {
    /// Load proxy configuration from environment variables.
    ///
    /// `origin` is the address the proxy listens on, e.g. `http://127.0.0.1:3001`.
    pub fn from_env(origin: Url) -> Result<Self> {
        let upstream = std::env::var("FSD_UPSTREAM").unwrap_or_else(|_| DEFAULT_UPSTREAM.into());
        let upstream = Url::parse(&upstream)
            .with_context(|| format!("Invalid FSD_UPSTREAM URL: {}", upstream))?;

        let mut config = Self::new(origin, upstream);
        if let Ok(prefix) = std::env::var("FSD_CACHE_PREFIX") {
            config.cache_prefix = prefix;
        }
        if let Ok(version) = std::env::var("FSD_CACHE_VERSION") {
            config.cache_version = version;
        }
        Ok(config)
    }

    /// Defaults for a proxy at `origin` in front of `upstream`.
    pub fn new(origin: Url, upstream: Url) -> Self {
        Self {
            cache_prefix: DEFAULT_CACHE_PREFIX.to_string(),
            cache_version: DEFAULT_CACHE_VERSION.to_string(),
            upstream,
            origin,
            offline_path: "/offline".to_string(),
            precache: vec![
                "/".to_string(),
                "/offline".to_string(),
                "/manifest.webmanifest".to_string(),
            ],
            routes: default_routes(),
        }
    }
}
