mod handlers;

use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::SiteConfig;
use crate::db::Database;
use crate::site;

/// Shared state for API and page handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: SiteConfig,
}

/// Build the full site: JSON API under `/api/v1` plus the HTML page routes.
pub fn create_router(db: Database, config: SiteConfig) -> Router {
    let api = Router::new()
        // Topics
        .route("/topics", get(handlers::list_topics))
        .route("/topics/{slug}", get(handlers::get_topic))
        .route("/topics/{slug}/rendered", get(handlers::get_rendered_topic))
        // Resources & pages
        .route("/resources", get(handlers::list_resources))
        .route("/pages/{slug}", get(handlers::get_page))
        // Animation specs
        .route("/animations/validate", post(handlers::validate_animation))
        .route("/schema/animation", get(handlers::animation_schema))
        // Health
        .route("/health", get(handlers::health));

    Router::new()
        .nest("/api/v1", api)
        .merge(site::routes())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(AppState { db, config })
}
