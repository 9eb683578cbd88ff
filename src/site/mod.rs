//! HTML page routes.
//!
//! Pages are rendered on the server from the content store. A store failure
//! renders a generic "Failed to load" page instead of leaking details.

mod layout;
mod pages;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse},
    routing::get,
    Router,
};

use crate::api::AppState;
use crate::config::SiteConfig;
use crate::models::TopicSummary;

pub use layout::page_shell;
pub use pages::web_manifest;

type PageResult = Result<Html<String>, (StatusCode, Html<String>)>;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/topics/{slug}", get(topic))
        .route("/pages/{slug}", get(page))
        .route("/resources", get(resources))
        .route("/offline", get(offline))
        .route("/manifest.webmanifest", get(manifest))
}

fn failed_to_load(config: &SiteConfig, e: anyhow::Error) -> (StatusCode, Html<String>) {
    tracing::error!("Failed to load page content: {:#}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Html(page_shell(
            config,
            "Failed to load",
            &layout::message_body("Failed to load", "This content could not be loaded. Please try again."),
        )),
    )
}

fn not_found(config: &SiteConfig, what: &str) -> (StatusCode, Html<String>) {
    (
        StatusCode::NOT_FOUND,
        Html(page_shell(
            config,
            "Not found",
            &layout::message_body("Not found", &format!("That {} does not exist.", what)),
        )),
    )
}

async fn index(State(state): State<AppState>) -> PageResult {
    let config = &state.config;
    let topics = state
        .db
        .get_all_topics()
        .map_err(|e| failed_to_load(config, e))?;
    let summaries: Vec<TopicSummary> = topics.into_iter().map(Into::into).collect();

    Ok(Html(page_shell(
        config,
        &config.site_name,
        &pages::index_body(config, &summaries),
    )))
}

async fn topic(State(state): State<AppState>, Path(slug): Path<String>) -> PageResult {
    let config = &state.config;
    let topics = state
        .db
        .get_all_topics()
        .map_err(|e| failed_to_load(config, e))?;

    let Some(position) = topics.iter().position(|t| t.slug == slug) else {
        return Err(not_found(config, "module"));
    };

    let summaries: Vec<TopicSummary> = topics.iter().cloned().map(Into::into).collect();
    let prev = position.checked_sub(1).and_then(|i| summaries.get(i));
    let next = summaries.get(position + 1);
    let current = &topics[position];

    Ok(Html(page_shell(
        config,
        &current.title,
        &pages::topic_body(current, prev, next, !config.mode.is_production()),
    )))
}

async fn page(State(state): State<AppState>, Path(slug): Path<String>) -> PageResult {
    let config = &state.config;
    let page = state
        .db
        .get_page_by_slug(&slug)
        .map_err(|e| failed_to_load(config, e))?
        .ok_or_else(|| not_found(config, "page"))?;

    Ok(Html(page_shell(config, &page.title, &pages::page_body(&page))))
}

async fn resources(State(state): State<AppState>) -> PageResult {
    let config = &state.config;
    let resources = state
        .db
        .get_all_resources()
        .map_err(|e| failed_to_load(config, e))?;

    Ok(Html(page_shell(
        config,
        "Resources",
        &pages::resources_body(&resources),
    )))
}

async fn offline(State(state): State<AppState>) -> Html<String> {
    Html(page_shell(&state.config, "Offline", &pages::offline_body()))
}

async fn manifest(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/manifest+json")],
        web_manifest(&state.config).to_string(),
    )
}
