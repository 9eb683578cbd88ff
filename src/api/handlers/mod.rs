use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::AppState;
use crate::animation::{self, ValidationIssue};
use crate::error::ContentError;
use crate::models::*;
use crate::render::{render_document, Rendered};

// ============================================================
// Error Handling
// ============================================================

/// Log an internal error and return a sanitized response to the client.
///
/// Content validation errors are safe to expose and keep their message;
/// everything else is logged server-side and reported generically.
pub(crate) fn internal_error(e: anyhow::Error) -> (StatusCode, String) {
    if let Some(content) = e.downcast_ref::<ContentError>() {
        tracing::warn!("Validation error: {}", content);
        let status = match content {
            ContentError::DuplicateSlug(_) => StatusCode::CONFLICT,
            _ => StatusCode::BAD_REQUEST,
        };
        return (status, content.to_string());
    }

    tracing::error!("Internal error: {:#}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error".to_string(),
    )
}

// ============================================================
// Health
// ============================================================

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ============================================================
// Topics
// ============================================================

/// Query parameters for listing topics.
#[derive(Debug, Deserialize)]
pub struct ListTopicsQuery {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

pub async fn list_topics(
    State(state): State<AppState>,
    Query(query): Query<ListTopicsQuery>,
) -> Result<Json<Vec<TopicSummary>>, (StatusCode, String)> {
    let topics = state.db.get_all_topics().map_err(internal_error)?;

    // Apply pagination
    let offset = query.offset.unwrap_or(0) as usize;
    let topics = topics.into_iter().skip(offset);
    let summaries: Vec<TopicSummary> = match query.limit {
        Some(limit) => topics.take(limit as usize).map(Into::into).collect(),
        None => topics.map(Into::into).collect(),
    };

    Ok(Json(summaries))
}

pub async fn get_topic(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Topic>, (StatusCode, String)> {
    state
        .db
        .get_topic_by_slug(&slug)
        .map_err(internal_error)?
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "Topic not found".to_string()))
}

/// Render a topic's theory document; topics without theory render empty.
pub async fn get_rendered_topic(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Rendered>, (StatusCode, String)> {
    let topic = state
        .db
        .get_topic_by_slug(&slug)
        .map_err(internal_error)?
        .ok_or((StatusCode::NOT_FOUND, "Topic not found".to_string()))?;

    Ok(Json(
        topic
            .theory
            .as_ref()
            .map(render_document)
            .unwrap_or_default(),
    ))
}

// ============================================================
// Resources & Pages
// ============================================================

#[derive(Debug, Deserialize)]
pub struct ListResourcesQuery {
    pub tag: Option<String>,
}

pub async fn list_resources(
    State(state): State<AppState>,
    Query(query): Query<ListResourcesQuery>,
) -> Result<Json<Vec<Resource>>, (StatusCode, String)> {
    match query.tag.as_deref() {
        Some(tag) => state.db.get_resources_by_tag(tag),
        None => state.db.get_all_resources(),
    }
    .map(Json)
    .map_err(internal_error)
}

pub async fn get_page(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Page>, (StatusCode, String)> {
    state
        .db
        .get_page_by_slug(&slug)
        .map_err(internal_error)?
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "Page not found".to_string()))
}

// ============================================================
// Animation specs
// ============================================================

/// Result of validating an animation spec.
#[derive(Debug, Serialize, Deserialize)]
pub struct ValidationResponse {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<ValidationIssue>,
}

pub async fn validate_animation(
    Json(spec): Json<Value>,
) -> (StatusCode, Json<ValidationResponse>) {
    match animation::parse_spec(&spec) {
        Ok(spec) => (
            StatusCode::OK,
            Json(ValidationResponse {
                valid: true,
                kind: Some(spec.body.kind().to_string()),
                issues: Vec::new(),
            }),
        ),
        Err(e) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ValidationResponse {
                valid: false,
                kind: None,
                issues: e.issues(),
            }),
        ),
    }
}

pub async fn animation_schema() -> Json<Value> {
    Json(animation::json_schema())
}
