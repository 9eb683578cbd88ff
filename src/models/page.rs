use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::render::Document;

/// A standalone content page such as "About" or "Glossary".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub content: Option<Document>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePageInput {
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub content: Option<Document>,
}
