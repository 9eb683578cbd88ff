use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An external learning resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    pub id: Uuid,
    pub title: String,
    pub url: String,
    pub kind: ResourceKind,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Article,
    Video,
    Docs,
    Tool,
    Course,
    #[default]
    Other,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Article => "article",
            Self::Video => "video",
            Self::Docs => "docs",
            Self::Tool => "tool",
            Self::Course => "course",
            Self::Other => "other",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "article" => Some(Self::Article),
            "video" => Some(Self::Video),
            "docs" => Some(Self::Docs),
            "tool" => Some(Self::Tool),
            "course" => Some(Self::Course),
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}

/// Input for creating a resource. Resources are keyed by URL on import.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateResourceInput {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub kind: ResourceKind,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}
