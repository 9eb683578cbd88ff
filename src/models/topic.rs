use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::render::Document;

/// A curriculum module.
///
/// Topics are ordered by `order` and addressed by `slug`. The theory is a
/// rich-text document; animation specs are kept raw and only validated when
/// the topic renders, so one broken diagram never hides the rest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Topic {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub order: i64,
    pub summary: Option<String>,
    pub theory: Option<Document>,
    pub references: Vec<Reference>,
    pub practice: Option<Practice>,
    pub animations: Vec<AnimationBlock>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A cited source listed at the end of a topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub title: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Hands-on part of a topic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Practice {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intro: Option<String>,
    #[serde(default)]
    pub steps: Vec<String>,
    #[serde(default)]
    pub tasks: Vec<PracticeTask>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub demo: Option<DemoConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PracticeTask {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

/// Configuration for an interactive demo widget mounted on the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemoConfig {
    pub kind: String,
    #[serde(default = "empty_object")]
    pub props: Value,
}

fn empty_object() -> Value {
    Value::Object(Default::default())
}

/// One animation diagram attached to a topic; `spec` is unvalidated JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    pub spec: Value,
}

/// Lightweight topic representation for list views.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicSummary {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub order: i64,
    pub summary: Option<String>,
    pub animation_count: usize,
    pub has_practice: bool,
}

impl From<Topic> for TopicSummary {
    fn from(t: Topic) -> Self {
        Self {
            id: t.id,
            slug: t.slug,
            title: t.title,
            order: t.order,
            summary: t.summary,
            animation_count: t.animations.len(),
            has_practice: t.practice.is_some(),
        }
    }
}

/// Input for creating a topic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTopicInput {
    pub slug: String,
    pub title: String,
    /// Curriculum position. Defaults to 0.
    #[serde(default)]
    pub order: Option<i64>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub theory: Option<Document>,
    #[serde(default)]
    pub references: Vec<Reference>,
    #[serde(default)]
    pub practice: Option<Practice>,
    #[serde(default)]
    pub animations: Vec<AnimationBlock>,
}

impl CreateTopicInput {
    pub fn new(slug: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            title: title.into(),
            order: None,
            summary: None,
            theory: None,
            references: Vec::new(),
            practice: None,
            animations: Vec::new(),
        }
    }
}

/// Input for updating a topic. All fields are optional for partial updates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTopicInput {
    pub title: Option<String>,
    pub order: Option<i64>,
    pub summary: Option<String>,
    pub theory: Option<Document>,
    pub references: Option<Vec<Reference>>,
    pub practice: Option<Practice>,
    pub animations: Option<Vec<AnimationBlock>>,
}

impl From<CreateTopicInput> for UpdateTopicInput {
    fn from(input: CreateTopicInput) -> Self {
        Self {
            title: Some(input.title),
            order: input.order,
            summary: input.summary,
            theory: input.theory,
            references: Some(input.references),
            practice: input.practice,
            animations: Some(input.animations),
        }
    }
}
