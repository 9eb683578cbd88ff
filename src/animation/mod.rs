//! Versioned animation specs for the 2D teaching diagrams.
//!
//! A spec is JSON with a `version` and a `kind` discriminator:
//!
//! - `timeline2d`: events laid out on named lanes over time
//! - `flow2d`: a node/edge graph stepped through with highlights
//! - `diff2d`: a before/after comparison of keyed items
//!
//! [`parse_spec`] turns raw JSON into a typed [`AnimationSpec`] and reports
//! every problem it finds, not just the first.

mod diff;
mod figure;
mod validate;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub use diff::*;
pub use figure::*;
pub use validate::ValidationIssue;

/// The only spec version this build understands.
pub const SPEC_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AnimationSpec {
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(flatten)]
    pub body: AnimationBody,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind")]
pub enum AnimationBody {
    #[serde(rename = "timeline2d")]
    Timeline(Timeline2d),
    #[serde(rename = "flow2d")]
    Flow(Flow2d),
    #[serde(rename = "diff2d")]
    Diff(Diff2d),
}

impl AnimationBody {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Timeline(_) => "timeline2d",
            Self::Flow(_) => "flow2d",
            Self::Diff(_) => "diff2d",
        }
    }
}

/// Events placed on lanes; times are milliseconds from the start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Timeline2d {
    pub lanes: Vec<Lane>,
    #[serde(default)]
    pub events: Vec<TimelineEvent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Lane {
    pub id: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TimelineEvent {
    pub id: String,
    pub lane: String,
    pub at: f64,
    #[serde(default)]
    pub duration: f64,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Flow2d {
    pub nodes: Vec<FlowNode>,
    #[serde(default)]
    pub edges: Vec<FlowEdge>,
    #[serde(default)]
    pub steps: Vec<FlowStep>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FlowNode {
    pub id: String,
    pub label: String,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FlowEdge {
    pub from: String,
    pub to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FlowStep {
    pub caption: String,
    #[serde(default)]
    pub highlight: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Diff2d {
    pub before: DiffPanel,
    pub after: DiffPanel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DiffPanel {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub items: Vec<DiffItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DiffItem {
    pub id: String,
    pub text: String,
}

/// Why a spec was rejected.
#[derive(Debug, Error)]
pub enum AnimationError {
    #[error("Malformed animation spec: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Invalid animation spec: {}", summarize(.issues))]
    Invalid { issues: Vec<ValidationIssue> },
}

impl AnimationError {
    /// All problems as path/message pairs, for API responses and diagnostics.
    pub fn issues(&self) -> Vec<ValidationIssue> {
        match self {
            Self::Malformed(e) => vec![ValidationIssue::new("", e.to_string())],
            Self::Invalid { issues } => issues.clone(),
        }
    }
}

fn summarize(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Parse and validate a raw JSON animation spec.
pub fn parse_spec(value: &Value) -> Result<AnimationSpec, AnimationError> {
    let spec = AnimationSpec::deserialize(value)?;
    let issues = spec.validate();
    if issues.is_empty() {
        Ok(spec)
    } else {
        Err(AnimationError::Invalid { issues })
    }
}

/// JSON Schema for [`AnimationSpec`].
pub fn json_schema() -> Value {
    serde_json::to_value(schemars::schema_for!(AnimationSpec)).unwrap_or(Value::Null)
}
