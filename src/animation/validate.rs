use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::{AnimationBody, AnimationSpec, Diff2d, DiffPanel, Flow2d, Timeline2d, SPEC_VERSION};

/// One problem found in a spec, located by a JSON-ish path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub path: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

#[derive(Default)]
struct Issues(Vec<ValidationIssue>);

impl Issues {
    fn push(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.0.push(ValidationIssue::new(path, message));
    }

    fn non_empty(&mut self, path: &str, text: &str) {
        if text.trim().is_empty() {
            self.push(path, "must not be empty");
        }
    }

    /// Record duplicate ids and return the set of ids seen.
    fn unique_ids<'a>(
        &mut self,
        list: &str,
        ids: impl Iterator<Item = &'a str>,
    ) -> HashSet<&'a str> {
        let mut seen = HashSet::new();
        for (i, id) in ids.enumerate() {
            if id.trim().is_empty() {
                self.push(format!("{}[{}].id", list, i), "must not be empty");
            } else if !seen.insert(id) {
                self.push(format!("{}[{}].id", list, i), format!("duplicate id '{}'", id));
            }
        }
        seen
    }
}

impl AnimationSpec {
    /// Semantic checks that the JSON shape alone cannot express.
    pub fn validate(&self) -> Vec<ValidationIssue> {
        let mut issues = Issues::default();

        if self.version != SPEC_VERSION {
            issues.push(
                "version",
                format!("unsupported version {} (expected {})", self.version, SPEC_VERSION),
            );
        }

        match &self.body {
            AnimationBody::Timeline(timeline) => validate_timeline(timeline, &mut issues),
            AnimationBody::Flow(flow) => validate_flow(flow, &mut issues),
            AnimationBody::Diff(diff) => validate_diff(diff, &mut issues),
        }

        issues.0
    }
}

fn validate_timeline(timeline: &Timeline2d, issues: &mut Issues) {
    if timeline.lanes.is_empty() {
        issues.push("lanes", "at least one lane is required");
    }
    let lanes = issues.unique_ids("lanes", timeline.lanes.iter().map(|l| l.id.as_str()));
    issues.unique_ids("events", timeline.events.iter().map(|e| e.id.as_str()));

    if let Some(total) = timeline.duration_ms {
        if !total.is_finite() || total <= 0.0 {
            issues.push("durationMs", "must be a positive number");
        }
    }

    for (i, event) in timeline.events.iter().enumerate() {
        let path = format!("events[{}]", i);
        if !lanes.contains(event.lane.as_str()) {
            issues.push(
                format!("{}.lane", path),
                format!("unknown lane '{}'", event.lane),
            );
        }
        if !event.at.is_finite() || event.at < 0.0 {
            issues.push(format!("{}.at", path), "must be a non-negative number");
        }
        if !event.duration.is_finite() || event.duration < 0.0 {
            issues.push(format!("{}.duration", path), "must be a non-negative number");
        }
        if let Some(total) = timeline.duration_ms.filter(|t| t.is_finite() && *t > 0.0) {
            if event.at + event.duration > total {
                issues.push(
                    path.clone(),
                    format!("ends at {}ms, after the timeline's {}ms", event.at + event.duration, total),
                );
            }
        }
        issues.non_empty(&format!("{}.label", path), &event.label);
    }
}

fn validate_flow(flow: &Flow2d, issues: &mut Issues) {
    if flow.nodes.is_empty() {
        issues.push("nodes", "at least one node is required");
    }
    let nodes = issues.unique_ids("nodes", flow.nodes.iter().map(|n| n.id.as_str()));

    for (i, node) in flow.nodes.iter().enumerate() {
        if !node.x.is_finite() || !node.y.is_finite() {
            issues.push(format!("nodes[{}]", i), "coordinates must be finite");
        }
    }

    for (i, edge) in flow.edges.iter().enumerate() {
        for (end, id) in [("from", &edge.from), ("to", &edge.to)] {
            if !nodes.contains(id.as_str()) {
                issues.push(
                    format!("edges[{}].{}", i, end),
                    format!("unknown node '{}'", id),
                );
            }
        }
    }

    for (i, step) in flow.steps.iter().enumerate() {
        issues.non_empty(&format!("steps[{}].caption", i), &step.caption);
        for (j, id) in step.highlight.iter().enumerate() {
            if !nodes.contains(id.as_str()) {
                issues.push(
                    format!("steps[{}].highlight[{}]", i, j),
                    format!("unknown node '{}'", id),
                );
            }
        }
    }
}

fn validate_diff(diff: &Diff2d, issues: &mut Issues) {
    if diff.before.items.is_empty() && diff.after.items.is_empty() {
        issues.push("", "before and after are both empty");
    }
    validate_panel("before", &diff.before, issues);
    validate_panel("after", &diff.after, issues);
}

fn validate_panel(name: &str, panel: &DiffPanel, issues: &mut Issues) {
    issues.unique_ids(
        &format!("{}.items", name),
        panel.items.iter().map(|item| item.id.as_str()),
    );
}
