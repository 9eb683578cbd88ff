//! ASCII tree rendering for the curriculum outline.

use super::html::{render_document, TocEntry};
use crate::models::Topic;

const HEADING: char = '§';
const ANIMATION: char = '▶';
const TASK: char = '✎';

/// What an outline entry points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutlineKind {
    Topic,
    Heading,
    Animation,
    Task,
}

/// Get the symbol drawn in front of a child entry.
fn kind_symbol(kind: OutlineKind) -> char {
    match kind {
        OutlineKind::Topic | OutlineKind::Heading => HEADING,
        OutlineKind::Animation => ANIMATION,
        OutlineKind::Task => TASK,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineNode {
    pub label: String,
    pub kind: OutlineKind,
    pub children: Vec<OutlineNode>,
}

impl OutlineNode {
    pub fn new(label: impl Into<String>, kind: OutlineKind) -> Self {
        Self {
            label: label.into(),
            kind,
            children: Vec::new(),
        }
    }
}

/// Nest a flat table of contents by heading level.
///
/// A heading becomes a child of the closest preceding heading with a
/// smaller level; skipped levels (h2 straight to h4) nest one step.
pub fn nest_headings(toc: &[TocEntry]) -> Vec<OutlineNode> {
    fn build(toc: &[TocEntry], pos: &mut usize, parent_level: u8) -> Vec<OutlineNode> {
        let mut nodes = Vec::new();
        while let Some(entry) = toc.get(*pos) {
            if entry.level <= parent_level {
                break;
            }
            *pos += 1;
            let mut node = OutlineNode::new(entry.text.clone(), OutlineKind::Heading);
            node.children = build(toc, pos, entry.level);
            nodes.push(node);
        }
        nodes
    }

    let mut pos = 0;
    let mut roots = Vec::new();
    while pos < toc.len() {
        roots.extend(build(toc, &mut pos, 0));
    }
    roots
}

/// Outline of one topic: theory headings, then animations, then practice tasks.
pub fn topic_outline(topic: &Topic) -> OutlineNode {
    let mut node = OutlineNode::new(
        format!("{:02} {}", topic.order, topic.title),
        OutlineKind::Topic,
    );

    if let Some(theory) = &topic.theory {
        node.children = nest_headings(&render_document(theory).toc);
    }

    for (i, block) in topic.animations.iter().enumerate() {
        let label = block
            .title
            .clone()
            .or_else(|| {
                block
                    .spec
                    .get("title")
                    .and_then(|t| t.as_str())
                    .map(String::from)
            })
            .unwrap_or_else(|| format!("Animation {}", i + 1));
        node.children.push(OutlineNode::new(label, OutlineKind::Animation));
    }

    if let Some(practice) = &topic.practice {
        for task in &practice.tasks {
            node.children
                .push(OutlineNode::new(task.title.clone(), OutlineKind::Task));
        }
    }

    node
}

/// Render an outline as ASCII art.
///
/// Example output:
/// ```text
/// 01 Rendering Patterns
/// ├── § Server rendering
/// │   └── § Streaming
/// ├── ▶ Request waterfall
/// └── ✎ Measure TTFB
/// ```
pub fn render_outline(nodes: &[OutlineNode]) -> String {
    let mut output = String::new();
    for (i, node) in nodes.iter().enumerate() {
        let is_last = i == nodes.len() - 1;
        render_node(&mut output, node, "", is_last, true);
    }
    output
}

fn render_node(output: &mut String, node: &OutlineNode, prefix: &str, is_last: bool, is_root: bool) {
    if is_root {
        output.push_str(&node.label);
        output.push('\n');
    } else {
        let branch = if is_last { "└── " } else { "├── " };
        output.push_str(prefix);
        output.push_str(branch);
        output.push(kind_symbol(node.kind));
        output.push(' ');
        output.push_str(&node.label);
        output.push('\n');
    }

    let child_prefix = if is_root {
        String::new()
    } else {
        let continuation = if is_last { "    " } else { "│   " };
        format!("{}{}", prefix, continuation)
    };

    for (i, child) in node.children.iter().enumerate() {
        let child_is_last = i == node.children.len() - 1;
        render_node(output, child, &child_prefix, child_is_last, false);
    }
}
