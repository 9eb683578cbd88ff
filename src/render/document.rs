use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A serialized rich-text editor document.
///
/// Accepts both the editor's envelope (`{"root": {...}}`) and a bare root
/// node; always serializes with the envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "DocumentRepr")]
pub struct Document {
    pub root: Node,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DocumentRepr {
    Wrapped { root: Node },
    Bare(Node),
}

impl From<DocumentRepr> for Document {
    fn from(repr: DocumentRepr) -> Self {
        match repr {
            DocumentRepr::Wrapped { root } | DocumentRepr::Bare(root) => Document { root },
        }
    }
}

impl Document {
    /// Build a document from top-level block nodes.
    pub fn new(children: Vec<Node>) -> Self {
        Self {
            root: Node::Root { children },
        }
    }
}

/// Bitmask of inline text formats, as stored by the editor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TextFormat(pub u32);

impl TextFormat {
    pub const BOLD: u32 = 1;
    pub const ITALIC: u32 = 1 << 1;
    pub const STRIKETHROUGH: u32 = 1 << 2;
    pub const UNDERLINE: u32 = 1 << 3;
    pub const CODE: u32 = 1 << 4;

    pub fn contains(&self, flag: u32) -> bool {
        self.0 & flag == flag
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Bullet,
    Number,
    Check,
}

impl ListKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bullet => "bullet",
            Self::Number => "number",
            Self::Check => "check",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "bullet" => Some(Self::Bullet),
            "number" => Some(Self::Number),
            "check" => Some(Self::Check),
            _ => None,
        }
    }
}

/// One node of the document tree.
///
/// Node types the site does not know are kept as [`Node::Other`] so their
/// children still render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawNode", into = "RawNode")]
pub enum Node {
    Root {
        children: Vec<Node>,
    },
    Paragraph {
        children: Vec<Node>,
    },
    Heading {
        level: u8,
        children: Vec<Node>,
    },
    Quote {
        children: Vec<Node>,
    },
    List {
        kind: ListKind,
        start: u32,
        children: Vec<Node>,
    },
    ListItem {
        checked: Option<bool>,
        children: Vec<Node>,
    },
    Link {
        url: String,
        new_tab: bool,
        children: Vec<Node>,
    },
    Text {
        text: String,
        format: TextFormat,
    },
    Code {
        language: Option<String>,
        children: Vec<Node>,
    },
    LineBreak,
    HorizontalRule,
    Other {
        kind: String,
        children: Vec<Node>,
    },
}

impl Node {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text {
            text: text.into(),
            format: TextFormat::default(),
        }
    }

    pub fn children(&self) -> &[Node] {
        match self {
            Self::Root { children }
            | Self::Paragraph { children }
            | Self::Heading { children, .. }
            | Self::Quote { children }
            | Self::List { children, .. }
            | Self::ListItem { children, .. }
            | Self::Link { children, .. }
            | Self::Code { children, .. }
            | Self::Other { children, .. } => children,
            Self::Text { .. } | Self::LineBreak | Self::HorizontalRule => &[],
        }
    }

    /// Concatenated text of this node and all its descendants.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            Self::Text { text, .. } => out.push_str(text),
            Self::LineBreak => out.push(' '),
            _ => {
                for child in self.children() {
                    child.collect_text(out);
                }
            }
        }
    }
}

/// Wire shape of a node: every field any node type may carry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawNode {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    children: Vec<Node>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    /// Bitmask on text nodes, alignment string on element nodes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    format: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    list_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    start: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    checked: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    new_tab: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    fields: Option<LinkFields>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    language: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LinkFields {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    new_tab: Option<bool>,
}

fn heading_level(tag: Option<&str>) -> u8 {
    tag.and_then(|t| t.strip_prefix('h'))
        .and_then(|n| n.parse::<u8>().ok())
        .filter(|n| (1..=6).contains(n))
        .unwrap_or(2)
}

impl From<RawNode> for Node {
    fn from(raw: RawNode) -> Self {
        let RawNode {
            kind,
            children,
            text,
            format,
            tag,
            list_type,
            start,
            checked,
            url,
            new_tab,
            fields,
            language,
        } = raw;

        match kind.as_str() {
            "root" => Node::Root { children },
            "paragraph" => Node::Paragraph { children },
            "heading" => Node::Heading {
                level: heading_level(tag.as_deref()),
                children,
            },
            "quote" => Node::Quote { children },
            "list" => {
                let kind = list_type
                    .as_deref()
                    .and_then(ListKind::from_str)
                    .unwrap_or(if tag.as_deref() == Some("ol") {
                        ListKind::Number
                    } else {
                        ListKind::Bullet
                    });
                Node::List {
                    kind,
                    start: start.unwrap_or(1),
                    children,
                }
            }
            "listitem" => Node::ListItem { checked, children },
            "link" | "autolink" => {
                let fields = fields.unwrap_or_default();
                Node::Link {
                    url: fields.url.or(url).unwrap_or_default(),
                    new_tab: fields.new_tab.or(new_tab).unwrap_or(false),
                    children,
                }
            }
            "text" | "code-highlight" => Node::Text {
                text: text.unwrap_or_default(),
                format: TextFormat(
                    format
                        .as_ref()
                        .and_then(Value::as_u64)
                        .map(|bits| bits as u32)
                        .unwrap_or(0),
                ),
            },
            "code" => Node::Code { language, children },
            "linebreak" => Node::LineBreak,
            "horizontalrule" => Node::HorizontalRule,
            _ => Node::Other { kind, children },
        }
    }
}

impl From<Node> for RawNode {
    fn from(node: Node) -> Self {
        match node {
            Node::Root { children } => RawNode {
                kind: "root".into(),
                children,
                ..Default::default()
            },
            Node::Paragraph { children } => RawNode {
                kind: "paragraph".into(),
                children,
                ..Default::default()
            },
            Node::Heading { level, children } => RawNode {
                kind: "heading".into(),
                tag: Some(format!("h{}", level)),
                children,
                ..Default::default()
            },
            Node::Quote { children } => RawNode {
                kind: "quote".into(),
                children,
                ..Default::default()
            },
            Node::List {
                kind,
                start,
                children,
            } => RawNode {
                kind: "list".into(),
                list_type: Some(kind.as_str().into()),
                tag: Some(if kind == ListKind::Number { "ol" } else { "ul" }.into()),
                start: Some(start),
                children,
                ..Default::default()
            },
            Node::ListItem { checked, children } => RawNode {
                kind: "listitem".into(),
                checked,
                children,
                ..Default::default()
            },
            Node::Link {
                url,
                new_tab,
                children,
            } => RawNode {
                kind: "link".into(),
                fields: Some(LinkFields {
                    url: Some(url),
                    new_tab: Some(new_tab),
                }),
                children,
                ..Default::default()
            },
            Node::Text { text, format } => RawNode {
                kind: "text".into(),
                text: Some(text),
                format: Some(Value::from(format.0)),
                ..Default::default()
            },
            Node::Code { language, children } => RawNode {
                kind: "code".into(),
                language,
                children,
                ..Default::default()
            },
            Node::LineBreak => RawNode {
                kind: "linebreak".into(),
                ..Default::default()
            },
            Node::HorizontalRule => RawNode {
                kind: "horizontalrule".into(),
                ..Default::default()
            },
            Node::Other { kind, children } => RawNode {
                kind,
                children,
                ..Default::default()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_editor_envelope() {
        let doc: Document = serde_json::from_value(json!({
            "root": {
                "type": "root",
                "format": "",
                "children": [
                    { "type": "heading", "tag": "h3", "children": [{ "type": "text", "text": "Intro", "format": 0 }] },
                    { "type": "paragraph", "format": "center", "children": [{ "type": "text", "text": "Hi", "format": 3 }] }
                ]
            }
        }))
        .unwrap();

        let children = doc.root.children();
        assert_eq!(children.len(), 2);
        assert!(matches!(children[0], Node::Heading { level: 3, .. }));
        match &children[1].children()[0] {
            Node::Text { text, format } => {
                assert_eq!(text, "Hi");
                assert!(format.contains(TextFormat::BOLD));
                assert!(format.contains(TextFormat::ITALIC));
                assert!(!format.contains(TextFormat::CODE));
            }
            other => panic!("expected text node, got {:?}", other),
        }
    }

    #[test]
    fn accepts_bare_root() {
        let doc: Document = serde_json::from_value(json!({
            "type": "root",
            "children": [{ "type": "paragraph", "children": [] }]
        }))
        .unwrap();
        assert_eq!(doc.root.children().len(), 1);
    }

    #[test]
    fn keeps_unknown_nodes_with_children() {
        let node: Node = serde_json::from_value(json!({
            "type": "callout",
            "children": [{ "type": "text", "text": "kept" }]
        }))
        .unwrap();
        assert!(matches!(&node, Node::Other { kind, .. } if kind == "callout"));
        assert_eq!(node.text_content(), "kept");
    }

    #[test]
    fn link_url_prefers_fields() {
        let node: Node = serde_json::from_value(json!({
            "type": "link",
            "url": "https://old.example",
            "fields": { "url": "https://new.example", "newTab": true },
            "children": []
        }))
        .unwrap();
        assert_eq!(
            node,
            Node::Link {
                url: "https://new.example".into(),
                new_tab: true,
                children: vec![]
            }
        );
    }

    #[test]
    fn out_of_range_heading_tag_falls_back_to_h2() {
        let node: Node =
            serde_json::from_value(json!({ "type": "heading", "tag": "h9", "children": [] }))
                .unwrap();
        assert!(matches!(node, Node::Heading { level: 2, .. }));
    }

    #[test]
    fn serialized_form_reads_back_identically() {
        let doc = Document::new(vec![Node::List {
            kind: ListKind::Number,
            start: 3,
            children: vec![Node::ListItem {
                checked: None,
                children: vec![Node::text("step")],
            }],
        }]);
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["root"]["children"][0]["listType"], "number");
        let back: Document = serde_json::from_value(json).unwrap();
        assert_eq!(back, doc);
    }
}
