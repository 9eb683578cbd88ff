use serde::{Deserialize, Serialize};

use super::document::{Document, ListKind, Node, TextFormat};
use super::slug::HeadingIds;

/// One heading of a rendered document, in document order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TocEntry {
    pub level: u8,
    pub text: String,
    pub id: String,
}

/// Output of a render pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rendered {
    pub html: String,
    pub toc: Vec<TocEntry>,
}

/// Render a document to HTML, collecting its table of contents.
pub fn render_document(doc: &Document) -> Rendered {
    let mut renderer = Renderer::default();
    renderer.node(&doc.root);
    Rendered {
        html: renderer.out,
        toc: renderer.toc,
    }
}

/// Escape text for use in HTML element content and quoted attributes.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Return `url` if it is safe to put in an `href`, otherwise `#`.
///
/// Relative URLs and the http, https, mailto and tel schemes are allowed.
pub fn safe_href(url: &str) -> &str {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return "#";
    }

    let scheme_end = trimmed.find(':');
    let path_start = trimmed.find(['/', '?', '#']);
    let has_scheme = match (scheme_end, path_start) {
        (Some(colon), Some(path)) => colon < path,
        (Some(_), None) => true,
        (None, _) => false,
    };
    if !has_scheme {
        return trimmed;
    }

    let lower = trimmed.to_ascii_lowercase();
    if ["http:", "https:", "mailto:", "tel:"]
        .iter()
        .any(|scheme| lower.starts_with(scheme))
    {
        trimmed
    } else {
        "#"
    }
}

#[derive(Default)]
struct Renderer {
    out: String,
    toc: Vec<TocEntry>,
    ids: HeadingIds,
}

impl Renderer {
    fn children(&mut self, children: &[Node]) {
        for child in children {
            self.node(child);
        }
    }

    fn wrap(&mut self, open: &str, close: &str, children: &[Node]) {
        self.out.push_str(open);
        self.children(children);
        self.out.push_str(close);
    }

    fn node(&mut self, node: &Node) {
        match node {
            Node::Root { children } => self.children(children),
            Node::Paragraph { children } => self.wrap("<p>", "</p>", children),
            Node::Heading { level, children } => {
                let text = node.text_content().trim().to_string();
                let id = self.ids.issue(&text);
                self.out
                    .push_str(&format!("<h{} id=\"{}\">", level, escape_html(&id)));
                self.children(children);
                self.out.push_str(&format!("</h{}>", level));
                self.toc.push(TocEntry {
                    level: *level,
                    text,
                    id,
                });
            }
            Node::Quote { children } => self.wrap("<blockquote>", "</blockquote>", children),
            Node::List {
                kind,
                start,
                children,
            } => match kind {
                ListKind::Number if *start != 1 => {
                    self.wrap(&format!("<ol start=\"{}\">", start), "</ol>", children)
                }
                ListKind::Number => self.wrap("<ol>", "</ol>", children),
                ListKind::Bullet => self.wrap("<ul>", "</ul>", children),
                ListKind::Check => self.wrap("<ul class=\"checklist\">", "</ul>", children),
            },
            Node::ListItem { checked, children } => {
                let open = match checked {
                    Some(checked) => format!("<li role=\"checkbox\" aria-checked=\"{}\">", checked),
                    None => "<li>".to_string(),
                };
                self.wrap(&open, "</li>", children);
            }
            Node::Link {
                url,
                new_tab,
                children,
            } => {
                let mut open = format!("<a href=\"{}\"", escape_html(safe_href(url)));
                if *new_tab {
                    open.push_str(" target=\"_blank\" rel=\"noopener noreferrer\"");
                }
                open.push('>');
                self.wrap(&open, "</a>", children);
            }
            Node::Text { text, format } => self.text(text, *format),
            Node::Code { language, children } => {
                let open = match language.as_deref().filter(|l| !l.is_empty()) {
                    Some(lang) => {
                        format!("<pre><code class=\"language-{}\">", escape_html(lang))
                    }
                    None => "<pre><code>".to_string(),
                };
                self.out.push_str(&open);
                // Code blocks show their text verbatim, without inline formats.
                for child in children {
                    match child {
                        Node::LineBreak => self.out.push('\n'),
                        other => self.out.push_str(&escape_html(&other.text_content())),
                    }
                }
                self.out.push_str("</code></pre>");
            }
            Node::LineBreak => self.out.push_str("<br>"),
            Node::HorizontalRule => self.out.push_str("<hr>"),
            Node::Other { children, .. } => self.children(children),
        }
    }

    fn text(&mut self, text: &str, format: TextFormat) {
        // Innermost first.
        const WRAPPERS: [(u32, &str); 5] = [
            (TextFormat::CODE, "code"),
            (TextFormat::UNDERLINE, "u"),
            (TextFormat::STRIKETHROUGH, "s"),
            (TextFormat::ITALIC, "em"),
            (TextFormat::BOLD, "strong"),
        ];

        let mut html = escape_html(text);
        for (flag, tag) in WRAPPERS {
            if format.contains(flag) {
                html = format!("<{tag}>{html}</{tag}>");
            }
        }
        self.out.push_str(&html);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn render(value: serde_json::Value) -> Rendered {
        let doc: Document = serde_json::from_value(value).unwrap();
        render_document(&doc)
    }

    fn text(s: &str, format: u32) -> serde_json::Value {
        json!({ "type": "text", "text": s, "format": format })
    }

    #[test]
    fn renders_paragraph_with_formats() {
        let out = render(json!({ "root": { "type": "root", "children": [
            { "type": "paragraph", "children": [
                text("plain ", 0),
                text("bold", 1),
                text(" and ", 0),
                text("all", 1 | 2 | 16),
            ]}
        ]}}));
        assert_eq!(
            out.html,
            "<p>plain <strong>bold</strong> and <strong><em><code>all</code></em></strong></p>"
        );
    }

    #[test]
    fn headings_get_unique_ids_and_toc() {
        let out = render(json!({ "root": { "type": "root", "children": [
            { "type": "heading", "tag": "h2", "children": [text("Caching", 0)] },
            { "type": "heading", "tag": "h3", "children": [text("Caching", 2)] },
        ]}}));
        assert_eq!(
            out.html,
            "<h2 id=\"caching\">Caching</h2><h3 id=\"caching-1\"><em>Caching</em></h3>"
        );
        assert_eq!(
            out.toc,
            vec![
                TocEntry { level: 2, text: "Caching".into(), id: "caching".into() },
                TocEntry { level: 3, text: "Caching".into(), id: "caching-1".into() },
            ]
        );
    }

    #[test]
    fn ids_restart_for_each_render() {
        let doc: Document = serde_json::from_value(json!({ "root": { "type": "root", "children": [
            { "type": "heading", "tag": "h2", "children": [text("Intro", 0)] }
        ]}}))
        .unwrap();
        assert_eq!(render_document(&doc).toc[0].id, "intro");
        assert_eq!(render_document(&doc).toc[0].id, "intro");
    }

    #[test]
    fn renders_lists_quotes_and_code() {
        let out = render(json!({ "root": { "type": "root", "children": [
            { "type": "list", "listType": "number", "start": 2, "children": [
                { "type": "listitem", "children": [text("two", 0)] }
            ]},
            { "type": "list", "listType": "check", "children": [
                { "type": "listitem", "checked": true, "children": [text("done", 0)] }
            ]},
            { "type": "quote", "children": [text("q", 0)] },
            { "type": "code", "language": "ts", "children": [
                { "type": "code-highlight", "text": "let a = 1;" },
                { "type": "linebreak" },
                { "type": "code-highlight", "text": "a < 2" }
            ]}
        ]}}));
        assert_eq!(
            out.html,
            "<ol start=\"2\"><li>two</li></ol>\
             <ul class=\"checklist\"><li role=\"checkbox\" aria-checked=\"true\">done</li></ul>\
             <blockquote>q</blockquote>\
             <pre><code class=\"language-ts\">let a = 1;\na &lt; 2</code></pre>"
        );
    }

    #[test]
    fn links_are_sanitized() {
        let out = render(json!({ "root": { "type": "root", "children": [
            { "type": "paragraph", "children": [
                { "type": "link", "fields": { "url": "https://web.dev", "newTab": true }, "children": [text("web.dev", 0)] },
                { "type": "link", "url": "javascript:alert(1)", "children": [text("x", 0)] },
                { "type": "autolink", "url": "/topics/caching", "children": [text("y", 0)] }
            ]}
        ]}}));
        assert_eq!(
            out.html,
            "<p><a href=\"https://web.dev\" target=\"_blank\" rel=\"noopener noreferrer\">web.dev</a>\
             <a href=\"#\">x</a><a href=\"/topics/caching\">y</a></p>"
        );
    }

    #[test]
    fn unknown_nodes_render_children_or_nothing() {
        let out = render(json!({ "root": { "type": "root", "children": [
            { "type": "callout", "children": [{ "type": "paragraph", "children": [text("inside", 0)] }] },
            { "type": "upload", "value": { "id": "img" } }
        ]}}));
        assert_eq!(out.html, "<p>inside</p>");
    }

    #[test]
    fn escapes_text() {
        let out = render(json!({ "root": { "type": "root", "children": [
            { "type": "paragraph", "children": [text("<script>\"x\" & 'y'</script>", 0)] }
        ]}}));
        assert_eq!(
            out.html,
            "<p>&lt;script&gt;&quot;x&quot; &amp; &#39;y&#39;&lt;/script&gt;</p>"
        );
    }

    #[test]
    fn safe_href_allows_relative_and_known_schemes() {
        assert_eq!(safe_href("#intro"), "#intro");
        assert_eq!(safe_href("../up"), "../up");
        assert_eq!(safe_href("path/with:colon"), "path/with:colon");
        assert_eq!(safe_href("MAILTO:me@example.com"), "MAILTO:me@example.com");
        assert_eq!(safe_href(" data:text/html,hi"), "#");
        assert_eq!(safe_href(""), "#");
    }
}
