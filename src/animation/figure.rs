use super::{compare, parse_spec, AnimationBody, AnimationError, Diff2d, Flow2d, Timeline2d};
use crate::models::AnimationBlock;
use crate::render::escape_html;

/// Render an animation block as a `<figure>` for the client-side player.
///
/// The figure carries the validated spec in `data-spec` and a static
/// fallback so the content still reads without scripts. An invalid block
/// renders a diagnostic when `diagnostics` is set and nothing otherwise.
pub fn render_block(block: &AnimationBlock, diagnostics: bool) -> String {
    let spec = match parse_spec(&block.spec) {
        Ok(spec) => spec,
        Err(e) => {
            tracing::warn!(
                "Skipping animation block {:?}: {}",
                block.title.as_deref().unwrap_or("untitled"),
                e
            );
            return if diagnostics {
                render_diagnostic(block, &e)
            } else {
                String::new()
            };
        }
    };

    let kind = spec.body.kind();
    let data = serde_json::to_string(&spec).unwrap_or_default();
    let mut html = format!(
        "<figure class=\"animation animation-{kind}\" data-kind=\"{kind}\" data-spec=\"{}\">",
        escape_html(&data)
    );

    if let Some(title) = block.title.as_deref().or(spec.title.as_deref()) {
        html.push_str(&format!("<figcaption>{}</figcaption>", escape_html(title)));
    }

    match &spec.body {
        AnimationBody::Timeline(timeline) => html.push_str(&timeline_fallback(timeline)),
        AnimationBody::Flow(flow) => html.push_str(&flow_fallback(flow)),
        AnimationBody::Diff(diff) => html.push_str(&diff_fallback(diff)),
    }

    if let Some(caption) = &block.caption {
        html.push_str(&format!("<p class=\"caption\">{}</p>", escape_html(caption)));
    }
    html.push_str("</figure>");
    html
}

fn render_diagnostic(block: &AnimationBlock, error: &AnimationError) -> String {
    let mut html = String::from("<div class=\"animation-error\" role=\"alert\">");
    html.push_str(&format!(
        "<strong>Invalid animation spec{}</strong><ul>",
        block
            .title
            .as_deref()
            .map(|t| format!(": {}", escape_html(t)))
            .unwrap_or_default()
    ));
    for issue in error.issues() {
        if issue.path.is_empty() {
            html.push_str(&format!("<li>{}</li>", escape_html(&issue.message)));
        } else {
            html.push_str(&format!(
                "<li><code>{}</code> {}</li>",
                escape_html(&issue.path),
                escape_html(&issue.message)
            ));
        }
    }
    html.push_str("</ul></div>");
    html
}

fn timeline_fallback(timeline: &Timeline2d) -> String {
    let mut events: Vec<_> = timeline.events.iter().collect();
    events.sort_by(|a, b| a.at.total_cmp(&b.at));

    let mut html = String::from("<ol class=\"timeline\">");
    for event in events {
        let lane = timeline
            .lanes
            .iter()
            .find(|l| l.id == event.lane)
            .map(|l| l.label.as_str())
            .unwrap_or(event.lane.as_str());
        html.push_str(&format!(
            "<li data-lane=\"{}\"><span class=\"at\">{}ms</span> <span class=\"lane\">{}</span> {}</li>",
            escape_html(&event.lane),
            event.at,
            escape_html(lane),
            escape_html(&event.label)
        ));
    }
    html.push_str("</ol>");
    html
}

fn flow_fallback(flow: &Flow2d) -> String {
    let label = |id: &str| {
        flow.nodes
            .iter()
            .find(|n| n.id == id)
            .map(|n| n.label.clone())
            .unwrap_or_else(|| id.to_string())
    };

    let mut html = String::from("<ul class=\"flow-edges\">");
    for edge in &flow.edges {
        html.push_str(&format!(
            "<li>{} → {}",
            escape_html(&label(&edge.from)),
            escape_html(&label(&edge.to))
        ));
        if let Some(text) = &edge.label {
            html.push_str(&format!(" <span class=\"edge-label\">{}</span>", escape_html(text)));
        }
        html.push_str("</li>");
    }
    html.push_str("</ul>");

    if !flow.steps.is_empty() {
        html.push_str("<ol class=\"flow-steps\">");
        for step in &flow.steps {
            html.push_str(&format!("<li>{}</li>", escape_html(&step.caption)));
        }
        html.push_str("</ol>");
    }
    html
}

fn diff_fallback(diff: &Diff2d) -> String {
    let heading = |label: &Option<String>, default: &str| {
        escape_html(label.as_deref().unwrap_or(default))
    };

    let mut html = format!(
        "<table class=\"diff\"><thead><tr><th></th><th>{}</th><th>{}</th></tr></thead><tbody>",
        heading(&diff.before.label, "Before"),
        heading(&diff.after.label, "After")
    );
    for row in compare(diff) {
        html.push_str(&format!(
            "<tr class=\"{}\"><td>{}</td><td>{}</td><td>{}</td></tr>",
            row.change.as_str(),
            row.change.marker(),
            escape_html(row.before.as_deref().unwrap_or("")),
            escape_html(row.after.as_deref().unwrap_or(""))
        ));
    }
    html.push_str("</tbody></table>");
    if let Some(caption) = &diff.caption {
        html.push_str(&format!("<p class=\"diff-caption\">{}</p>", escape_html(caption)));
    }
    html
}

#[cfg(test)]
mod tests {
    use super::super::tests as fixtures;
    use super::*;
    use serde_json::json;

    fn block(spec: serde_json::Value) -> AnimationBlock {
        AnimationBlock {
            title: Some("Demo".to_string()),
            caption: None,
            spec,
        }
    }

    #[test]
    fn valid_timeline_renders_figure_with_sorted_events() {
        let mut spec = fixtures::timeline();
        spec["events"] = json!([
            { "id": "b", "lane": "main", "at": 300, "label": "Second" },
            { "id": "a", "lane": "net", "at": 10, "label": "First" }
        ]);
        let html = render_block(&block(spec), true);
        assert!(html.starts_with("<figure class=\"animation animation-timeline2d\""));
        assert!(html.contains("<figcaption>Demo</figcaption>"));
        let list = &html[html.find("<ol class=\"timeline\">").unwrap()..];
        let first = list.find("First").unwrap();
        let second = list.find("Second").unwrap();
        assert!(first < second);
        assert!(list.contains("<span class=\"lane\">Network</span>"));
    }

    #[test]
    fn flow_fallback_uses_node_labels() {
        let html = render_block(&block(fixtures::flow()), false);
        assert!(html.contains("<li>Browser → CDN <span class=\"edge-label\">GET /</span></li>"));
        assert!(html.contains("<ol class=\"flow-steps\"><li>Request leaves the browser</li></ol>"));
    }

    #[test]
    fn diff_fallback_escapes_markup() {
        let html = render_block(&block(fixtures::diff()), false);
        assert!(html.contains(
            "<tr class=\"changed\"><td>~</td><td>&lt;div&gt;</td><td>&lt;main&gt;</td></tr>"
        ));
    }

    #[test]
    fn invalid_block_shows_diagnostic_only_when_asked() {
        let broken = block(json!({ "version": 1, "kind": "flow2d", "nodes": [] }));

        let shown = render_block(&broken, true);
        assert!(shown.contains("role=\"alert\""));
        assert!(shown.contains("<code>nodes</code> at least one node is required"));

        assert_eq!(render_block(&broken, false), "");
    }
}
