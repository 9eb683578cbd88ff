//! HTML bodies for the page routes.

use serde_json::json;

use crate::animation::render_block;
use crate::config::SiteConfig;
use crate::models::*;
use crate::render::{escape_html, render_document, safe_href, TocEntry};

pub fn index_body(config: &SiteConfig, topics: &[TopicSummary]) -> String {
    let mut html = format!(
        "<section class=\"curriculum\"><h1>{}</h1>",
        escape_html(&config.site_name)
    );

    if topics.is_empty() {
        html.push_str("<p class=\"empty\">No modules published yet.</p>");
    } else {
        html.push_str("<ol class=\"topics\">");
        for topic in topics {
            html.push_str(&format!(
                "<li><a href=\"/topics/{}\">{}</a>",
                escape_html(&topic.slug),
                escape_html(&topic.title)
            ));
            if let Some(summary) = &topic.summary {
                html.push_str(&format!("<p>{}</p>", escape_html(summary)));
            }
            html.push_str("</li>");
        }
        html.push_str("</ol>");
    }

    html.push_str("</section>");
    html
}

/// Full topic article. `prev`/`next` are the neighbours in curriculum order.
pub fn topic_body(
    topic: &Topic,
    prev: Option<&TopicSummary>,
    next: Option<&TopicSummary>,
    diagnostics: bool,
) -> String {
    let rendered = topic.theory.as_ref().map(render_document).unwrap_or_default();

    let mut html = format!(
        "<article class=\"topic\"><header><p class=\"eyebrow\">Module {}</p><h1>{}</h1>",
        topic.order,
        escape_html(&topic.title)
    );
    if let Some(summary) = &topic.summary {
        html.push_str(&format!("<p class=\"summary\">{}</p>", escape_html(summary)));
    }
    html.push_str("</header>");

    if !rendered.toc.is_empty() {
        html.push_str(&toc_nav(&rendered.toc));
    }
    if !rendered.html.is_empty() {
        html.push_str(&format!("<section class=\"theory\">{}</section>", rendered.html));
    }

    let figures: String = topic
        .animations
        .iter()
        .map(|block| render_block(block, diagnostics))
        .collect();
    if !figures.is_empty() {
        html.push_str(&format!(
            "<section class=\"animations\"><h2>Visualizations</h2>{}</section>",
            figures
        ));
    }

    if let Some(practice) = &topic.practice {
        html.push_str(&practice_section(practice));
    }
    if !topic.references.is_empty() {
        html.push_str(&references_section(&topic.references));
    }

    html.push_str(&pager(prev, next));
    html.push_str("</article>");
    html
}

fn toc_nav(toc: &[TocEntry]) -> String {
    let mut html = String::from("<nav class=\"toc\"><h2>On this page</h2><ol>");
    for entry in toc {
        html.push_str(&format!(
            "<li class=\"toc-h{}\"><a href=\"#{}\">{}</a></li>",
            entry.level,
            escape_html(&entry.id),
            escape_html(&entry.text)
        ));
    }
    html.push_str("</ol></nav>");
    html
}

fn practice_section(practice: &Practice) -> String {
    let mut html = String::from("<section class=\"practice\"><h2>Practice</h2>");
    if let Some(intro) = &practice.intro {
        html.push_str(&format!("<p>{}</p>", escape_html(intro)));
    }

    if !practice.steps.is_empty() {
        html.push_str("<ol class=\"steps\">");
        for step in &practice.steps {
            html.push_str(&format!("<li>{}</li>", escape_html(step)));
        }
        html.push_str("</ol>");
    }

    if !practice.tasks.is_empty() {
        html.push_str("<ul class=\"tasks\">");
        for task in &practice.tasks {
            html.push_str(&format!("<li><strong>{}</strong>", escape_html(&task.title)));
            if let Some(description) = &task.description {
                html.push_str(&format!("<p>{}</p>", escape_html(description)));
            }
            if let Some(hint) = &task.hint {
                html.push_str(&format!(
                    "<details><summary>Hint</summary><p>{}</p></details>",
                    escape_html(hint)
                ));
            }
            html.push_str("</li>");
        }
        html.push_str("</ul>");
    }

    if let Some(demo) = &practice.demo {
        html.push_str(&format!(
            "<div class=\"demo\" data-demo=\"{}\" data-props=\"{}\"></div>",
            escape_html(&demo.kind),
            escape_html(&demo.props.to_string())
        ));
    }

    html.push_str("</section>");
    html
}

fn references_section(references: &[Reference]) -> String {
    let mut html = String::from("<section class=\"references\"><h2>References</h2><ul>");
    for reference in references {
        html.push_str(&format!(
            "<li><a href=\"{}\" rel=\"noopener\">{}</a>",
            escape_html(safe_href(&reference.url)),
            escape_html(&reference.title)
        ));
        if let Some(note) = &reference.note {
            html.push_str(&format!(" <span class=\"note\">{}</span>", escape_html(note)));
        }
        html.push_str("</li>");
    }
    html.push_str("</ul></section>");
    html
}

fn pager(prev: Option<&TopicSummary>, next: Option<&TopicSummary>) -> String {
    if prev.is_none() && next.is_none() {
        return String::new();
    }
    let mut html = String::from("<nav class=\"pager\">");
    if let Some(prev) = prev {
        html.push_str(&format!(
            "<a rel=\"prev\" href=\"/topics/{}\">← {}</a>",
            escape_html(&prev.slug),
            escape_html(&prev.title)
        ));
    }
    if let Some(next) = next {
        html.push_str(&format!(
            "<a rel=\"next\" href=\"/topics/{}\">{} →</a>",
            escape_html(&next.slug),
            escape_html(&next.title)
        ));
    }
    html.push_str("</nav>");
    html
}

pub fn page_body(page: &Page) -> String {
    let rendered = page.content.as_ref().map(render_document).unwrap_or_default();
    format!(
        "<article class=\"page\"><h1>{}</h1>{}</article>",
        escape_html(&page.title),
        rendered.html
    )
}

pub fn resources_body(resources: &[Resource]) -> String {
    let mut html = String::from("<section class=\"resources\"><h1>Resources</h1>");
    if resources.is_empty() {
        html.push_str("<p class=\"empty\">No resources yet.</p>");
    } else {
        html.push_str("<ul>");
        for resource in resources {
            html.push_str(&format!(
                "<li class=\"resource resource-{}\"><a href=\"{}\" rel=\"noopener\">{}</a> <span class=\"kind\">{}</span>",
                resource.kind.as_str(),
                escape_html(safe_href(&resource.url)),
                escape_html(&resource.title),
                resource.kind.as_str()
            ));
            if let Some(description) = &resource.description {
                html.push_str(&format!("<p>{}</p>", escape_html(description)));
            }
            html.push_str("</li>");
        }
        html.push_str("</ul>");
    }
    html.push_str("</section>");
    html
}

pub fn offline_body() -> String {
    "<section class=\"offline\"><h1>You're offline</h1>\
<p>This page hasn't been saved for offline reading yet. Pages you've visited before are still available.</p>\
<p><a href=\"/\">Back to the curriculum</a></p></section>"
        .to_string()
}

/// Web app manifest for installing the site.
pub fn web_manifest(config: &SiteConfig) -> serde_json::Value {
    json!({
        "name": config.site_name,
        "short_name": "FSD",
        "start_url": "/",
        "scope": "/",
        "display": "standalone",
        "background_color": "#ffffff",
        "theme_color": config.theme_color
    })
}
