use crate::config::SiteConfig;
use crate::render::escape_html;

/// Wrap page content in the shared document shell.
pub fn page_shell(config: &SiteConfig, title: &str, body: &str) -> String {
    let site = escape_html(&config.site_name);
    let full_title = if title.is_empty() || title == config.site_name {
        site.clone()
    } else {
        format!("{} · {}", escape_html(title), site)
    };

    format!(
        "<!DOCTYPE html>\
<html lang=\"en\">\
<head>\
<meta charset=\"utf-8\">\
<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\
<meta name=\"theme-color\" content=\"{theme}\">\
<link rel=\"manifest\" href=\"/manifest.webmanifest\">\
<title>{full_title}</title>\
</head>\
<body>\
<header class=\"site-header\"><a class=\"brand\" href=\"/\">{site}</a>\
<nav><a href=\"/\">Curriculum</a> <a href=\"/resources\">Resources</a></nav></header>\
<main>{body}</main>\
</body>\
</html>",
        theme = escape_html(&config.theme_color),
    )
}

/// Body of the generic error page.
pub fn message_body(heading: &str, message: &str) -> String {
    format!(
        "<section class=\"message\"><h1>{}</h1><p>{}</p><p><a href=\"/\">Back to the curriculum</a></p></section>",
        escape_html(heading),
        escape_html(message)
    )
}
