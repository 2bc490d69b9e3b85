//! Markdown to HTML rendering for step cards and explanations

use pulldown_cmark::{CowStr, Event, Options, Parser, Tag, html};

/// Render model Markdown into HTML safe to drop into a card.
///
/// Raw HTML from the model is escaped rather than passed through.
pub fn render(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);

    let parser = Parser::new_ext(markdown, options).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        Event::Start(Tag::Link {
            link_type,
            dest_url,
            title,
            id,
        }) => {
            let dest_url = sanitize_url(dest_url);
            Event::Start(Tag::Link {
                link_type,
                dest_url,
                title,
                id,
            })
        }
        other => other,
    });

    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, parser);
    open_external_links(&out)
}

/// Drop `javascript:` style targets
fn sanitize_url(url: CowStr<'_>) -> CowStr<'_> {
    let lower = url.trim_start().to_ascii_lowercase();
    if lower.starts_with("javascript:") || lower.starts_with("vbscript:") || lower.starts_with("data:")
    {
        CowStr::Borrowed("#")
    } else {
        url
    }
}

fn open_external_links(html: &str) -> String {
    html.replace(
        "<a href=\"http",
        "<a target=\"_blank\" rel=\"noopener\" href=\"http",
    )
}
