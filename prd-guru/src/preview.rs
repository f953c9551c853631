//! Markdown and HTML renderings of a draft.

use pulldown_cmark::{html, Event, Options, Parser};
use shared_types::{Document, DocumentField, DocumentPreview};

const UNTITLED: &str = "Untitled PRD";

pub fn to_markdown(document: &Document) -> String {
    let title = document.title.trim();
    let mut markdown = format!("# {}\n", if title.is_empty() { UNTITLED } else { title });

    for field in DocumentField::ALL {
        if field == DocumentField::Title {
            continue;
        }
        let value = document.field(field).trim();
        if value.is_empty() {
            continue;
        }
        markdown.push_str(&format!("\n## {}\n\n{}\n", field.label(), value));
    }
    markdown
}

/// Raw HTML in field values is rendered as text.
pub fn render(document: &Document) -> DocumentPreview {
    let markdown = to_markdown(document);

    let parser = Parser::new_ext(&markdown, Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH)
        .map(|event| match event {
            Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
            other => other,
        });
    let mut body = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut body, parser);

    DocumentPreview {
        markdown,
        html: body,
    }
}
