//! Read-mode HTML preview
//!
//! Renders canonical markup to HTML for the read surface using comrak.
//! Cross-reference tokens become anchors the host wires to navigation.

use comrak::{markdown_to_html, Options};

use crate::markdown::reference::{find_references, CrossReference};

/// CSS class on every rendered cross-reference anchor.
pub const REFERENCE_CLASS: &str = "note-ref";

/// Render canonical markup to an HTML fragment.
///
/// Single newlines become line breaks, matching the line-per-block model.
/// Raw HTML in the note is escaped; only underline tags and cross-reference
/// anchors produced here reach the output as markup.
pub fn render_preview_html(markdown: &str) -> String {
    let (source, references) = mark_inline_entities(markdown);
    let html = markdown_to_html(&source, &preview_options());
    restore_inline_entities(&html, &references)
}

/// Render a complete standalone HTML page.
pub fn generate_preview_document(markdown: &str, title: Option<&str>) -> String {
    let body = render_preview_html(markdown);
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <meta name="generator" content="grimoire">
    <title>{title}</title>
    <style>
{css}
    </style>
</head>
<body>
    <article class="note-body">
{body}
    </article>
</body>
</html>"#,
        title = html_escape(title.unwrap_or("Untitled note")),
        css = BASE_CSS,
        body = body,
    )
}

fn preview_options() -> Options {
    let mut options = Options::default();
    options.extension.strikethrough = true;
    options.render.unsafe_ = false;
    options.render.escape = true;
    options.render.hardbreaks = true;
    options
}

// Private-use chars stand in for entities while comrak renders the text
const REFERENCE_START: char = '\u{E000}';
const REFERENCE_END: char = '\u{E001}';
const UNDERLINE_OPEN: char = '\u{E002}';
const UNDERLINE_CLOSE: char = '\u{E003}';

fn is_placeholder(c: char) -> bool {
    matches!(c, REFERENCE_START | REFERENCE_END | UNDERLINE_OPEN | UNDERLINE_CLOSE)
}

/// Replace `[[target|label]]` tokens and unescaped `<u>`/`</u>` tags with
/// placeholders comrak treats as plain text.
fn mark_inline_entities(markdown: &str) -> (String, Vec<CrossReference>) {
    let cleaned: String = markdown.chars().filter(|&c| !is_placeholder(c)).collect();
    let mut output = String::with_capacity(cleaned.len());
    let mut references = Vec::new();
    let mut last = 0;
    for (range, reference) in find_references(&cleaned) {
        mark_underlines(&cleaned[last..range.start], &mut output);
        output.push(REFERENCE_START);
        output.push_str(&references.len().to_string());
        output.push(REFERENCE_END);
        references.push(reference);
        last = range.end;
    }
    mark_underlines(&cleaned[last..], &mut output);
    (output, references)
}

fn mark_underlines(text: &str, output: &mut String) {
    let mut rest = text;
    while let Some(at) = rest.find('<') {
        let escaped = rest[..at].ends_with('\\');
        let tail = &rest[at..];
        output.push_str(&rest[..at]);
        if !escaped && tail.starts_with("<u>") {
            output.push(UNDERLINE_OPEN);
            rest = &tail[3..];
        } else if !escaped && tail.starts_with("</u>") {
            output.push(UNDERLINE_CLOSE);
            rest = &tail[4..];
        } else {
            output.push('<');
            rest = &tail[1..];
        }
    }
    output.push_str(rest);
}

/// Swap placeholders in rendered HTML for underline tags and anchors.
fn restore_inline_entities(html: &str, references: &[CrossReference]) -> String {
    let mut output = String::with_capacity(html.len());
    let mut chars = html.chars();
    while let Some(c) = chars.next() {
        match c {
            UNDERLINE_OPEN => output.push_str("<u>"),
            UNDERLINE_CLOSE => output.push_str("</u>"),
            REFERENCE_START => {
                let index: String = chars
                    .by_ref()
                    .take_while(|&c| c != REFERENCE_END)
                    .collect();
                let reference = index
                    .parse::<usize>()
                    .ok()
                    .and_then(|i| references.get(i));
                if let Some(reference) = reference {
                    output.push_str(&reference_anchor(reference));
                }
            }
            REFERENCE_END => {}
            other => output.push(other),
        }
    }
    output
}

fn reference_anchor(reference: &CrossReference) -> String {
    format!(
        r##"<a class="{}" data-note-ref="{}" href="#">{}</a>"##,
        REFERENCE_CLASS,
        html_escape(&reference.target),
        html_escape(&reference.label),
    )
}

/// HTML-escape a string.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

const BASE_CSS: &str = r#"        body {
            font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Helvetica, Arial, sans-serif;
            line-height: 1.6;
            max-width: 48rem;
            margin: 2rem auto;
            padding: 0 1rem;
        }
        a.note-ref {
            text-decoration: none;
            border-bottom: 1px dashed currentColor;
        }"#;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
