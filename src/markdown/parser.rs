//! Markup parser
//!
//! Converts canonical markup text into a [`FormattedNode`] document. The
//! grammar is deliberately small and line oriented: each line is a heading,
//! a list item or a paragraph, and inline content may carry bold, italic,
//! strikethrough, underline and cross-references. Anything that does not
//! match a construct is kept as literal text, so parsing never fails and no
//! character of the input is lost.

use std::ops::Range;

use crate::markdown::document::{FormattedNode, HeadingLevel, InlineFormat, ItemMarker, NodeKind};
use crate::markdown::reference::{find_references, CrossReference};

// ─────────────────────────────────────────────────────────────────────────────
// Public Types
// ─────────────────────────────────────────────────────────────────────────────

/// Configuration options for parsing and serialization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MarkdownOptions {
    /// Resolve `[[target|label]]` tokens into cross-reference nodes.
    ///
    /// Off while editing, so tokens stay literal text the user can change.
    pub resolve_references: bool,
}

impl MarkdownOptions {
    /// Options for the read (display) surface.
    pub fn read() -> Self {
        Self {
            resolve_references: true,
        }
    }

    /// Options for the write (editing) surface.
    pub fn write() -> Self {
        Self {
            resolve_references: false,
        }
    }
}

/// Block role of a single line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Paragraph,
    Heading(HeadingLevel),
    Item(ItemMarker),
}

/// One parsed line: its block role and inline content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineBlock {
    pub kind: LineKind,
    pub inlines: Vec<FormattedNode>,
}

/// Characters a backslash can escape.
pub(crate) fn is_escapable(byte: u8) -> bool {
    matches!(
        byte,
        b'\\' | b'*' | b'~' | b'<' | b'[' | b']' | b'|' | b'#' | b'-' | b'+' | b'.' | b')'
    )
}

// ─────────────────────────────────────────────────────────────────────────────
// Public API Functions
// ─────────────────────────────────────────────────────────────────────────────

/// Parse markup text into a document tree, keeping reference tokens literal.
///
/// # Example
/// ```ignore
/// let doc = parse_markdown("# Hello\nWorld");
/// assert_eq!(doc.children.len(), 2);
/// ```
pub fn parse_markdown(markdown: &str) -> FormattedNode {
    parse_markdown_with_options(markdown, &MarkdownOptions::default())
}

/// Parse markup text with custom options.
///
/// Empty input yields a document with a single empty paragraph.
pub fn parse_markdown_with_options(markdown: &str, options: &MarkdownOptions) -> FormattedNode {
    let mut blocks: Vec<FormattedNode> = Vec::new();

    for line in markdown.split('\n') {
        let LineBlock { kind, inlines } = parse_line(line, options);
        match kind {
            LineKind::Paragraph => blocks.push(FormattedNode::paragraph(inlines)),
            LineKind::Heading(level) => blocks.push(FormattedNode::heading(level, inlines)),
            LineKind::Item(marker) => push_list_item(&mut blocks, marker, inlines),
        }
    }

    FormattedNode::document(blocks)
}

/// Parse a single line (without its trailing newline).
pub fn parse_line(line: &str, options: &MarkdownOptions) -> LineBlock {
    let (kind, content) = line_prefix(line);
    LineBlock {
        kind,
        inlines: parse_inlines(content, options),
    }
}

/// Parse inline content into text, format and cross-reference nodes.
pub fn parse_inlines(text: &str, options: &MarkdownOptions) -> Vec<FormattedNode> {
    let references = if options.resolve_references {
        find_references(text)
    } else {
        Vec::new()
    };
    InlineParser {
        src: text,
        references,
    }
    .parse_range(0, text.len())
}

// ─────────────────────────────────────────────────────────────────────────────
// Block Structure
// ─────────────────────────────────────────────────────────────────────────────

/// Split a line into its block role and the remaining inline content.
pub(crate) fn line_prefix(line: &str) -> (LineKind, &str) {
    let bytes = line.as_bytes();

    let hashes = bytes.iter().take_while(|b| **b == b'#').count();
    if (1..=6).contains(&hashes) && bytes.get(hashes) == Some(&b' ') {
        return (
            LineKind::Heading(HeadingLevel::from(hashes as u8)),
            &line[hashes + 1..],
        );
    }

    if bytes.len() >= 2 && matches!(bytes[0], b'-' | b'*' | b'+') && bytes[1] == b' ' {
        return (LineKind::Item(ItemMarker::Bullet(bytes[0] as char)), &line[2..]);
    }

    let digits = bytes.iter().take_while(|b| b.is_ascii_digit()).count();
    if (1..=9).contains(&digits) {
        let delimiter = bytes.get(digits).copied();
        if matches!(delimiter, Some(b'.') | Some(b')')) && bytes.get(digits + 1) == Some(&b' ') {
            let number_text = &line[..digits];
            // "01." would not survive a round trip, so it stays a paragraph
            if let Ok(number) = number_text.parse::<u32>() {
                if number.to_string() == number_text {
                    let delimiter = if delimiter == Some(b')') { ')' } else { '.' };
                    return (
                        LineKind::Item(ItemMarker::Ordered { number, delimiter }),
                        &line[digits + 2..],
                    );
                }
            }
        }
    }

    (LineKind::Paragraph, line)
}

/// Append an item to the trailing list when it continues it, otherwise
/// start a new list.
fn push_list_item(blocks: &mut Vec<FormattedNode>, marker: ItemMarker, inlines: Vec<FormattedNode>) {
    let item = FormattedNode::list_item(inlines);

    if let Some(last) = blocks.last_mut() {
        if let NodeKind::List(list_type) = &last.kind {
            if list_type.marker_for(last.children.len()) == marker {
                last.children.push(item);
                return;
            }
        }
    }

    blocks.push(FormattedNode::list(marker.list_type(), vec![item]));
}

// ─────────────────────────────────────────────────────────────────────────────
// Inline Parsing
// ─────────────────────────────────────────────────────────────────────────────

struct FormatSpan {
    format: InlineFormat,
    inner: Range<usize>,
    after: usize,
}

/// Recursive-descent inline parser over byte indices of one line.
struct InlineParser<'a> {
    src: &'a str,
    /// Resolved reference tokens; their bytes are never delimiters
    references: Vec<(Range<usize>, CrossReference)>,
}

impl<'a> InlineParser<'a> {
    fn parse_range(&self, start: usize, end: usize) -> Vec<FormattedNode> {
        let bytes = self.src.as_bytes();
        let mut nodes = Vec::new();
        let mut text = String::new();
        let mut i = start;

        while i < end {
            if let Some((range, reference)) = self.reference_at(i) {
                if range.end <= end {
                    flush_text(&mut nodes, &mut text);
                    nodes.push(FormattedNode::reference(reference.clone()));
                    i = range.end;
                    continue;
                }
            }

            if bytes[i] == b'\\' && i + 1 < end && is_escapable(bytes[i + 1]) {
                text.push(bytes[i + 1] as char);
                i += 2;
                continue;
            }

            if let Some(span) = self.match_format(i, end) {
                flush_text(&mut nodes, &mut text);
                let children = self.parse_range(span.inner.start, span.inner.end);
                nodes.push(FormattedNode::formatted(span.format, children));
                i = span.after;
                continue;
            }

            let Some(ch) = self.src[i..end].chars().next() else {
                break;
            };
            text.push(ch);
            i += ch.len_utf8();
        }

        flush_text(&mut nodes, &mut text);
        nodes
    }

    fn reference_at(&self, i: usize) -> Option<&(Range<usize>, CrossReference)> {
        self.references.iter().find(|(range, _)| range.start == i)
    }

    fn match_format(&self, i: usize, end: usize) -> Option<FormatSpan> {
        let rest = &self.src[i..end];
        if rest.starts_with("<u>") {
            return self.match_underline(i, end);
        }
        if rest.starts_with("~~") {
            return self.match_delimited(i, end, InlineFormat::Strikethrough);
        }
        if rest.starts_with("**") {
            if let Some(span) = self.match_delimited(i, end, InlineFormat::Bold) {
                return Some(span);
            }
        }
        if rest.starts_with('*') {
            return self.match_delimited(i, end, InlineFormat::Italic);
        }
        None
    }

    /// `<u>` closes at the first `</u>`; content must be non-empty.
    fn match_underline(&self, i: usize, end: usize) -> Option<FormatSpan> {
        let bytes = self.src.as_bytes();
        let open_end = i + InlineFormat::Underline.open().len();
        let close = InlineFormat::Underline.close();
        let mut j = open_end;

        while j < end {
            if let Some((range, _)) = self.reference_at(j) {
                j = range.end;
                continue;
            }
            if bytes[j] == b'\\' && j + 1 < end && is_escapable(bytes[j + 1]) {
                j += 2;
                continue;
            }
            if self.src[j..end].starts_with(close) {
                return (j > open_end).then(|| FormatSpan {
                    format: InlineFormat::Underline,
                    inner: open_end..j,
                    after: j + close.len(),
                });
            }
            j += self.char_width(j);
        }
        None
    }

    /// `*`, `**` and `~~` spans.
    ///
    /// The opener must be followed by non-whitespace (and for `*`, not by a
    /// second `*`). A closer is the tail of a delimiter run preceded by
    /// non-whitespace; `*` ignores runs of exactly two, which belong to bold.
    fn match_delimited(&self, i: usize, end: usize, format: InlineFormat) -> Option<FormatSpan> {
        let bytes = self.src.as_bytes();
        let delimiter = format.open().as_bytes()[0];
        let width = format.open().len();
        let open_end = i + width;

        let next = self.src[open_end.min(end)..end].chars().next()?;
        if next.is_whitespace() || (width == 1 && next == delimiter as char) {
            return None;
        }

        let mut j = open_end;
        while j < end {
            if let Some((range, _)) = self.reference_at(j) {
                j = range.end;
                continue;
            }
            if bytes[j] == b'\\' && j + 1 < end && is_escapable(bytes[j + 1]) {
                j += 2;
                continue;
            }
            if bytes[j] == delimiter {
                let mut run_end = j;
                while run_end < end && bytes[run_end] == delimiter {
                    run_end += 1;
                }
                let run_len = run_end - j;
                let usable = if width == 1 { run_len != 2 } else { run_len >= width };
                if usable {
                    let close = run_end - width;
                    let flanked = self.src[open_end..close]
                        .chars()
                        .next_back()
                        .is_some_and(|c| !c.is_whitespace());
                    if close > open_end && flanked {
                        return Some(FormatSpan {
                            format,
                            inner: open_end..close,
                            after: run_end,
                        });
                    }
                }
                j = run_end;
                continue;
            }
            j += self.char_width(j);
        }
        None
    }

    fn char_width(&self, i: usize) -> usize {
        self.src[i..].chars().next().map_or(1, char::len_utf8)
    }
}

fn flush_text(nodes: &mut Vec<FormattedNode>, text: &mut String) {
    if !text.is_empty() {
        nodes.push(FormattedNode::text(std::mem::take(text)));
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
