//! Document serializer
//!
//! Writes a [`FormattedNode`] tree back to canonical markup. Every line is
//! first written plainly; if re-parsing that line would not reproduce the
//! same node, its text is written again with every significant character
//! escaped. The result is deterministic, and parsing it yields a tree equal
//! to the normalized input.

use log::trace;

use crate::markdown::document::{FormattedNode, ItemMarker, NodeKind};
use crate::markdown::parser::{line_prefix, parse_line, LineKind, MarkdownOptions};
use crate::markdown::reference::strip_reference_escapes;

/// Serialize a document to canonical markup, keeping reference tokens literal.
pub fn serialize(root: &FormattedNode) -> String {
    serialize_with_options(root, &MarkdownOptions::default())
}

/// Serialize a document with custom options.
///
/// `options` must match those the output will be parsed with.
pub fn serialize_with_options(root: &FormattedNode, options: &MarkdownOptions) -> String {
    let root = root.normalized();
    if root.kind.format().is_some()
        || matches!(root.kind, NodeKind::Text(_) | NodeKind::CrossReference(_))
    {
        return write_inlines(std::slice::from_ref(&root), false);
    }

    let mut lines = Vec::new();
    write_block(&root, options, &mut lines);
    lines.join("\n")
}

fn write_block(block: &FormattedNode, options: &MarkdownOptions, lines: &mut Vec<String>) {
    match &block.kind {
        NodeKind::Document => {
            for child in &block.children {
                write_block(child, options, lines);
            }
        }
        NodeKind::Paragraph => {
            lines.push(write_line(LineKind::Paragraph, &block.children, options));
        }
        NodeKind::Heading(level) => {
            lines.push(write_line(LineKind::Heading(*level), &block.children, options));
        }
        NodeKind::List(list_type) => {
            for (index, item) in block.children.iter().enumerate() {
                let marker = list_type.marker_for(index);
                lines.push(write_line(LineKind::Item(marker), &item.children, options));
            }
        }
        NodeKind::ListItem => {
            let marker = ItemMarker::Bullet('-');
            lines.push(write_line(LineKind::Item(marker), &block.children, options));
        }
        // Inline content directly under the root reads as its own line
        _ => {
            lines.push(write_line(
                LineKind::Paragraph,
                std::slice::from_ref(block),
                options,
            ));
        }
    }
}

fn line_marker(kind: LineKind) -> String {
    match kind {
        LineKind::Paragraph => String::new(),
        LineKind::Heading(level) => level.prefix(),
        LineKind::Item(marker) => marker.prefix(),
    }
}

/// Write one line, falling back to full escaping when the plain form would
/// parse differently.
fn write_line(kind: LineKind, inlines: &[FormattedNode], options: &MarkdownOptions) -> String {
    let marker = line_marker(kind);
    let plain = format!("{}{}", marker, write_inlines(inlines, false));

    let reparsed = parse_line(&plain, options);
    if reparsed.kind == kind && reparsed.inlines == inlines {
        return plain;
    }

    trace!("Escaping line {:?}", plain);
    let mut escaped = write_inlines(inlines, true);
    if kind == LineKind::Paragraph {
        escaped = escape_block_marker(&escaped);
    }
    if !options.resolve_references {
        escaped = strip_reference_escapes(&escaped);
    }
    format!("{}{}", marker, escaped)
}

fn write_inlines(nodes: &[FormattedNode], escape: bool) -> String {
    let mut out = String::new();
    for node in nodes {
        write_inline(node, escape, &mut out);
    }
    out
}

fn write_inline(node: &FormattedNode, escape: bool, out: &mut String) {
    match &node.kind {
        NodeKind::Text(text) if escape => escape_text(text, out),
        NodeKind::Text(text) => out.push_str(text),
        NodeKind::CrossReference(reference) => out.push_str(&reference.to_markup()),
        kind => {
            let format = kind.format();
            if let Some(format) = format {
                out.push_str(format.open());
            }
            for child in &node.children {
                write_inline(child, escape, out);
            }
            if let Some(format) = format {
                out.push_str(format.close());
            }
        }
    }
}

fn escape_text(text: &str, out: &mut String) {
    for ch in text.chars() {
        if matches!(ch, '\\' | '*' | '~' | '<' | '[' | ']' | '|') {
            out.push('\\');
        }
        out.push(ch);
    }
}

/// Keep a paragraph that begins like a heading or list item a paragraph.
fn escape_block_marker(line: &str) -> String {
    match line_prefix(line).0 {
        LineKind::Paragraph => line.to_string(),
        LineKind::Heading(_) | LineKind::Item(ItemMarker::Bullet(_)) => format!("\\{}", line),
        LineKind::Item(ItemMarker::Ordered { .. }) => {
            let digits = line.bytes().take_while(u8::is_ascii_digit).count();
            format!("{}\\{}", &line[..digits], &line[digits..])
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markdown::document::{HeadingLevel, InlineFormat, ListType};
    use crate::markdown::parser::{parse_markdown, parse_markdown_with_options};
    use crate::markdown::reference::CrossReference;

    fn text(s: &str) -> FormattedNode {
        FormattedNode::text(s)
    }

    fn round_trip(markdown: &str) -> String {
        serialize(&parse_markdown(markdown))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Canonical Round Trips
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_round_trip_canonical_text() {
        let samples = [
            "",
            "plain",
            "# Title\n## Sub",
            "**bold** and *italic* and ~~gone~~ and <u>under</u>",
            "**bold *nested* bold**",
            "- one\n- two\n\n1. a\n2. b",
            "3) three\n4) four",
            "2 * 3 = 6",
            "a line with trailing space ",
            "日本語 **på**",
            "[[42|See also]]",
        ];
        for sample in samples {
            assert_eq!(round_trip(sample), sample, "round trip of {:?}", sample);
        }
    }

    #[test]
    fn test_serialize_heading() {
        let doc = FormattedNode::document(vec![FormattedNode::heading(
            HeadingLevel::H2,
            vec![text("Hi")],
        )]);
        assert_eq!(serialize(&doc), "## Hi");
    }

    #[test]
    fn test_serialize_list_numbers_from_start() {
        let doc = FormattedNode::document(vec![FormattedNode::list(
            ListType::Ordered {
                start: 5,
                delimiter: '.',
            },
            vec![
                FormattedNode::list_item(vec![text("a")]),
                FormattedNode::list_item(vec![text("b")]),
            ],
        )]);
        assert_eq!(serialize(&doc), "5. a\n6. b");
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Escaping
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_literal_delimiters_are_escaped() {
        let doc = FormattedNode::document(vec![FormattedNode::paragraph(vec![text("**not bold**")])]);
        let out = serialize(&doc);
        assert_eq!(out, r"\*\*not bold\*\*");
        assert_eq!(parse_markdown(&out).normalized(), doc.normalized());
    }

    #[test]
    fn test_literal_block_markers_are_escaped() {
        let cases = [
            ("# not heading", r"\# not heading"),
            ("- not item", r"\- not item"),
            ("+ not item", r"\+ not item"),
            ("1. not item", r"1\. not item"),
            ("7) not item", r"7\) not item"),
        ];
        for (literal, expected) in cases {
            let doc = FormattedNode::document(vec![FormattedNode::paragraph(vec![text(literal)])]);
            let out = serialize(&doc);
            assert_eq!(out, expected);
            assert_eq!(parse_markdown(&out), doc);
        }
    }

    #[test]
    fn test_escaping_is_stable() {
        let doc = FormattedNode::document(vec![FormattedNode::paragraph(vec![
            text("*a* "),
            FormattedNode::formatted(InlineFormat::Bold, vec![text("b")]),
        ])]);
        let first = serialize(&doc);
        let second = serialize(&parse_markdown(&first));
        assert_eq!(first, second);
        assert_eq!(first, r"\*a\* **b**");
    }

    #[test]
    fn test_reference_tokens_survive_escaping() {
        let doc = FormattedNode::document(vec![FormattedNode::paragraph(vec![text(
            "*x* [[42|See also]]",
        )])]);
        let out = serialize(&doc);
        assert_eq!(out, r"\*x\* [[42|See also]]");
        assert_eq!(parse_markdown(&out), doc);
    }

    #[test]
    fn test_literal_token_escaped_in_read_mode() {
        let options = MarkdownOptions::read();
        let doc = FormattedNode::document(vec![FormattedNode::paragraph(vec![text("[[42]]")])]);
        let out = serialize_with_options(&doc, &options);
        assert_eq!(out, r"\[\[42\]\]");
        assert_eq!(parse_markdown_with_options(&out, &options), doc);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Cross References
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_serialize_reference_node() {
        let doc = FormattedNode::document(vec![FormattedNode::paragraph(vec![
            text("see "),
            FormattedNode::reference(CrossReference::new("note:42", None).unwrap()),
        ])]);
        assert_eq!(serialize(&doc), "see [[42|42]]");
    }

    #[test]
    fn test_reference_round_trip_read_mode() {
        let options = MarkdownOptions::read();
        let doc = parse_markdown_with_options("go [[note:42]]", &options);
        let out = serialize_with_options(&doc, &options);
        assert_eq!(out, "go [[42|42]]");
        assert_eq!(parse_markdown_with_options(&out, &options), doc);
    }

    #[test]
    fn test_labelled_reference_reproduces_in_read_mode() {
        let options = MarkdownOptions::read();
        let doc = parse_markdown_with_options("[[42|See also]]", &options);
        let reference = CrossReference::new("42", Some("See also")).unwrap();
        assert_eq!(
            doc.children[0].children,
            vec![FormattedNode::reference(reference)]
        );
        assert_eq!(serialize_with_options(&doc, &options), "[[42|See also]]");
    }

    #[test]
    fn test_namespaced_target_round_trip_read_mode() {
        let options = MarkdownOptions::read();
        let doc = parse_markdown_with_options("[[note:ch:7|Chapter]]", &options);
        let out = serialize_with_options(&doc, &options);
        assert_eq!(out, "[[note:ch:7|Chapter]]");

        let reparsed = parse_markdown_with_options(&out, &options);
        assert_eq!(reparsed, doc);
        match &reparsed.children[0].children[0].kind {
            NodeKind::CrossReference(reference) => assert_eq!(reference.target, "ch:7"),
            other => panic!("expected a cross-reference, got {:?}", other),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Normalization
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_edge_whitespace_moves_outside_format() {
        let doc = FormattedNode::document(vec![FormattedNode::paragraph(vec![
            FormattedNode::formatted(InlineFormat::Bold, vec![text("hello ")]),
            text("world"),
        ])]);
        assert_eq!(serialize(&doc), "**hello** world");
    }

    #[test]
    fn test_serialize_inline_root() {
        let node = FormattedNode::formatted(InlineFormat::Italic, vec![text("x")]);
        assert_eq!(serialize(&node), "*x*");
    }
}
