//! Reverse conversion
//!
//! Double-clicking formatted text on the rich surface turns the formatting
//! back into literal markup so the user can edit the delimiters directly:
//! bold `hello` becomes the plain text `**hello**` with `hello` selected.
//! Headings turn back into a paragraph that starts with its `#` prefix.
//!
//! Conversion is idempotent: a second double-click on text that already
//! shows its delimiters changes nothing.

use log::debug;

use crate::markdown::ast_ops::{line_runs, set_line_kind, store_line_runs, MarkupKind, TreeEdit};
use crate::markdown::document::{
    inline_chain_at, FormattedNode, HeadingLevel, InlineFormat, LineLocation, NodeKind, Selection,
};
use crate::markdown::runs::Marks;
use crate::string_utils::{char_len, char_slice, char_to_byte};

/// Convert the formatting under the caret back into literal markup.
///
/// The innermost inline format containing the caret wins; with none, a
/// heading line reverts to a paragraph. Cross-references are left alone.
pub fn apply_reverse_markdown(root: &mut FormattedNode, selection: Selection) -> TreeEdit {
    let Some(location) = root.locate(selection.index) else {
        return TreeEdit::no_op(selection);
    };
    let Some(line) = root.line(location.path) else {
        return TreeEdit::no_op(selection);
    };

    // At the end of a line the caret belongs to the char before it
    let anchor = if location.column == location.line_len && location.column > 0 {
        location.column - 1
    } else {
        location.column
    };

    let chain = inline_chain_at(&line.children, anchor);
    let mut innermost: Option<(InlineFormat, usize, usize)> = None;
    let mut outer_marks = Marks::NONE;
    for (node, start) in &chain {
        if let Some(format) = node.kind.format() {
            if let Some((previous, _, _)) = innermost {
                outer_marks = outer_marks.with(previous);
            }
            innermost = Some((format, *start, node.char_len()));
        }
    }
    let heading = match line.kind {
        NodeKind::Heading(level) => Some(level),
        _ => None,
    };

    // Literal markup a previous conversion produced around the caret; checked
    // within the innermost format, or the whole line when there is none
    let (context_start, context_len) = innermost
        .map(|(_, start, len)| (start, len))
        .unwrap_or((0, location.line_len));
    let text = line.text_content();
    let context = char_slice(&text, context_start, context_start + context_len);
    if encloses_literal_pair(context, anchor.saturating_sub(context_start)) {
        debug!("Caret inside literal delimiters, skipping reverse conversion");
        return TreeEdit::no_op(selection);
    }

    if let Some((format, start, len)) = innermost {
        return reverse_inline(root, location, format, start, len, outer_marks, selection);
    }
    if let Some(level) = heading {
        return reverse_heading(root, location, level, selection);
    }
    TreeEdit::no_op(selection)
}

fn reverse_inline(
    root: &mut FormattedNode,
    location: LineLocation,
    format: InlineFormat,
    start: usize,
    len: usize,
    outer_marks: Marks,
    selection: Selection,
) -> TreeEdit {
    let Some(mut runs) = line_runs(root, location.path) else {
        return TreeEdit::no_op(selection);
    };
    let text = runs.text();
    let end = start + len;
    let run_text = char_slice(&text, start, end);
    let (open, close) = (format.open(), format.close());

    if run_text.len() >= open.len() + close.len()
        && run_text.starts_with(open)
        && run_text.ends_with(close)
    {
        debug!("Delimiters already literal, skipping reverse conversion");
        return TreeEdit::no_op(selection);
    }

    runs.set_format(start, end, format, false);
    runs.insert_text(end, close, outer_marks);
    runs.insert_text(start, open, outer_marks);
    store_line_runs(root, location.path, &runs);

    let open_len = char_len(open);
    debug!("Reverse-converted {:?} at {}", format, location.line_start + start);
    TreeEdit::success(
        Selection::new(location.line_start + start + open_len, len),
        MarkupKind::Inline(format),
    )
}

/// Whether the char at `anchor` lies inside a literal `open..close` pair of
/// some format, as reverse conversion writes it: the content between the
/// delimiters is non-empty and does not start or end with whitespace.
fn encloses_literal_pair(text: &str, anchor: usize) -> bool {
    let anchor = char_to_byte(text, anchor);
    InlineFormat::ALL.iter().any(|format| {
        let (open, close) = (format.open(), format.close());
        text.match_indices(open)
            .map(|(at, _)| at + open.len())
            .filter(|&content_start| content_start <= anchor)
            .any(|content_start| {
                text[content_start..]
                    .match_indices(close)
                    .map(|(at, _)| content_start + at)
                    .filter(|&content_end| content_end >= anchor)
                    .any(|content_end| {
                        let content = &text[content_start..content_end];
                        !content.is_empty()
                            && !content.starts_with(char::is_whitespace)
                            && !content.ends_with(char::is_whitespace)
                    })
            })
    })
}

fn reverse_heading(
    root: &mut FormattedNode,
    location: LineLocation,
    level: HeadingLevel,
    selection: Selection,
) -> TreeEdit {
    let Some(mut runs) = line_runs(root, location.path) else {
        return TreeEdit::no_op(selection);
    };
    let prefix = level.prefix();
    if runs.text().starts_with(&prefix) {
        return TreeEdit::no_op(selection);
    }

    runs.insert_text(0, &prefix, Marks::NONE);
    store_line_runs(root, location.path, &runs);
    set_line_kind(root, location.path, NodeKind::Paragraph);

    debug!("Reverse-converted heading level {}", level.level());
    TreeEdit::success(
        Selection::caret(selection.index + char_len(&prefix)),
        MarkupKind::Heading(level),
    )
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
