//! Tree operations for the rich editing surface
//!
//! This module provides the structural edits the editing surface performs on
//! a [`FormattedNode`] document: inserting typed text, splitting a line at
//! the caret, and reading or replacing one line's inline content.
//!
//! # Design
//! Operations address the document by flattened offsets and return the new
//! selection, or a [`TreeEdit`] describing whether anything changed.

use crate::markdown::document::{
    FormattedNode, HeadingLevel, InlineFormat, LinePath, NodeKind, Selection,
};
use crate::markdown::runs::{InlineRuns, Marks};
use crate::string_utils::char_len;

// ─────────────────────────────────────────────────────────────────────────────
// Tree Edit Result
// ─────────────────────────────────────────────────────────────────────────────

/// Markup construct produced or removed by an edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkupKind {
    Heading(HeadingLevel),
    Inline(InlineFormat),
}

/// Represents an edit applied to the document tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEdit {
    /// Whether the edit was performed
    pub performed: bool,
    /// The selection after the edit
    pub selection: Selection,
    /// Which construct the edit concerned
    pub kind: Option<MarkupKind>,
}

impl TreeEdit {
    /// Create a no-op edit that leaves the selection where it was
    pub fn no_op(selection: Selection) -> Self {
        Self {
            performed: false,
            selection,
            kind: None,
        }
    }

    /// Create a successful edit
    pub fn success(selection: Selection, kind: MarkupKind) -> Self {
        Self {
            performed: true,
            selection,
            kind: Some(kind),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Line Access
// ─────────────────────────────────────────────────────────────────────────────

/// Flatten one line's inline content.
pub fn line_runs(root: &FormattedNode, path: LinePath) -> Option<InlineRuns> {
    root.line(path).map(|line| InlineRuns::from_nodes(&line.children))
}

/// Replace one line's inline content with rebuilt runs.
pub fn store_line_runs(root: &mut FormattedNode, path: LinePath, runs: &InlineRuns) -> bool {
    match root.line_mut(path) {
        Some(line) => {
            line.children = runs.to_nodes();
            true
        }
        None => false,
    }
}

/// Change a top-level line between paragraph and heading.
///
/// List items keep their role.
pub fn set_line_kind(root: &mut FormattedNode, path: LinePath, kind: NodeKind) -> bool {
    if !matches!(kind, NodeKind::Paragraph | NodeKind::Heading(_)) {
        return false;
    }
    match (path, root.line_mut(path)) {
        (LinePath::Block(_), Some(line)) if line.kind.is_line() => {
            line.kind = kind;
            true
        }
        _ => false,
    }
}

/// A document always has at least one line to place the caret on.
pub fn ensure_line(root: &mut FormattedNode) {
    if root.kind == NodeKind::Document && root.line_paths().is_empty() {
        root.children.push(FormattedNode::paragraph(Vec::new()));
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Text Editing
// ─────────────────────────────────────────────────────────────────────────────

/// Insert typed text at the selection, replacing any selected text on the
/// same line. A `'\n'` splits the line.
///
/// Inserted text inherits the formatting of the char before the caret.
/// Returns the caret after the inserted text.
pub fn insert_text(root: &mut FormattedNode, selection: Selection, text: &str) -> Selection {
    insert_text_with_marks(root, selection, text, None)
}

/// Like [`insert_text`], but `marks` (when given) replaces the inherited
/// formatting.
pub fn insert_text_with_marks(
    root: &mut FormattedNode,
    selection: Selection,
    text: &str,
    marks: Option<Marks>,
) -> Selection {
    ensure_line(root);
    let mut caret = delete_selection(root, selection).index;

    for (i, piece) in text.split('\n').enumerate() {
        if i > 0 {
            match split_line(root, caret) {
                Some(next) => caret = next,
                None => break,
            }
        }
        if piece.is_empty() {
            continue;
        }
        let Some(location) = root.locate(caret) else {
            break;
        };
        let Some(mut runs) = line_runs(root, location.path) else {
            break;
        };
        let inherited = runs.marks_at(location.column);
        runs.insert_text(location.column, piece, marks.unwrap_or(inherited));
        store_line_runs(root, location.path, &runs);
        caret += char_len(piece);
    }

    Selection::caret(caret)
}

/// Formatting that text typed at `offset` would inherit.
pub fn marks_at(root: &FormattedNode, offset: usize) -> Marks {
    root.locate(offset)
        .and_then(|location| {
            line_runs(root, location.path).map(|runs| runs.marks_at(location.column))
        })
        .unwrap_or(Marks::NONE)
}

/// Delete the selected text. Only the part on the selection's first line is
/// removed.
pub fn delete_selection(root: &mut FormattedNode, selection: Selection) -> Selection {
    if selection.is_caret() {
        return selection;
    }
    let Some(location) = root.locate(selection.index) else {
        return Selection::caret(selection.index);
    };
    if let Some(mut runs) = line_runs(root, location.path) {
        let end = (location.column + selection.length).min(location.line_len);
        runs.delete(location.column, end);
        store_line_runs(root, location.path, &runs);
    }
    Selection::caret(selection.index)
}

/// Split the line containing `offset` in two.
///
/// A heading split at its end continues as a paragraph; otherwise the new
/// line keeps the original's role. Returns the caret at the start of the new
/// line.
pub fn split_line(root: &mut FormattedNode, offset: usize) -> Option<usize> {
    let location = root.locate(offset)?;
    let mut runs = line_runs(root, location.path)?;
    let tail = runs.split_off(location.column);
    store_line_runs(root, location.path, &runs);

    match location.path {
        LinePath::Block(block) => {
            let kind = match &root.children[block].kind {
                NodeKind::Heading(_) if tail.is_empty() => NodeKind::Paragraph,
                other => other.clone(),
            };
            root.children
                .insert(block + 1, FormattedNode::new(kind, tail.to_nodes()));
        }
        LinePath::Item { block, item } => {
            root.children[block]
                .children
                .insert(item + 1, FormattedNode::list_item(tail.to_nodes()));
        }
    }

    Some(offset + 1)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markdown::document::ListType;
    use crate::markdown::parser::parse_markdown;
    use crate::markdown::serializer::serialize;

    #[test]
    fn test_tree_edit_constructors() {
        let edit = TreeEdit::no_op(Selection::caret(3));
        assert!(!edit.performed);
        assert_eq!(edit.kind, None);

        let edit = TreeEdit::success(
            Selection::caret(1),
            MarkupKind::Inline(InlineFormat::Bold),
        );
        assert!(edit.performed);
        assert_eq!(edit.kind, Some(MarkupKind::Inline(InlineFormat::Bold)));
    }

    #[test]
    fn test_insert_text_in_plain_line() {
        let mut doc = parse_markdown("held");
        let sel = insert_text(&mut doc, Selection::caret(3), "l");
        assert_eq!(sel, Selection::caret(4));
        assert_eq!(serialize(&doc), "helld");
    }

    #[test]
    fn test_insert_text_inherits_format() {
        let mut doc = parse_markdown("**bol** x");
        insert_text(&mut doc, Selection::caret(3), "d");
        assert_eq!(serialize(&doc), "**bold** x");
    }

    #[test]
    fn test_edit_coalesces_adjacent_underlines() {
        let mut doc = parse_markdown("<u>a</u><u>b</u>");
        assert_eq!(serialize(&doc), "<u>a</u><u>b</u>");
        insert_text(&mut doc, Selection::caret(2), "c");
        assert_eq!(serialize(&doc), "<u>abc</u>");
    }

    #[test]
    fn test_insert_into_empty_document() {
        let mut doc = FormattedNode::document(Vec::new());
        let sel = insert_text(&mut doc, Selection::caret(0), "hi");
        assert_eq!(sel, Selection::caret(2));
        assert_eq!(serialize(&doc), "hi");
    }

    #[test]
    fn test_insert_newline_splits_line() {
        let mut doc = parse_markdown("hello world");
        let sel = insert_text(&mut doc, Selection::caret(5), "\n");
        assert_eq!(sel, Selection::caret(6));
        assert_eq!(serialize(&doc), "hello\n world");
    }

    #[test]
    fn test_split_heading_at_end_starts_paragraph() {
        let mut doc = parse_markdown("# Title");
        insert_text(&mut doc, Selection::caret(5), "\nbody");
        assert_eq!(serialize(&doc), "# Title\nbody");
    }

    #[test]
    fn test_split_list_item() {
        let mut doc = parse_markdown("1. ab");
        insert_text(&mut doc, Selection::caret(1), "\n");
        assert_eq!(serialize(&doc), "1. a\n2. b");
        assert!(matches!(
            doc.children[0].kind,
            NodeKind::List(ListType::Ordered { start: 1, .. })
        ));
    }

    #[test]
    fn test_insert_replaces_selection() {
        let mut doc = parse_markdown("hello world");
        let sel = insert_text(&mut doc, Selection::new(6, 5), "there");
        assert_eq!(sel, Selection::caret(11));
        assert_eq!(serialize(&doc), "hello there");
    }

    #[test]
    fn test_insert_with_explicit_marks() {
        let mut doc = parse_markdown("**bold**");
        assert!(marks_at(&doc, 4).contains(InlineFormat::Bold));
        insert_text_with_marks(&mut doc, Selection::caret(4), "x", Some(Marks::NONE));
        assert_eq!(serialize(&doc), "**bold**x");
    }

    #[test]
    fn test_set_line_kind() {
        let mut doc = parse_markdown("text\n- item");
        assert!(set_line_kind(
            &mut doc,
            LinePath::Block(0),
            NodeKind::Heading(HeadingLevel::H2)
        ));
        assert!(!set_line_kind(
            &mut doc,
            LinePath::Item { block: 1, item: 0 },
            NodeKind::Paragraph
        ));
        assert_eq!(serialize(&doc), "## text\n- item");
    }
}
