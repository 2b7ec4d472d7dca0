//! Flat inline runs
//!
//! Editing a line's nested inline tree directly is awkward: a selection can
//! start inside one format and end inside another. [`InlineRuns`] flattens a
//! line into segments that each carry a set of [`Marks`], performs the edit on
//! char offsets, and rebuilds a nested tree afterwards.

use crate::markdown::document::{FormattedNode, InlineFormat, NodeKind};
use crate::markdown::reference::CrossReference;
use crate::string_utils::{char_len, split_at_char};

/// Set of inline formats applied to a segment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Marks(u8);

impl Marks {
    pub const NONE: Marks = Marks(0);

    fn bit(format: InlineFormat) -> u8 {
        match format {
            InlineFormat::Bold => 0b0001,
            InlineFormat::Italic => 0b0010,
            InlineFormat::Strikethrough => 0b0100,
            InlineFormat::Underline => 0b1000,
        }
    }

    pub fn contains(self, format: InlineFormat) -> bool {
        self.0 & Self::bit(format) != 0
    }

    pub fn with(self, format: InlineFormat) -> Self {
        Marks(self.0 | Self::bit(format))
    }

    pub fn without(self, format: InlineFormat) -> Self {
        Marks(self.0 & !Self::bit(format))
    }

    /// Marks in `self` that are not in `other`.
    pub fn difference(self, other: Marks) -> Self {
        Marks(self.0 & !other.0)
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Formats in outermost-first nesting order.
    pub fn formats(self) -> impl Iterator<Item = InlineFormat> {
        InlineFormat::ALL
            .into_iter()
            .filter(move |format| self.contains(*format))
    }
}

impl FromIterator<InlineFormat> for Marks {
    fn from_iter<I: IntoIterator<Item = InlineFormat>>(iter: I) -> Self {
        iter.into_iter().fold(Marks::NONE, Marks::with)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Text { text: String, marks: Marks },
    Reference { reference: CrossReference, marks: Marks },
}

impl Segment {
    fn marks(&self) -> Marks {
        match self {
            Segment::Text { marks, .. } | Segment::Reference { marks, .. } => *marks,
        }
    }

    fn marks_mut(&mut self) -> &mut Marks {
        match self {
            Segment::Text { marks, .. } | Segment::Reference { marks, .. } => marks,
        }
    }

    fn len(&self) -> usize {
        match self {
            Segment::Text { text, .. } => char_len(text),
            Segment::Reference { reference, .. } => char_len(&reference.label),
        }
    }

    fn to_leaf(&self) -> FormattedNode {
        match self {
            Segment::Text { text, .. } => FormattedNode::text(text.clone()),
            Segment::Reference { reference, .. } => FormattedNode::reference(reference.clone()),
        }
    }
}

/// One line's inline content as a flat list of marked segments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InlineRuns {
    segments: Vec<Segment>,
}

impl InlineRuns {
    /// Flatten a line's inline children.
    pub fn from_nodes(nodes: &[FormattedNode]) -> Self {
        let mut runs = Self::default();
        runs.collect(nodes, Marks::NONE);
        runs.normalize();
        runs
    }

    fn collect(&mut self, nodes: &[FormattedNode], marks: Marks) {
        for node in nodes {
            match &node.kind {
                NodeKind::Text(text) => self.segments.push(Segment::Text {
                    text: text.clone(),
                    marks,
                }),
                NodeKind::CrossReference(reference) => self.segments.push(Segment::Reference {
                    reference: reference.clone(),
                    marks,
                }),
                kind => {
                    let inner = kind.format().map_or(marks, |f| marks.with(f));
                    self.collect(&node.children, inner);
                }
            }
        }
    }

    /// Length in chars.
    pub fn len(&self) -> usize {
        self.segments.iter().map(Segment::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flattened text, references contributing their label.
    pub fn text(&self) -> String {
        self.segments
            .iter()
            .map(|segment| match segment {
                Segment::Text { text, .. } => text.as_str(),
                Segment::Reference { reference, .. } => reference.label.as_str(),
            })
            .collect()
    }

    /// Marks that text typed at `offset` inherits: those of the preceding
    /// char, or of the first char at the start of the line.
    pub fn marks_at(&self, offset: usize) -> Marks {
        let anchor = offset.saturating_sub(1);
        let mut start = 0;
        for segment in &self.segments {
            let len = segment.len();
            if anchor < start + len {
                return segment.marks();
            }
            start += len;
        }
        Marks::NONE
    }

    /// Whether any cross-reference overlaps `[start, end)`.
    pub fn has_reference_in(&self, start: usize, end: usize) -> bool {
        let mut pos = 0;
        for segment in &self.segments {
            let len = segment.len();
            if matches!(segment, Segment::Reference { .. }) && pos < end && start < pos + len {
                return true;
            }
            pos += len;
        }
        false
    }

    /// Split segments so one boundary falls at `offset`; returns the index of
    /// the first segment at or after it. An offset inside a reference snaps
    /// to the reference's end.
    fn split_at(&mut self, offset: usize) -> usize {
        let mut pos = 0;
        for i in 0..self.segments.len() {
            if pos == offset {
                return i;
            }
            let len = self.segments[i].len();
            if offset < pos + len {
                let tail = match &mut self.segments[i] {
                    Segment::Text { text, marks } => {
                        let (head, rest) = split_at_char(text, offset - pos);
                        let tail = Segment::Text {
                            text: rest.to_string(),
                            marks: *marks,
                        };
                        *text = head.to_string();
                        tail
                    }
                    Segment::Reference { .. } => return i + 1,
                };
                self.segments.insert(i + 1, tail);
                return i + 1;
            }
            pos += len;
        }
        self.segments.len()
    }

    /// Insert `text` carrying `marks` at `offset`.
    pub fn insert_text(&mut self, offset: usize, text: &str, marks: Marks) {
        if text.is_empty() {
            return;
        }
        let i = self.split_at(offset);
        self.segments.insert(
            i,
            Segment::Text {
                text: text.to_string(),
                marks,
            },
        );
        self.normalize();
    }

    /// Remove `[start, end)`.
    pub fn delete(&mut self, start: usize, end: usize) {
        if start >= end {
            return;
        }
        let i = self.split_at(start);
        let j = self.split_at(end);
        self.segments.drain(i..j);
        self.normalize();
    }

    /// Add or remove `format` on `[start, end)`.
    pub fn set_format(&mut self, start: usize, end: usize, format: InlineFormat, on: bool) {
        if start >= end {
            return;
        }
        let i = self.split_at(start);
        let j = self.split_at(end);
        for segment in &mut self.segments[i..j] {
            let marks = segment.marks_mut();
            *marks = if on {
                marks.with(format)
            } else {
                marks.without(format)
            };
        }
        self.normalize();
    }

    /// Split off everything from `offset` onward.
    pub fn split_off(&mut self, offset: usize) -> InlineRuns {
        let i = self.split_at(offset);
        let mut tail = InlineRuns {
            segments: self.segments.split_off(i),
        };
        self.normalize();
        tail.normalize();
        tail
    }

    fn normalize(&mut self) {
        let mut merged: Vec<Segment> = Vec::with_capacity(self.segments.len());
        for segment in self.segments.drain(..) {
            if let Segment::Text { text, .. } = &segment {
                if text.is_empty() {
                    continue;
                }
            }
            if let (
                Some(Segment::Text { text: last, marks: last_marks }),
                Segment::Text { text, marks },
            ) = (merged.last_mut(), &segment)
            {
                if last_marks == marks {
                    last.push_str(text);
                    continue;
                }
            }
            merged.push(segment);
        }
        self.segments = merged;
    }

    /// Rebuild nested inline nodes.
    ///
    /// At each point the format whose span reaches furthest becomes the
    /// outer node; ties follow [`InlineFormat::ALL`] order.
    pub fn to_nodes(&self) -> Vec<FormattedNode> {
        build_nodes(&self.segments, Marks::NONE)
    }
}

fn build_nodes(segments: &[Segment], open: Marks) -> Vec<FormattedNode> {
    let mut nodes = Vec::new();
    let mut i = 0;
    while i < segments.len() {
        let pending = segments[i].marks().difference(open);

        let mut outer: Option<(InlineFormat, usize)> = None;
        for format in pending.formats() {
            let end = run_end(segments, i, format);
            if outer.map_or(true, |(_, best)| end > best) {
                outer = Some((format, end));
            }
        }

        match outer {
            Some((format, end)) => {
                let children = build_nodes(&segments[i..end], open.with(format));
                nodes.push(FormattedNode::formatted(format, children));
                i = end;
            }
            None => {
                nodes.push(segments[i].to_leaf());
                i += 1;
            }
        }
    }
    nodes
}

fn run_end(segments: &[Segment], from: usize, format: InlineFormat) -> usize {
    let mut end = from;
    while end < segments.len() && segments[end].marks().contains(format) {
        end += 1;
    }
    end
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn bold(children: Vec<FormattedNode>) -> FormattedNode {
        FormattedNode::formatted(InlineFormat::Bold, children)
    }

    fn italic(children: Vec<FormattedNode>) -> FormattedNode {
        FormattedNode::formatted(InlineFormat::Italic, children)
    }

    fn text(s: &str) -> FormattedNode {
        FormattedNode::text(s)
    }

    #[test]
    fn test_marks_set_operations() {
        let marks = Marks::NONE.with(InlineFormat::Bold).with(InlineFormat::Underline);
        assert!(marks.contains(InlineFormat::Bold));
        assert!(!marks.contains(InlineFormat::Italic));
        assert_eq!(
            marks.formats().collect::<Vec<_>>(),
            vec![InlineFormat::Underline, InlineFormat::Bold]
        );
        assert!(marks.without(InlineFormat::Bold).without(InlineFormat::Underline).is_empty());
    }

    #[test]
    fn test_flatten_and_rebuild_nested() {
        let nodes = vec![
            text("a "),
            bold(vec![text("b "), italic(vec![text("c")])]),
        ];
        let runs = InlineRuns::from_nodes(&nodes);
        assert_eq!(runs.text(), "a b c");
        assert_eq!(runs.len(), 5);
        assert_eq!(runs.to_nodes(), nodes);
    }

    #[test]
    fn test_set_format_splits_text() {
        let mut runs = InlineRuns::from_nodes(&[text("hello world")]);
        runs.set_format(6, 11, InlineFormat::Bold, true);
        assert_eq!(runs.to_nodes(), vec![text("hello "), bold(vec![text("world")])]);

        runs.set_format(6, 11, InlineFormat::Bold, false);
        assert_eq!(runs.to_nodes(), vec![text("hello world")]);
    }

    #[test]
    fn test_longest_span_becomes_outer() {
        let mut runs = InlineRuns::from_nodes(&[text("abc")]);
        runs.set_format(0, 3, InlineFormat::Italic, true);
        runs.set_format(1, 2, InlineFormat::Bold, true);
        assert_eq!(
            runs.to_nodes(),
            vec![italic(vec![text("a"), bold(vec![text("b")]), text("c")])]
        );
    }

    #[test]
    fn test_insert_and_delete() {
        let mut runs = InlineRuns::from_nodes(&[text("held")]);
        runs.insert_text(3, "l", Marks::NONE);
        runs.insert_text(5, "o", Marks::NONE);
        assert_eq!(runs.text(), "hellod");
        runs.delete(5, 6);
        assert_eq!(runs.text(), "hello");
        assert_eq!(runs.to_nodes(), vec![text("hello")]);
    }

    #[test]
    fn test_marks_at_inherits_previous_char() {
        let runs = InlineRuns::from_nodes(&[bold(vec![text("ab")]), text("cd")]);
        assert!(runs.marks_at(0).contains(InlineFormat::Bold));
        assert!(runs.marks_at(2).contains(InlineFormat::Bold));
        assert!(runs.marks_at(3).is_empty());
        assert!(runs.marks_at(99).is_empty());
    }

    #[test]
    fn test_reference_is_atomic() {
        let reference = CrossReference::new("42", Some("note")).unwrap();
        let mut runs = InlineRuns::from_nodes(&[
            text("a"),
            FormattedNode::reference(reference.clone()),
            text("b"),
        ]);
        assert_eq!(runs.text(), "anoteb");
        assert!(runs.has_reference_in(2, 3));
        assert!(!runs.has_reference_in(0, 1));

        // Splitting inside the label snaps to its end
        let tail = runs.split_off(3);
        assert_eq!(tail.text(), "b");
        assert_eq!(
            runs.to_nodes(),
            vec![text("a"), FormattedNode::reference(reference)]
        );
    }

    #[test]
    fn test_adjacent_underlines_coalesce() {
        let underline = |s: &str| FormattedNode::formatted(InlineFormat::Underline, vec![text(s)]);
        let runs = InlineRuns::from_nodes(&[underline("a"), underline("b")]);
        assert_eq!(runs.to_nodes(), vec![underline("ab")]);
    }

    #[test]
    fn test_split_off_keeps_marks() {
        let mut runs = InlineRuns::from_nodes(&[bold(vec![text("abcd")])]);
        let tail = runs.split_off(2);
        assert_eq!(runs.to_nodes(), vec![bold(vec![text("ab")])]);
        assert_eq!(tail.to_nodes(), vec![bold(vec![text("cd")])]);
    }
}
