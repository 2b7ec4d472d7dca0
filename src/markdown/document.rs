//! Formatted document model
//!
//! The rich document the user edits is a tree of [`FormattedNode`]s. Block
//! structure is line oriented: a `Document` holds paragraphs, headings and
//! lists, and every paragraph, heading or list item is exactly one *line* of
//! canonical markup. Inline nodes (text runs, formats, cross-references) are
//! the children of a line.
//!
//! Cursor and selection offsets address the *flattened text projection*:
//! the inline text of every line joined by `'\n'`, counted in `char`s, where a
//! cross-reference contributes its label.

use std::fmt;

use crate::markdown::reference::CrossReference;
use crate::string_utils::char_len;

// ─────────────────────────────────────────────────────────────────────────────
// Node Attributes
// ─────────────────────────────────────────────────────────────────────────────

/// Heading level (H1-H6)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeadingLevel {
    H1 = 1,
    H2 = 2,
    H3 = 3,
    H4 = 4,
    H5 = 5,
    H6 = 6,
}

impl From<u8> for HeadingLevel {
    fn from(level: u8) -> Self {
        match level {
            0 | 1 => HeadingLevel::H1,
            2 => HeadingLevel::H2,
            3 => HeadingLevel::H3,
            4 => HeadingLevel::H4,
            5 => HeadingLevel::H5,
            _ => HeadingLevel::H6,
        }
    }
}

impl HeadingLevel {
    /// Numeric level, 1-6.
    pub fn level(self) -> u8 {
        self as u8
    }

    /// Line prefix in canonical markup, e.g. `"## "`.
    pub fn prefix(self) -> String {
        format!("{} ", "#".repeat(self.level() as usize))
    }
}

/// List type (ordered or unordered)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListType {
    /// `-`, `*` or `+` bullets
    Bullet { marker: char },
    /// `1.` or `1)` numbering, counted up from `start`
    Ordered { start: u32, delimiter: char },
}

impl ListType {
    /// Marker of the item at `index` within the list.
    pub fn marker_for(&self, index: usize) -> ItemMarker {
        match *self {
            ListType::Bullet { marker } => ItemMarker::Bullet(marker),
            ListType::Ordered { start, delimiter } => ItemMarker::Ordered {
                number: start.saturating_add(index as u32),
                delimiter,
            },
        }
    }
}

/// Marker at the start of one list item line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemMarker {
    Bullet(char),
    Ordered { number: u32, delimiter: char },
}

impl ItemMarker {
    /// Line prefix in canonical markup, e.g. `"- "` or `"3. "`.
    pub fn prefix(&self) -> String {
        match self {
            ItemMarker::Bullet(marker) => format!("{} ", marker),
            ItemMarker::Ordered { number, delimiter } => format!("{}{} ", number, delimiter),
        }
    }

    /// List type for a list that starts with this marker.
    pub fn list_type(&self) -> ListType {
        match *self {
            ItemMarker::Bullet(marker) => ListType::Bullet { marker },
            ItemMarker::Ordered { number, delimiter } => ListType::Ordered {
                start: number,
                delimiter,
            },
        }
    }
}

/// Inline formatting marks with paired delimiters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InlineFormat {
    /// `**text**`
    Bold,
    /// `*text*`
    Italic,
    /// `~~text~~`
    Strikethrough,
    /// `<u>text</u>`
    Underline,
}

impl InlineFormat {
    /// All formats, ordered from outermost to innermost nesting.
    pub const ALL: [InlineFormat; 4] = [
        InlineFormat::Underline,
        InlineFormat::Strikethrough,
        InlineFormat::Bold,
        InlineFormat::Italic,
    ];

    /// Opening delimiter in canonical markup.
    pub fn open(self) -> &'static str {
        match self {
            InlineFormat::Bold => "**",
            InlineFormat::Italic => "*",
            InlineFormat::Strikethrough => "~~",
            InlineFormat::Underline => "<u>",
        }
    }

    /// Closing delimiter in canonical markup.
    pub fn close(self) -> &'static str {
        match self {
            InlineFormat::Underline => "</u>",
            other => other.open(),
        }
    }

    /// Whether the delimiters only bind next to non-whitespace.
    pub(crate) fn is_flanking(self) -> bool {
        !matches!(self, InlineFormat::Underline)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Node Kind
// ─────────────────────────────────────────────────────────────────────────────

/// Represents the type of a formatted node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// Root document node
    Document,
    /// One plain line
    Paragraph,
    /// One heading line
    Heading(HeadingLevel),
    /// Container of consecutive list item lines
    List(ListType),
    /// One list item line
    ListItem,
    /// Inline text run
    Text(String),
    Bold,
    Italic,
    Strikethrough,
    Underline,
    /// Inline cross-reference to another note
    CrossReference(CrossReference),
}

impl NodeKind {
    /// The inline format this node applies, if it is a formatting node.
    pub fn format(&self) -> Option<InlineFormat> {
        match self {
            NodeKind::Bold => Some(InlineFormat::Bold),
            NodeKind::Italic => Some(InlineFormat::Italic),
            NodeKind::Strikethrough => Some(InlineFormat::Strikethrough),
            NodeKind::Underline => Some(InlineFormat::Underline),
            _ => None,
        }
    }

    pub fn from_format(format: InlineFormat) -> Self {
        match format {
            InlineFormat::Bold => NodeKind::Bold,
            InlineFormat::Italic => NodeKind::Italic,
            InlineFormat::Strikethrough => NodeKind::Strikethrough,
            InlineFormat::Underline => NodeKind::Underline,
        }
    }

    /// Paragraphs, headings and list items each occupy one line.
    pub fn is_line(&self) -> bool {
        matches!(
            self,
            NodeKind::Paragraph | NodeKind::Heading(_) | NodeKind::ListItem
        )
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// FormattedNode
// ─────────────────────────────────────────────────────────────────────────────

/// A node in the editable rich-document tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedNode {
    /// The type of this node
    pub kind: NodeKind,
    /// Child nodes
    pub children: Vec<FormattedNode>,
}

impl FormattedNode {
    pub fn new(kind: NodeKind, children: Vec<FormattedNode>) -> Self {
        Self { kind, children }
    }

    pub fn document(blocks: Vec<FormattedNode>) -> Self {
        Self::new(NodeKind::Document, blocks)
    }

    pub fn paragraph(inlines: Vec<FormattedNode>) -> Self {
        Self::new(NodeKind::Paragraph, inlines)
    }

    pub fn heading(level: HeadingLevel, inlines: Vec<FormattedNode>) -> Self {
        Self::new(NodeKind::Heading(level), inlines)
    }

    pub fn list(list_type: ListType, items: Vec<FormattedNode>) -> Self {
        Self::new(NodeKind::List(list_type), items)
    }

    pub fn list_item(inlines: Vec<FormattedNode>) -> Self {
        Self::new(NodeKind::ListItem, inlines)
    }

    pub fn text(content: impl Into<String>) -> Self {
        Self::new(NodeKind::Text(content.into()), Vec::new())
    }

    pub fn formatted(format: InlineFormat, children: Vec<FormattedNode>) -> Self {
        Self::new(NodeKind::from_format(format), children)
    }

    pub fn reference(reference: CrossReference) -> Self {
        Self::new(NodeKind::CrossReference(reference), Vec::new())
    }

    /// Get the flattened text of this node and its descendants.
    ///
    /// Lines of a document or list are joined with `'\n'`.
    pub fn text_content(&self) -> String {
        let mut text = String::new();
        self.collect_text(&mut text);
        text
    }

    fn collect_text(&self, output: &mut String) {
        match &self.kind {
            NodeKind::Text(t) => output.push_str(t),
            NodeKind::CrossReference(r) => output.push_str(&r.label),
            NodeKind::Document | NodeKind::List(_) => {
                for (i, line) in self.lines().into_iter().enumerate() {
                    if i > 0 {
                        output.push('\n');
                    }
                    line.collect_text(output);
                }
            }
            _ => {
                for child in &self.children {
                    child.collect_text(output);
                }
            }
        }
    }

    /// Length of the flattened text in chars.
    pub fn char_len(&self) -> usize {
        match &self.kind {
            NodeKind::Text(t) => char_len(t),
            NodeKind::CrossReference(r) => char_len(&r.label),
            NodeKind::Document | NodeKind::List(_) => {
                let lines = self.lines();
                let separators = lines.len().saturating_sub(1);
                lines.iter().map(|l| l.char_len()).sum::<usize>() + separators
            }
            _ => self.children.iter().map(|c| c.char_len()).sum(),
        }
    }

    /// Line nodes (paragraphs, headings, list items) in document order.
    pub fn lines(&self) -> Vec<&FormattedNode> {
        let mut lines = Vec::new();
        for child in &self.children {
            match &child.kind {
                kind if kind.is_line() => lines.push(child),
                NodeKind::List(_) => lines.extend(child.children.iter()),
                _ => {}
            }
        }
        lines
    }

    /// Addresses of every line, in document order.
    pub fn line_paths(&self) -> Vec<LinePath> {
        let mut paths = Vec::new();
        for (block, child) in self.children.iter().enumerate() {
            match &child.kind {
                kind if kind.is_line() => paths.push(LinePath::Block(block)),
                NodeKind::List(_) => {
                    paths.extend((0..child.children.len()).map(|item| LinePath::Item { block, item }))
                }
                _ => {}
            }
        }
        paths
    }

    pub fn line(&self, path: LinePath) -> Option<&FormattedNode> {
        match path {
            LinePath::Block(block) => self.children.get(block),
            LinePath::Item { block, item } => self.children.get(block)?.children.get(item),
        }
    }

    pub fn line_mut(&mut self, path: LinePath) -> Option<&mut FormattedNode> {
        match path {
            LinePath::Block(block) => self.children.get_mut(block),
            LinePath::Item { block, item } => self.children.get_mut(block)?.children.get_mut(item),
        }
    }

    /// Find the line containing a flattened-text offset.
    ///
    /// An offset equal to a line's length addresses the end of that line;
    /// the following offset is the start of the next line.
    pub fn locate(&self, offset: usize) -> Option<LineLocation> {
        let mut line_start = 0;
        for path in self.line_paths() {
            let line_len = self.line(path).map(|l| l.char_len()).unwrap_or(0);
            if offset <= line_start + line_len {
                return Some(LineLocation {
                    path,
                    line_start,
                    column: offset.saturating_sub(line_start),
                    line_len,
                });
            }
            line_start += line_len + 1;
        }
        None
    }

    /// Copy of this tree with adjacent text runs merged, empty runs dropped,
    /// adjacent delimiter formats of the same kind merged, and whitespace at
    /// the edges of flanking formats moved outside the format.
    pub fn normalized(&self) -> FormattedNode {
        let children = if self.kind.is_line() || self.kind.format().is_some() {
            normalize_inlines(&self.children)
        } else {
            self.children.iter().map(|c| c.normalized()).collect()
        };
        FormattedNode::new(self.kind.clone(), children)
    }
}

/// Normalize a sequence of inline nodes (see [`FormattedNode::normalized`]).
pub(crate) fn normalize_inlines(nodes: &[FormattedNode]) -> Vec<FormattedNode> {
    let mut out: Vec<FormattedNode> = Vec::new();
    for node in nodes {
        for piece in hoist_edge_whitespace(node.normalized()) {
            push_merged(&mut out, piece);
        }
    }
    out
}

fn push_merged(out: &mut Vec<FormattedNode>, node: FormattedNode) {
    match &node.kind {
        NodeKind::Text(t) if t.is_empty() => return,
        kind if kind.format().is_some() && node.children.is_empty() => return,
        _ => {}
    }

    if let Some(last) = out.last_mut() {
        if let (NodeKind::Text(a), NodeKind::Text(b)) = (&mut last.kind, &node.kind) {
            a.push_str(b);
            return;
        }
        let mergeable = last
            .kind
            .format()
            .is_some_and(|f| f.is_flanking() && last.kind == node.kind);
        if mergeable {
            let merged: Vec<FormattedNode> = last.children.drain(..).chain(node.children).collect();
            last.children = normalize_inlines(&merged);
            return;
        }
    }
    out.push(node);
}

/// `**a **` cannot be written as markup, so the space leaves the format.
fn hoist_edge_whitespace(mut node: FormattedNode) -> Vec<FormattedNode> {
    if !node.kind.format().is_some_and(|f| f.is_flanking()) {
        return vec![node];
    }

    let mut leading = String::new();
    if let Some(NodeKind::Text(t)) = node.children.first_mut().map(|c| &mut c.kind) {
        let trimmed = t.trim_start().len();
        leading = t[..t.len() - trimmed].to_string();
        t.drain(..t.len() - trimmed);
    }
    let mut trailing = String::new();
    if let Some(NodeKind::Text(t)) = node.children.last_mut().map(|c| &mut c.kind) {
        let keep = t.trim_end().len();
        trailing = t[keep..].to_string();
        t.truncate(keep);
    }
    node.children
        .retain(|c| !matches!(&c.kind, NodeKind::Text(t) if t.is_empty()));

    let mut pieces = Vec::with_capacity(3);
    if !leading.is_empty() {
        pieces.push(FormattedNode::text(leading));
    }
    pieces.push(node);
    if !trailing.is_empty() {
        pieces.push(FormattedNode::text(trailing));
    }
    pieces
}

/// Chain of inline nodes covering the char at `column`, outermost first,
/// each paired with its start column within the line.
pub fn inline_chain_at(inlines: &[FormattedNode], column: usize) -> Vec<(&FormattedNode, usize)> {
    let mut chain = Vec::new();
    let mut nodes = inlines;
    let mut start = 0;
    'descend: loop {
        for node in nodes {
            let len = node.char_len();
            if column >= start && column < start + len {
                chain.push((node, start));
                if node.kind.format().is_some() {
                    nodes = &node.children;
                    continue 'descend;
                }
                break 'descend;
            }
            start += len;
        }
        break;
    }
    chain
}

impl fmt::Display for FormattedNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn write_node(node: &FormattedNode, depth: usize, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            let indent = "  ".repeat(depth);
            match &node.kind {
                NodeKind::Text(t) => writeln!(f, "{}Text {:?}", indent, t)?,
                NodeKind::CrossReference(r) => writeln!(
                    f,
                    "{}CrossReference target={:?} label={:?}",
                    indent, r.target, r.label
                )?,
                NodeKind::Heading(level) => writeln!(f, "{}Heading({})", indent, level.level())?,
                NodeKind::List(list_type) => writeln!(f, "{}List({:?})", indent, list_type)?,
                other => writeln!(f, "{}{:?}", indent, other)?,
            }
            for child in &node.children {
                write_node(child, depth + 1, f)?;
            }
            Ok(())
        }
        write_node(self, 0, f)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Selection & Line Addressing
// ─────────────────────────────────────────────────────────────────────────────

/// Cursor or selection in the flattened text projection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Selection {
    /// Offset of the selection start (chars)
    pub index: usize,
    /// Selected length (chars); 0 for a plain caret
    pub length: usize,
}

impl Selection {
    pub fn new(index: usize, length: usize) -> Self {
        Self { index, length }
    }

    pub fn caret(index: usize) -> Self {
        Self { index, length: 0 }
    }

    pub fn end(&self) -> usize {
        self.index + self.length
    }

    pub fn is_caret(&self) -> bool {
        self.length == 0
    }
}

/// Address of one line within a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinePath {
    /// Paragraph or heading at `children[block]`
    Block(usize),
    /// Item `item` of the list at `children[block]`
    Item { block: usize, item: usize },
}

/// Result of [`FormattedNode::locate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineLocation {
    pub path: LinePath,
    /// Flattened offset of the line's first char
    pub line_start: usize,
    /// Offset within the line
    pub column: usize,
    /// Line length in chars
    pub line_len: usize,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
