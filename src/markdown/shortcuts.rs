//! Live shortcuts
//!
//! While the user types on the rich surface, markup typed literally is
//! converted into formatting as soon as it is complete:
//!
//! | Typed            | Result                      |
//! |------------------|-----------------------------|
//! | `# ` at line start  | line becomes a level-1 heading |
//! | `## ` at line start | line becomes a level-2 heading |
//! | `**text** `      | **text** in bold            |
//! | `*text* `        | *text* in italic            |
//! | `~~text~~ `      | text struck through         |
//! | `<u>text</u> `   | text underlined             |
//!
//! The trailing space is the trigger and is consumed along with the
//! delimiters. Only the text immediately before the caret on the current line
//! is inspected, so earlier text is never rescanned.

use std::sync::OnceLock;

use log::debug;
use regex::Regex;

use crate::markdown::ast_ops::{line_runs, set_line_kind, store_line_runs, MarkupKind, TreeEdit};
use crate::markdown::document::{FormattedNode, HeadingLevel, InlineFormat, LinePath, NodeKind, Selection};
use crate::string_utils::{byte_to_char, char_len, char_slice, char_to_byte};

/// Default number of chars before the caret that inline patterns may span.
pub const DEFAULT_LOOKBACK: usize = 256;

// ─────────────────────────────────────────────────────────────────────────────
// Detection
// ─────────────────────────────────────────────────────────────────────────────

/// A completed shortcut found before the caret.
///
/// Offsets are chars within the line: the shortcut spans `[start, end)`,
/// and for inline formats the content sits at `[content_start, content_end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShortcutMatch {
    pub kind: MarkupKind,
    pub start: usize,
    pub content_start: usize,
    pub content_end: usize,
    pub end: usize,
}

static INLINE_PATTERNS: OnceLock<Vec<(InlineFormat, Regex)>> = OnceLock::new();

/// Inline patterns in priority order. Each is anchored at the caret and
/// requires the trailing trigger space.
fn inline_patterns() -> &'static [(InlineFormat, Regex)] {
    INLINE_PATTERNS.get_or_init(|| {
        [
            (InlineFormat::Bold, r"\*\*(?P<content>[^*\n]+)\*\* $"),
            (InlineFormat::Italic, r"(?:^|[^*])\*(?P<content>[^*\n]+)\* $"),
            (InlineFormat::Strikethrough, r"~~(?P<content>[^~\n]+)~~ $"),
            (InlineFormat::Underline, r"<u>(?P<content>[^<>\n]+)</u> $"),
        ]
        .into_iter()
        .map(|(format, pattern)| {
            let regex = Regex::new(pattern).expect("live shortcut pattern is valid");
            (format, regex)
        })
        .collect()
    })
}

/// Detects live shortcuts in the text before the caret.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShortcutDetector {
    lookback: usize,
}

impl Default for ShortcutDetector {
    fn default() -> Self {
        Self::new(DEFAULT_LOOKBACK)
    }
}

impl ShortcutDetector {
    pub fn new(lookback: usize) -> Self {
        Self { lookback }
    }

    pub fn lookback(&self) -> usize {
        self.lookback
    }

    /// Find a completed shortcut at the end of `before_cursor`, the current
    /// line's text up to the caret.
    ///
    /// Heading shortcuts only apply when `allow_heading` is set. Inline
    /// content must not start or end with whitespace.
    pub fn detect(&self, before_cursor: &str, allow_heading: bool) -> Option<ShortcutMatch> {
        if allow_heading {
            let level = match before_cursor {
                "# " => Some(HeadingLevel::H1),
                "## " => Some(HeadingLevel::H2),
                _ => None,
            };
            if let Some(level) = level {
                let end = char_len(before_cursor);
                return Some(ShortcutMatch {
                    kind: MarkupKind::Heading(level),
                    start: 0,
                    content_start: end,
                    content_end: end,
                    end,
                });
            }
        }

        if !before_cursor.ends_with(' ') {
            return None;
        }

        let total = char_len(before_cursor);
        let skipped = total.saturating_sub(self.lookback);
        let window = &before_cursor[char_to_byte(before_cursor, skipped)..];

        for (format, regex) in inline_patterns() {
            let Some(caps) = regex.captures(window) else {
                continue;
            };
            let Some(content) = caps.name("content") else {
                continue;
            };
            let text = content.as_str();
            if text.trim_start() != text || text.trim_end() != text {
                continue;
            }

            let open_len = format.open().len();
            let start_byte = content.start() - open_len;
            let to_chars = |byte: usize| skipped + byte_to_char(window, byte);
            return Some(ShortcutMatch {
                kind: MarkupKind::Inline(*format),
                start: to_chars(start_byte),
                content_start: to_chars(content.start()),
                content_end: to_chars(content.end()),
                end: total,
            });
        }

        None
    }

    /// Apply a shortcut completed just before the caret.
    ///
    /// The markup chars and the trigger space are removed, the construct is
    /// applied, and the caret lands right after the formatted content.
    pub fn apply(&self, root: &mut FormattedNode, selection: Selection) -> TreeEdit {
        if !selection.is_caret() {
            return TreeEdit::no_op(selection);
        }
        let Some(location) = root.locate(selection.index) else {
            return TreeEdit::no_op(selection);
        };
        let Some(line) = root.line(location.path) else {
            return TreeEdit::no_op(selection);
        };
        let allow_heading = matches!(location.path, LinePath::Block(_))
            && matches!(line.kind, NodeKind::Paragraph | NodeKind::Heading(_));
        let Some(mut runs) = line_runs(root, location.path) else {
            return TreeEdit::no_op(selection);
        };

        let text = runs.text();
        let before_cursor = char_slice(&text, 0, location.column);
        let Some(found) = self.detect(before_cursor, allow_heading) else {
            return TreeEdit::no_op(selection);
        };
        if runs.has_reference_in(found.start, found.end) {
            return TreeEdit::no_op(selection);
        }

        let caret = match found.kind {
            MarkupKind::Heading(level) => {
                runs.delete(found.start, found.end);
                store_line_runs(root, location.path, &runs);
                set_line_kind(root, location.path, NodeKind::Heading(level));
                location.line_start
            }
            MarkupKind::Inline(format) => {
                runs.delete(found.content_end, found.end);
                runs.set_format(found.content_start, found.content_end, format, true);
                runs.delete(found.start, found.content_start);
                store_line_runs(root, location.path, &runs);
                location.line_start + found.start + (found.content_end - found.content_start)
            }
        };

        debug!("Applied live shortcut {:?}", found.kind);
        TreeEdit::success(Selection::caret(caret), found.kind)
    }
}

/// Check for and apply a live shortcut with default settings.
pub fn check_live_markdown(root: &mut FormattedNode, selection: Selection) -> TreeEdit {
    ShortcutDetector::default().apply(root, selection)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
