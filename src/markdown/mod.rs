//! Markup parsing, serialization, and rich-text editing module
//!
//! This module keeps a note's canonical markup text and its rich document
//! tree in sync, and implements the editing behaviors of the rich surface.
//!
//! # Features
//! - Parse markup text to a [`FormattedNode`] tree (lossless, never fails)
//! - Serialize the tree back to canonical markup with minimal escaping
//! - `[[target|label]]` cross-references as atomic inline entities
//! - Live shortcuts that turn typed markup into formatting
//! - Reverse conversion of formatting back to literal markup
//! - HTML preview rendering for the read surface via comrak
//!
//! # Example
//! ```ignore
//! use crate::markdown::{parse_markdown, serialize, apply_reverse_markdown, Selection};
//!
//! let mut doc = parse_markdown("say **hello**");
//! assert_eq!(serialize(&doc), "say **hello**");
//!
//! let edit = apply_reverse_markdown(&mut doc, Selection::caret(6));
//! assert_eq!(edit.selection, Selection::new(6, 5));
//! ```

pub mod ast_ops;
pub mod document;
pub mod parser;
pub mod preview;
pub mod reference;
pub mod reverse;
pub mod runs;
pub mod serializer;
pub mod shortcuts;

pub use ast_ops::{insert_text, insert_text_with_marks, marks_at, split_line, MarkupKind, TreeEdit};
pub use document::{
    FormattedNode, HeadingLevel, InlineFormat, ItemMarker, LineLocation, LinePath, ListType,
    NodeKind, Selection,
};
pub use parser::{parse_markdown, parse_markdown_with_options, MarkdownOptions};
pub use preview::{generate_preview_document, render_preview_html};
pub use reference::{
    activate_reference, activate_reference_at, Activation, ClickEvent, CrossReference, Navigator,
};
pub use reverse::apply_reverse_markdown;
pub use runs::{InlineRuns, Marks};
pub use serializer::{serialize, serialize_with_options};
pub use shortcuts::{check_live_markdown, ShortcutDetector, ShortcutMatch};
