//! grimoire - markdown and rich-document synchronization for note editing
//!
//! Keeps a note's canonical markup and its formatted tree in sync in both
//! directions: markup is parsed into a tree for the rich surface, edits on
//! the tree (including live shortcuts and reverse conversion) are serialized
//! back to markup.

pub mod config;
pub mod editor;
pub mod error;
pub mod markdown;
pub mod notes;
pub mod string_utils;

pub use config::{EditorMode, Settings};
pub use editor::{EditorSession, Metrics};
pub use error::{Error, Result};
pub use notes::{search_titles, MemoryStore, NoteStore, SearchHit};
