//! Editor module for grimoire
//!
//! This module contains the per-note editing session and the document
//! metrics shown alongside it.

mod session;
mod stats;

pub use session::{EditorSession, NoteSnapshot, SaveRequest};
pub use stats::{format_size, Metrics};
