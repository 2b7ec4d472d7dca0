//! Note persistence interface
//!
//! The editing session loads and saves note content through a [`NoteStore`].
//! [`MemoryStore`] keeps notes in memory for embedding hosts and tests.

mod search;

pub use search::{search_titles, SearchHit, MAX_SEARCH_RESULTS};

use std::cell::RefCell;
use std::collections::HashMap;

use log::debug;

use crate::error::{Error, Result};

/// Loads and saves canonical note content by id.
pub trait NoteStore {
    fn load(&self, note_id: &str) -> Result<String>;
    fn save(&self, note_id: &str, content: &str) -> Result<()>;

    /// `(note_id, title)` of every stored note.
    fn titles(&self) -> Vec<(String, String)>;

    /// Fuzzy search over note titles.
    fn search(&self, query: &str, limit: usize) -> Vec<SearchHit> {
        let titles = self.titles();
        search_titles(
            query,
            titles.iter().map(|(id, title)| (id.as_str(), title.as_str())),
            limit,
        )
    }
}

#[derive(Debug, Clone)]
struct StoredNote {
    title: String,
    content: String,
}

/// Single-threaded in-memory note store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    notes: RefCell<HashMap<String, StoredNote>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert of a note.
    pub fn with_note(self, note_id: &str, title: &str, content: &str) -> Self {
        self.notes.borrow_mut().insert(
            note_id.to_string(),
            StoredNote {
                title: title.to_string(),
                content: content.to_string(),
            },
        );
        self
    }

    /// Current content of a note, if stored.
    pub fn get(&self, note_id: &str) -> Option<String> {
        self.notes.borrow().get(note_id).map(|n| n.content.clone())
    }

    /// Rename a stored note. Returns `false` for an unknown id.
    pub fn set_title(&self, note_id: &str, title: &str) -> bool {
        match self.notes.borrow_mut().get_mut(note_id) {
            Some(note) => {
                note.title = title.to_string();
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.notes.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.borrow().is_empty()
    }
}

impl NoteStore for MemoryStore {
    fn load(&self, note_id: &str) -> Result<String> {
        self.get(note_id)
            .ok_or_else(|| Error::NoteNotFound(note_id.to_string()))
    }

    /// A note saved for the first time is titled with its id.
    fn save(&self, note_id: &str, content: &str) -> Result<()> {
        debug!("Storing note '{}' ({} bytes)", note_id, content.len());
        self.notes
            .borrow_mut()
            .entry(note_id.to_string())
            .and_modify(|note| note.content = content.to_string())
            .or_insert_with(|| StoredNote {
                title: note_id.to_string(),
                content: content.to_string(),
            });
        Ok(())
    }

    fn titles(&self) -> Vec<(String, String)> {
        self.notes
            .borrow()
            .iter()
            .map(|(id, note)| (id.clone(), note.title.clone()))
            .collect()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
