//! Editing session for a single note
//!
//! An [`EditorSession`] owns everything the rich editing surface needs for
//! one open note: the canonical markup, the formatted tree built from it,
//! the selection, metrics, and the save bookkeeping. Keystrokes and gestures
//! mutate the tree; the canonical text is regenerated from the tree after
//! each action.
//!
//! Saving is split into [`EditorSession::begin_save`] and
//! [`EditorSession::finish_save`] so the caller can perform the store I/O
//! however it likes. A failed save never reverts edits.

use log::{debug, info, warn};
use serde::Serialize;

use crate::config::{EditorMode, Settings};
use crate::editor::stats::Metrics;
use crate::error::Result;
use crate::markdown::{
    activate_reference_at, apply_reverse_markdown, insert_text_with_marks, marks_at,
    parse_markdown_with_options, serialize_with_options, Activation, ClickEvent, FormattedNode,
    Marks, MarkupKind, Navigator, Selection, ShortcutDetector, TreeEdit,
};
use crate::notes::NoteStore;

// ─────────────────────────────────────────────────────────────────────────────
// Save Records
// ─────────────────────────────────────────────────────────────────────────────

/// Content captured for one save attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveRequest {
    pub note_id: String,
    pub content: String,
    /// Edit revision the content belongs to
    pub revision: u64,
}

/// Serializable note record, as persisted by the note store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NoteSnapshot {
    pub id: String,
    pub title: String,
    pub content_markdown: String,
    pub size_bytes: usize,
    pub line_count: usize,
    pub word_count: usize,
    pub char_count: usize,
}

// ─────────────────────────────────────────────────────────────────────────────
// Editor Session
// ─────────────────────────────────────────────────────────────────────────────

/// Editing state of one open note.
#[derive(Debug, Clone)]
pub struct EditorSession {
    note_id: String,
    title: String,
    mode: EditorMode,
    canonical: String,
    document: FormattedNode,
    selection: Selection,
    metrics: Metrics,
    detector: ShortcutDetector,
    live_shortcuts: bool,
    reverse_conversion: bool,
    /// Bumped on every change to the note
    revision: u64,
    saved_revision: u64,
    last_save_error: Option<String>,
    /// Formatting for the next typed char, set after an inline shortcut so
    /// text typed after it is not formatted
    typing_marks: Option<Marks>,
}

impl EditorSession {
    /// Create a session for note content, opened in the configured mode.
    ///
    /// The caret starts at the end of the document.
    pub fn new(note_id: &str, title: &str, content: &str, settings: &Settings) -> Self {
        let mode = settings.default_mode;
        let document = parse_markdown_with_options(content, &mode.markdown_options());
        let selection = Selection::caret(document.char_len());

        Self {
            note_id: note_id.to_string(),
            title: title.to_string(),
            mode,
            canonical: content.to_string(),
            document,
            selection,
            metrics: Metrics::from_text(content),
            detector: ShortcutDetector::new(settings.shortcut_lookback),
            live_shortcuts: settings.live_shortcuts,
            reverse_conversion: settings.reverse_conversion,
            revision: 0,
            saved_revision: 0,
            last_save_error: None,
            typing_marks: None,
        }
    }

    /// Load a note from the store and open it.
    pub fn open(store: &dyn NoteStore, note_id: &str, title: &str, settings: &Settings) -> Result<Self> {
        let content = store.load(note_id)?;
        debug!("Opened note '{}' ({} bytes)", note_id, content.len());
        Ok(Self::new(note_id, title, &content, settings))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    pub fn note_id(&self) -> &str {
        &self.note_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn mode(&self) -> EditorMode {
        self.mode
    }

    /// Canonical markup of the current document.
    pub fn canonical(&self) -> &str {
        &self.canonical
    }

    pub fn document(&self) -> &FormattedNode {
        &self.document
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Move the caret or selection, clamped to the document.
    pub fn set_selection(&mut self, selection: Selection) {
        let len = self.document.char_len();
        let index = selection.index.min(len);
        let length = selection.length.min(len - index);
        self.selection = Selection::new(index, length);
        self.typing_marks = None;
    }

    pub fn set_title(&mut self, title: &str) {
        if self.title != title {
            self.title = title.to_string();
            self.revision += 1;
        }
    }

    /// Switch between write and read mode, rebuilding the tree from the
    /// canonical text with the new mode's parser options.
    pub fn set_mode(&mut self, mode: EditorMode) {
        if self.mode == mode {
            return;
        }
        debug!("Switching note '{}' to {} mode", self.note_id, mode.label());
        self.mode = mode;
        self.document = parse_markdown_with_options(&self.canonical, &mode.markdown_options());
        self.typing_marks = None;
        self.set_selection(self.selection);
    }

    /// Flip between write and read mode. Returns the new mode.
    pub fn toggle_mode(&mut self) -> EditorMode {
        self.set_mode(self.mode.toggle());
        self.mode
    }

    /// Replace the note content from outside the editing surface.
    pub fn replace_content(&mut self, content: &str) {
        self.document = parse_markdown_with_options(content, &self.mode.markdown_options());
        self.typing_marks = None;
        if self.canonical != content {
            self.canonical = content.to_string();
            self.metrics = Metrics::from_text(content);
            self.revision += 1;
        }
        self.set_selection(self.selection);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Editing Surface Events
    // ─────────────────────────────────────────────────────────────────────────

    /// Type text at the caret, one char at a time.
    ///
    /// After each char the live shortcut detector runs. Returns the
    /// constructs the shortcuts produced. Read mode ignores typing.
    pub fn type_text(&mut self, text: &str) -> Vec<MarkupKind> {
        let mut applied = Vec::new();
        if self.mode == EditorMode::Read || text.is_empty() {
            return applied;
        }

        let mut buffer = [0u8; 4];
        for ch in text.chars() {
            let marks = self.typing_marks.take();
            let piece: &str = ch.encode_utf8(&mut buffer);
            self.selection = insert_text_with_marks(&mut self.document, self.selection, piece, marks);

            if ch == '\n' || !self.live_shortcuts {
                continue;
            }
            let edit = self.detector.apply(&mut self.document, self.selection);
            if !edit.performed {
                continue;
            }
            self.selection = edit.selection;
            if let Some(MarkupKind::Inline(format)) = edit.kind {
                self.typing_marks =
                    Some(marks_at(&self.document, self.selection.index).without(format));
            }
            applied.extend(edit.kind);
        }

        self.sync_canonical();
        applied
    }

    /// Double-click at an offset: turn the formatting there back into
    /// literal markup.
    pub fn double_click(&mut self, offset: usize) -> TreeEdit {
        if self.mode == EditorMode::Read || !self.reverse_conversion {
            return TreeEdit::no_op(self.selection);
        }

        let edit = apply_reverse_markdown(&mut self.document, Selection::caret(offset));
        if edit.performed {
            debug!("Reverse conversion {:?} at {}", edit.kind, offset);
            self.selection = edit.selection;
            self.typing_marks = None;
            self.sync_canonical();
        }
        edit
    }

    /// Click at an offset. A cross-reference there is handed to the
    /// navigator; references only exist as entities in read mode.
    pub fn activate(&self, offset: usize, navigator: &mut dyn Navigator) -> Result<Activation> {
        let mut event = ClickEvent::new();
        activate_reference_at(&self.document, offset, &mut event, navigator)
    }

    fn sync_canonical(&mut self) {
        let canonical = serialize_with_options(&self.document, &self.mode.markdown_options());
        if canonical != self.canonical {
            self.canonical = canonical;
            self.metrics = Metrics::from_text(&self.canonical);
            self.revision += 1;
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Save Lifecycle
    // ─────────────────────────────────────────────────────────────────────────

    /// Capture the current content for saving.
    pub fn begin_save(&self) -> SaveRequest {
        SaveRequest {
            note_id: self.note_id.clone(),
            content: self.canonical.clone(),
            revision: self.revision,
        }
    }

    /// Record the outcome of a save started with [`Self::begin_save`].
    ///
    /// On failure the error is kept and returned; the document stays dirty.
    pub fn finish_save(&mut self, request: &SaveRequest, result: Result<()>) -> Result<()> {
        match result {
            Ok(()) => {
                self.saved_revision = self.saved_revision.max(request.revision);
                self.last_save_error = None;
                info!(
                    "Saved note '{}' at revision {}",
                    request.note_id, request.revision
                );
                Ok(())
            }
            Err(err) => {
                warn!("Failed to save note '{}': {}", request.note_id, err);
                self.last_save_error = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// Save synchronously through a store.
    pub fn save_to(&mut self, store: &dyn NoteStore) -> Result<()> {
        let request = self.begin_save();
        let result = store.save(&request.note_id, &request.content);
        self.finish_save(&request, result)
    }

    /// Whether there are edits not yet confirmed saved.
    pub fn is_dirty(&self) -> bool {
        self.revision != self.saved_revision
    }

    pub fn last_save_error(&self) -> Option<&str> {
        self.last_save_error.as_deref()
    }

    /// Note record for the current content.
    pub fn snapshot(&self) -> NoteSnapshot {
        NoteSnapshot {
            id: self.note_id.clone(),
            title: self.title.clone(),
            content_markdown: self.canonical.clone(),
            size_bytes: self.metrics.size_bytes,
            line_count: self.metrics.lines,
            word_count: self.metrics.words,
            char_count: self.metrics.characters,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
