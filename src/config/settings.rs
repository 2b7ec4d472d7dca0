//! User settings and preferences for grimoire
//!
//! This module defines the `Settings` struct that holds all user-configurable
//! options, with serde support for JSON persistence.

use serde::{Deserialize, Serialize};

use crate::markdown::MarkdownOptions;

// ─────────────────────────────────────────────────────────────────────────────
// Editor Mode Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Which surface a note opens in.
///
/// Two modes are available:
/// - `Write`: rich editing; reference tokens stay literal so they can be edited
/// - `Read`: display; reference tokens become clickable cross-references
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EditorMode {
    #[default]
    Write,
    Read,
}

impl EditorMode {
    /// Toggle between Write and Read modes.
    pub fn toggle(&self) -> Self {
        match self {
            EditorMode::Write => EditorMode::Read,
            EditorMode::Read => EditorMode::Write,
        }
    }

    /// Get a display label for the mode.
    pub fn label(&self) -> &'static str {
        match self {
            EditorMode::Write => "Write",
            EditorMode::Read => "Read",
        }
    }

    /// Parser and serializer options for this mode.
    pub fn markdown_options(&self) -> MarkdownOptions {
        match self {
            EditorMode::Write => MarkdownOptions::write(),
            EditorMode::Read => MarkdownOptions::read(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Main Settings Struct
// ─────────────────────────────────────────────────────────────────────────────

/// User preferences and application settings.
///
/// This struct is serialized to JSON and persisted to the user's config directory.
/// All fields have sensible defaults via the `Default` trait and `#[serde(default)]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Mode a note opens in
    pub default_mode: EditorMode,

    /// Convert typed markup into formatting while typing
    pub live_shortcuts: bool,

    /// Turn formatting back into markup on double-click
    pub reverse_conversion: bool,

    /// How many chars before the caret an inline shortcut may span
    pub shortcut_lookback: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_mode: EditorMode::Write,
            live_shortcuts: true,
            reverse_conversion: true,
            shortcut_lookback: 256,
        }
    }
}

impl Settings {
    // ─────────────────────────────────────────────────────────────────────────
    // Validation Constants and Sanitization
    // ─────────────────────────────────────────────────────────────────────────

    /// Minimum allowed shortcut look-back.
    pub const MIN_SHORTCUT_LOOKBACK: usize = 8;
    /// Maximum allowed shortcut look-back.
    pub const MAX_SHORTCUT_LOOKBACK: usize = 4096;

    /// Sanitize settings by clamping values to valid ranges.
    ///
    /// This is useful after loading settings from a file that might have
    /// been manually edited with invalid values.
    pub fn sanitize(&mut self) {
        self.shortcut_lookback = self
            .shortcut_lookback
            .clamp(Self::MIN_SHORTCUT_LOOKBACK, Self::MAX_SHORTCUT_LOOKBACK);
    }

    /// Load settings and sanitize them to ensure validity.
    ///
    /// This is a convenience method that deserializes and then sanitizes.
    pub fn from_json_sanitized(json: &str) -> Result<Self, serde_json::Error> {
        let mut settings: Self = serde_json::from_str(json)?;
        settings.sanitize();
        Ok(settings)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
