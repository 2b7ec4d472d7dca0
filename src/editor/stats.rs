//! Document metrics for the note editor
//!
//! Counts characters, words, lines and the UTF-8 size of a note's canonical
//! markup for display in the status bar and in the stored note record.

use serde::Serialize;

// ─────────────────────────────────────────────────────────────────────────────
// Metrics
// ─────────────────────────────────────────────────────────────────────────────

/// Metrics of a canonical markup text.
///
/// # Example
///
/// ```ignore
/// let metrics = Metrics::from_text("Hello, World!\nNew line.");
/// assert_eq!(metrics.words, 4);
/// assert_eq!(metrics.lines, 2);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Metrics {
    /// Number of characters (Unicode scalar values), markup included
    pub characters: usize,
    /// Number of whitespace-separated words
    pub words: usize,
    /// Number of `\n`-separated lines; an empty text has one
    pub lines: usize,
    /// Size of the UTF-8 encoding in bytes
    pub size_bytes: usize,
}

impl Metrics {
    /// Calculate metrics from the given text in a single pass.
    pub fn from_text(text: &str) -> Self {
        let mut metrics = Self {
            characters: 0,
            words: 0,
            lines: 1,
            size_bytes: text.len(),
        };

        let mut in_word = false;
        for ch in text.chars() {
            metrics.characters += 1;

            if ch == '\n' {
                metrics.lines += 1;
            }

            if ch.is_whitespace() {
                in_word = false;
            } else if !in_word {
                in_word = true;
                metrics.words += 1;
            }
        }

        metrics
    }

    /// Human-readable size, e.g. `"1.2 KB"`.
    pub fn format_size(&self) -> String {
        format_size(self.size_bytes)
    }

    /// Format the metrics for display in the status bar.
    ///
    /// Returns a compact string like "150 words | 892 chars | 25 lines | 1.1 KB"
    pub fn format_compact(&self) -> String {
        format!(
            "{} words | {} chars | {} lines | {}",
            self.words,
            self.characters,
            self.lines,
            self.format_size()
        )
    }
}

/// Format a byte count with decimal units: `B` below 1000, then `KB`, then
/// `MB`, one decimal place.
pub fn format_size(bytes: usize) -> String {
    if bytes < 1_000 {
        format!("{} B", bytes)
    } else if bytes < 1_000_000 {
        format!("{:.1} KB", bytes as f64 / 1_000.0)
    } else {
        format!("{:.1} MB", bytes as f64 / 1_000_000.0)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_empty_text() {
        let metrics = Metrics::from_text("");
        assert_eq!(metrics.characters, 0);
        assert_eq!(metrics.words, 0);
        assert_eq!(metrics.lines, 1);
        assert_eq!(metrics.size_bytes, 0);
    }

    #[test]
    fn test_metrics_hello_world() {
        let metrics = Metrics::from_text("Hello world\n");
        assert_eq!(metrics.characters, 12);
        assert_eq!(metrics.words, 2);
        assert_eq!(metrics.lines, 2);
        assert_eq!(metrics.size_bytes, 12);
    }

    #[test]
    fn test_metrics_whitespace_only() {
        let metrics = Metrics::from_text("   \n\t ");
        assert_eq!(metrics.words, 0);
        assert_eq!(metrics.lines, 2);
        assert_eq!(metrics.characters, 6);
    }

    #[test]
    fn test_metrics_counts_markup() {
        let metrics = Metrics::from_text("# Title\n**bold** text");
        assert_eq!(metrics.words, 4);
        assert_eq!(metrics.lines, 2);
        assert_eq!(metrics.characters, 21);
        assert_eq!(metrics.size_bytes, 21);
    }

    #[test]
    fn test_metrics_multibyte() {
        let metrics = Metrics::from_text("på 日本");
        assert_eq!(metrics.characters, 5);
        assert_eq!(metrics.words, 2);
        assert_eq!(metrics.size_bytes, 10);
    }

    #[test]
    fn test_metrics_trailing_newline_adds_line() {
        assert_eq!(Metrics::from_text("a\n").lines, 2);
        assert_eq!(Metrics::from_text("a\n\nb").lines, 3);
    }

    #[test]
    fn test_format_size_units() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(999), "999 B");
        assert_eq!(format_size(1_000), "1.0 KB");
        assert_eq!(format_size(1_536), "1.5 KB");
        assert_eq!(format_size(999_999), "1000.0 KB");
        assert_eq!(format_size(2_500_000), "2.5 MB");
    }

    #[test]
    fn test_format_compact() {
        let metrics = Metrics::from_text("one two");
        assert_eq!(metrics.format_compact(), "2 words | 7 chars | 1 lines | 7 B");
    }

    #[test]
    fn test_metrics_serialize() {
        let json = serde_json::to_string(&Metrics::from_text("hi")).unwrap();
        assert_eq!(json, r#"{"characters":2,"words":1,"lines":1,"size_bytes":2}"#);
    }
}
