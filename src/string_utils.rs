//! Char-Offset String Utilities
//!
//! Cursor and selection offsets in the engine count Unicode scalar values
//! (`char`s) in the flattened document text, while Rust strings are sliced by
//! UTF-8 byte index. These helpers translate between the two so that no
//! caller ever slices in the middle of a multi-byte character.
//!
//! # Example
//! ```ignore
//! use crate::string_utils::{char_len, char_slice};
//!
//! let text = "Hei på deg"; // 'å' is 2 bytes
//! assert_eq!(char_len(text), 10);
//! assert_eq!(char_slice(text, 4, 6), "på");
//! ```

// ─────────────────────────────────────────────────────────────────────────────
// Offset Conversion
// ─────────────────────────────────────────────────────────────────────────────

/// Number of chars in `s`.
#[inline]
pub fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Convert a char offset into a byte index.
///
/// Offsets past the end clamp to `s.len()`.
pub fn char_to_byte(s: &str, char_index: usize) -> usize {
    s.char_indices()
        .nth(char_index)
        .map(|(byte, _)| byte)
        .unwrap_or(s.len())
}

/// Convert a byte index into a char offset.
///
/// A byte index inside a multi-byte character counts that character as
/// not yet reached.
pub fn byte_to_char(s: &str, byte_index: usize) -> usize {
    s.char_indices()
        .take_while(|(byte, _)| *byte < byte_index)
        .count()
}

// ─────────────────────────────────────────────────────────────────────────────
// Safe Slicing Functions
// ─────────────────────────────────────────────────────────────────────────────

/// Slice `s` by char offsets `[start, end)`.
///
/// Out-of-range offsets clamp to the string end; an inverted range yields
/// an empty string.
pub fn char_slice(s: &str, start: usize, end: usize) -> &str {
    if start >= end {
        return "";
    }
    let start = char_to_byte(s, start);
    let end = char_to_byte(s, end);
    &s[start..end]
}

/// Split `s` at a char offset.
pub fn split_at_char(s: &str, char_index: usize) -> (&str, &str) {
    s.split_at(char_to_byte(s, char_index))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_char_len_ascii_and_multibyte() {
        assert_eq!(char_len("hello"), 5);
        assert_eq!(char_len("Hei på deg"), 10);
        assert_eq!(char_len("日本語"), 3);
        assert_eq!(char_len(""), 0);
    }

    #[test]
    fn test_char_to_byte() {
        let s = "aå日b";
        assert_eq!(char_to_byte(s, 0), 0);
        assert_eq!(char_to_byte(s, 1), 1);
        assert_eq!(char_to_byte(s, 2), 3);
        assert_eq!(char_to_byte(s, 3), 6);
        assert_eq!(char_to_byte(s, 4), 7);
        assert_eq!(char_to_byte(s, 99), 7);
    }

    #[test]
    fn test_byte_to_char() {
        let s = "aå日b";
        assert_eq!(byte_to_char(s, 0), 0);
        assert_eq!(byte_to_char(s, 3), 2);
        assert_eq!(byte_to_char(s, 7), 4);
        // Inside the 3-byte '日'
        assert_eq!(byte_to_char(s, 4), 3);
    }

    #[test]
    fn test_char_slice() {
        let text = "Hei på deg";
        assert_eq!(char_slice(text, 4, 6), "på");
        assert_eq!(char_slice(text, 7, 100), "deg");
        assert_eq!(char_slice(text, 5, 5), "");
        assert_eq!(char_slice(text, 6, 2), "");
    }

    #[test]
    fn test_split_at_char() {
        let (a, b) = split_at_char("世界!", 2);
        assert_eq!(a, "世界");
        assert_eq!(b, "!");
        assert_eq!(split_at_char("ab", 9), ("ab", ""));
    }
}
