//! Cross-reference entities
//!
//! A cross-reference links one note to another. In markup it is written
//! `[[target|label]]` (or `[[target]]`, where the label defaults to the
//! target). In the rich document it is a single atomic inline node that
//! displays its label and navigates to its target when activated.

use std::ops::Range;
use std::sync::OnceLock;

use log::debug;
use regex::Regex;

use crate::error::Result;
use crate::markdown::document::{inline_chain_at, FormattedNode, NodeKind};

// ─────────────────────────────────────────────────────────────────────────────
// CrossReference
// ─────────────────────────────────────────────────────────────────────────────

/// Inline link to another note.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CrossReference {
    /// Identifier of the referenced note, preserved exactly
    pub target: String,
    /// Display text
    pub label: String,
}

impl CrossReference {
    /// Build a reference from raw token parts.
    ///
    /// A leading `namespace:` on the target is dropped and an empty or missing
    /// label falls back to the target. Returns `None` when no target remains.
    pub fn new(target: &str, label: Option<&str>) -> Option<Self> {
        let target = strip_namespace(target);
        if target.is_empty() {
            return None;
        }
        let label = match label {
            Some(label) if !label.is_empty() => label,
            _ => target,
        };
        Some(Self {
            target: target.to_string(),
            label: label.to_string(),
        })
    }

    /// Canonical token form, always with an explicit label.
    ///
    /// A target that itself looks namespaced gets [`DEFAULT_NAMESPACE`] in
    /// front, so parsing the token strips exactly that prefix again.
    pub fn to_markup(&self) -> String {
        if strip_namespace(&self.target) != self.target {
            format!("[[{}:{}|{}]]", DEFAULT_NAMESPACE, self.target, self.label)
        } else {
            format!("[[{}|{}]]", self.target, self.label)
        }
    }
}

/// Namespace written in front of targets that contain a `:` of their own.
pub const DEFAULT_NAMESPACE: &str = "note";

/// `note:42` → `42`. Only an identifier-like prefix counts as a namespace.
pub fn strip_namespace(target: &str) -> &str {
    match target.split_once(':') {
        Some((namespace, rest)) if is_namespace(namespace) => rest,
        _ => target,
    }
}

fn is_namespace(candidate: &str) -> bool {
    let mut chars = candidate.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

// ─────────────────────────────────────────────────────────────────────────────
// Token Recognition
// ─────────────────────────────────────────────────────────────────────────────

static TOKEN_REGEX: OnceLock<Regex> = OnceLock::new();
static ESCAPED_TOKEN_REGEX: OnceLock<Regex> = OnceLock::new();

fn token_regex() -> &'static Regex {
    TOKEN_REGEX.get_or_init(|| {
        Regex::new(r"\[\[([^\[\]|\n]+)(?:\|([^\[\]\n]*))?\]\]")
            .expect("cross-reference pattern is valid")
    })
}

fn escaped_token_regex() -> &'static Regex {
    ESCAPED_TOKEN_REGEX.get_or_init(|| {
        Regex::new(r"\\\[\\\[((?:[^\[\]\\\n]|\\[^\n])+?)\\\]\\\]")
            .expect("escaped cross-reference pattern is valid")
    })
}

/// Find every cross-reference token in `text`.
///
/// Returns byte ranges paired with the resolved reference. A token preceded
/// by a backslash is literal text and is skipped.
pub fn find_references(text: &str) -> Vec<(Range<usize>, CrossReference)> {
    token_regex()
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            if text[..whole.start()].ends_with('\\') {
                return None;
            }
            let target = caps.get(1)?.as_str();
            let label = caps.get(2).map(|m| m.as_str());
            CrossReference::new(target, label).map(|r| (whole.range(), r))
        })
        .collect()
}

/// Undo escaping of `[`, `]` and `|` inside escaped text that still forms
/// a well-formed token, e.g. `\[\[42\|See\]\]` → `[[42|See]]`.
///
/// Other escapes inside the token are kept.
pub fn strip_reference_escapes(escaped: &str) -> String {
    escaped_token_regex()
        .replace_all(escaped, |caps: &regex::Captures<'_>| {
            let inner = caps[1].replace("\\|", "|");
            let candidate = format!("[[{}]]", inner);
            let well_formed = token_regex()
                .find(&candidate)
                .is_some_and(|m| m.start() == 0 && m.end() == candidate.len());
            if well_formed {
                candidate
            } else {
                caps[0].to_string()
            }
        })
        .into_owned()
}

// ─────────────────────────────────────────────────────────────────────────────
// Activation
// ─────────────────────────────────────────────────────────────────────────────

/// Receives navigation requests from activated cross-references.
pub trait Navigator {
    fn on_activate_reference(&mut self, target: &str) -> Result<()>;
}

impl<F> Navigator for F
where
    F: FnMut(&str) -> Result<()>,
{
    fn on_activate_reference(&mut self, target: &str) -> Result<()> {
        self(target)
    }
}

/// A click delivered to an inline node.
#[derive(Debug, Clone, Default)]
pub struct ClickEvent {
    default_prevented: bool,
}

impl ClickEvent {
    pub fn new() -> Self {
        Self::default()
    }

    /// Suppress the host's default handling (caret placement, selection).
    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented
    }
}

/// What a click on an inline node did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activation {
    /// A cross-reference was activated; carries its target
    Navigated(String),
    /// Not a cross-reference; the host handles the click normally
    PassThrough,
}

/// Handle a click on `node`.
///
/// For a cross-reference the default action is suppressed and the navigator
/// is invoked exactly once with the reference target.
pub fn activate_reference(
    node: &FormattedNode,
    event: &mut ClickEvent,
    navigator: &mut dyn Navigator,
) -> Result<Activation> {
    match &node.kind {
        NodeKind::CrossReference(reference) => {
            event.prevent_default();
            debug!("Activating cross-reference to '{}'", reference.target);
            navigator.on_activate_reference(&reference.target)?;
            Ok(Activation::Navigated(reference.target.clone()))
        }
        _ => Ok(Activation::PassThrough),
    }
}

/// Handle a click at a flattened offset of a document.
pub fn activate_reference_at(
    root: &FormattedNode,
    offset: usize,
    event: &mut ClickEvent,
    navigator: &mut dyn Navigator,
) -> Result<Activation> {
    let Some(location) = root.locate(offset) else {
        return Ok(Activation::PassThrough);
    };
    let Some(line) = root.line(location.path) else {
        return Ok(Activation::PassThrough);
    };
    match inline_chain_at(&line.children, location.column).last() {
        Some((node, _)) => activate_reference(node, event, navigator),
        None => Ok(Activation::PassThrough),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_reference_with_label() {
        let r = CrossReference::new("42", Some("See also")).unwrap();
        assert_eq!(r.target, "42");
        assert_eq!(r.label, "See also");
        assert_eq!(r.to_markup(), "[[42|See also]]");
    }

    #[test]
    fn test_reference_label_defaults_to_target() {
        let r = CrossReference::new("42", None).unwrap();
        assert_eq!(r.label, "42");
        let r = CrossReference::new("42", Some("")).unwrap();
        assert_eq!(r.label, "42");
    }

    #[test]
    fn test_namespace_prefix_stripped() {
        let r = CrossReference::new("note:42", None).unwrap();
        assert_eq!(r.target, "42");
        assert_eq!(r.to_markup(), "[[42|42]]");
        // Not a namespace: keep the target as typed
        assert_eq!(strip_namespace("12:30"), "12:30");
        assert!(CrossReference::new("note:", None).is_none());
    }

    #[test]
    fn test_namespaced_target_survives_markup() {
        let r = CrossReference::new("note:ch:7", Some("Chapter")).unwrap();
        assert_eq!(r.target, "ch:7");
        assert_eq!(r.to_markup(), "[[note:ch:7|Chapter]]");
        let reparsed = find_references(&r.to_markup());
        assert_eq!(reparsed[0].1, r);

        // Target that would strip to nothing
        let r = CrossReference::new("x:x:", None).unwrap();
        assert_eq!(r.target, "x:");
        assert_eq!(find_references(&r.to_markup())[0].1, r);
    }

    #[test]
    fn test_find_references() {
        let text = "see [[42|Meeting]] and [[7]]";
        let found = find_references(text);
        assert_eq!(found.len(), 2);
        assert_eq!(&text[found[0].0.clone()], "[[42|Meeting]]");
        assert_eq!(found[0].1.label, "Meeting");
        assert_eq!(found[1].1.target, "7");
        assert_eq!(found[1].1.label, "7");
    }

    #[test]
    fn test_find_references_skips_escaped_and_malformed() {
        assert!(find_references(r"\[[42]]").is_empty());
        assert!(find_references("[[]]").is_empty());
        assert!(find_references("[[a\nb]]").is_empty());
        assert!(find_references("[42]").is_empty());
    }

    #[test]
    fn test_strip_reference_escapes() {
        assert_eq!(
            strip_reference_escapes(r"\[\[42\|See also\]\] and \*"),
            r"[[42|See also]] and \*"
        );
        // Not a well-formed token once unescaped
        assert_eq!(strip_reference_escapes(r"\[\[\]\]"), r"\[\[\]\]");
        assert_eq!(strip_reference_escapes(r"\[\[a\[b\]\]"), r"\[\[a\[b\]\]");
    }

    #[test]
    fn test_activate_reference_navigates_once() {
        let node = FormattedNode::reference(CrossReference::new("42", Some("x")).unwrap());
        let mut event = ClickEvent::new();
        let mut calls = Vec::new();
        let mut navigator = |target: &str| -> Result<()> {
            calls.push(target.to_string());
            Ok(())
        };
        let result = activate_reference(&node, &mut event, &mut navigator).unwrap();
        assert_eq!(result, Activation::Navigated("42".to_string()));
        assert!(event.is_default_prevented());
        assert_eq!(calls, vec!["42".to_string()]);
    }

    #[test]
    fn test_activate_plain_text_passes_through() {
        let node = FormattedNode::text("hello");
        let mut event = ClickEvent::new();
        let mut navigator = |_: &str| -> Result<()> { panic!("should not navigate") };
        let result = activate_reference(&node, &mut event, &mut navigator).unwrap();
        assert_eq!(result, Activation::PassThrough);
        assert!(!event.is_default_prevented());
    }

    #[test]
    fn test_activate_propagates_navigation_error() {
        let node = FormattedNode::reference(CrossReference::new("9", None).unwrap());
        let mut event = ClickEvent::new();
        let mut navigator = |target: &str| -> Result<()> {
            Err(Error::NavigationFailed {
                target: target.to_string(),
                message: "missing".to_string(),
            })
        };
        let result = activate_reference(&node, &mut event, &mut navigator);
        assert!(matches!(result, Err(Error::NavigationFailed { .. })));
    }

    #[test]
    fn test_activate_reference_at_offset() {
        let doc = FormattedNode::document(vec![FormattedNode::paragraph(vec![
            FormattedNode::text("go "),
            FormattedNode::reference(CrossReference::new("5", Some("there")).unwrap()),
        ])]);
        let mut targets = Vec::new();
        let mut navigator = |target: &str| -> Result<()> {
            targets.push(target.to_string());
            Ok(())
        };

        let mut event = ClickEvent::new();
        let hit = activate_reference_at(&doc, 4, &mut event, &mut navigator).unwrap();
        assert_eq!(hit, Activation::Navigated("5".to_string()));

        let mut event = ClickEvent::new();
        let miss = activate_reference_at(&doc, 1, &mut event, &mut navigator).unwrap();
        assert_eq!(miss, Activation::PassThrough);
        assert_eq!(targets, vec!["5".to_string()]);
    }
}
