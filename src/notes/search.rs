//! Fuzzy title search over notes
//!
//! Scores note titles against a query with the skim algorithm and returns
//! the best matches first.

use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use serde::Serialize;

/// Maximum number of results a search returns.
pub const MAX_SEARCH_RESULTS: usize = 20;

/// One note matching a search query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    pub note_id: String,
    pub title: String,
    /// Match score; higher is better
    pub score: i64,
}

/// Search `(note_id, title)` pairs for `query`.
///
/// A blank query matches nothing. At most `limit` hits are returned, and
/// never more than [`MAX_SEARCH_RESULTS`]. Equal scores are ordered by title.
pub fn search_titles<'a, I>(query: &str, notes: I, limit: usize) -> Vec<SearchHit>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let query = query.trim();
    if query.is_empty() {
        return Vec::new();
    }

    let matcher = SkimMatcherV2::default();
    let mut hits: Vec<SearchHit> = notes
        .into_iter()
        .filter_map(|(note_id, title)| {
            matcher.fuzzy_match(title, query).map(|score| SearchHit {
                note_id: note_id.to_string(),
                title: title.to_string(),
                score,
            })
        })
        .collect();

    hits.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.title.cmp(&b.title)));
    hits.truncate(limit.min(MAX_SEARCH_RESULTS));
    hits
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const NOTES: [(&str, &str); 4] = [
        ("1", "Meeting notes"),
        ("2", "Grocery list"),
        ("3", "Meeting agenda"),
        ("4", "Spell book"),
    ];

    #[test]
    fn test_search_matches_titles() {
        let hits = search_titles("meet", NOTES, 10);
        let ids: Vec<&str> = hits.iter().map(|h| h.note_id.as_str()).collect();
        assert_eq!(hits.len(), 2);
        assert!(ids.contains(&"1"));
        assert!(ids.contains(&"3"));
    }

    #[test]
    fn test_search_is_fuzzy() {
        let hits = search_titles("spbk", NOTES, 10);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Spell book");
    }

    #[test]
    fn test_search_best_match_first() {
        let hits = search_titles("grocery", NOTES, 10);
        assert_eq!(hits[0].note_id, "2");
        assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn test_blank_query_matches_nothing() {
        assert!(search_titles("", NOTES, 10).is_empty());
        assert!(search_titles("   ", NOTES, 10).is_empty());
    }

    #[test]
    fn test_no_match() {
        assert!(search_titles("zzz", NOTES, 10).is_empty());
    }

    #[test]
    fn test_results_are_capped() {
        let titles: Vec<(String, String)> = (0..30)
            .map(|i| (i.to_string(), format!("Note {}", i)))
            .collect();
        let pairs = titles.iter().map(|(id, t)| (id.as_str(), t.as_str()));
        assert_eq!(search_titles("note", pairs.clone(), 100).len(), MAX_SEARCH_RESULTS);
        assert_eq!(search_titles("note", pairs, 3).len(), 3);
    }
}
