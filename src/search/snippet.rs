//! Snippet extraction for search results.
//!
//! Picks the sentence of a decision that shares the most distinct terms
//! with the query. Without any overlap the description's first sentence is
//! used, and a title-only decision has no snippet.

use crate::model::Decision;
use std::collections::HashSet;

const MAX_SNIPPET_CHARS: usize = 200;

/// Best-matching sentence from a decision's text fields.
#[must_use]
pub fn best_snippet(decision: &Decision, query: &str) -> Option<String> {
    let query_terms = terms(query);

    let mut best: Option<(&str, usize)> = None;
    for sentence in decision.text_fields().flat_map(sentences) {
        let overlap = terms(sentence).intersection(&query_terms).count();
        if overlap > 0 && best.is_none_or(|(_, b)| overlap > b) {
            best = Some((sentence, overlap));
        }
    }

    let chosen = best.map(|(s, _)| s).or_else(|| {
        decision
            .description
            .as_deref()
            .and_then(|d| sentences(d).next())
    })?;

    Some(clip(chosen))
}

fn sentences(text: &str) -> impl Iterator<Item = &str> {
    text.split(['.', '!', '?', '\n'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn terms(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() > 2)
        .map(str::to_lowercase)
        .collect()
}

fn clip(s: &str) -> String {
    match s.char_indices().nth(MAX_SNIPPET_CHARS) {
        Some((idx, _)) => format!("{}…", s[..idx].trim_end()),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decision(description: Option<&str>, reason: Option<&str>) -> Decision {
        Decision::new(
            "proj_1",
            "Use PostgreSQL",
            description.map(String::from),
            reason.map(String::from),
            None,
        )
    }

    #[test]
    fn test_picks_sentence_with_most_overlap() {
        let d = decision(
            Some("We evaluated several stores. Postgres handles concurrent writes well."),
            Some("Team already knows SQL. Replication for concurrent readers is mature."),
        );
        assert_eq!(
            best_snippet(&d, "concurrent writes").as_deref(),
            Some("Postgres handles concurrent writes well")
        );
    }

    #[test]
    fn test_falls_back_to_description() {
        let d = decision(Some("Relational data. Strong typing."), None);
        assert_eq!(best_snippet(&d, "kubernetes").as_deref(), Some("Relational data"));
    }

    #[test]
    fn test_title_only_without_overlap_is_none() {
        assert_eq!(best_snippet(&decision(None, None), "kubernetes"), None);
    }

    #[test]
    fn test_long_sentences_are_clipped() {
        let long = "word ".repeat(100);
        let d = decision(Some(&long), None);
        let snippet = best_snippet(&d, "word").unwrap();
        assert!(snippet.ends_with('…'));
        assert!(snippet.chars().count() <= MAX_SNIPPET_CHARS + 1);
    }
}
