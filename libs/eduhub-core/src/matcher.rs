use std::collections::HashSet;

use crate::catalog::{Catalog, CatalogEntry};
use crate::error::MatchError;

/// A catalog entry scored against one query. Rank is 1..=100.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    pub entry: CatalogEntry,
    pub rank: u8,
}

/// Score every catalog entry by keyword overlap with `query`.
///
/// The query and each entry's `"{category} {label}"` text are normalized to
/// lower-case word sets; an entry's rank is the rounded percentage of query
/// words it contains. Zero-rank entries are dropped and ties keep catalog
/// order.
pub fn rank(query: &str, catalog: &Catalog) -> Result<Vec<SearchResult>, MatchError> {
    let query_words: HashSet<String> = query
        .to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect();
    if query_words.is_empty() {
        return Err(MatchError::EmptyQuery);
    }

    let mut results: Vec<SearchResult> = catalog
        .entries()
        .iter()
        .filter_map(|entry| {
            let text = format!("{} {}", entry.category, entry.label).to_lowercase();
            let entry_words: HashSet<&str> = text.split_whitespace().collect();
            let matched = query_words
                .iter()
                .filter(|w| entry_words.contains(w.as_str()))
                .count();
            let rank = ((matched as f64 / query_words.len() as f64) * 100.0).round() as u8;
            (rank > 0).then(|| SearchResult {
                entry: entry.clone(),
                rank,
            })
        })
        .collect();

    // Stable sort: equal ranks keep catalog order.
    results.sort_by(|a, b| b.rank.cmp(&a.rank));
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Catalog {
        Catalog::from_json(
            r#"[
                {"title": "Physics", "items": [
                    {"label": "Physics MTG", "key": "phy_mtg"},
                    {"label": "Physics Short Notes", "key": "phy_notes"}
                ]},
                {"title": "Biology", "items": [
                    {"label": "Biology MTG", "key": "bio_mtg"},
                    {"label": "Biology Short Notes", "key": "bio_notes"}
                ]}
            ]"#,
            "Material_eduhubkmrbot",
        )
        .unwrap()
    }

    #[test]
    fn full_match_is_100_regardless_of_word_order() {
        let results = rank("mtg biology", &catalog()).unwrap();
        assert_eq!(results[0].entry.key, "bio_mtg");
        assert_eq!(results[0].rank, 100);
    }

    #[test]
    fn ranks_are_positive_and_descending() {
        let results = rank("biology short notes", &catalog()).unwrap();
        assert!(!results.is_empty());
        assert!(results.iter().all(|r| r.rank > 0));
        assert!(results.windows(2).all(|w| w[0].rank >= w[1].rank));
    }

    #[test]
    fn ties_keep_catalog_order() {
        // "mtg" matches both MTG entries at the same rank.
        let results = rank("mtg", &catalog()).unwrap();
        let keys: Vec<&str> = results.iter().map(|r| r.entry.key.as_str()).collect();
        assert_eq!(keys, vec!["phy_mtg", "bio_mtg"]);
        assert!(results.iter().all(|r| r.rank == 100));
    }

    #[test]
    fn unmatched_entries_are_excluded() {
        let results = rank("biology", &catalog()).unwrap();
        assert!(results.iter().all(|r| r.entry.category == "Biology"));
    }

    #[test]
    fn empty_query_is_rejected() {
        assert_eq!(rank("", &catalog()), Err(MatchError::EmptyQuery));
        assert_eq!(rank("   \t ", &catalog()), Err(MatchError::EmptyQuery));
    }

    #[test]
    fn no_matches_yields_empty_list() {
        let results = rank("astronomy", &catalog()).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn deterministic_for_same_query() {
        let a = rank("physics notes", &catalog()).unwrap();
        let b = rank("physics notes", &catalog()).unwrap();
        assert_eq!(a, b);
    }
}
