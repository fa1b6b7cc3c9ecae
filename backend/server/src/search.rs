//! # Search
//!
//! Finds words to relate from the word page.
//!
//! ## Request
//! - `q`: case-insensitive substring of the word, blank or absent answers `[]`
//! - `exclude`: comma separated ids left out of the results (the word itself, its current relations)
//!
//! ## Failure
//! Search is a convenience, so a store failure degrades to an empty list
//! instead of an error response.
use std::collections::HashSet;

use models::VocabularyEntry;
use serde::Deserialize;
use tracing::warn;

use crate::database::Database;

#[derive(Deserialize, Debug, Default)]
pub struct SearchParams {
    pub q: Option<String>,
    pub exclude: Option<String>,
}

impl SearchParams {
    pub fn query(&self) -> Option<&str> {
        self.q.as_deref().map(str::trim).filter(|q| !q.is_empty())
    }

    pub fn exclude_ids(&self) -> HashSet<String> {
        self.exclude
            .as_deref()
            .map(parse_ids)
            .unwrap_or_default()
    }
}

pub fn parse_ids(raw: &str) -> HashSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn search_words(database: &Database, params: &SearchParams) -> Vec<VocabularyEntry> {
    let Some(query) = params.query() else {
        return Vec::new();
    };

    database
        .search(query, &params.exclude_ids())
        .unwrap_or_else(|e| {
            warn!("Search for {query:?} failed: {e}");
            Vec::new()
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(q: Option<&str>, exclude: Option<&str>) -> SearchParams {
        SearchParams {
            q: q.map(str::to_string),
            exclude: exclude.map(str::to_string),
        }
    }

    #[test]
    fn test_parse_ids() {
        let ids = parse_ids("a, b,,c ,");

        assert_eq!(ids.len(), 3);
        assert!(ids.contains("a") && ids.contains("b") && ids.contains("c"));
        assert!(parse_ids("").is_empty());
    }

    #[test]
    fn test_blank_query_short_circuits() {
        assert_eq!(params(None, None).query(), None);
        assert_eq!(params(Some("  "), None).query(), None);
        assert_eq!(params(Some(" ru "), None).query(), Some("ru"));
    }

    #[test]
    fn test_search_words_excludes() {
        let database = Database::in_memory().unwrap();
        let run = database.create_entry("run", None, None).unwrap();
        database.create_entry("rune", None, None).unwrap();

        let found = search_words(&database, &params(Some("RUN"), Some(run.id.as_str())));
        let words: Vec<&str> = found.iter().map(|entry| entry.word.as_str()).collect();

        assert_eq!(words, ["rune"]);
        assert!(search_words(&database, &params(Some(""), None)).is_empty());
    }
}
