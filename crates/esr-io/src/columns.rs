//! Alias tables mapping drifting column headers onto canonical concepts.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MatchMode {
    /// Whole trimmed header equals the pattern
    Exact,
    /// Pattern occurs anywhere in the header
    Contains,
}

/// Ordered `(pattern, concept)` pairs; comparison is case-insensitive.
///
/// Earlier pairs take priority when a header matches several patterns.
#[derive(Debug, Clone, Copy)]
pub struct AliasTable {
    pub mode: MatchMode,
    pub entries: &'static [(&'static str, &'static str)],
}

/// A header resolved to a concept
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnMatch {
    pub concept: &'static str,
    pub index: usize,
    pub header: String,
}

impl AliasTable {
    pub const fn new(mode: MatchMode, entries: &'static [(&'static str, &'static str)]) -> Self {
        Self { mode, entries }
    }

    /// Concept of the first pattern matching `header`.
    pub fn concept_for(&self, header: &str) -> Option<&'static str> {
        let header = header.trim().to_lowercase();
        self.entries
            .iter()
            .find(|(pattern, _)| {
                let pattern = pattern.to_lowercase();
                match self.mode {
                    MatchMode::Exact => header == pattern,
                    MatchMode::Contains => header.contains(&pattern),
                }
            })
            .map(|(_, concept)| *concept)
    }

    /// Every column that resolves to a concept, in header order.
    ///
    /// A concept may match several columns; callers decide which one to use.
    pub fn resolve(&self, headers: &[String]) -> Vec<ColumnMatch> {
        headers
            .iter()
            .enumerate()
            .filter_map(|(index, header)| {
                self.concept_for(header).map(|concept| ColumnMatch {
                    concept,
                    index,
                    header: header.trim().to_string(),
                })
            })
            .collect()
    }

    /// Like [`resolve`](Self::resolve), keeping the first column per concept.
    pub fn resolve_first(&self, headers: &[String]) -> Vec<ColumnMatch> {
        let mut matches: Vec<ColumnMatch> = Vec::new();
        for column in self.resolve(headers) {
            if !matches.iter().any(|m| m.concept == column.concept) {
                matches.push(column);
            }
        }
        matches
    }

    pub fn find(&self, headers: &[String], concept: &str) -> Option<ColumnMatch> {
        self.resolve(headers).into_iter().find(|m| m.concept == concept)
    }
}
