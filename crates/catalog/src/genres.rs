//! Genre-code maps and the strict genre-cell parser.
//!
//! The ETL stores each title's genres as a serialized list of codes
//! (e.g. `[16, 35]`). Codes are mapped to human-readable labels through
//! a per-kind JSON lookup; unmapped codes fall back to the raw code.

use std::collections::HashMap;
use std::path::Path;

use mirador_core::types::MediaKind;

use crate::CatalogError;

/// Parse result for a raw genre cell. Malformed cells recover to
/// `Unparsed` instead of failing the row; an `Unparsed` cell maps to an
/// empty genre set everywhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenreCodes {
    Codes(Vec<String>),
    Unparsed,
}

impl GenreCodes {
    /// Strictly parse a genre cell. Accepts a JSON list of numbers or
    /// strings, or a single scalar; anything else is `Unparsed`.
    pub fn parse(cell: Option<&str>) -> Self {
        let Some(raw) = cell else {
            return Self::Unparsed;
        };
        let raw = raw.trim();
        if raw.is_empty() {
            return Self::Unparsed;
        }

        let Ok(value) = serde_json::from_str::<serde_json::Value>(raw) else {
            return Self::Unparsed;
        };

        match value {
            serde_json::Value::Array(items) => {
                let mut codes = Vec::with_capacity(items.len());
                for item in items {
                    match scalar_code(&item) {
                        Some(code) => codes.push(code),
                        None => return Self::Unparsed,
                    }
                }
                Self::Codes(codes)
            }
            scalar => match scalar_code(&scalar) {
                Some(code) => Self::Codes(vec![code]),
                None => Self::Unparsed,
            },
        }
    }

    /// Map codes through a genre map. `Unparsed` yields the empty set.
    pub fn mapped(&self, map: &GenreMap) -> Vec<String> {
        match self {
            Self::Codes(codes) => codes.iter().map(|c| map.label_for(c)).collect(),
            Self::Unparsed => Vec::new(),
        }
    }
}

fn scalar_code(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::String(s) => Some(s.clone()),
        _ => None,
    }
}

/// Code → label lookup for one media kind.
#[derive(Debug, Clone, Default)]
pub struct GenreMap {
    labels: HashMap<String, String>,
}

impl GenreMap {
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            labels: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Load from a JSON object file: `{ "16": "Animation", … }`.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let data = std::fs::read_to_string(path)
            .map_err(|e| CatalogError::Lookup(format!("read {}: {e}", path.display())))?;
        let labels: HashMap<String, String> = serde_json::from_str(&data)
            .map_err(|e| CatalogError::Lookup(format!("parse {}: {e}", path.display())))?;
        Ok(Self { labels })
    }

    /// Label for a code; unmapped codes pass through unchanged.
    pub fn label_for(&self, code: &str) -> String {
        self.labels
            .get(code)
            .cloned()
            .unwrap_or_else(|| code.to_string())
    }

    /// Sorted distinct labels (multi-select source for the UI).
    pub fn labels(&self) -> Vec<String> {
        let mut out: Vec<String> = self.labels.values().cloned().collect();
        out.sort();
        out.dedup();
        out
    }
}

/// One genre map per media kind.
#[derive(Debug, Clone, Default)]
pub struct GenreMaps {
    pub movie: GenreMap,
    pub series: GenreMap,
}

impl GenreMaps {
    pub fn load(movie_path: &Path, series_path: &Path) -> Result<Self, CatalogError> {
        Ok(Self {
            movie: GenreMap::load(movie_path)?,
            series: GenreMap::load(series_path)?,
        })
    }

    pub fn for_kind(&self, kind: MediaKind) -> &GenreMap {
        match kind {
            MediaKind::Movie => &self.movie,
            MediaKind::Series => &self.series,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map() -> GenreMap {
        GenreMap::from_pairs([("16", "Animation"), ("35", "Comedy")])
    }

    #[test]
    fn parses_json_list_of_codes() {
        assert_eq!(
            GenreCodes::parse(Some("[16, 35]")),
            GenreCodes::Codes(vec!["16".into(), "35".into()])
        );
    }

    #[test]
    fn parses_scalar_cell() {
        assert_eq!(
            GenreCodes::parse(Some("16")),
            GenreCodes::Codes(vec!["16".into()])
        );
    }

    #[test]
    fn malformed_cell_recovers_to_unparsed() {
        assert_eq!(GenreCodes::parse(Some("[16, oops")), GenreCodes::Unparsed);
        assert_eq!(GenreCodes::parse(Some("{\"a\": 1}")), GenreCodes::Unparsed);
        assert_eq!(GenreCodes::parse(Some("   ")), GenreCodes::Unparsed);
        assert_eq!(GenreCodes::parse(None), GenreCodes::Unparsed);
    }

    #[test]
    fn unparsed_maps_to_empty_set() {
        assert!(GenreCodes::Unparsed.mapped(&map()).is_empty());
    }

    #[test]
    fn unmapped_codes_fall_through() {
        let codes = GenreCodes::parse(Some("[16, 99]"));
        assert_eq!(codes.mapped(&map()), vec!["Animation", "99"]);
    }

    #[test]
    fn labels_are_sorted_and_distinct() {
        let map = GenreMap::from_pairs([("1", "Drama"), ("2", "Comedy"), ("3", "Drama")]);
        assert_eq!(map.labels(), vec!["Comedy", "Drama"]);
    }
}
