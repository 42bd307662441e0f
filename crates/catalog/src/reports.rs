//! Aggregation reporters: independent, stateless group-by transforms
//! over the snapshot (or a filtered view) that feed the chart layer.
//!
//! Top-N ordering is deterministic everywhere: metric descending, then
//! key ascending.

use std::collections::HashMap;

use serde::Serialize;

use mirador_core::types::MediaKind;

use crate::genres::GenreMaps;
use crate::load::{CatalogSnapshot, Title};

pub const TOP_PROVIDERS: usize = 15;
pub const TOP_GENRES: usize = 10;
pub const TOP_LANGUAGES: usize = 10;
pub const TOP_TITLES: usize = 10;

/// Minimum vote count for the best-rated listing.
pub const TOP_RATED_MIN_VOTES: i32 = 100;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountRow {
    pub key: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeanRow {
    pub key: String,
    pub mean: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearCount {
    pub year: i16,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearMean {
    pub year: i16,
    pub mean: f64,
}

/// Offer rows per provider for the selected kind, top 15.
pub fn top_providers(snapshot: &CatalogSnapshot, kind: MediaKind) -> Vec<CountRow> {
    let mut counts: HashMap<String, u64> = HashMap::new();
    match kind {
        MediaKind::Movie => {
            for offer in &snapshot.movie_offers {
                if let Some(p) = offer.provider.as_deref() {
                    if !p.trim().is_empty() {
                        *counts.entry(p.to_string()).or_default() += 1;
                    }
                }
            }
        }
        MediaKind::Series => {
            for offer in &snapshot.season_offers {
                if let Some(p) = offer.provider.as_deref() {
                    if !p.trim().is_empty() {
                        *counts.entry(p.to_string()).or_default() += 1;
                    }
                }
            }
        }
    }
    top_counts(counts, TOP_PROVIDERS)
}

/// Exploded mapped genre labels for the selected kind, top 10.
pub fn top_genres(snapshot: &CatalogSnapshot, maps: &GenreMaps, kind: MediaKind) -> Vec<CountRow> {
    let map = maps.for_kind(kind);
    let mut counts: HashMap<String, u64> = HashMap::new();
    for title in snapshot.titles_of(kind) {
        for label in title.genres.mapped(map) {
            *counts.entry(label).or_default() += 1;
        }
    }
    top_counts(counts, TOP_GENRES)
}

/// Mean rating per mapped genre label, keyed ascending.
pub fn rating_by_genre(
    snapshot: &CatalogSnapshot,
    maps: &GenreMaps,
    kind: MediaKind,
) -> Vec<MeanRow> {
    let map = maps.for_kind(kind);
    let mut sums: HashMap<String, (f64, u64)> = HashMap::new();
    for title in snapshot.titles_of(kind) {
        let Some(rating) = title.rating else { continue };
        for label in title.genres.mapped(map) {
            let entry = sums.entry(label).or_default();
            entry.0 += f64::from(rating);
            entry.1 += 1;
        }
    }

    let mut out: Vec<MeanRow> = sums
        .into_iter()
        .map(|(key, (sum, n))| MeanRow {
            key,
            mean: sum / n as f64,
        })
        .collect();
    out.sort_by(|a, b| a.key.cmp(&b.key));
    out
}

/// Titles per release year, ascending year.
pub fn titles_per_year(snapshot: &CatalogSnapshot, kind: MediaKind) -> Vec<YearCount> {
    let mut counts: HashMap<i16, u64> = HashMap::new();
    for title in snapshot.titles_of(kind) {
        if let Some(year) = title.release_year {
            *counts.entry(year).or_default() += 1;
        }
    }
    let mut out: Vec<YearCount> = counts
        .into_iter()
        .map(|(year, count)| YearCount { year, count })
        .collect();
    out.sort_by_key(|r| r.year);
    out
}

/// Mean rating per release year, ascending year.
pub fn rating_by_year(snapshot: &CatalogSnapshot, kind: MediaKind) -> Vec<YearMean> {
    let mut sums: HashMap<i16, (f64, u64)> = HashMap::new();
    for title in snapshot.titles_of(kind) {
        let (Some(year), Some(rating)) = (title.release_year, title.rating) else {
            continue;
        };
        let entry = sums.entry(year).or_default();
        entry.0 += f64::from(rating);
        entry.1 += 1;
    }
    let mut out: Vec<YearMean> = sums
        .into_iter()
        .map(|(year, (sum, n))| YearMean {
            year,
            mean: sum / n as f64,
        })
        .collect();
    out.sort_by_key(|r| r.year);
    out
}

/// Original-language codes for the selected kind, top 10.
pub fn top_languages(snapshot: &CatalogSnapshot, kind: MediaKind) -> Vec<CountRow> {
    let mut counts: HashMap<String, u64> = HashMap::new();
    for title in snapshot.titles_of(kind) {
        if let Some(lang) = title.language.as_deref() {
            *counts.entry(lang.to_string()).or_default() += 1;
        }
    }
    top_counts(counts, TOP_LANGUAGES)
}

/// Top 10 of a filtered view by popularity.
pub fn top_popular<'a>(rows: &[&'a Title]) -> Vec<&'a Title> {
    let mut out: Vec<&Title> = rows.to_vec();
    out.sort_by(|a, b| {
        b.popularity
            .total_cmp(&a.popularity)
            .then_with(|| a.title.cmp(&b.title))
    });
    out.truncate(TOP_TITLES);
    out
}

/// Top 10 of a filtered view by rating, among titles with more than
/// 100 votes.
pub fn top_rated<'a>(rows: &[&'a Title]) -> Vec<&'a Title> {
    let mut out: Vec<&Title> = rows
        .iter()
        .copied()
        .filter(|t| t.votes.is_some_and(|v| v > TOP_RATED_MIN_VOTES))
        .collect();
    out.sort_by(|a, b| {
        let ra = a.rating.unwrap_or(0.0);
        let rb = b.rating.unwrap_or(0.0);
        rb.total_cmp(&ra).then_with(|| a.title.cmp(&b.title))
    });
    out.truncate(TOP_TITLES);
    out
}

fn top_counts(counts: HashMap<String, u64>, n: usize) -> Vec<CountRow> {
    let mut out: Vec<CountRow> = counts
        .into_iter()
        .map(|(key, count)| CountRow { key, count })
        .collect();
    out.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.key.cmp(&b.key)));
    out.truncate(n);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genres::{GenreCodes, GenreMap};
    use crate::logos::LogoTable;
    use mirador_db::repo::availability::MovieOfferRow;

    fn title(id: i64, name: &str, year: i16, rating: f32, votes: i32, genres: &[&str]) -> Title {
        Title {
            id,
            kind: MediaKind::Movie,
            title: name.to_string(),
            original_title: None,
            language: Some("en".into()),
            release_year: Some(year),
            rating: Some(rating),
            votes: Some(votes),
            poster_path: None,
            popularity: id as f64,
            genres: GenreCodes::Codes(genres.iter().map(|g| g.to_string()).collect()),
        }
    }

    fn snapshot() -> CatalogSnapshot {
        CatalogSnapshot {
            titles: vec![
                title(1, "A", 2000, 8.0, 500, &["35"]),
                title(2, "B", 2000, 6.0, 50, &["35", "18"]),
                title(3, "C", 2001, 7.0, 200, &["18"]),
            ],
            movie_offers: vec![
                MovieOfferRow {
                    title_id: 1,
                    provider: Some("Netflix".into()),
                    offer_kind: Some("flatrate".into()),
                },
                MovieOfferRow {
                    title_id: 2,
                    provider: Some("Netflix".into()),
                    offer_kind: Some("rent".into()),
                },
                MovieOfferRow {
                    title_id: 3,
                    provider: Some("Max".into()),
                    offer_kind: Some("flatrate".into()),
                },
            ],
            season_offers: vec![],
            logos: LogoTable::empty(),
        }
    }

    fn maps() -> GenreMaps {
        GenreMaps {
            movie: GenreMap::from_pairs([("35", "Comedy"), ("18", "Drama")]),
            series: GenreMap::default(),
        }
    }

    #[test]
    fn top_providers_sorts_desc_with_name_tiebreak() {
        let rows = top_providers(&snapshot(), MediaKind::Movie);
        assert_eq!(rows[0].key, "Netflix");
        assert_eq!(rows[0].count, 2);
        assert_eq!(rows[1].key, "Max");
    }

    #[test]
    fn top_genres_explodes_multi_genre_titles() {
        let rows = top_genres(&snapshot(), &maps(), MediaKind::Movie);
        // Comedy and Drama both appear twice; tie broken by name.
        assert_eq!(rows[0].key, "Comedy");
        assert_eq!(rows[0].count, 2);
        assert_eq!(rows[1].key, "Drama");
        assert_eq!(rows[1].count, 2);
    }

    #[test]
    fn rating_by_genre_means() {
        let rows = rating_by_genre(&snapshot(), &maps(), MediaKind::Movie);
        let comedy = rows.iter().find(|r| r.key == "Comedy").unwrap();
        assert!((comedy.mean - 7.0).abs() < 1e-9);
        let drama = rows.iter().find(|r| r.key == "Drama").unwrap();
        assert!((drama.mean - 6.5).abs() < 1e-9);
    }

    #[test]
    fn titles_per_year_ascending() {
        let rows = titles_per_year(&snapshot(), MediaKind::Movie);
        assert_eq!(rows.len(), 2);
        assert_eq!((rows[0].year, rows[0].count), (2000, 2));
        assert_eq!((rows[1].year, rows[1].count), (2001, 1));
    }

    #[test]
    fn top_rated_requires_vote_floor() {
        let snap = snapshot();
        let view: Vec<&Title> = snap.titles.iter().collect();
        let rows = top_rated(&view);
        // Title B has only 50 votes and is excluded.
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].title, "A");
        assert_eq!(rows[1].title, "C");
    }

    #[test]
    fn top_popular_is_bounded_and_descending() {
        let snap = snapshot();
        let view: Vec<&Title> = snap.titles.iter().collect();
        let rows = top_popular(&view);
        assert!(rows.len() <= TOP_TITLES);
        assert_eq!(rows[0].title, "C");
    }
}
