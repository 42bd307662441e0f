//! Catalog loader: coerces the two heterogeneous title tables into one
//! unified in-memory table and carries the raw availability tables and
//! the logo lookup alongside it.

use std::collections::HashSet;
use std::path::Path;

use sqlx::SqlitePool;
use tracing::{info, warn};

use mirador_core::types::{MediaKind, TitleKey};
use mirador_db::repo::availability::{MovieOfferRow, SeasonOfferRow};
use mirador_db::repo::titles::{MovieRow, SeriesRow};

use crate::CatalogError;
use crate::genres::GenreCodes;
use crate::logos::LogoTable;

/// Unified title record. Rating and vote count are deliberately compact
/// (`f32` / `i32`), mirroring the source downcast; nothing relies on it
/// for correctness.
#[derive(Debug, Clone)]
pub struct Title {
    pub id: i64,
    pub kind: MediaKind,
    pub title: String,
    pub original_title: Option<String>,
    pub language: Option<String>,
    pub release_year: Option<i16>,
    pub rating: Option<f32>,
    pub votes: Option<i32>,
    pub poster_path: Option<String>,
    pub popularity: f64,
    pub genres: GenreCodes,
}

impl Title {
    pub fn key(&self) -> TitleKey {
        TitleKey::new(self.kind, self.id)
    }
}

/// Immutable catalog snapshot: everything a request needs, loaded in
/// one pass and shared behind an `Arc`.
#[derive(Debug, Clone)]
pub struct CatalogSnapshot {
    pub titles: Vec<Title>,
    pub movie_offers: Vec<MovieOfferRow>,
    pub season_offers: Vec<SeasonOfferRow>,
    pub logos: LogoTable,
}

impl CatalogSnapshot {
    pub fn titles_of(&self, kind: MediaKind) -> impl Iterator<Item = &Title> {
        self.titles.iter().filter(move |t| t.kind == kind)
    }

    pub fn get(&self, key: TitleKey) -> Option<&Title> {
        self.titles
            .iter()
            .find(|t| t.kind == key.kind && t.id == key.id)
    }

    /// Sorted distinct provider names across both availability tables
    /// (the provider-selector source).
    pub fn provider_names(&self) -> Vec<String> {
        let mut names: HashSet<&str> = HashSet::new();
        for offer in &self.movie_offers {
            if let Some(p) = offer.provider.as_deref() {
                if !p.trim().is_empty() {
                    names.insert(p);
                }
            }
        }
        for offer in &self.season_offers {
            if let Some(p) = offer.provider.as_deref() {
                if !p.trim().is_empty() {
                    names.insert(p);
                }
            }
        }
        let mut out: Vec<String> = names.into_iter().map(str::to_string).collect();
        out.sort();
        out
    }

    /// Title IDs carried by a provider, selected by media kind. The
    /// kind keeps colliding movie/series IDs from cross-joining.
    pub fn provider_title_ids(&self, kind: MediaKind, provider: &str) -> HashSet<i64> {
        match kind {
            MediaKind::Movie => self
                .movie_offers
                .iter()
                .filter(|o| o.provider.as_deref() == Some(provider))
                .map(|o| o.title_id)
                .collect(),
            MediaKind::Series => self
                .season_offers
                .iter()
                .filter(|o| o.provider.as_deref() == Some(provider))
                .map(|o| o.title_id)
                .collect(),
        }
    }
}

/// Load a fresh snapshot. A database failure is fatal (no partial
/// catalog); a missing or unreadable logo file degrades to an empty
/// logo table since logos are cosmetic.
pub async fn load_snapshot(
    pool: &SqlitePool,
    logos_path: Option<&Path>,
) -> Result<CatalogSnapshot, CatalogError> {
    let movies = mirador_db::repo::titles::fetch_movies(pool).await?;
    let series = mirador_db::repo::titles::fetch_series(pool).await?;

    let mut titles = Vec::with_capacity(movies.len() + series.len());
    titles.extend(movies.into_iter().filter_map(movie_to_title));
    titles.extend(series.into_iter().filter_map(series_to_title));

    let movie_offers = mirador_db::repo::availability::fetch_movie_offers(pool).await?;
    let season_offers = mirador_db::repo::availability::fetch_season_offers(pool).await?;

    let logos = match logos_path {
        Some(path) => match LogoTable::load(path) {
            Ok(table) => table,
            Err(e) => {
                warn!(error = %e, "logo lookup unavailable, rendering without logos");
                LogoTable::empty()
            }
        },
        None => LogoTable::empty(),
    };

    info!(
        titles = titles.len(),
        movie_offers = movie_offers.len(),
        season_offers = season_offers.len(),
        logos = logos.len(),
        "catalog snapshot loaded"
    );

    Ok(CatalogSnapshot {
        titles,
        movie_offers,
        season_offers,
        logos,
    })
}

fn movie_to_title(row: MovieRow) -> Option<Title> {
    let title = non_blank(row.title)?;
    Some(Title {
        id: row.id,
        kind: MediaKind::Movie,
        title,
        original_title: non_blank(row.original_title),
        language: non_blank(row.original_language),
        release_year: row.release_date.as_deref().and_then(year_from_date),
        rating: row.vote_average.map(|r| r as f32),
        votes: row.vote_count.map(|v| v as i32),
        poster_path: non_blank(row.poster_path),
        popularity: row.popularity,
        genres: GenreCodes::parse(row.genre_ids.as_deref()),
    })
}

fn series_to_title(row: SeriesRow) -> Option<Title> {
    let title = non_blank(row.name)?;
    Some(Title {
        id: row.id,
        kind: MediaKind::Series,
        title,
        original_title: non_blank(row.original_name),
        language: non_blank(row.original_language),
        release_year: row.first_air_year.map(|y| y as i16),
        rating: row.vote_average.map(|r| r as f32),
        votes: row.vote_count.map(|v| v as i32),
        poster_path: non_blank(row.poster_path),
        popularity: row.popularity,
        genres: GenreCodes::parse(row.genre_ids.as_deref()),
    })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

fn year_from_date(date: &str) -> Option<i16> {
    date.get(..4).and_then(|y| y.parse().ok())
}
