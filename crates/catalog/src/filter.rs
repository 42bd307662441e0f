//! Filter engine: applies a conjunction of predicates to the unified
//! table and pages the result.

use serde::Serialize;

use mirador_core::types::MediaKind;

use crate::genres::GenreMaps;
use crate::load::{CatalogSnapshot, Title};

pub const PAGE_SIZE: usize = 10;

/// Provider predicate: a specific provider, or the "any" sentinel that
/// disables the predicate.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ProviderFilter {
    #[default]
    Any,
    Named(String),
}

impl ProviderFilter {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            None => Self::Any,
            Some(s) if s.is_empty() || s.eq_ignore_ascii_case("any") => Self::Any,
            Some(s) => Self::Named(s.to_string()),
        }
    }
}

/// Immutable per-request filter configuration. Built once from the
/// resolved control values; the engine never mutates it.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterSpec {
    pub kind: MediaKind,
    pub text: Option<String>,
    pub year_range: Option<(i16, i16)>,
    pub rating_range: Option<(f32, f32)>,
    pub vote_range: Option<(i32, i32)>,
    pub genres: Vec<String>,
    pub provider: ProviderFilter,
}

impl FilterSpec {
    /// The documented reset state for a media kind.
    pub fn defaults(kind: MediaKind) -> Self {
        Self {
            kind,
            text: None,
            year_range: Some((1900, current_year())),
            rating_range: Some((0.0, 10.0)),
            vote_range: Some((0, i32::MAX)),
            genres: Vec::new(),
            provider: ProviderFilter::Any,
        }
    }
}

pub fn current_year() -> i16 {
    use chrono::Datelike;
    chrono::Utc::now().year() as i16
}

/// Apply every active predicate (logical AND across categories; OR
/// within the genre set) and return the surviving rows in catalog
/// order.
pub fn apply<'a>(
    snapshot: &'a CatalogSnapshot,
    maps: &GenreMaps,
    spec: &FilterSpec,
) -> Vec<&'a Title> {
    let text = spec
        .text
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase);

    let provider_ids = match &spec.provider {
        ProviderFilter::Any => None,
        ProviderFilter::Named(name) => Some(snapshot.provider_title_ids(spec.kind, name)),
    };

    let genre_map = maps.for_kind(spec.kind);

    snapshot
        .titles_of(spec.kind)
        .filter(|title| {
            if let Some(needle) = &text {
                if !matches_text(title, needle) {
                    return false;
                }
            }
            if !in_range(title.release_year, spec.year_range) {
                return false;
            }
            if !in_range(title.rating, spec.rating_range) {
                return false;
            }
            if !in_range(title.votes, spec.vote_range) {
                return false;
            }
            if !spec.genres.is_empty() {
                let mapped = title.genres.mapped(genre_map);
                if !mapped.iter().any(|g| spec.genres.contains(g)) {
                    return false;
                }
            }
            if let Some(ids) = &provider_ids {
                if !ids.contains(&title.id) {
                    return false;
                }
            }
            true
        })
        .collect()
}

fn matches_text(title: &Title, needle: &str) -> bool {
    if title.title.to_lowercase().contains(needle) {
        return true;
    }
    title
        .original_title
        .as_deref()
        .is_some_and(|t| t.to_lowercase().contains(needle))
}

/// Inclusive range check. An inactive range always passes; a missing
/// value always fails an active range.
fn in_range<T: PartialOrd>(value: Option<T>, range: Option<(T, T)>) -> bool {
    match range {
        None => true,
        Some((lo, hi)) => match value {
            Some(v) => v >= lo && v <= hi,
            None => false,
        },
    }
}

/// One page of results. An empty result is a valid terminal state
/// ("no results found"), reported as one empty page.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub total_pages: usize,
    pub total: usize,
}

/// Slice a filtered view into a 1-based page, clamping out-of-range
/// page numbers instead of erroring.
pub fn paginate<T>(rows: Vec<T>, page: usize) -> Page<T> {
    let total = rows.len();
    let total_pages = if total == 0 {
        1
    } else {
        (total - 1) / PAGE_SIZE + 1
    };
    let page = page.clamp(1, total_pages);
    let start = (page - 1) * PAGE_SIZE;

    let items = rows
        .into_iter()
        .skip(start)
        .take(PAGE_SIZE)
        .collect::<Vec<_>>();

    Page {
        items,
        page,
        total_pages,
        total,
    }
}
