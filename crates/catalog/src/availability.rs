//! Availability resolver: groups a title's raw offer rows by provider
//! into a display-ready structure.

use serde::Serialize;

use mirador_core::types::{MediaKind, TitleKey, offer_label};

use crate::load::CatalogSnapshot;

/// Grouped availability for one title. `None` means no usable offer
/// rows existed at all, which the UI renders differently from an empty
/// provider list left over after grouping.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Availability {
    None,
    Available { providers: Vec<ProviderAvailability> },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderAvailability {
    pub provider: String,
    pub logo_url: Option<String>,
    #[serde(flatten)]
    pub detail: AvailabilityDetail,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AvailabilityDetail {
    /// Movie offer-kind labels, deduplicated, in encounter order.
    Offers(Vec<String>),
    /// Season numbers, deduplicated, ascending. Null seasons were
    /// dropped before grouping.
    Seasons(Vec<i64>),
}

/// Resolve grouped availability for one title.
pub fn resolve(snapshot: &CatalogSnapshot, key: TitleKey) -> Availability {
    match key.kind {
        MediaKind::Movie => resolve_movie(snapshot, key.id),
        MediaKind::Series => resolve_series(snapshot, key.id),
    }
}

fn resolve_movie(snapshot: &CatalogSnapshot, id: i64) -> Availability {
    let rows: Vec<(&str, Option<&str>)> = snapshot
        .movie_offers
        .iter()
        .filter(|o| o.title_id == id)
        .filter_map(|o| {
            let provider = o.provider.as_deref()?;
            if provider.trim().is_empty() {
                return None;
            }
            Some((provider, o.offer_kind.as_deref()))
        })
        .collect();

    if rows.is_empty() {
        return Availability::None;
    }

    // Group by normalized provider name, preserving encounter order.
    let mut groups: Vec<(String, Vec<String>)> = Vec::new();
    for (provider, offer_kind) in rows {
        let name = normalize_provider(provider);
        let idx = match groups.iter().position(|(p, _)| *p == name) {
            Some(i) => i,
            None => {
                groups.push((name, Vec::new()));
                groups.len() - 1
            }
        };
        if let Some(raw) = offer_kind {
            let label = offer_label(raw);
            if !groups[idx].1.contains(&label) {
                groups[idx].1.push(label);
            }
        }
    }

    Availability::Available {
        providers: groups
            .into_iter()
            .map(|(provider, offers)| ProviderAvailability {
                logo_url: snapshot.logos.url_for(&provider).map(str::to_string),
                provider,
                detail: AvailabilityDetail::Offers(offers),
            })
            .collect(),
    }
}

fn resolve_series(snapshot: &CatalogSnapshot, id: i64) -> Availability {
    let rows: Vec<(&str, Option<i64>)> = snapshot
        .season_offers
        .iter()
        .filter(|o| o.title_id == id)
        .filter_map(|o| {
            let provider = o.provider.as_deref()?;
            if provider.trim().is_empty() {
                return None;
            }
            Some((provider, o.season))
        })
        .collect();

    if rows.is_empty() {
        return Availability::None;
    }

    // Null seasons are dropped before grouping, so a provider offering
    // only null seasons vanishes — legitimately leaving an empty list,
    // which is distinct from `Availability::None`.
    let mut groups: Vec<(String, Vec<i64>)> = Vec::new();
    for (provider, season) in rows {
        let Some(season) = season else { continue };
        match groups.iter_mut().find(|(p, _)| p == provider) {
            Some((_, seasons)) => {
                if !seasons.contains(&season) {
                    seasons.push(season);
                }
            }
            None => groups.push((provider.to_string(), vec![season])),
        }
    }

    Availability::Available {
        providers: groups
            .into_iter()
            .map(|(provider, mut seasons)| {
                seasons.sort_unstable();
                ProviderAvailability {
                    logo_url: snapshot.logos.url_for(&provider).map(str::to_string),
                    provider,
                    detail: AvailabilityDetail::Seasons(seasons),
                }
            })
            .collect(),
    }
}

/// Collapse whitespace runs and trim.
fn normalize_provider(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}
