use serde::{Deserialize, Serialize};

/// Catalog entry kind. Movie and series IDs come from independent
/// namespaces, so a bare numeric ID is never a full identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Movie,
    Series,
}

impl MediaKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Movie => "movie",
            Self::Series => "series",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "movie" => Some(Self::Movie),
            "series" => Some(Self::Series),
            _ => None,
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Composite title identity: (kind, id). Availability joins must always
/// go through this key, never the numeric ID alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TitleKey {
    pub kind: MediaKind,
    pub id: i64,
}

impl TitleKey {
    pub fn new(kind: MediaKind, id: i64) -> Self {
        Self { kind, id }
    }
}

impl std::fmt::Display for TitleKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.kind, self.id)
    }
}

/// How a provider makes a movie available. Stored in the
/// `movie_offer.offer_kind` column using the raw source codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfferKind {
    Subscription,
    Rental,
    Purchase,
    Free,
    AdSupported,
}

impl OfferKind {
    /// Raw code as stored by the ETL.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Subscription => "flatrate",
            Self::Rental => "rent",
            Self::Purchase => "buy",
            Self::Free => "free",
            Self::AdSupported => "ads",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "flatrate" => Some(Self::Subscription),
            "rent" => Some(Self::Rental),
            "buy" => Some(Self::Purchase),
            "free" => Some(Self::Free),
            "ads" => Some(Self::AdSupported),
            _ => None,
        }
    }

    /// Display label for availability listings.
    pub fn label(self) -> &'static str {
        match self {
            Self::Subscription => "subscription",
            Self::Rental => "rental",
            Self::Purchase => "purchase",
            Self::Free => "free",
            Self::AdSupported => "ad-supported",
        }
    }
}

impl std::fmt::Display for OfferKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display label for a raw offer-kind cell; unknown codes pass through.
pub fn offer_label(raw: &str) -> String {
    match OfferKind::parse(raw) {
        Some(kind) => kind.label().to_string(),
        None => raw.to_string(),
    }
}
