//! Provider-logo lookup, loaded from a `Provider,Logo_URL` CSV.

use std::collections::HashMap;
use std::path::Path;

use tracing::warn;

use crate::CatalogError;

/// Provider name → logo URL. At most one entry per provider; absence is
/// a valid state (render without a logo).
#[derive(Debug, Clone, Default)]
pub struct LogoTable {
    urls: HashMap<String, String>,
}

impl LogoTable {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut table = Self::default();
        for (k, v) in pairs {
            table.urls.entry(k.into()).or_insert_with(|| v.into());
        }
        table
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| CatalogError::Lookup(format!("read {}: {e}", path.display())))?;
        Ok(Self::parse_csv(&contents))
    }

    /// Parse CSV content. Malformed rows are skipped, and the first
    /// occurrence wins when a provider appears twice.
    pub fn parse_csv(content: &str) -> Self {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(content.as_bytes());

        let mut urls = HashMap::new();
        for result in reader.records() {
            let record = match result {
                Ok(r) => r,
                Err(e) => {
                    warn!(error = %e, "skipping malformed logo CSV row");
                    continue;
                }
            };

            let provider = record.get(0).unwrap_or("").trim();
            let url = record.get(1).unwrap_or("").trim();
            if provider.is_empty() || url.is_empty() {
                continue;
            }
            urls.entry(provider.to_string())
                .or_insert_with(|| url.to_string());
        }

        Self { urls }
    }

    pub fn url_for(&self, provider: &str) -> Option<&str> {
        self.urls.get(provider).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}
