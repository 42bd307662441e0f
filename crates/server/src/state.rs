use std::sync::Arc;

use mirador_catalog::cache::CatalogCache;
use mirador_catalog::genres::GenreMaps;
use sqlx::SqlitePool;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub cache: Arc<CatalogCache>,
    pub genre_maps: Arc<GenreMaps>,
    pub http: reqwest::Client,
    /// Base URL poster path fragments are resolved against.
    pub image_base: String,
}
