use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use mirador_catalog::cache::{CatalogCache, DEFAULT_TTL};
use mirador_catalog::genres::GenreMaps;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    // DB path: use MIRADOR_DB env or default
    let db_path = std::env::var("MIRADOR_DB").unwrap_or_else(|_| "mirador.db".to_string());
    info!(db_path = %db_path, "connecting to database");

    let pool = mirador_db::connect(&db_path)
        .await
        .context("failed to connect to database")?;

    // Run migrations
    mirador_db::migrate::run(&pool)
        .await
        .context("failed to run migrations")?;
    info!("migrations complete");

    // Genre lookup files. A misconfigured path is fatal; an unset one
    // degrades to raw-code labels.
    let genre_maps = match (
        std::env::var("MIRADOR_MOVIE_GENRES").ok(),
        std::env::var("MIRADOR_SERIES_GENRES").ok(),
    ) {
        (Some(movie), Some(series)) => {
            GenreMaps::load(movie.as_ref(), series.as_ref())
                .context("failed to load genre lookup files")?
        }
        (None, None) => {
            warn!("MIRADOR_MOVIE_GENRES/MIRADOR_SERIES_GENRES unset, genre codes will show raw");
            GenreMaps::default()
        }
        _ => anyhow::bail!(
            "MIRADOR_MOVIE_GENRES and MIRADOR_SERIES_GENRES must be set together"
        ),
    };

    // Provider logo CSV is optional; the loader degrades to no logos.
    let logos_path = std::env::var("MIRADOR_LOGOS").ok().map(PathBuf::from);

    let ttl_secs: u64 = std::env::var("MIRADOR_CACHE_TTL_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_TTL.as_secs());
    let cache = Arc::new(CatalogCache::new(Duration::from_secs(ttl_secs), logos_path));

    let image_base = std::env::var("MIRADOR_IMAGE_BASE")
        .unwrap_or_else(|_| mirador_server::poster::DEFAULT_IMAGE_BASE.to_string());

    let app_state = mirador_server::state::AppState {
        db: pool,
        cache,
        genre_maps: Arc::new(genre_maps),
        http: reqwest::Client::new(),
        image_base,
    };

    let app = mirador_server::routes::build_router(app_state);

    let bind_addr = std::env::var("MIRADOR_BIND").unwrap_or_else(|_| "0.0.0.0:8602".to_string());
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .context("failed to bind")?;
    info!(addr = %bind_addr, "server listening");

    axum::serve(listener, app).await?;
    Ok(())
}
