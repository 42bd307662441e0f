//! Time-bounded snapshot cache.
//!
//! Explicit cache object keyed by the single catalog: holds the latest
//! immutable snapshot plus its load instant, with an expiry check on
//! each access. Refresh swaps in a new `Arc`; readers holding the old
//! snapshot are unaffected.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use sqlx::SqlitePool;
use tokio::sync::RwLock;
use tracing::info;

use crate::CatalogError;
use crate::load::{CatalogSnapshot, load_snapshot};

pub const DEFAULT_TTL: Duration = Duration::from_secs(1800);

struct Cached {
    snapshot: Arc<CatalogSnapshot>,
    loaded_at: Instant,
}

pub struct CatalogCache {
    ttl: Duration,
    logos_path: Option<PathBuf>,
    slot: RwLock<Option<Cached>>,
}

impl CatalogCache {
    pub fn new(ttl: Duration, logos_path: Option<PathBuf>) -> Self {
        Self {
            ttl,
            logos_path,
            slot: RwLock::new(None),
        }
    }

    /// Return the cached snapshot, reloading it when expired or absent.
    pub async fn snapshot(&self, pool: &SqlitePool) -> Result<Arc<CatalogSnapshot>, CatalogError> {
        {
            let guard = self.slot.read().await;
            if let Some(cached) = guard.as_ref() {
                if cached.loaded_at.elapsed() < self.ttl {
                    return Ok(cached.snapshot.clone());
                }
            }
        }

        let mut guard = self.slot.write().await;
        // Another task may have refreshed while we waited for the lock.
        if let Some(cached) = guard.as_ref() {
            if cached.loaded_at.elapsed() < self.ttl {
                return Ok(cached.snapshot.clone());
            }
        }

        info!("refreshing catalog snapshot");
        let snapshot = Arc::new(load_snapshot(pool, self.logos_path.as_deref()).await?);
        *guard = Some(Cached {
            snapshot: snapshot.clone(),
            loaded_at: Instant::now(),
        });
        Ok(snapshot)
    }

    /// Drop the cached snapshot so the next access reloads.
    pub async fn invalidate(&self) {
        let mut guard = self.slot.write().await;
        *guard = None;
    }
}
