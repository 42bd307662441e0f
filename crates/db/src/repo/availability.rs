use sqlx::SqlitePool;

/// Raw per-movie provider offer. Loaded without transformation;
/// consumers normalize provider names as needed.
#[derive(Debug, Clone, serde::Serialize)]
pub struct MovieOfferRow {
    pub title_id: i64,
    pub provider: Option<String>,
    pub offer_kind: Option<String>,
}

/// Raw per-series-season provider offer. `season` is nullable in the
/// source data and must be dropped before grouping.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SeasonOfferRow {
    pub title_id: i64,
    pub provider: Option<String>,
    pub season: Option<i64>,
}

pub async fn fetch_movie_offers(pool: &SqlitePool) -> Result<Vec<MovieOfferRow>, sqlx::Error> {
    let rows: Vec<(i64, Option<String>, Option<String>)> =
        sqlx::query_as("SELECT title_id, provider, offer_kind FROM movie_offer")
            .fetch_all(pool)
            .await?;

    Ok(rows
        .into_iter()
        .map(|(title_id, provider, offer_kind)| MovieOfferRow {
            title_id,
            provider,
            offer_kind,
        })
        .collect())
}

pub async fn fetch_season_offers(pool: &SqlitePool) -> Result<Vec<SeasonOfferRow>, sqlx::Error> {
    let rows: Vec<(i64, Option<String>, Option<i64>)> =
        sqlx::query_as("SELECT title_id, provider, season FROM series_season_offer")
            .fetch_all(pool)
            .await?;

    Ok(rows
        .into_iter()
        .map(|(title_id, provider, season)| SeasonOfferRow {
            title_id,
            provider,
            season,
        })
        .collect())
}
