use sqlx::SqlitePool;

/// Raw movie row as stored by the ETL. `release_date` keeps full
/// `YYYY-MM-DD` granularity; the loader derives the year.
#[derive(Debug, Clone, serde::Serialize)]
pub struct MovieRow {
    pub id: i64,
    pub title: Option<String>,
    pub original_title: Option<String>,
    pub original_language: Option<String>,
    pub release_date: Option<String>,
    pub vote_average: Option<f64>,
    pub vote_count: Option<i64>,
    pub poster_path: Option<String>,
    pub popularity: f64,
    pub genre_ids: Option<String>,
}

/// Raw series row. The source only records a start year, not a date.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SeriesRow {
    pub id: i64,
    pub name: Option<String>,
    pub original_name: Option<String>,
    pub original_language: Option<String>,
    pub first_air_year: Option<i64>,
    pub vote_average: Option<f64>,
    pub vote_count: Option<i64>,
    pub poster_path: Option<String>,
    pub popularity: f64,
    pub genre_ids: Option<String>,
}

/// Fetch all movie rows. Titles released before 1900 are excluded at
/// the query level.
pub async fn fetch_movies(pool: &SqlitePool) -> Result<Vec<MovieRow>, sqlx::Error> {
    let rows: Vec<(
        i64,
        Option<String>,
        Option<String>,
        Option<String>,
        Option<String>,
        Option<f64>,
        Option<i64>,
        Option<String>,
        f64,
        Option<String>,
    )> = sqlx::query_as(
        "SELECT id, title, original_title, original_language, release_date, \
         vote_average, vote_count, poster_path, popularity, genre_ids \
         FROM movie WHERE release_date >= '1900-01-01'",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|r| MovieRow {
            id: r.0,
            title: r.1,
            original_title: r.2,
            original_language: r.3,
            release_date: r.4,
            vote_average: r.5,
            vote_count: r.6,
            poster_path: r.7,
            popularity: r.8,
            genre_ids: r.9,
        })
        .collect())
}

/// Fetch all series rows, with the same 1900 clamp on the start year.
pub async fn fetch_series(pool: &SqlitePool) -> Result<Vec<SeriesRow>, sqlx::Error> {
    let rows: Vec<(
        i64,
        Option<String>,
        Option<String>,
        Option<String>,
        Option<i64>,
        Option<f64>,
        Option<i64>,
        Option<String>,
        f64,
        Option<String>,
    )> = sqlx::query_as(
        "SELECT id, name, original_name, original_language, first_air_year, \
         vote_average, vote_count, poster_path, popularity, genre_ids \
         FROM series WHERE first_air_year >= 1900",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|r| SeriesRow {
            id: r.0,
            name: r.1,
            original_name: r.2,
            original_language: r.3,
            first_air_year: r.4,
            vote_average: r.5,
            vote_count: r.6,
            poster_path: r.7,
            popularity: r.8,
            genre_ids: r.9,
        })
        .collect())
}
