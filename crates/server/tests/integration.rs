use std::sync::Arc;
use std::time::Duration;

use axum_test::TestServer;
use mirador_catalog::cache::CatalogCache;
use mirador_catalog::genres::{GenreMap, GenreMaps};
use mirador_server::routes::build_router;
use mirador_server::state::AppState;
use serde_json::Value;
use sqlx::SqlitePool;

/// Create a test server over an in-memory SQLite database seeded with a
/// small mixed catalog.
async fn test_app() -> (TestServer, SqlitePool) {
    test_app_with_image_base(mirador_server::poster::DEFAULT_IMAGE_BASE).await
}

async fn test_app_with_image_base(image_base: &str) -> (TestServer, SqlitePool) {
    let pool = mirador_db::connect(":memory:").await.unwrap();
    mirador_db::migrate::run(&pool).await.unwrap();
    seed(&pool).await;

    let genre_maps = GenreMaps {
        movie: GenreMap::from_pairs([("35", "Comedy"), ("18", "Drama")]),
        series: GenreMap::from_pairs([("18", "Drama"), ("10765", "Sci-Fi & Fantasy")]),
    };

    let state = AppState {
        db: pool.clone(),
        cache: Arc::new(CatalogCache::new(Duration::from_secs(3600), None)),
        genre_maps: Arc::new(genre_maps),
        http: reqwest::Client::new(),
        image_base: image_base.to_string(),
    };

    let app = build_router(state);
    (TestServer::new(app).unwrap(), pool)
}

async fn seed(pool: &SqlitePool) {
    // Twelve plain movies so listing spills onto a second page.
    for i in 1..=12i64 {
        sqlx::query(
            "INSERT INTO movie (id, title, original_title, original_language, release_date, \
             vote_average, vote_count, poster_path, popularity, genre_ids) \
             VALUES (?, ?, ?, 'en', ?, ?, ?, ?, ?, '[35]')",
        )
        .bind(i)
        .bind(format!("Movie {i:02}"))
        .bind(format!("Movie {i:02}"))
        .bind(format!("{}-06-01", 2000 + i))
        .bind(5.0 + (i as f64) / 10.0)
        .bind(i * 100)
        .bind(format!("/poster{i}.jpg"))
        .bind(i as f64)
        .execute(pool)
        .await
        .unwrap();
    }

    // A drama with a distinctive original title for text matching.
    sqlx::query(
        "INSERT INTO movie (id, title, original_title, original_language, release_date, \
         vote_average, vote_count, poster_path, popularity, genre_ids) \
         VALUES (13, 'The Long Winter', 'El Largo Invierno', 'es', '1995-03-10', \
         8.2, 900, NULL, 4.5, '[18]')",
    )
    .execute(pool)
    .await
    .unwrap();

    // Pre-1900 row, excluded at the query level.
    sqlx::query(
        "INSERT INTO movie (id, title, release_date, vote_average, vote_count, popularity, genre_ids) \
         VALUES (99, 'Antique Reel', '1890-01-01', 6.0, 10, 0.1, '[35]')",
    )
    .execute(pool)
    .await
    .unwrap();

    sqlx::query(
        "INSERT INTO series (id, name, original_name, original_language, first_air_year, \
         vote_average, vote_count, poster_path, popularity, genre_ids) \
         VALUES (1, 'Night Shift', 'Night Shift', 'en', 2018, 7.8, 2500, '/ns.jpg', 9.0, '[18]')",
    )
    .execute(pool)
    .await
    .unwrap();

    // Shares numeric id 2 with a movie; must never leak across kinds.
    sqlx::query(
        "INSERT INTO series (id, name, original_name, original_language, first_air_year, \
         vote_average, vote_count, poster_path, popularity, genre_ids) \
         VALUES (2, 'Starfall', 'Starfall', 'en', 2020, 8.5, 4000, NULL, 12.0, '[10765]')",
    )
    .execute(pool)
    .await
    .unwrap();

    for (title_id, provider, kind) in [
        (1i64, "Netflix", "flatrate"),
        (1, "Netflix", "flatrate"),
        (1, "Netflix", "rent"),
        (2, "Max", "buy"),
    ] {
        sqlx::query("INSERT INTO movie_offer (title_id, provider, offer_kind) VALUES (?, ?, ?)")
            .bind(title_id)
            .bind(provider)
            .bind(kind)
            .execute(pool)
            .await
            .unwrap();
    }
    // Blank provider cell, dropped everywhere.
    sqlx::query("INSERT INTO movie_offer (title_id, provider, offer_kind) VALUES (3, '  ', 'rent')")
        .execute(pool)
        .await
        .unwrap();

    for (title_id, provider, season) in [
        (1i64, Some("Netflix"), Some(2i64)),
        (1, Some("Netflix"), Some(1)),
        (1, Some("Netflix"), None),
        (2, Some("Pluto TV"), None),
    ] {
        sqlx::query(
            "INSERT INTO series_season_offer (title_id, provider, season) VALUES (?, ?, ?)",
        )
        .bind(title_id)
        .bind(provider)
        .bind(season)
        .execute(pool)
        .await
        .unwrap();
    }
}

#[tokio::test]
async fn health_endpoint_returns_ok() {
    let (server, _pool) = test_app().await;
    let resp = server.get("/health").await;
    resp.assert_status_ok();
    let body: Value = resp.json();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn titles_default_listing_pages_at_ten() {
    let (server, _pool) = test_app().await;
    let resp = server.get("/api/v1/titles").add_query_param("kind", "movie").await;
    resp.assert_status_ok();
    let body: Value = resp.json();
    // 13 in-range movies: the antique reel never loads.
    assert_eq!(body["total"], 13);
    assert_eq!(body["total_pages"], 2);
    assert_eq!(body["page"], 1);
    assert_eq!(body["items"].as_array().unwrap().len(), 10);

    let resp = server
        .get("/api/v1/titles")
        .add_query_param("kind", "movie")
        .add_query_param("page", "2")
        .await;
    let body: Value = resp.json();
    assert_eq!(body["items"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn titles_out_of_range_page_is_clamped() {
    let (server, _pool) = test_app().await;
    let resp = server
        .get("/api/v1/titles")
        .add_query_param("kind", "movie")
        .add_query_param("page", "50")
        .await;
    resp.assert_status_ok();
    let body: Value = resp.json();
    assert_eq!(body["page"], 2);
}

#[tokio::test]
async fn titles_text_filter_matches_original_title() {
    let (server, _pool) = test_app().await;
    let resp = server
        .get("/api/v1/titles")
        .add_query_param("kind", "movie")
        .add_query_param("text", "largo inv")
        .await;
    resp.assert_status_ok();
    let body: Value = resp.json();
    assert_eq!(body["total"], 1);
    assert_eq!(body["items"][0]["title"], "The Long Winter");
    // Missing poster path resolves to the placeholder URL.
    assert!(
        body["items"][0]["poster_url"]
            .as_str()
            .unwrap()
            .contains("No_Image_Available")
    );
}

#[tokio::test]
async fn titles_no_results_is_an_empty_page_not_an_error() {
    let (server, _pool) = test_app().await;
    let resp = server
        .get("/api/v1/titles")
        .add_query_param("kind", "movie")
        .add_query_param("text", "zzz no such film")
        .await;
    resp.assert_status_ok();
    let body: Value = resp.json();
    assert_eq!(body["total"], 0);
    assert_eq!(body["total_pages"], 1);
    assert!(body["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn titles_genre_filter_uses_mapped_labels() {
    let (server, _pool) = test_app().await;
    let resp = server
        .get("/api/v1/titles")
        .add_query_param("kind", "movie")
        .add_query_param("genres", "Drama")
        .await;
    resp.assert_status_ok();
    let body: Value = resp.json();
    assert_eq!(body["total"], 1);
    assert_eq!(body["items"][0]["genres"][0], "Drama");
}

#[tokio::test]
async fn titles_provider_filter_is_kind_scoped() {
    let (server, _pool) = test_app().await;
    // Pluto TV only carries a series; the movie view must be empty.
    let resp = server
        .get("/api/v1/titles")
        .add_query_param("kind", "movie")
        .add_query_param("provider", "Pluto TV")
        .await;
    resp.assert_status_ok();
    let body: Value = resp.json();
    assert_eq!(body["total"], 0);

    let resp = server
        .get("/api/v1/titles")
        .add_query_param("kind", "series")
        .add_query_param("provider", "Pluto TV")
        .await;
    let body: Value = resp.json();
    assert_eq!(body["total"], 1);
    assert_eq!(body["items"][0]["title"], "Starfall");
}

#[tokio::test]
async fn titles_unknown_kind_is_bad_request() {
    let (server, _pool) = test_app().await;
    let resp = server.get("/api/v1/titles").add_query_param("kind", "season").await;
    resp.assert_status(axum::http::StatusCode::BAD_REQUEST);
    let body: Value = resp.json();
    assert_eq!(body["error"]["code"], "bad_request");
}

#[tokio::test]
async fn title_detail_and_not_found() {
    let (server, _pool) = test_app().await;
    let resp = server.get("/api/v1/titles/movie/13").await;
    resp.assert_status_ok();
    let body: Value = resp.json();
    assert_eq!(body["title"], "The Long Winter");
    assert_eq!(body["kind"], "movie");
    assert_eq!(body["release_year"], 1995);

    let resp = server.get("/api/v1/titles/movie/4040").await;
    resp.assert_status(axum::http::StatusCode::NOT_FOUND);
    let body: Value = resp.json();
    assert_eq!(body["error"]["code"], "not_found");
}

#[tokio::test]
async fn movie_availability_dedups_offer_kinds() {
    let (server, _pool) = test_app().await;
    let resp = server.get("/api/v1/titles/movie/1/availability").await;
    resp.assert_status_ok();
    let body: Value = resp.json();
    assert_eq!(body["status"], "available");
    let providers = body["providers"].as_array().unwrap();
    assert_eq!(providers.len(), 1);
    assert_eq!(providers[0]["provider"], "Netflix");
    assert_eq!(
        providers[0]["offers"],
        serde_json::json!(["subscription", "rental"])
    );
}

#[tokio::test]
async fn series_availability_drops_null_seasons() {
    let (server, _pool) = test_app().await;
    let resp = server.get("/api/v1/titles/series/1/availability").await;
    resp.assert_status_ok();
    let body: Value = resp.json();
    assert_eq!(body["status"], "available");
    let providers = body["providers"].as_array().unwrap();
    assert_eq!(providers.len(), 1);
    assert_eq!(providers[0]["seasons"], serde_json::json!([1, 2]));
}

#[tokio::test]
async fn series_with_only_null_seasons_groups_to_empty() {
    let (server, _pool) = test_app().await;
    let resp = server.get("/api/v1/titles/series/2/availability").await;
    resp.assert_status_ok();
    let body: Value = resp.json();
    assert_eq!(body["status"], "available");
    assert!(body["providers"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn movie_without_offers_reports_none() {
    let (server, _pool) = test_app().await;
    let resp = server.get("/api/v1/titles/movie/5/availability").await;
    resp.assert_status_ok();
    let body: Value = resp.json();
    assert_eq!(body["status"], "none");
}

#[tokio::test]
async fn poster_with_missing_path_redirects_to_placeholder() {
    let (server, _pool) = test_app().await;
    // Movie 13 has no stored poster path.
    let resp = server.get("/api/v1/titles/movie/13/poster").await;
    resp.assert_status(axum::http::StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        resp.header(axum::http::header::LOCATION),
        mirador_server::poster::PLACEHOLDER_URL
    );
}

#[tokio::test]
async fn poster_fetch_failure_redirects_to_placeholder() {
    // Point poster resolution at a port nothing listens on; the failed
    // fetch must degrade to the placeholder, never an error.
    let (server, _pool) = test_app_with_image_base("http://127.0.0.1:9").await;
    let resp = server.get("/api/v1/titles/movie/1/poster").await;
    resp.assert_status(axum::http::StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        resp.header(axum::http::header::LOCATION),
        mirador_server::poster::PLACEHOLDER_URL
    );
}

#[tokio::test]
async fn genre_listing_is_sorted_per_kind() {
    let (server, _pool) = test_app().await;
    let resp = server.get("/api/v1/genres").add_query_param("kind", "series").await;
    resp.assert_status_ok();
    let body: Value = resp.json();
    assert_eq!(body, serde_json::json!(["Drama", "Sci-Fi & Fantasy"]));
}

#[tokio::test]
async fn provider_listing_is_sorted_union_of_both_kinds() {
    let (server, _pool) = test_app().await;
    let resp = server.get("/api/v1/providers").await;
    resp.assert_status_ok();
    let body: Value = resp.json();
    assert_eq!(body, serde_json::json!(["Max", "Netflix", "Pluto TV"]));
}

#[tokio::test]
async fn filter_defaults_describe_reset_state() {
    let (server, _pool) = test_app().await;
    let resp = server
        .get("/api/v1/filters/defaults")
        .add_query_param("kind", "movie")
        .await;
    resp.assert_status_ok();
    let body: Value = resp.json();
    assert_eq!(body["kind"], "movie");
    assert_eq!(body["year_range"][0], 1900);
    assert_eq!(body["rating_range"], serde_json::json!([0.0, 10.0]));
    assert_eq!(body["provider"], "any");
    assert_eq!(body["page"], 1);
}

#[tokio::test]
async fn top_providers_report_counts_offer_rows() {
    let (server, _pool) = test_app().await;
    let resp = server
        .get("/api/v1/reports/top-providers")
        .add_query_param("kind", "movie")
        .await;
    resp.assert_status_ok();
    let body: Value = resp.json();
    let rows = body.as_array().unwrap();
    assert_eq!(rows[0]["key"], "Netflix");
    assert_eq!(rows[0]["count"], 3);
    assert_eq!(rows[1]["key"], "Max");
}

#[tokio::test]
async fn top_rated_report_respects_filters_and_vote_floor() {
    let (server, _pool) = test_app().await;
    let resp = server
        .get("/api/v1/reports/top-rated")
        .add_query_param("kind", "movie")
        .await;
    resp.assert_status_ok();
    let body: Value = resp.json();
    let rows = body.as_array().unwrap();
    assert!(rows.len() <= 10);
    // Highest rated in-range movie with >100 votes.
    assert_eq!(rows[0]["title"], "The Long Winter");
    // Movie 01 has exactly 100 votes, below the strict floor.
    assert!(rows.iter().all(|r| r["title"] != "Movie 01"));
}

#[tokio::test]
async fn titles_per_year_report_is_ascending() {
    let (server, _pool) = test_app().await;
    let resp = server
        .get("/api/v1/reports/titles-per-year")
        .add_query_param("kind", "movie")
        .await;
    resp.assert_status_ok();
    let body: Value = resp.json();
    let years: Vec<i64> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["year"].as_i64().unwrap())
        .collect();
    let mut sorted = years.clone();
    sorted.sort_unstable();
    assert_eq!(years, sorted);
    assert_eq!(years.first().copied(), Some(1995));
}

#[tokio::test]
async fn refresh_invalidates_the_snapshot() {
    let (server, pool) = test_app().await;

    let resp = server.get("/api/v1/titles").add_query_param("kind", "series").await;
    let body: Value = resp.json();
    assert_eq!(body["total"], 2);

    sqlx::query(
        "INSERT INTO series (id, name, original_language, first_air_year, vote_average, \
         vote_count, popularity, genre_ids) \
         VALUES (3, 'Fresh Arrival', 'en', 2024, 7.0, 300, 2.0, '[18]')",
    )
    .execute(&pool)
    .await
    .unwrap();

    // Still served from the cached snapshot.
    let resp = server.get("/api/v1/titles").add_query_param("kind", "series").await;
    let body: Value = resp.json();
    assert_eq!(body["total"], 2);

    let resp = server.post("/api/v1/catalog/refresh").await;
    resp.assert_status_ok();

    let resp = server.get("/api/v1/titles").add_query_param("kind", "series").await;
    let body: Value = resp.json();
    assert_eq!(body["total"], 3);
}
