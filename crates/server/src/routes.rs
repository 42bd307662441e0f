use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use mirador_catalog::availability::{self, Availability};
use mirador_catalog::filter::{self, FilterSpec, Page, ProviderFilter, current_year};
use mirador_catalog::load::Title;
use mirador_catalog::reports;
use mirador_core::error::ApiError;
use mirador_core::types::{MediaKind, TitleKey};

use crate::error::AppError;
use crate::poster;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api_router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn api_router() -> Router<AppState> {
    Router::new()
        // Catalog browsing
        .route("/titles", get(list_titles))
        .route("/titles/{kind}/{id}", get(get_title))
        .route("/titles/{kind}/{id}/availability", get(get_availability))
        .route("/titles/{kind}/{id}/poster", get(get_poster))
        // Filter control sources
        .route("/genres", get(list_genres))
        .route("/providers", get(list_providers))
        .route("/filters/defaults", get(filter_defaults))
        // Aggregate reports
        .route("/reports/top-providers", get(report_top_providers))
        .route("/reports/top-genres", get(report_top_genres))
        .route("/reports/rating-by-genre", get(report_rating_by_genre))
        .route("/reports/titles-per-year", get(report_titles_per_year))
        .route("/reports/rating-by-year", get(report_rating_by_year))
        .route("/reports/top-languages", get(report_top_languages))
        .route("/reports/top-popular", get(report_top_popular))
        .route("/reports/top-rated", get(report_top_rated))
        // Cache control
        .route("/catalog/refresh", post(refresh_catalog))
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct HealthResponse {
    status: String,
}

async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>, AppError> {
    sqlx::query("SELECT 1")
        .execute(&state.db)
        .await
        .map_err(|e| ApiError::Internal(format!("database check failed: {e}")))?;

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
    }))
}

// ---------------------------------------------------------------------------
// Shared extraction helpers
// ---------------------------------------------------------------------------

fn parse_kind(raw: &str) -> Result<MediaKind, AppError> {
    MediaKind::parse(raw).ok_or_else(|| {
        ApiError::BadRequest(format!("kind must be 'movie' or 'series', got '{raw}'")).into()
    })
}

#[derive(Deserialize)]
struct KindQuery {
    kind: String,
}

/// Resolved filter-control values as query parameters. Missing fields
/// take their documented defaults.
#[derive(Deserialize)]
struct TitlesQuery {
    kind: String,
    text: Option<String>,
    year_min: Option<i16>,
    year_max: Option<i16>,
    rating_min: Option<f32>,
    rating_max: Option<f32>,
    votes_min: Option<i32>,
    votes_max: Option<i32>,
    /// Comma-separated genre labels.
    genres: Option<String>,
    provider: Option<String>,
    page: Option<usize>,
}

impl TitlesQuery {
    fn to_spec(&self) -> Result<FilterSpec, AppError> {
        let kind = parse_kind(&self.kind)?;
        let defaults = FilterSpec::defaults(kind);
        let (year_lo, year_hi) = defaults.year_range.unwrap_or((1900, current_year()));

        let genres = self
            .genres
            .as_deref()
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|g| !g.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Ok(FilterSpec {
            kind,
            text: self.text.clone().filter(|t| !t.trim().is_empty()),
            year_range: Some((
                self.year_min.unwrap_or(year_lo),
                self.year_max.unwrap_or(year_hi),
            )),
            rating_range: Some((
                self.rating_min.unwrap_or(0.0),
                self.rating_max.unwrap_or(10.0),
            )),
            vote_range: Some((
                self.votes_min.unwrap_or(0),
                self.votes_max.unwrap_or(i32::MAX),
            )),
            genres,
            provider: ProviderFilter::parse(self.provider.as_deref()),
        })
    }
}

// ---------------------------------------------------------------------------
// Titles
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct TitleResponse {
    id: i64,
    kind: MediaKind,
    title: String,
    original_title: Option<String>,
    language: Option<String>,
    release_year: Option<i16>,
    rating: Option<f32>,
    votes: Option<i32>,
    popularity: f64,
    genres: Vec<String>,
    poster_url: String,
}

fn title_to_response(title: &Title, state: &AppState) -> TitleResponse {
    let map = state.genre_maps.for_kind(title.kind);
    TitleResponse {
        id: title.id,
        kind: title.kind,
        title: title.title.clone(),
        original_title: title.original_title.clone(),
        language: title.language.clone(),
        release_year: title.release_year,
        rating: title.rating,
        votes: title.votes,
        popularity: title.popularity,
        genres: title.genres.mapped(map),
        poster_url: poster::poster_url(&state.image_base, title.poster_path.as_deref()),
    }
}

async fn list_titles(
    State(state): State<AppState>,
    Query(query): Query<TitlesQuery>,
) -> Result<Json<Page<TitleResponse>>, AppError> {
    let spec = query.to_spec()?;
    let snapshot = state.cache.snapshot(&state.db).await?;

    let rows = filter::apply(&snapshot, &state.genre_maps, &spec);
    let page = filter::paginate(rows, query.page.unwrap_or(1));

    Ok(Json(Page {
        items: page
            .items
            .into_iter()
            .map(|t| title_to_response(t, &state))
            .collect(),
        page: page.page,
        total_pages: page.total_pages,
        total: page.total,
    }))
}

async fn get_title(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, i64)>,
) -> Result<Json<TitleResponse>, AppError> {
    let kind = parse_kind(&kind)?;
    let snapshot = state.cache.snapshot(&state.db).await?;

    let title = snapshot
        .get(TitleKey::new(kind, id))
        .ok_or_else(|| ApiError::NotFound(format!("no {kind} with id {id}")))?;

    Ok(Json(title_to_response(title, &state)))
}

// ---------------------------------------------------------------------------
// Availability
// ---------------------------------------------------------------------------

async fn get_availability(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, i64)>,
) -> Result<Json<Availability>, AppError> {
    let kind = parse_kind(&kind)?;
    let snapshot = state.cache.snapshot(&state.db).await?;

    let key = TitleKey::new(kind, id);
    if snapshot.get(key).is_none() {
        return Err(ApiError::NotFound(format!("no {kind} with id {id}")).into());
    }

    Ok(Json(availability::resolve(&snapshot, key)))
}

// ---------------------------------------------------------------------------
// Posters
// ---------------------------------------------------------------------------

async fn get_poster(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, i64)>,
) -> Result<axum::response::Response, AppError> {
    use axum::response::{IntoResponse, Redirect};

    let kind = parse_kind(&kind)?;
    let snapshot = state.cache.snapshot(&state.db).await?;

    let title = snapshot
        .get(TitleKey::new(kind, id))
        .ok_or_else(|| ApiError::NotFound(format!("no {kind} with id {id}")))?;

    let url = poster::poster_url(&state.image_base, title.poster_path.as_deref());
    if url == poster::PLACEHOLDER_URL {
        return Ok(Redirect::temporary(poster::PLACEHOLDER_URL).into_response());
    }

    // A failed or timed-out fetch degrades to the placeholder; it never
    // fails the page.
    match poster::fetch_image(&state.http, &url).await {
        Some(image) => Ok((
            [(axum::http::header::CONTENT_TYPE, image.content_type)],
            image.bytes,
        )
            .into_response()),
        None => Ok(Redirect::temporary(poster::PLACEHOLDER_URL).into_response()),
    }
}

// ---------------------------------------------------------------------------
// Filter control sources
// ---------------------------------------------------------------------------

async fn list_genres(
    State(state): State<AppState>,
    Query(query): Query<KindQuery>,
) -> Result<Json<Vec<String>>, AppError> {
    let kind = parse_kind(&query.kind)?;
    Ok(Json(state.genre_maps.for_kind(kind).labels()))
}

async fn list_providers(State(state): State<AppState>) -> Result<Json<Vec<String>>, AppError> {
    let snapshot = state.cache.snapshot(&state.db).await?;
    Ok(Json(snapshot.provider_names()))
}

#[derive(Serialize)]
struct FilterDefaultsResponse {
    kind: MediaKind,
    text: String,
    year_range: (i16, i16),
    rating_range: (f32, f32),
    vote_range: (i32, i32),
    genres: Vec<String>,
    provider: String,
    page: usize,
}

async fn filter_defaults(
    Query(query): Query<KindQuery>,
) -> Result<Json<FilterDefaultsResponse>, AppError> {
    let kind = parse_kind(&query.kind)?;
    let spec = FilterSpec::defaults(kind);

    Ok(Json(FilterDefaultsResponse {
        kind,
        text: String::new(),
        year_range: spec.year_range.unwrap_or((1900, current_year())),
        rating_range: spec.rating_range.unwrap_or((0.0, 10.0)),
        vote_range: spec.vote_range.unwrap_or((0, i32::MAX)),
        genres: Vec::new(),
        provider: "any".to_string(),
        page: 1,
    }))
}

// ---------------------------------------------------------------------------
// Aggregate reports
// ---------------------------------------------------------------------------

async fn report_top_providers(
    State(state): State<AppState>,
    Query(query): Query<KindQuery>,
) -> Result<Json<Vec<reports::CountRow>>, AppError> {
    let kind = parse_kind(&query.kind)?;
    let snapshot = state.cache.snapshot(&state.db).await?;
    Ok(Json(reports::top_providers(&snapshot, kind)))
}

async fn report_top_genres(
    State(state): State<AppState>,
    Query(query): Query<KindQuery>,
) -> Result<Json<Vec<reports::CountRow>>, AppError> {
    let kind = parse_kind(&query.kind)?;
    let snapshot = state.cache.snapshot(&state.db).await?;
    Ok(Json(reports::top_genres(&snapshot, &state.genre_maps, kind)))
}

async fn report_rating_by_genre(
    State(state): State<AppState>,
    Query(query): Query<KindQuery>,
) -> Result<Json<Vec<reports::MeanRow>>, AppError> {
    let kind = parse_kind(&query.kind)?;
    let snapshot = state.cache.snapshot(&state.db).await?;
    Ok(Json(reports::rating_by_genre(
        &snapshot,
        &state.genre_maps,
        kind,
    )))
}

async fn report_titles_per_year(
    State(state): State<AppState>,
    Query(query): Query<KindQuery>,
) -> Result<Json<Vec<reports::YearCount>>, AppError> {
    let kind = parse_kind(&query.kind)?;
    let snapshot = state.cache.snapshot(&state.db).await?;
    Ok(Json(reports::titles_per_year(&snapshot, kind)))
}

async fn report_rating_by_year(
    State(state): State<AppState>,
    Query(query): Query<KindQuery>,
) -> Result<Json<Vec<reports::YearMean>>, AppError> {
    let kind = parse_kind(&query.kind)?;
    let snapshot = state.cache.snapshot(&state.db).await?;
    Ok(Json(reports::rating_by_year(&snapshot, kind)))
}

async fn report_top_languages(
    State(state): State<AppState>,
    Query(query): Query<KindQuery>,
) -> Result<Json<Vec<reports::CountRow>>, AppError> {
    let kind = parse_kind(&query.kind)?;
    let snapshot = state.cache.snapshot(&state.db).await?;
    Ok(Json(reports::top_languages(&snapshot, kind)))
}

async fn report_top_popular(
    State(state): State<AppState>,
    Query(query): Query<TitlesQuery>,
) -> Result<Json<Vec<TitleResponse>>, AppError> {
    let spec = query.to_spec()?;
    let snapshot = state.cache.snapshot(&state.db).await?;
    let rows = filter::apply(&snapshot, &state.genre_maps, &spec);
    Ok(Json(
        reports::top_popular(&rows)
            .into_iter()
            .map(|t| title_to_response(t, &state))
            .collect(),
    ))
}

async fn report_top_rated(
    State(state): State<AppState>,
    Query(query): Query<TitlesQuery>,
) -> Result<Json<Vec<TitleResponse>>, AppError> {
    let spec = query.to_spec()?;
    let snapshot = state.cache.snapshot(&state.db).await?;
    let rows = filter::apply(&snapshot, &state.genre_maps, &spec);
    Ok(Json(
        reports::top_rated(&rows)
            .into_iter()
            .map(|t| title_to_response(t, &state))
            .collect(),
    ))
}

// ---------------------------------------------------------------------------
// Cache control
// ---------------------------------------------------------------------------

async fn refresh_catalog(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.cache.invalidate().await;
    tracing::info!("catalog cache invalidated");
    Ok(Json(serde_json::json!({ "ok": true })))
}
