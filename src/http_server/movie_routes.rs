//! Movie HTTP Routes
//!
//! Read endpoints over the query engine plus token-guarded create, update
//! and delete. Raw path and query parameters are parsed into typed filters
//! here; the catalog never sees strings it has to interpret.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::get,
    Json, Router,
};
use serde_json::Value;

use crate::catalog::{
    CatalogError, DurationFilter, DurationReport, GenreStats, Metrics, MovieCatalog,
    MovieRecord, Page, PageRequest, RatingFilter, YearFilter,
};

use super::auth::authorize;
use super::errors::ApiResult;
use super::response::{GenresResponse, MutationResponse};

// ==================
// Shared State
// ==================

/// Movie state shared across handlers
#[derive(Debug)]
pub struct MovieState {
    pub catalog: MovieCatalog,
    pub api_token: Option<String>,
}

impl MovieState {
    pub fn new(catalog: MovieCatalog, api_token: Option<String>) -> Self {
        Self { catalog, api_token }
    }
}

type Params = Query<HashMap<String, String>>;

// ==================
// Movie Routes
// ==================

/// Create movie routes, mounted under `/movies`
pub fn movie_routes(state: Arc<MovieState>) -> Router {
    Router::new()
        .route("/", get(list_movies_handler).post(create_movie_handler))
        // Aggregates
        .route("/genre", get(list_genres_handler))
        .route("/stats", get(genre_histogram_handler))
        .route("/metrics", get(metrics_handler))
        // Filters
        .route("/year", get(year_range_handler))
        .route("/year/:year", get(exact_year_handler))
        .route("/director", get(missing_director_handler))
        .route("/director/:name", get(director_handler))
        .route("/actor", get(missing_actor_handler))
        .route("/actor/:name", get(actor_handler))
        .route("/rating", get(rating_range_handler))
        .route("/rating/:rating", get(exact_rating_handler))
        .route("/duration", get(duration_handler))
        .route("/genre/:genre", get(genre_handler))
        .route("/genre/:genre/stats", get(genre_stats_handler))
        // Single movie
        .route(
            "/:id",
            get(find_movie_handler)
                .put(update_movie_handler)
                .delete(delete_movie_handler),
        )
        .with_state(state)
}

// ==================
// Helper Functions
// ==================

fn parse_value<T: FromStr>(name: &str, raw: &str) -> ApiResult<T> {
    raw.trim().parse().map_err(|_| {
        CatalogError::validation(format!("Invalid value '{}' for `{}`", raw, name)).into()
    })
}

/// Optional query parameter; an empty value counts as absent
fn optional_param<T: FromStr>(params: &HashMap<String, String>, name: &str) -> ApiResult<Option<T>> {
    match params.get(name).map(|s| s.trim()) {
        None | Some("") => Ok(None),
        Some(raw) => parse_value(name, raw).map(Some),
    }
}

/// Exact lookups treat an empty result as `not_found`
fn require_matches(movies: Vec<MovieRecord>, what: String) -> ApiResult<Vec<MovieRecord>> {
    if movies.is_empty() {
        return Err(CatalogError::not_found(format!("No movies found for {}", what)).into());
    }
    Ok(movies)
}

/// Runs catalog work on the blocking pool so file I/O and the write lock
/// never park an async worker
async fn run_blocking<T, F>(state: &Arc<MovieState>, work: F) -> ApiResult<T>
where
    T: Send + 'static,
    F: FnOnce(&MovieCatalog) -> Result<T, CatalogError> + Send + 'static,
{
    let state = Arc::clone(state);
    tokio::task::spawn_blocking(move || work(&state.catalog))
        .await
        .map_err(|e| CatalogError::Unexpected(format!("catalog task failed: {}", e)))?
        .map_err(Into::into)
}

fn json_body(body: Result<Json<Value>, JsonRejection>) -> ApiResult<Value> {
    body.map(|Json(value)| value).map_err(|rejection| {
        CatalogError::validation(format!("Invalid JSON body: {}", rejection.body_text())).into()
    })
}

// ==================
// Read Handlers
// ==================

async fn list_movies_handler(
    State(state): State<Arc<MovieState>>,
    Query(params): Params,
) -> ApiResult<Json<Page>> {
    let request = PageRequest::parse(
        params.get("page").map(String::as_str),
        params.get("limit").map(String::as_str),
        params.get("orden").map(String::as_str),
    )?;
    let page = run_blocking(&state, move |catalog| catalog.query().page(&request)).await?;
    Ok(Json(page))
}

async fn list_genres_handler(
    State(state): State<Arc<MovieState>>,
) -> ApiResult<Json<GenresResponse>> {
    let generos = run_blocking(&state, |catalog| catalog.query().genres()).await?;
    Ok(Json(GenresResponse { generos }))
}

async fn genre_histogram_handler(
    State(state): State<Arc<MovieState>>,
) -> ApiResult<Json<std::collections::BTreeMap<String, usize>>> {
    Ok(Json(run_blocking(&state, |catalog| catalog.query().genre_counts()).await?))
}

async fn metrics_handler(State(state): State<Arc<MovieState>>) -> ApiResult<Json<Metrics>> {
    Ok(Json(run_blocking(&state, |catalog| catalog.query().metrics()).await?))
}

async fn year_range_handler(
    State(state): State<Arc<MovieState>>,
    Query(params): Params,
) -> ApiResult<Json<Vec<MovieRecord>>> {
    let filter = match (
        optional_param::<i32>(&params, "from")?,
        optional_param::<i32>(&params, "to")?,
    ) {
        (Some(from), Some(to)) => YearFilter::Between { from, to },
        (Some(from), None) => YearFilter::After(from),
        (None, Some(to)) => YearFilter::Before(to),
        (None, None) => {
            return Err(CatalogError::validation(
                "Specify a year in the path (/movies/year/:year) or `from`/`to` query parameters",
            )
            .into())
        }
    };
    Ok(Json(run_blocking(&state, move |catalog| catalog.query().by_year(filter)).await?))
}

async fn exact_year_handler(
    State(state): State<Arc<MovieState>>,
    Path(year): Path<String>,
) -> ApiResult<Json<Vec<MovieRecord>>> {
    let year: i32 = parse_value("year", &year)?;
    let movies =
        run_blocking(&state, move |catalog| catalog.query().by_year(YearFilter::Exact(year))).await?;
    Ok(Json(require_matches(movies, format!("year {}", year))?))
}

async fn director_handler(
    State(state): State<Arc<MovieState>>,
    Path(name): Path<String>,
) -> ApiResult<Json<Vec<MovieRecord>>> {
    let term = name.clone();
    let movies = run_blocking(&state, move |catalog| catalog.query().by_director(&term)).await?;
    Ok(Json(require_matches(movies, format!("director '{}'", name))?))
}

async fn missing_director_handler() -> ApiResult<Json<Vec<MovieRecord>>> {
    Err(CatalogError::validation("Specify a director in the path (/movies/director/:name)").into())
}

async fn actor_handler(
    State(state): State<Arc<MovieState>>,
    Path(name): Path<String>,
) -> ApiResult<Json<Vec<MovieRecord>>> {
    let term = name.clone();
    let movies = run_blocking(&state, move |catalog| catalog.query().by_actor(&term)).await?;
    Ok(Json(require_matches(movies, format!("actor '{}'", name))?))
}

async fn missing_actor_handler() -> ApiResult<Json<Vec<MovieRecord>>> {
    Err(CatalogError::validation("Specify an actor in the path (/movies/actor/:name)").into())
}

async fn rating_range_handler(
    State(state): State<Arc<MovieState>>,
    Query(params): Params,
) -> ApiResult<Json<Vec<MovieRecord>>> {
    let filter = match (
        optional_param::<f64>(&params, "from")?,
        optional_param::<f64>(&params, "to")?,
    ) {
        (Some(from), Some(to)) => RatingFilter::Between { from, to },
        (Some(from), None) => RatingFilter::AtLeast(from),
        (None, Some(to)) => RatingFilter::AtMost(to),
        (None, None) => {
            return Err(CatalogError::validation(
                "Specify a rating in the path (/movies/rating/:rating) or `from`/`to` query parameters",
            )
            .into())
        }
    };
    Ok(Json(run_blocking(&state, move |catalog| catalog.query().by_rating(filter)).await?))
}

async fn exact_rating_handler(
    State(state): State<Arc<MovieState>>,
    Path(rating): Path<String>,
) -> ApiResult<Json<Vec<MovieRecord>>> {
    let rating: f64 = parse_value("rating", &rating)?;
    let movies =
        run_blocking(&state, move |catalog| catalog.query().by_rating(RatingFilter::Exact(rating)))
            .await?;
    Ok(Json(require_matches(movies, format!("rating {}", rating))?))
}

async fn duration_handler(
    State(state): State<Arc<MovieState>>,
    Query(params): Params,
) -> ApiResult<Json<DurationReport>> {
    let filter = match (
        optional_param::<u32>(&params, "min")?,
        optional_param::<u32>(&params, "max")?,
    ) {
        (Some(min), Some(max)) => DurationFilter::Between { min, max },
        (Some(min), None) => DurationFilter::AtLeast(min),
        (None, Some(max)) => DurationFilter::AtMost(max),
        (None, None) => {
            return Err(
                CatalogError::validation("Specify `min` and/or `max` minutes").into(),
            )
        }
    };
    Ok(Json(run_blocking(&state, move |catalog| catalog.query().by_duration(filter)).await?))
}

async fn genre_handler(
    State(state): State<Arc<MovieState>>,
    Path(genre): Path<String>,
) -> ApiResult<Json<Vec<MovieRecord>>> {
    let term = genre.clone();
    let movies = run_blocking(&state, move |catalog| catalog.query().by_genre(&term)).await?;
    Ok(Json(require_matches(movies, format!("genre '{}'", genre))?))
}

async fn genre_stats_handler(
    State(state): State<Arc<MovieState>>,
    Path(genre): Path<String>,
) -> ApiResult<Json<GenreStats>> {
    Ok(Json(run_blocking(&state, move |catalog| catalog.query().genre_stats(&genre)).await?))
}

async fn find_movie_handler(
    State(state): State<Arc<MovieState>>,
    Path(term): Path<String>,
) -> ApiResult<Json<MovieRecord>> {
    let lookup = term.clone();
    run_blocking(&state, move |catalog| catalog.query().find_by_id_or_title(&lookup))
        .await?
        .map(Json)
        .ok_or_else(|| CatalogError::not_found(format!("Movie '{}' not found", term)).into())
}

// ==================
// Mutation Handlers
// ==================

async fn create_movie_handler(
    State(state): State<Arc<MovieState>>,
    headers: HeaderMap,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<MutationResponse>)> {
    authorize(state.api_token.as_deref(), &headers)?;
    let payload = json_body(body)?;

    let created = run_blocking(&state, move |catalog| catalog.mutations().create(&payload)).await?;
    Ok((
        StatusCode::CREATED,
        Json(MutationResponse::success("Película añadida correctamente", created)),
    ))
}

async fn update_movie_handler(
    State(state): State<Arc<MovieState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<MutationResponse>> {
    authorize(state.api_token.as_deref(), &headers)?;
    let payload = json_body(body)?;

    let updated =
        run_blocking(&state, move |catalog| catalog.mutations().update(&id, &payload)).await?;
    Ok(Json(MutationResponse::success(
        "Película actualizada correctamente",
        updated,
    )))
}

async fn delete_movie_handler(
    State(state): State<Arc<MovieState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<Json<MutationResponse>> {
    authorize(state.api_token.as_deref(), &headers)?;

    let removed = run_blocking(&state, move |catalog| catalog.mutations().delete(&id)).await?;
    Ok(Json(MutationResponse::success(
        "Película eliminada correctamente",
        removed,
    )))
}
