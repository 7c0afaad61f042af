//! HTTP API Tests
//!
//! Drives the full router in-process: status codes, envelopes and bearer
//! token enforcement on write routes.

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use moviematch::catalog::{MovieCatalog, MovieValidator};
use moviematch::http_server::{HttpServer, HttpServerConfig};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

// =============================================================================
// Test Utilities
// =============================================================================

const TOKEN: &str = "1234";

const SEED: &str = "\
id,title,year,genre,director,actors,plot,imdb_rating,runtime_minutes
tt0111161,The Shawshank Redemption,1994,Drama,Frank Darabont,\"Tim Robbins, Morgan Freeman\",Two imprisoned men bond.,9.3,142
tt0068646,The Godfather,1972,\"Crime, Drama\",Francis Ford Coppola,\"Marlon Brando, Al Pacino\",The aging patriarch of a crime dynasty.,9.2,175
tt0133093,The Matrix,1999,\"Action, Sci-Fi\",Lana Wachowski,\"Keanu Reeves, Laurence Fishburne\",A hacker learns the truth.,8.7,136
";

fn setup(token: Option<&str>) -> (TempDir, Router) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("movies.csv");
    std::fs::write(&path, SEED).unwrap();

    let catalog = MovieCatalog::with_validator(path, MovieValidator::with_current_year(2024));
    let mut config = HttpServerConfig::default();
    config.api_token = token.map(str::to_string);

    (dir, HttpServer::build_router(&config, catalog))
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

async fn get(router: &Router, uri: &str) -> (StatusCode, Value) {
    send(router, Request::get(uri).body(Body::empty()).unwrap()).await
}

fn write_request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

fn inception() -> Value {
    json!({
        "id": "tt1375666",
        "title": "Inception",
        "year": 2010,
        "genre": "Action, Sci-Fi",
        "director": "Christopher Nolan",
        "actors": "Leonardo DiCaprio, Joseph Gordon-Levitt",
        "plot": "A thief steals secrets through dreams.",
        "imdb_rating": 8.8,
        "runtime_minutes": 148
    })
}

// =============================================================================
// Read routes
// =============================================================================

#[tokio::test]
async fn test_welcome_and_health() {
    let (_dir, router) = setup(None);

    let response = router
        .clone()
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], "¡Bienvenido a Movie Match!".as_bytes());

    let (status, body) = get(&router, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_paginated_list() {
    let (_dir, router) = setup(None);

    let (status, body) = get(&router, "/movies?page=1&limit=2&orden=year").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pagina"], 1);
    assert_eq!(body["total"], 3);
    assert_eq!(body["peliculas"][0]["id"], "tt0068646");
    assert_eq!(body["peliculas"].as_array().unwrap().len(), 2);

    let (status, body) = get(&router, "/movies?page=0&limit=2").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["estado"], "fail");
    assert_eq!(body["tipo"], "validation");

    let (status, _) = get(&router, "/movies").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_lookup_by_id_or_title() {
    let (_dir, router) = setup(None);

    let (status, body) = get(&router, "/movies/shawshank").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], "tt0111161");
    assert_eq!(body["imdb_rating"], 9.3);

    let (status, body) = get(&router, "/movies/tt0133093").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "The Matrix");

    let (status, body) = get(&router, "/movies/nonexistent").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["tipo"], "not_found");
}

#[tokio::test]
async fn test_aggregates() {
    let (_dir, router) = setup(None);

    let (_, body) = get(&router, "/movies/genre").await;
    assert_eq!(body["generos"], json!(["Drama", "Crime", "Action", "Sci-Fi"]));

    let (_, body) = get(&router, "/movies/stats").await;
    assert_eq!(body["Drama"], 2);

    let (_, body) = get(&router, "/movies/metrics").await;
    assert_eq!(body["totalMovies"], 3);
    assert_eq!(body["totalDirectors"], 3);
    assert_eq!(body["totalActors"], 6);

    let (status, body) = get(&router, "/movies/genre/drama/stats").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalPeliculas"], 2);
    assert_eq!(body["promedioDuracion"], 158.5);

    let (status, _) = get(&router, "/movies/genre/western/stats").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_exact_filters_answer_not_found_when_empty() {
    let (_dir, router) = setup(None);

    let (status, body) = get(&router, "/movies/year/1994").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    for uri in [
        "/movies/year/1950",
        "/movies/rating/5.5",
        "/movies/genre/Western",
        "/movies/director/Kubrick",
        "/movies/actor/Streep",
    ] {
        let (status, _) = get(&router, uri).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{}", uri);
    }

    let (status, body) = get(&router, "/movies/actor/pacino").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["id"], "tt0068646");

    let (status, _) = get(&router, "/movies/year/nineteen").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_director_and_actor_without_name_are_validation_errors() {
    let (_dir, router) = setup(None);

    for uri in ["/movies/director", "/movies/actor"] {
        let (status, body) = get(&router, uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(body["tipo"], "validation");
    }
}

#[tokio::test]
async fn test_range_filters() {
    let (_dir, router) = setup(None);

    let (status, body) = get(&router, "/movies/year?from=1972&to=1999").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, body) = get(&router, "/movies/year?from=2020").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    let (status, _) = get(&router, "/movies/year").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = get(&router, "/movies/rating?from=9&to=10").await;
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (status, body) = get(&router, "/movies/duration?min=140").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["minutosMinimos"], 140);
    assert!(body.get("minutosMaximos").is_none());
    assert_eq!(body["total"], 2);
}

// =============================================================================
// Write routes
// =============================================================================

#[tokio::test]
async fn test_create_update_delete_cycle() {
    let (_dir, router) = setup(Some(TOKEN));

    let (status, body) = send(
        &router,
        write_request(Method::POST, "/movies", Some(TOKEN), Some(inception())),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["estado"], "success");
    assert_eq!(body["pelicula"], inception());

    let (status, body) = send(
        &router,
        write_request(
            Method::PUT,
            "/movies/tt1375666",
            Some(TOKEN),
            Some(json!({ "runtime_minutes": 150 })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pelicula"]["runtime_minutes"], 150);
    assert_eq!(body["pelicula"]["title"], "Inception");

    let (status, body) = send(
        &router,
        write_request(Method::DELETE, "/movies/tt1375666", Some(TOKEN), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pelicula"]["id"], "tt1375666");

    let (status, _) = get(&router, "/movies/tt1375666").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_write_failures() {
    let (_dir, router) = setup(Some(TOKEN));

    let mut dup = inception();
    dup["id"] = json!("tt0111161");
    let (status, body) = send(
        &router,
        write_request(Method::POST, "/movies", Some(TOKEN), Some(dup)),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["tipo"], "duplicate");

    let request = Request::post("/movies")
        .header(header::AUTHORIZATION, format!("Bearer {}", TOKEN))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send(&router, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["tipo"], "validation");

    let (status, _) = send(
        &router,
        write_request(
            Method::PUT,
            "/movies/tt0111161",
            Some(TOKEN),
            Some(json!({ "plot": "rewritten" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &router,
        write_request(Method::DELETE, "/movies/tt9999999", Some(TOKEN), None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_auth_enforcement() {
    let (_dir, router) = setup(Some(TOKEN));

    let (status, body) = send(
        &router,
        write_request(Method::POST, "/movies", None, Some(inception())),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["tipo"], "auth");

    let (status, _) = send(
        &router,
        write_request(Method::DELETE, "/movies/tt0111161", Some("wrong"), None),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = get(&router, "/movies/tt0111161").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_writes_open_without_token() {
    let (_dir, router) = setup(None);

    let (status, _) = send(
        &router,
        write_request(Method::POST, "/movies", None, Some(inception())),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}
