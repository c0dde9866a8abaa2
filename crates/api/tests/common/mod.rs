#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use crowdqueue_api::config::ServerConfig;
use crowdqueue_api::router::build_app_router;
use crowdqueue_api::state::AppState;

/// Build a test `ServerConfig` with safe defaults.
///
/// The database URL is unused: tests hand the router a pool directly.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        database_url: String::new(),
        database_max_connections: 5,
    }
}

/// Build the full application router, with the production middleware stack,
/// around the given database pool.
pub fn build_test_app(pool: PgPool) -> Router {
    build_app_router(AppState::new(pool, test_config()))
}

/// Send a request, optionally as `user` and optionally with a JSON body.
pub async fn send(
    app: Router,
    method: Method,
    uri: &str,
    user: Option<&str>,
    body: Option<serde_json::Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header("x-user-id", user);
    }
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    app.oneshot(builder.body(body).unwrap()).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None, None).await
}

pub async fn get_as(app: Router, uri: &str, user: &str) -> Response<Body> {
    send(app, Method::GET, uri, Some(user), None).await
}

pub async fn post_as(app: Router, uri: &str, user: &str) -> Response<Body> {
    send(app, Method::POST, uri, Some(user), None).await
}

pub async fn post_json_as(
    app: Router,
    uri: &str,
    user: &str,
    body: serde_json::Value,
) -> Response<Body> {
    send(app, Method::POST, uri, Some(user), Some(body)).await
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Submit `https://youtu.be/vid{n:08}` to `playlist` and return the new entry id.
pub async fn submit(app: Router, playlist: &str, n: u32) -> i64 {
    let response = post_json_as(
        app,
        &format!("/api/v1/playlists/{playlist}/entries"),
        "submitter",
        serde_json::json!({
            "url": format!("https://youtu.be/vid{n:08}"),
            "title": format!("Track {n}"),
        }),
    )
    .await;
    assert_eq!(response.status(), 201);
    body_json(response).await["data"]["id"].as_i64().unwrap()
}
