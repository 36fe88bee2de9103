use anyhow::Result;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use newsroom_api::database::Database;
use newsroom_api::resource::Registry;
use newsroom_api::server::{app, AppState};

/// Build a fresh application over an in-memory database. Each test gets
/// its own instance, so tests stay independent of execution order.
pub async fn test_app() -> Result<Router> {
    let registry = Registry::builtin()?;
    let db = Database::connect_url("sqlite::memory:", 1).await?;
    db.ensure_schema(&registry).await?;
    Ok(app(AppState::new(db, registry)))
}

/// Drive one request through the router and decode the response body.
/// Non-JSON bodies (the plaintext root route) come back as a JSON string.
pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> Result<(StatusCode, Value)> {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))?,
        None => builder.body(Body::empty())?,
    };
    let response = app.clone().oneshot(request).await?;

    let status = response.status();
    let bytes = response.into_body().collect().await?.to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    Ok((status, value))
}

/// Send a request with a raw (possibly malformed) body.
pub async fn send_raw(
    app: &Router,
    method: &str,
    uri: &str,
    body: &str,
) -> Result<(StatusCode, Value)> {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))?;
    let response = app.clone().oneshot(request).await?;

    let status = response.status();
    let bytes = response.into_body().collect().await?.to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    Ok((status, value))
}
