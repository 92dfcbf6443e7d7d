//! Shared helpers for the database-backed integration tests.
//!
//! Every test calls [`test_pool`] first and returns early when
//! `DATABASE_URL` is not set, so `cargo test` stays green without PostgreSQL.
#![allow(dead_code)]

use std::path::Path;

use anyhow::Result;
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::Value;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tokio::sync::Mutex;
use tower::ServiceExt;
use uuid::Uuid;

use hub_api::app::{app, AppState};
use hub_api::config::AppConfig;
use hub_api::database::identifier::TenantSchema;
use hub_api::database::manager::DatabaseManager;
use hub_api::database::registry;

static BOOTSTRAPPED: Mutex<bool> = Mutex::const_new(false);

/// Pool against `DATABASE_URL` with the global tables in place, or `None`.
pub async fn test_pool() -> Option<PgPool> {
    let _ = dotenvy::dotenv();
    let url = std::env::var("DATABASE_URL").ok()?;
    let pool = match PgPoolOptions::new().max_connections(5).connect(&url).await {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("skipping: cannot connect to DATABASE_URL: {e}");
            return None;
        }
    };

    // Concurrent CREATE ... IF NOT EXISTS can still collide in the catalog.
    let mut done = BOOTSTRAPPED.lock().await;
    if !*done {
        if let Err(e) = registry::bootstrap_global(&pool).await {
            eprintln!("skipping: bootstrap failed: {e}");
            return None;
        }
        *done = true;
    }
    Some(pool)
}

/// Short unique suffix for usernames and schema names.
pub fn unique(prefix: &str) -> String {
    format!("{}{}", prefix, &Uuid::new_v4().simple().to_string()[..12])
}

/// A freshly provisioned schema that belongs to no registered user.
pub async fn fresh_schema(pool: &PgPool) -> Result<TenantSchema> {
    let schema = TenantSchema::derive(&unique("it_"), chrono::Utc::now().timestamp_millis())?;
    registry::provision_tenant_schema(pool, &schema).await?;
    Ok(schema)
}

pub async fn drop_schema(pool: &PgPool, schema: &TenantSchema) {
    let _ = registry::deprovision_tenant_schema(pool, schema).await;
}

/// In-process router over `pool`, storing files under `data_root`.
pub fn test_app(pool: PgPool, data_root: &Path) -> Router {
    let mut config = AppConfig::development();
    config.storage.data_root = data_root.to_path_buf();
    config.security.jwt_secret = "integration-test-secret".to_string();
    config.api.enable_request_logging = false;
    app(AppState::new(DatabaseManager::from_pool(pool), config))
}

/// Send one request through the router and decode the JSON envelope.
pub async fn send(app: &Router, request: Request<Body>) -> Result<(StatusCode, Value)> {
    let response = app.clone().oneshot(request).await?;
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    let body = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes)? };
    Ok((status, body))
}

pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("valid request")
}

/// Register `username` through the API and return its session token.
pub async fn register(app: &Router, username: &str) -> Result<String> {
    let body = serde_json::json!({
        "username": username,
        "email": format!("{username}@example.com"),
        "password": "correct-horse",
    });
    let (status, body) = send(app, json_request("POST", "/auth/register", None, Some(body))).await?;
    anyhow::ensure!(status == StatusCode::CREATED, "register returned {status}: {body}");
    body["data"]["token"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| anyhow::anyhow!("no token in {body}"))
}
