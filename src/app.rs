use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, State},
    http::{HeaderValue, StatusCode},
    middleware::from_fn_with_state,
    response::{IntoResponse, Json},
    routing::{get, patch, post, put},
    Router,
};
use serde_json::{json, Value};
use sqlx::PgPool;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::database::manager::DatabaseManager;
use crate::handlers::{protected, public};
use crate::middleware::jwt_auth_middleware;
use crate::services::storage::StorageLayout;
use crate::services::tenant_service::TenantService;

/// Shared handles every handler receives.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseManager,
    pub config: Arc<AppConfig>,
    pub storage: StorageLayout,
}

impl AppState {
    pub fn new(db: DatabaseManager, config: AppConfig) -> Self {
        let storage = StorageLayout::new(config.storage.data_root.clone());
        Self { db, config: Arc::new(config), storage }
    }

    pub fn pool(&self) -> &PgPool {
        self.db.pool()
    }

    pub fn tenants(&self) -> TenantService {
        TenantService::new(self.pool().clone(), &self.config.security)
    }
}

pub fn app(state: AppState) -> Router {
    let mut router = Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .merge(auth_public_routes())
        // Protected API
        .merge(protected_routes(state.clone()))
        .with_state(state.clone());

    if state.config.api.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }
    if state.config.security.enable_cors {
        router = router.layer(cors_layer(&state.config.security.cors_origins));
    }
    router
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }
    let origins: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
    CorsLayer::new().allow_origin(origins).allow_methods(Any).allow_headers(Any)
}

fn auth_public_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(public::auth::register))
        .route("/auth/login", post(public::auth::login))
}

fn protected_routes(state: AppState) -> Router<AppState> {
    let upload_limit = state.config.api.max_upload_bytes;

    Router::new()
        // Session and account
        .route("/api/auth/whoami", get(protected::auth::whoami))
        .route("/api/auth/account", axum::routing::delete(protected::auth::delete_account))
        // Generic table CRUD
        .route("/api/data/:table", get(protected::data::list).post(protected::data::create))
        .route(
            "/api/data/:table/:id",
            get(protected::data::show)
                .patch(protected::data::update)
                .delete(protected::data::remove),
        )
        // Nested workout resources
        .route(
            "/api/workouts/:id/exercises",
            get(protected::workouts::exercises_list).post(protected::workouts::exercises_create),
        )
        .route(
            "/api/exercises/:id",
            patch(protected::workouts::exercise_update).delete(protected::workouts::exercise_delete),
        )
        .route(
            "/api/exercises/:id/sets",
            get(protected::workouts::sets_list).post(protected::workouts::sets_create),
        )
        .route(
            "/api/sets/:id",
            patch(protected::workouts::set_update).delete(protected::workouts::set_delete),
        )
        // Notes
        .route(
            "/api/notes/folders",
            get(protected::notes::folders_list).post(protected::notes::folders_create),
        )
        .route(
            "/api/notes/files",
            get(protected::notes::files_list)
                .post(protected::notes::files_upload)
                .layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route(
            "/api/notes/files/:id/content",
            put(protected::notes::files_overwrite).layer(DefaultBodyLimit::max(upload_limit)),
        )
        // Preferences
        .route(
            "/api/preferences",
            get(protected::preferences::get).put(protected::preferences::put),
        )
        .route_layer(from_fn_with_state(state, jwt_auth_middleware))
}

async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "Hub API",
            "version": version,
            "description": "Personal hub backend with per-user schema isolation",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "public_auth": "/auth/register, /auth/login (public - token acquisition)",
                "auth": "/api/auth/whoami, /api/auth/account (protected)",
                "data": "/api/data/:table[/:id] (protected)",
                "workouts": "/api/workouts/:id/exercises, /api/exercises/:id[/sets], /api/sets/:id (protected)",
                "notes": "/api/notes/folders, /api/notes/files[/:id/content] (protected)",
                "preferences": "/api/preferences (protected)",
            }
        }
    }))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.db.health_check().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "database unavailable",
                    "code": "SERVICE_UNAVAILABLE",
                    "data": {
                        "status": "degraded",
                        "timestamp": now
                    }
                })),
            )
        }
    }
}
