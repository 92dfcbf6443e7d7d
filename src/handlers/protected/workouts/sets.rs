// handlers/protected/workouts/sets.rs - set handlers
//
// Ownership of a set is checked through exercise then workout.

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde_json::Value;

use crate::app::AppState;
use crate::database::identifier::LogicalTable;
use crate::database::query_builder::QueryBuilder;
use crate::handlers::protected::data::utils::{into_object, parse_id};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};

use super::{create_child, list_children};

/// GET /api/exercises/:id/sets
pub async fn sets_list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(exercise_id): Path<String>,
) -> ApiResult<Vec<Value>> {
    let exercise_id = parse_id(&exercise_id)?;
    let rows = list_children(
        state.pool(),
        &user,
        LogicalTable::Exercises,
        exercise_id,
        LogicalTable::Sets,
        "exercise_id",
    )
    .await?;
    Ok(ApiResponse::success(rows))
}

/// POST /api/exercises/:id/sets
pub async fn sets_create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(exercise_id): Path<String>,
    Json(body): Json<Value>,
) -> ApiResult<Value> {
    let exercise_id = parse_id(&exercise_id)?;
    let data = into_object(body)?;
    let row = create_child(state.pool(), &user, exercise_id, LogicalTable::Sets, "exercise_id", data).await?;
    Ok(ApiResponse::created(row))
}

/// PATCH /api/sets/:id
pub async fn set_update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> ApiResult<Value> {
    let id = parse_id(&id)?;
    let data = into_object(body)?;
    let row = QueryBuilder::new(&user.schema, LogicalTable::Sets, user.id)
        .update(state.pool(), id, &data)
        .await?;
    Ok(ApiResponse::success(row))
}

/// DELETE /api/sets/:id
pub async fn set_delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    let id = parse_id(&id)?;
    let row = QueryBuilder::new(&user.schema, LogicalTable::Sets, user.id)
        .delete(state.pool(), id)
        .await?;
    Ok(ApiResponse::success(row))
}
