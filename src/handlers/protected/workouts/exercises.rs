// handlers/protected/workouts/exercises.rs - exercise handlers
//
// Exercises have no owner column; every statement checks ownership through
// the parent workout.

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

/// GET /api/workouts/:id/exercises
pub async fn exercises_list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(workout_id): Path<String>,
) -> ApiResult<Vec<Value>> {
    let workout_id = parse_id(&workout_id)?;
    let rows = list_children(
        state.pool(),
        &user,
        LogicalTable::Workouts,
        workout_id,
        LogicalTable::Exercises,
        "workout_id",
    )
    .await?;
    Ok(ApiResponse::success(rows))
}

/// POST /api/workouts/:id/exercises
pub async fn exercises_create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(workout_id): Path<String>,
    Json(body): Json<Value>,
) -> ApiResult<Value> {
    let workout_id = parse_id(&workout_id)?;
    let data = into_object(body)?;
    let row = create_child(state.pool(), &user, workout_id, LogicalTable::Exercises, "workout_id", data).await?;
    Ok(ApiResponse::created(row))
}

/// PATCH /api/exercises/:id
pub async fn exercise_update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> ApiResult<Value> {
    let id = parse_id(&id)?;
    let data = into_object(body)?;
    let row = QueryBuilder::new(&user.schema, LogicalTable::Exercises, user.id)
        .update(state.pool(), id, &data)
        .await?;
    Ok(ApiResponse::success(row))
}

/// DELETE /api/exercises/:id - its sets go with it
pub async fn exercise_delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    let id = parse_id(&id)?;
    let row = QueryBuilder::new(&user.schema, LogicalTable::Exercises, user.id)
        .delete(state.pool(), id)
        .await?;
    Ok(ApiResponse::success(row))
}
