pub mod exercises;
pub mod sets;

pub use exercises::{exercise_delete, exercise_update, exercises_create, exercises_list};
pub use sets::{set_delete, set_update, sets_create, sets_list};

use serde_json::{Map, Value};
use uuid::Uuid;

use crate::database::identifier::LogicalTable;
use crate::database::query_builder::QueryBuilder;
use crate::error::ApiError;
use crate::filter::types::FilterData;
use crate::middleware::AuthUser;

/// Rows of `child` under one parent, after confirming the caller owns the parent.
async fn list_children(
    pool: &sqlx::PgPool,
    user: &AuthUser,
    parent: LogicalTable,
    parent_id: Uuid,
    child: LogicalTable,
    link: &str,
) -> Result<Vec<Value>, ApiError> {
    QueryBuilder::new(&user.schema, parent, user.id)
        .find_by_id(pool, parent_id)
        .await?;

    let rows = QueryBuilder::new(&user.schema, child, user.id)
        .filter(FilterData::new().eq(link, parent_id.to_string()))
        .list(pool)
        .await?;
    Ok(rows)
}

/// Insert a child row; the parent id comes from the path, never the body.
async fn create_child(
    pool: &sqlx::PgPool,
    user: &AuthUser,
    parent_id: Uuid,
    child: LogicalTable,
    link: &str,
    mut data: Map<String, Value>,
) -> Result<Value, ApiError> {
    data.insert(link.to_string(), Value::String(parent_id.to_string()));
    let row = QueryBuilder::new(&user.schema, child, user.id)
        .insert(pool, &data)
        .await?;
    Ok(row)
}
