use serde::Deserialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::database::identifier::LogicalTable;
use crate::database::topology::{table_def, Owner, TableDef};
use crate::error::ApiError;
use crate::filter::filter_order::FilterOrder;
use crate::filter::types::FilterData;

/// Resolve `:table` to a table the caller owns rows of directly.
///
/// Exercises and sets are only reachable through their workout routes.
pub fn resolve_table(name: &str) -> Result<LogicalTable, ApiError> {
    match LogicalTable::from_name(name) {
        Some(table) if table_def(table).owner == Owner::Direct => Ok(table),
        _ => Err(ApiError::not_found(format!("Unknown table '{}'", name))),
    }
}

/// Columns that mirror the notes directory on disk. They are written by the
/// notes handlers and the reconciler only.
fn managed_columns(table: LogicalTable) -> &'static [&'static str] {
    match table {
        LogicalTable::NoteFolders => &["name", "path", "parent_id"],
        LogicalTable::NoteFiles => &["folder_id", "stored_name", "file_path", "file_size"],
        _ => &[],
    }
}

/// Refuse generic updates of disk-backed columns.
pub fn reject_managed_columns(table: LogicalTable, data: &Map<String, Value>) -> Result<(), ApiError> {
    match managed_columns(table).iter().find(|column| data.contains_key(**column)) {
        Some(column) => Err(ApiError::field_error(
            column,
            format!("{} cannot be changed through /api/data", column),
        )),
        None => Ok(()),
    }
}

pub fn parse_id(id: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(id).map_err(|_| ApiError::field_error("id", "Invalid UUID"))
}

/// Request bodies must be JSON objects.
pub fn into_object(body: Value) -> Result<Map<String, Value>, ApiError> {
    match body {
        Value::Object(map) => Ok(map),
        _ => Err(ApiError::bad_request("Request body must be a JSON object")),
    }
}

/// List filters accepted on collection endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
    /// Inclusive lower bound on the table's range column.
    pub from: Option<String>,
    /// Inclusive upper bound on the table's range column.
    pub to: Option<String>,
    /// Folder id, or `root` for entries outside any folder.
    pub folder_id: Option<String>,
    pub school_year_id: Option<String>,
    pub order: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl ListQuery {
    pub fn to_filter(&self, def: &TableDef) -> Result<FilterData, ApiError> {
        let mut filter = FilterData::new().page(self.limit, self.offset);

        if let Some(status) = &self.status {
            filter = filter.eq("status", status.as_str());
        }

        if self.from.is_some() || self.to.is_some() {
            let column = def
                .range_column
                .ok_or_else(|| ApiError::bad_request(format!("{} does not support date ranges", def.table)))?;
            if let Some(from) = &self.from {
                filter = filter.gte(column, from.as_str());
            }
            if let Some(to) = &self.to {
                filter = filter.lte(column, to.as_str());
            }
        }

        if let Some(folder_id) = &self.folder_id {
            filter = match folder_id.as_str() {
                "root" | "null" => filter.is_null("folder_id"),
                id => filter.eq("folder_id", uuid_param("folder_id", id)?),
            };
        }

        if let Some(school_year_id) = &self.school_year_id {
            filter = filter.eq("school_year_id", uuid_param("school_year_id", school_year_id)?);
        }

        if let Some(order) = &self.order {
            filter.order = FilterOrder::parse(order);
        }

        Ok(filter)
    }
}

fn uuid_param(field: &str, value: &str) -> Result<String, ApiError> {
    Uuid::parse_str(value)
        .map(|id| id.to_string())
        .map_err(|_| ApiError::field_error(field, "Invalid UUID"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::types::FilterOp;

    #[test]
    fn resolves_only_directly_owned_tables() {
        assert_eq!(resolve_table("todos").unwrap(), LogicalTable::Todos);
        assert_eq!(resolve_table("body-metrics").unwrap(), LogicalTable::BodyMetrics);
        assert!(resolve_table("sets").is_err());
        assert!(resolve_table("users").is_err());
    }

    #[test]
    fn disk_backed_columns_are_read_only() {
        let patch = into_object(serde_json::json!({ "path": "../../bob/notes/Secret" })).unwrap();
        assert!(reject_managed_columns(LogicalTable::NoteFolders, &patch).is_err());

        let patch = into_object(serde_json::json!({ "file_path": "/etc/passwd" })).unwrap();
        assert!(reject_managed_columns(LogicalTable::NoteFiles, &patch).is_err());

        let patch = into_object(serde_json::json!({ "filename": "Essay (final).md" })).unwrap();
        assert!(reject_managed_columns(LogicalTable::NoteFiles, &patch).is_ok());

        let patch = into_object(serde_json::json!({ "path": "x" })).unwrap();
        assert!(reject_managed_columns(LogicalTable::Todos, &patch).is_ok());
    }

    #[test]
    fn range_uses_table_range_column() {
        let query = ListQuery {
            from: Some("2024-01-01".to_string()),
            to: Some("2024-01-31".to_string()),
            ..Default::default()
        };
        let filter = query.to_filter(table_def(LogicalTable::Events)).unwrap();
        assert_eq!(filter.where_clause.len(), 2);
        assert_eq!(filter.where_clause[0].column, "start_time");
        assert_eq!(filter.where_clause[0].operator, FilterOp::Gte);
        assert_eq!(filter.where_clause[1].operator, FilterOp::Lte);
    }

    #[test]
    fn range_rejected_without_range_column() {
        let query = ListQuery { from: Some("2024-01-01".to_string()), ..Default::default() };
        assert!(query.to_filter(table_def(LogicalTable::NoteFolders)).is_err());
    }

    #[test]
    fn root_folder_means_null() {
        let query = ListQuery { folder_id: Some("root".to_string()), ..Default::default() };
        let filter = query.to_filter(table_def(LogicalTable::Notes)).unwrap();
        assert_eq!(filter.where_clause[0].operator, FilterOp::Null);

        let query = ListQuery { folder_id: Some("not-a-uuid".to_string()), ..Default::default() };
        assert!(query.to_filter(table_def(LogicalTable::Notes)).is_err());
    }
}
