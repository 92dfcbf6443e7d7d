//! The fixed per-tenant table layout.
//!
//! One definition drives both the DDL the registry runs at provisioning time
//! and the column checks the query builder applies, so the two cannot drift
//! apart without a code change.

use crate::filter::types::SortDirection;

use super::identifier::{quote_identifier, LogicalTable, TenantSchema};

/// Columns every tenant table carries; not writable through the API.
pub const SYSTEM_COLUMNS: [&str; 4] = ["id", "user_id", "created_at", "updated_at"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    Uuid,
    Text,
    Integer,
    BigInt,
    Double,
    Boolean,
    Date,
    Time,
    Timestamptz,
    Jsonb,
}

impl SqlType {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SqlType::Uuid => "UUID",
            SqlType::Text => "TEXT",
            SqlType::Integer => "INTEGER",
            SqlType::BigInt => "BIGINT",
            SqlType::Double => "DOUBLE PRECISION",
            SqlType::Boolean => "BOOLEAN",
            SqlType::Date => "DATE",
            SqlType::Time => "TIME",
            SqlType::Timestamptz => "TIMESTAMPTZ",
            SqlType::Jsonb => "JSONB",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnDelete {
    Cascade,
}

#[derive(Debug, Clone, Copy)]
pub struct ColumnDef {
    pub name: &'static str,
    pub sql_type: SqlType,
    pub not_null: bool,
    pub default: Option<&'static str>,
    pub references: Option<(LogicalTable, OnDelete)>,
}

const fn col(name: &'static str, sql_type: SqlType) -> ColumnDef {
    ColumnDef { name, sql_type, not_null: false, default: None, references: None }
}

impl ColumnDef {
    const fn required(self) -> Self {
        ColumnDef { not_null: true, ..self }
    }

    const fn default(self, expr: &'static str) -> Self {
        ColumnDef { default: Some(expr), ..self }
    }

    const fn references(self, table: LogicalTable, on_delete: OnDelete) -> Self {
        ColumnDef { references: Some((table, on_delete)), ..self }
    }
}

/// How a row is tied back to the owning user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Owner {
    /// The row has its own `user_id` column.
    Direct,
    /// Ownership is inherited through a foreign key to `parent`.
    Via { column: &'static str, parent: LogicalTable },
}

#[derive(Debug, Clone, Copy)]
pub struct IndexDef {
    pub suffix: &'static str,
    /// Column list or expression, already quoted.
    pub expr: &'static str,
    pub unique: bool,
}

#[derive(Debug)]
pub struct TableDef {
    pub table: LogicalTable,
    pub owner: Owner,
    pub columns: &'static [ColumnDef],
    pub unique: &'static [&'static [&'static str]],
    pub indexes: &'static [IndexDef],
    /// Column used for `from`/`to` range filters on list endpoints.
    pub range_column: Option<&'static str>,
    pub default_order: &'static [(&'static str, SortDirection)],
}

use LogicalTable as T;
use SqlType::*;

static TODOS: TableDef = TableDef {
    table: T::Todos,
    owner: Owner::Direct,
    columns: &[
        col("title", Text).required(),
        col("description", Text),
        col("status", Text).required().default("'OPEN'"),
        col("priority", Text).required().default("'MEDIUM'"),
        col("due_date", Date),
        col("order", Integer).required().default("0"),
    ],
    unique: &[],
    indexes: &[IndexDef { suffix: "user_status_idx", expr: "\"user_id\", \"status\"", unique: false }],
    range_column: Some("due_date"),
    default_order: &[("order", SortDirection::Asc), ("created_at", SortDirection::Asc)],
};

static EVENTS: TableDef = TableDef {
    table: T::Events,
    owner: Owner::Direct,
    columns: &[
        col("title", Text).required(),
        col("description", Text),
        col("start_time", Timestamptz).required(),
        col("end_time", Timestamptz),
        col("all_day", Boolean).required().default("FALSE"),
        col("location", Text),
        col("color", Text),
    ],
    unique: &[],
    indexes: &[IndexDef { suffix: "user_start_idx", expr: "\"user_id\", \"start_time\"", unique: false }],
    range_column: Some("start_time"),
    default_order: &[("start_time", SortDirection::Asc)],
};

static BODY_METRICS: TableDef = TableDef {
    table: T::BodyMetrics,
    owner: Owner::Direct,
    columns: &[
        col("date", Date).required(),
        col("weight", Double),
        col("body_fat", Double),
        col("muscle_mass", Double),
        col("notes", Text),
    ],
    unique: &[&["user_id", "date"]],
    indexes: &[IndexDef { suffix: "user_date_idx", expr: "\"user_id\", \"date\"", unique: false }],
    range_column: Some("date"),
    default_order: &[("date", SortDirection::Desc)],
};

static WORKOUTS: TableDef = TableDef {
    table: T::Workouts,
    owner: Owner::Direct,
    columns: &[
        col("name", Text).required(),
        col("date", Date).required(),
        col("duration_minutes", Integer),
        col("notes", Text),
    ],
    unique: &[],
    indexes: &[IndexDef { suffix: "user_date_idx", expr: "\"user_id\", \"date\"", unique: false }],
    range_column: Some("date"),
    default_order: &[("date", SortDirection::Desc), ("created_at", SortDirection::Desc)],
};

static EXERCISES: TableDef = TableDef {
    table: T::Exercises,
    owner: Owner::Via { column: "workout_id", parent: T::Workouts },
    columns: &[
        col("workout_id", Uuid).required().references(T::Workouts, OnDelete::Cascade),
        col("name", Text).required(),
        col("order", Integer).required().default("0"),
        col("notes", Text),
    ],
    unique: &[],
    indexes: &[IndexDef { suffix: "workout_idx", expr: "\"workout_id\"", unique: false }],
    range_column: None,
    default_order: &[("order", SortDirection::Asc), ("created_at", SortDirection::Asc)],
};

static SETS: TableDef = TableDef {
    table: T::Sets,
    owner: Owner::Via { column: "exercise_id", parent: T::Exercises },
    columns: &[
        col("exercise_id", Uuid).required().references(T::Exercises, OnDelete::Cascade),
        col("set_number", Integer).required(),
        col("reps", Integer),
        col("weight", Double),
        col("rpe", Double),
        col("completed", Boolean).required().default("FALSE"),
    ],
    unique: &[],
    indexes: &[IndexDef { suffix: "exercise_idx", expr: "\"exercise_id\"", unique: false }],
    range_column: None,
    default_order: &[("set_number", SortDirection::Asc)],
};

static NUTRITION_PROFILES: TableDef = TableDef {
    table: T::NutritionProfiles,
    owner: Owner::Direct,
    columns: &[
        col("calorie_goal", Integer),
        col("protein_goal", Double),
        col("carbs_goal", Double),
        col("fat_goal", Double),
    ],
    unique: &[&["user_id"]],
    indexes: &[],
    range_column: None,
    default_order: &[("created_at", SortDirection::Asc)],
};

static NUTRITION_LOGS: TableDef = TableDef {
    table: T::NutritionLogs,
    owner: Owner::Direct,
    columns: &[
        col("date", Date).required(),
        col("meal_type", Text).required().default("'SNACK'"),
        col("food_name", Text).required(),
        col("calories", Double).required().default("0"),
        col("protein", Double),
        col("carbs", Double),
        col("fat", Double),
    ],
    unique: &[],
    indexes: &[IndexDef { suffix: "user_date_idx", expr: "\"user_id\", \"date\"", unique: false }],
    range_column: Some("date"),
    default_order: &[("date", SortDirection::Desc), ("created_at", SortDirection::Asc)],
};

static SCHOOL_YEARS: TableDef = TableDef {
    table: T::SchoolYears,
    owner: Owner::Direct,
    columns: &[
        col("name", Text).required(),
        col("start_date", Date),
        col("end_date", Date),
        col("is_active", Boolean).required().default("FALSE"),
    ],
    unique: &[],
    indexes: &[],
    range_column: Some("start_date"),
    default_order: &[("start_date", SortDirection::Desc)],
};

static TIMETABLE_ENTRIES: TableDef = TableDef {
    table: T::TimetableEntries,
    owner: Owner::Direct,
    columns: &[
        col("school_year_id", Uuid).references(T::SchoolYears, OnDelete::Cascade),
        col("day_of_week", Integer).required(),
        col("start_time", Time).required(),
        col("end_time", Time).required(),
        col("subject", Text).required(),
        col("room", Text),
        col("teacher", Text),
    ],
    unique: &[],
    indexes: &[],
    range_column: None,
    default_order: &[("day_of_week", SortDirection::Asc), ("start_time", SortDirection::Asc)],
};

static SCHOOL_TODOS: TableDef = TableDef {
    table: T::SchoolTodos,
    owner: Owner::Direct,
    columns: &[
        col("school_year_id", Uuid).references(T::SchoolYears, OnDelete::Cascade),
        col("title", Text).required(),
        col("subject", Text),
        col("due_date", Date),
        col("status", Text).required().default("'OPEN'"),
        col("order", Integer).required().default("0"),
    ],
    unique: &[],
    indexes: &[IndexDef { suffix: "user_status_idx", expr: "\"user_id\", \"status\"", unique: false }],
    range_column: Some("due_date"),
    default_order: &[("order", SortDirection::Asc), ("created_at", SortDirection::Asc)],
};

static NOTE_FOLDERS: TableDef = TableDef {
    table: T::NoteFolders,
    owner: Owner::Direct,
    columns: &[
        col("name", Text).required(),
        col("path", Text).required(),
        col("parent_id", Uuid).references(T::NoteFolders, OnDelete::Cascade),
    ],
    unique: &[&["user_id", "path"]],
    indexes: &[],
    range_column: None,
    default_order: &[("path", SortDirection::Asc)],
};

static NOTES: TableDef = TableDef {
    table: T::Notes,
    owner: Owner::Direct,
    columns: &[
        col("folder_id", Uuid).references(T::NoteFolders, OnDelete::Cascade),
        col("title", Text).required(),
        col("content", Text).required().default("''"),
        col("pinned", Boolean).required().default("FALSE"),
    ],
    unique: &[],
    indexes: &[],
    range_column: None,
    default_order: &[("pinned", SortDirection::Desc), ("updated_at", SortDirection::Desc)],
};

static NOTE_FILES: TableDef = TableDef {
    table: T::NoteFiles,
    owner: Owner::Direct,
    columns: &[
        col("folder_id", Uuid).references(T::NoteFolders, OnDelete::Cascade),
        col("filename", Text).required(),
        col("stored_name", Text).required(),
        col("file_path", Text).required(),
        col("file_type", Text).required(),
        col("file_size", BigInt).required(),
        col("annotations", Jsonb).required().default("'[]'::jsonb"),
    ],
    unique: &[],
    indexes: &[IndexDef {
        suffix: "scope_stored_name_key",
        expr: "\"user_id\", COALESCE(\"folder_id\", '00000000-0000-0000-0000-000000000000'::uuid), \"stored_name\"",
        unique: true,
    }],
    range_column: None,
    default_order: &[("filename", SortDirection::Asc)],
};

static GRADES: TableDef = TableDef {
    table: T::Grades,
    owner: Owner::Direct,
    columns: &[
        col("school_year_id", Uuid).references(T::SchoolYears, OnDelete::Cascade),
        col("subject", Text).required(),
        col("grade", Double).required(),
        col("weight", Double).required().default("1"),
        col("date", Date),
        col("description", Text),
    ],
    unique: &[],
    indexes: &[],
    range_column: Some("date"),
    default_order: &[("date", SortDirection::Desc)],
};

/// Definition for one logical table.
pub fn table_def(table: LogicalTable) -> &'static TableDef {
    match table {
        T::Todos => &TODOS,
        T::Events => &EVENTS,
        T::BodyMetrics => &BODY_METRICS,
        T::Workouts => &WORKOUTS,
        T::Exercises => &EXERCISES,
        T::Sets => &SETS,
        T::NutritionProfiles => &NUTRITION_PROFILES,
        T::NutritionLogs => &NUTRITION_LOGS,
        T::SchoolYears => &SCHOOL_YEARS,
        T::TimetableEntries => &TIMETABLE_ENTRIES,
        T::SchoolTodos => &SCHOOL_TODOS,
        T::NoteFolders => &NOTE_FOLDERS,
        T::Notes => &NOTES,
        T::NoteFiles => &NOTE_FILES,
        T::Grades => &GRADES,
    }
}

impl TableDef {
    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Declared type of any readable column, system columns included.
    pub fn column_type(&self, name: &str) -> Option<SqlType> {
        match name {
            "id" => Some(SqlType::Uuid),
            "user_id" if self.owner == Owner::Direct => Some(SqlType::Uuid),
            "created_at" | "updated_at" => Some(SqlType::Timestamptz),
            _ => self.column(name).map(|c| c.sql_type),
        }
    }

    pub fn is_writable(&self, name: &str) -> bool {
        !SYSTEM_COLUMNS.contains(&name) && self.column(name).is_some()
    }

    /// `CREATE TABLE IF NOT EXISTS` for this table inside `schema`.
    pub fn create_table_sql(&self, schema: &TenantSchema) -> String {
        let mut lines = vec!["    \"id\" UUID PRIMARY KEY DEFAULT gen_random_uuid()".to_string()];
        if self.owner == Owner::Direct {
            lines.push("    \"user_id\" UUID NOT NULL".to_string());
        }

        for column in self.columns {
            let mut line = format!("    {} {}", quote_identifier(column.name), column.sql_type.as_sql());
            if column.not_null {
                line.push_str(" NOT NULL");
            }
            if let Some(default) = column.default {
                line.push_str(" DEFAULT ");
                line.push_str(default);
            }
            if let Some((parent, on_delete)) = column.references {
                line.push_str(&format!(
                    " REFERENCES {} (\"id\") ON DELETE {}",
                    schema.qualify(parent),
                    match on_delete {
                        OnDelete::Cascade => "CASCADE",
                    }
                ));
            }
            lines.push(line);
        }

        lines.push("    \"created_at\" TIMESTAMPTZ NOT NULL DEFAULT NOW()".to_string());
        lines.push("    \"updated_at\" TIMESTAMPTZ NOT NULL DEFAULT NOW()".to_string());

        for unique in self.unique {
            let cols: Vec<String> = unique.iter().map(|c| quote_identifier(c)).collect();
            lines.push(format!("    UNIQUE ({})", cols.join(", ")));
        }

        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n{}\n)",
            schema.qualify(self.table),
            lines.join(",\n")
        )
    }

    /// Index name (schema-local) and its `CREATE INDEX IF NOT EXISTS` statement.
    pub fn create_index_sql(&self, schema: &TenantSchema) -> Vec<(String, String)> {
        self.indexes
            .iter()
            .map(|index| {
                let name = format!("{}_{}", self.table.as_str(), index.suffix);
                let sql = format!(
                    "CREATE {}INDEX IF NOT EXISTS {} ON {} ({})",
                    if index.unique { "UNIQUE " } else { "" },
                    quote_identifier(&name),
                    schema.qualify(self.table),
                    index.expr
                );
                (name, sql)
            })
            .collect()
    }
}
