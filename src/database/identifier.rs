//! Identifiers that are allowed to appear in SQL text.
//!
//! Values always travel as bind parameters. The only strings ever interpolated
//! into a statement are the ones represented here: a validated tenant schema
//! name, a logical table from the fixed topology, and column names checked
//! against that topology.

use std::fmt;

use serde::{Serialize, Serializer};

use super::manager::DatabaseError;

/// PostgreSQL identifier length limit (NAMEDATALEN - 1).
const MAX_IDENTIFIER_LEN: usize = 63;

const SCHEMA_PREFIX: &str = "user_";

/// A tenant's schema name, restricted to `user_[a-z0-9_]+`.
///
/// There is no `From<String>`: the only ways to obtain one are deriving it at
/// registration or parsing a value that came from the verified session claim
/// (or the `users.schema_name` column it was copied from).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TenantSchema(String);

impl TenantSchema {
    /// Derive the schema name for a newly registered user:
    /// `user_<sanitized lowercased username>_<epoch millis>`.
    pub fn derive(username: &str, registered_at_millis: i64) -> Result<Self, DatabaseError> {
        let sanitized: String = username
            .to_lowercase()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        Self::parse(&format!("{}{}_{}", SCHEMA_PREFIX, sanitized, registered_at_millis))
    }

    /// Validate a schema name taken from a trusted source.
    pub fn parse(name: &str) -> Result<Self, DatabaseError> {
        if name.len() > MAX_IDENTIFIER_LEN {
            return Err(DatabaseError::InvalidIdentifier(format!(
                "schema name exceeds {} bytes",
                MAX_IDENTIFIER_LEN
            )));
        }
        let rest = name
            .strip_prefix(SCHEMA_PREFIX)
            .ok_or_else(|| DatabaseError::InvalidIdentifier("schema name must start with 'user_'".to_string()))?;
        if rest.is_empty() {
            return Err(DatabaseError::InvalidIdentifier("schema name has no tenant part".to_string()));
        }
        if !rest.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_') {
            return Err(DatabaseError::InvalidIdentifier(
                "schema name may only contain [a-z0-9_]".to_string(),
            ));
        }
        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Quoted form for statement text, e.g. `"user_alice_1700000000000"`.
    pub fn quoted(&self) -> String {
        quote_identifier(&self.0)
    }

    /// Fully qualified reference to one of this tenant's tables.
    pub fn qualify(&self, table: LogicalTable) -> String {
        format!("{}.{}", self.quoted(), quote_identifier(table.as_str()))
    }
}

impl fmt::Display for TenantSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for TenantSchema {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

/// The fixed per-tenant topology, in creation order (referents first).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogicalTable {
    Todos,
    Events,
    BodyMetrics,
    Workouts,
    Exercises,
    Sets,
    NutritionProfiles,
    NutritionLogs,
    SchoolYears,
    TimetableEntries,
    SchoolTodos,
    NoteFolders,
    Notes,
    NoteFiles,
    Grades,
}

impl LogicalTable {
    pub const ALL: [LogicalTable; 15] = [
        LogicalTable::Todos,
        LogicalTable::Events,
        LogicalTable::BodyMetrics,
        LogicalTable::Workouts,
        LogicalTable::Exercises,
        LogicalTable::Sets,
        LogicalTable::NutritionProfiles,
        LogicalTable::NutritionLogs,
        LogicalTable::SchoolYears,
        LogicalTable::TimetableEntries,
        LogicalTable::SchoolTodos,
        LogicalTable::NoteFolders,
        LogicalTable::Notes,
        LogicalTable::NoteFiles,
        LogicalTable::Grades,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LogicalTable::Todos => "todos",
            LogicalTable::Events => "events",
            LogicalTable::BodyMetrics => "body_metrics",
            LogicalTable::Workouts => "workouts",
            LogicalTable::Exercises => "exercises",
            LogicalTable::Sets => "sets",
            LogicalTable::NutritionProfiles => "nutrition_profiles",
            LogicalTable::NutritionLogs => "nutrition_logs",
            LogicalTable::SchoolYears => "school_years",
            LogicalTable::TimetableEntries => "timetable_entries",
            LogicalTable::SchoolTodos => "school_todos",
            LogicalTable::NoteFolders => "note_folders",
            LogicalTable::Notes => "notes",
            LogicalTable::NoteFiles => "note_files",
            LogicalTable::Grades => "grades",
        }
    }

    /// Resolve a URL segment (`body_metrics` or `body-metrics`) to a table.
    pub fn from_name(name: &str) -> Option<Self> {
        let normalized = name.replace('-', "_");
        Self::ALL.into_iter().find(|t| t.as_str() == normalized)
    }
}

impl fmt::Display for LogicalTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Quote SQL identifier to prevent injection
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_schema_from_username() {
        let schema = TenantSchema::derive("Alice", 1_700_000_000_000).unwrap();
        assert_eq!(schema.as_str(), "user_alice_1700000000000");
    }

    #[test]
    fn derive_sanitizes_hyphens() {
        let schema = TenantSchema::derive("mary-jane_99", 42).unwrap();
        assert_eq!(schema.as_str(), "user_mary_jane_99_42");
    }

    #[test]
    fn longest_username_still_fits() {
        let username = "a".repeat(30);
        let schema = TenantSchema::derive(&username, 9_999_999_999_999).unwrap();
        assert!(schema.as_str().len() <= MAX_IDENTIFIER_LEN);
    }

    #[test]
    fn parse_rejects_unsafe_names() {
        assert!(TenantSchema::parse("user_alice_1").is_ok());
        assert!(TenantSchema::parse("public").is_err());
        assert!(TenantSchema::parse("user_").is_err());
        assert!(TenantSchema::parse("user_Alice").is_err());
        assert!(TenantSchema::parse("user_a\"; DROP SCHEMA public; --").is_err());
        assert!(TenantSchema::parse("user_a.b").is_err());
        assert!(TenantSchema::parse(&format!("user_{}", "a".repeat(64))).is_err());
    }

    #[test]
    fn qualifies_table_references() {
        let schema = TenantSchema::parse("user_bob_7").unwrap();
        assert_eq!(schema.qualify(LogicalTable::BodyMetrics), "\"user_bob_7\".\"body_metrics\"");
    }

    #[test]
    fn resolves_table_names() {
        assert_eq!(LogicalTable::from_name("todos"), Some(LogicalTable::Todos));
        assert_eq!(LogicalTable::from_name("body-metrics"), Some(LogicalTable::BodyMetrics));
        assert_eq!(LogicalTable::from_name("users"), None);
        assert_eq!(LogicalTable::from_name("todos; --"), None);
    }

    #[test]
    fn quote_identifier_escapes_quotes() {
        assert_eq!(quote_identifier("order"), "\"order\"");
        assert_eq!(quote_identifier("a\"b"), "\"a\"\"b\"");
    }
}
