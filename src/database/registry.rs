//! Schema registry: creates and drops tenant schemas from the topology, and
//! bootstraps the global tables every tenant hangs off.

use sqlx::{PgConnection, PgPool};
use tracing::info;

use super::identifier::{LogicalTable, TenantSchema};
use super::manager::DatabaseError;
use super::topology::table_def;

/// One statement of a provisioning run, labelled for error reports.
#[derive(Debug, Clone)]
pub struct DdlStatement {
    pub label: String,
    pub sql: String,
}

/// Every statement needed to bring `schema` to the current topology, in order:
/// the schema itself, then tables with referents first, then indexes.
///
/// All statements are `IF NOT EXISTS`, so replaying the list is a no-op on an
/// already provisioned schema.
pub fn provisioning_statements(schema: &TenantSchema) -> Vec<DdlStatement> {
    let mut statements = vec![DdlStatement {
        label: "schema".to_string(),
        sql: format!("CREATE SCHEMA IF NOT EXISTS {}", schema.quoted()),
    }];

    for table in LogicalTable::ALL {
        statements.push(DdlStatement {
            label: format!("table {}", table),
            sql: table_def(table).create_table_sql(schema),
        });
    }

    for table in LogicalTable::ALL {
        for (name, sql) in table_def(table).create_index_sql(schema) {
            statements.push(DdlStatement { label: format!("index {}", name), sql });
        }
    }

    statements
}

/// Run the provisioning statements on an existing connection.
///
/// Callers that need all-or-nothing semantics pass a transaction; PostgreSQL
/// DDL is transactional, so a failure part way rolls the schema back with it.
pub async fn provision(conn: &mut PgConnection, schema: &TenantSchema) -> Result<(), DatabaseError> {
    for statement in provisioning_statements(schema) {
        sqlx::query(&statement.sql)
            .execute(&mut *conn)
            .await
            .map_err(|source| DatabaseError::SchemaProvisioning {
                schema: schema.to_string(),
                statement: statement.label.clone(),
                source,
            })?;
    }
    Ok(())
}

/// Provision `schema` in its own transaction.
pub async fn provision_tenant_schema(pool: &PgPool, schema: &TenantSchema) -> Result<(), DatabaseError> {
    let mut tx = pool.begin().await?;
    provision(&mut tx, schema).await?;
    tx.commit().await?;
    info!("Provisioned tenant schema {}", schema);
    Ok(())
}

/// Drop `schema` and everything in it.
pub async fn deprovision(conn: &mut PgConnection, schema: &TenantSchema) -> Result<(), DatabaseError> {
    let sql = format!("DROP SCHEMA IF EXISTS {} CASCADE", schema.quoted());
    sqlx::query(&sql).execute(&mut *conn).await?;
    Ok(())
}

pub async fn deprovision_tenant_schema(pool: &PgPool, schema: &TenantSchema) -> Result<(), DatabaseError> {
    let mut conn = pool.acquire().await?;
    deprovision(&mut conn, schema).await?;
    info!("Dropped tenant schema {}", schema);
    Ok(())
}

/// Whether `schema` exists in the catalog.
pub async fn schema_exists(pool: &PgPool, schema: &TenantSchema) -> Result<bool, DatabaseError> {
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM information_schema.schemata WHERE schema_name = $1)",
    )
    .bind(schema.as_str())
    .fetch_one(pool)
    .await?;
    Ok(exists)
}

const GLOBAL_DDL: [&str; 5] = [
    "CREATE EXTENSION IF NOT EXISTS pgcrypto",
    r#"CREATE TABLE IF NOT EXISTS "users" (
    "id" UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    "username" TEXT NOT NULL,
    "email" TEXT NOT NULL UNIQUE,
    "password_hash" TEXT NOT NULL,
    "schema_name" TEXT NOT NULL UNIQUE,
    "created_at" TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    "updated_at" TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    "deleted_at" TIMESTAMPTZ
)"#,
    r#"ALTER TABLE "users" ADD COLUMN IF NOT EXISTS "deleted_at" TIMESTAMPTZ"#,
    r#"CREATE UNIQUE INDEX IF NOT EXISTS "users_username_lower_key" ON "users" (LOWER("username"))"#,
    r#"CREATE TABLE IF NOT EXISTS "user_preferences" (
    "user_id" UUID PRIMARY KEY REFERENCES "users" ("id") ON DELETE CASCADE,
    "ui_state" JSONB NOT NULL DEFAULT '[]'::jsonb,
    "updated_at" TIMESTAMPTZ NOT NULL DEFAULT NOW()
)"#,
];

/// Create the global `users` and `user_preferences` tables if missing.
pub async fn bootstrap_global(pool: &PgPool) -> Result<(), DatabaseError> {
    for sql in GLOBAL_DDL {
        sqlx::query(sql).execute(pool).await?;
    }
    info!("Global tables ready");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_is_created_before_tables() {
        let schema = TenantSchema::parse("user_alice_1").unwrap();
        let statements = provisioning_statements(&schema);
        assert_eq!(statements[0].sql, "CREATE SCHEMA IF NOT EXISTS \"user_alice_1\"");
        assert_eq!(statements[1].label, "table todos");
    }

    #[test]
    fn every_table_is_provisioned_once() {
        let schema = TenantSchema::parse("user_alice_1").unwrap();
        let statements = provisioning_statements(&schema);
        for table in LogicalTable::ALL {
            let label = format!("table {}", table);
            assert_eq!(statements.iter().filter(|s| s.label == label).count(), 1);
        }
    }

    #[test]
    fn indexes_follow_tables() {
        let schema = TenantSchema::parse("user_alice_1").unwrap();
        let statements = provisioning_statements(&schema);
        let last_table = statements.iter().rposition(|s| s.label.starts_with("table ")).unwrap();
        let first_index = statements.iter().position(|s| s.label.starts_with("index ")).unwrap();
        assert!(last_table < first_index);
    }

    #[test]
    fn statements_are_idempotent_and_scoped() {
        let schema = TenantSchema::parse("user_bob_2").unwrap();
        for statement in provisioning_statements(&schema) {
            assert!(statement.sql.contains("IF NOT EXISTS"), "{}", statement.label);
            assert!(statement.sql.contains("\"user_bob_2\""), "{}", statement.label);
        }
    }
}
