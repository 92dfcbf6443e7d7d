use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};
use tracing::{error, info};
use uuid::Uuid;

use crate::auth::{generate_jwt, hash_password, verify_password, Claims, JwtError};
use crate::config::SecurityConfig;
use crate::database::identifier::TenantSchema;
use crate::database::manager::DatabaseError;
use crate::database::models::{User, UserSummary};
use crate::database::registry;

#[derive(Debug, thiserror::Error)]
pub enum TenantError {
    #[error("Invalid username: {0}")]
    InvalidUsername(String),
    #[error("Invalid email: {0}")]
    InvalidEmail(String),
    #[error("Invalid password: {0}")]
    InvalidPassword(String),
    #[error("User already exists: {0}")]
    AlreadyExists(String),
    #[error("Registration failed")]
    RegistrationFailed,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error(transparent)]
    Token(#[from] JwtError),
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<sqlx::Error> for TenantError {
    fn from(err: sqlx::Error) -> Self {
        TenantError::Database(DatabaseError::from(err))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    /// Username or email.
    pub login: String,
    pub password: String,
}

/// Session credential plus the public view of the account.
#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    pub token: String,
    pub user: UserSummary,
}

/// Schema creation step run inside the registration transaction.
#[async_trait]
pub trait SchemaProvisioner: Send + Sync {
    async fn provision(&self, conn: &mut PgConnection, schema: &TenantSchema) -> Result<(), DatabaseError>;
}

/// Provisions the full tenant topology through the registry.
pub struct RegistryProvisioner;

#[async_trait]
impl SchemaProvisioner for RegistryProvisioner {
    async fn provision(&self, conn: &mut PgConnection, schema: &TenantSchema) -> Result<(), DatabaseError> {
        registry::provision(conn, schema).await
    }
}

/// Tenant lifecycle: registration (account row plus schema) and deletion.
pub struct TenantService {
    pool: PgPool,
    jwt_secret: String,
    jwt_expiry_hours: u64,
    provisioner: Arc<dyn SchemaProvisioner>,
}

impl TenantService {
    pub fn new(pool: PgPool, security: &SecurityConfig) -> Self {
        Self {
            pool,
            jwt_secret: security.jwt_secret.clone(),
            jwt_expiry_hours: security.jwt_expiry_hours,
            provisioner: Arc::new(RegistryProvisioner),
        }
    }

    pub fn with_provisioner(mut self, provisioner: Arc<dyn SchemaProvisioner>) -> Self {
        self.provisioner = provisioner;
        self
    }

    /// Register a user and provision their schema.
    ///
    /// The `users` row, the `user_preferences` row and the schema DDL share
    /// one transaction, so a failure anywhere leaves no account behind.
    pub async fn register(&self, request: RegisterRequest) -> Result<Registration, TenantError> {
        validate_username(&request.username)?;
        let email = request.email.trim().to_lowercase();
        validate_email(&email)?;
        validate_password(&request.password)?;

        if self.account_exists(&request.username, &email).await? {
            return Err(TenantError::AlreadyExists(request.username));
        }

        let password_hash = hash_password(&request.password).map_err(|e| {
            error!("Password hashing failed: {}", e);
            TenantError::RegistrationFailed
        })?;

        let schema = TenantSchema::derive(&request.username, Utc::now().timestamp_millis()).map_err(|e| {
            error!("Schema name derivation failed for {}: {}", request.username, e);
            TenantError::RegistrationFailed
        })?;

        let user = match self.create_tenant(&request.username, &email, &password_hash, &schema).await {
            Ok(user) => user,
            Err(DatabaseError::DuplicateEntry(_)) => return Err(TenantError::AlreadyExists(request.username)),
            Err(e) => {
                error!("Registration of {} failed: {}", request.username, e);
                return Err(TenantError::RegistrationFailed);
            }
        };

        info!("Registered user {} with schema {}", user.username, schema);
        self.session(&user)
    }

    async fn create_tenant(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
        schema: &TenantSchema,
    ) -> Result<User, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let user: User = sqlx::query_as(
            "INSERT INTO users (username, email, password_hash, schema_name) VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .bind(schema.as_str())
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO user_preferences (user_id) VALUES ($1)")
            .bind(user.id)
            .execute(&mut *tx)
            .await?;

        self.provisioner.provision(&mut *tx, schema).await?;

        tx.commit().await?;
        Ok(user)
    }

    /// Authenticate by username or email.
    pub async fn login(&self, request: LoginRequest) -> Result<Registration, TenantError> {
        let user: Option<User> = sqlx::query_as(
            "SELECT * FROM users WHERE (LOWER(username) = LOWER($1) OR email = LOWER($1)) AND deleted_at IS NULL LIMIT 1",
        )
        .bind(request.login.trim())
        .fetch_optional(&self.pool)
        .await?;

        match user {
            Some(user) if verify_password(&request.password, &user.password_hash) => self.session(&user),
            _ => Err(TenantError::InvalidCredentials),
        }
    }

    /// Drop the user's schema and mark the account deleted.
    ///
    /// The `users` row stays behind, so the username and email remain taken
    /// and the data directory, which is kept, never passes to a new account.
    pub async fn delete_account(&self, user_id: Uuid, schema: &TenantSchema) -> Result<(), TenantError> {
        let mut tx = self.pool.begin().await?;
        registry::deprovision(&mut tx, schema).await?;
        sqlx::query("DELETE FROM user_preferences WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("UPDATE users SET deleted_at = NOW(), updated_at = NOW() WHERE id = $1 AND deleted_at IS NULL")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        info!("Deleted account {} and dropped schema {}", user_id, schema);
        Ok(())
    }

    /// Whether the account behind a session still exists.
    pub async fn is_active(&self, user_id: Uuid) -> Result<bool, TenantError> {
        let active: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE id = $1 AND deleted_at IS NULL)")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(active)
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>, TenantError> {
        let user = sqlx::query_as("SELECT * FROM users WHERE LOWER(username) = LOWER($1) AND deleted_at IS NULL")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn list_tenants(&self) -> Result<Vec<User>, TenantError> {
        let users = sqlx::query_as("SELECT * FROM users WHERE deleted_at IS NULL ORDER BY created_at")
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    /// Deleted accounts count: their username and email stay reserved.
    pub async fn account_exists(&self, username: &str, email: &str) -> Result<bool, TenantError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM users WHERE LOWER(username) = LOWER($1) OR email = $2)",
        )
        .bind(username)
        .bind(email)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    fn session(&self, user: &User) -> Result<Registration, TenantError> {
        let schema = TenantSchema::parse(&user.schema_name)?;
        let claims = Claims::new(user.id, user.username.clone(), &schema, self.jwt_expiry_hours);
        Ok(Registration {
            token: generate_jwt(&claims, &self.jwt_secret)?,
            user: UserSummary::from(user),
        })
    }
}

/// 3 to 30 characters of `[a-zA-Z0-9_-]`.
pub fn validate_username(username: &str) -> Result<(), TenantError> {
    if username.len() < 3 || username.len() > 30 {
        return Err(TenantError::InvalidUsername("Username must be 3-30 characters".to_string()));
    }
    if !username.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
        return Err(TenantError::InvalidUsername(
            "Username can only contain letters, numbers, hyphens, and underscores".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), TenantError> {
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(TenantError::InvalidEmail("Email address is not valid".to_string()))
    }
}

pub fn validate_password(password: &str) -> Result<(), TenantError> {
    if password.chars().count() < 8 {
        return Err(TenantError::InvalidPassword("Password must be at least 8 characters".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validates_usernames() {
        assert!(validate_username("alice").is_ok());
        assert!(validate_username("mary-jane_99").is_ok());
        assert!(validate_username("ab").is_err());
        assert!(validate_username(&"a".repeat(31)).is_err());
        assert!(validate_username("alice smith").is_err());
        assert!(validate_username("al'ice").is_err());
        assert!(validate_username("ällice").is_err());
    }

    #[test]
    fn validates_emails() {
        assert!(validate_email("alice@example.com").is_ok());
        assert!(validate_email("alice@localhost").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("alice@@example.com").is_err());
        assert!(validate_email("alice example@x.com").is_err());
    }

    #[test]
    fn validates_passwords() {
        assert!(validate_password("12345678").is_ok());
        assert!(validate_password("short").is_err());
    }
}
