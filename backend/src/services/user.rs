//! User account management, exposed through the admin API

use bcrypt::{hash, DEFAULT_COST};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::types::Role;
use shared::validation::{validate_email, validate_password};

/// User management service
#[derive(Clone)]
pub struct UserService {
    db: PgPool,
}

/// User row as stored
#[derive(Debug, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub role: String,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// User shape served by the API. Never carries the password hash.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<UserRow> for UserRecord {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            email: row.email,
            role: row.role.parse().unwrap_or(Role::User),
            last_login_at: row.last_login_at,
            created_at: row.created_at,
        }
    }
}

/// Input for creating a user through the admin API
#[derive(Debug)]
pub struct CreateUserInput {
    pub email: String,
    pub password: String,
    pub role: Role,
}

/// Input for updating a user through the admin API
#[derive(Debug, Default)]
pub struct UpdateUserInput {
    pub role: Option<Role>,
    pub password: Option<String>,
}

impl UserService {
    /// Create a new UserService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// List all user accounts
    pub async fn list(&self) -> AppResult<Vec<UserRecord>> {
        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, role, last_login_at, created_at
            FROM users
            ORDER BY created_at ASC
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(UserRecord::from).collect())
    }

    /// Create a user account with an explicit role
    pub async fn create(&self, input: CreateUserInput) -> AppResult<UserRecord> {
        validate_email(&input.email).map_err(|msg| AppError::Validation {
            field: "email".to_string(),
            message: msg.to_string(),
        })?;
        validate_password(&input.password).map_err(|msg| AppError::Validation {
            field: "password".to_string(),
            message: msg.to_string(),
        })?;

        let existing =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE email = $1")
                .bind(&input.email)
                .fetch_one(&self.db)
                .await?;

        if existing > 0 {
            return Err(AppError::DuplicateEntry("email".to_string()));
        }

        let password_hash = hash(&input.password, DEFAULT_COST)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?;

        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (email, password_hash, role)
            VALUES ($1, $2, $3)
            RETURNING id, email, role, last_login_at, created_at
            "#,
        )
        .bind(&input.email)
        .bind(&password_hash)
        .bind(input.role.as_str())
        .fetch_one(&self.db)
        .await?;

        Ok(row.into())
    }

    /// Update a user's role and/or password
    pub async fn update(&self, id: Uuid, input: UpdateUserInput) -> AppResult<UserRecord> {
        if let Some(password) = &input.password {
            validate_password(password).map_err(|msg| AppError::Validation {
                field: "password".to_string(),
                message: msg.to_string(),
            })?;
        }

        let password_hash = match &input.password {
            Some(password) => Some(
                hash(password, DEFAULT_COST)
                    .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?,
            ),
            None => None,
        };

        let row = sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users
            SET role = COALESCE($2, role),
                password_hash = COALESCE($3, password_hash),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, email, role, last_login_at, created_at
            "#,
        )
        .bind(id)
        .bind(input.role.map(|role| role.as_str()))
        .bind(password_hash)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User".to_string()))?;

        Ok(row.into())
    }

    /// Delete a user account. Sessions die with it via the foreign key.
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("User".to_string()));
        }

        Ok(())
    }
}
