//! Authentication service for user registration and login

use bcrypt::{hash, verify, DEFAULT_COST};
use sqlx::PgPool;

use crate::error::{AppError, AppResult};
use crate::services::user::{UserRecord, UserRow};
use shared::validation::{validate_email, validate_password};

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    db: PgPool,
}

/// User row including the password hash, used only for verification
#[derive(Debug, sqlx::FromRow)]
struct CredentialRow {
    id: uuid::Uuid,
    password_hash: String,
}

impl AuthService {
    /// Create a new AuthService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Register a new account. Self-registration always produces a regular
    /// user; admins are minted through the admin API.
    pub async fn register(&self, email: &str, password: &str) -> AppResult<UserRecord> {
        validate_email(email).map_err(|msg| AppError::Validation {
            field: "email".to_string(),
            message: msg.to_string(),
        })?;
        validate_password(password).map_err(|msg| AppError::Validation {
            field: "password".to_string(),
            message: msg.to_string(),
        })?;

        let existing =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE email = $1")
                .bind(email)
                .fetch_one(&self.db)
                .await?;

        if existing > 0 {
            return Err(AppError::DuplicateEntry("email".to_string()));
        }

        let password_hash = hash(password, DEFAULT_COST)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?;

        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (email, password_hash, role)
            VALUES ($1, $2, 'user')
            RETURNING id, email, role, last_login_at, created_at
            "#,
        )
        .bind(email)
        .bind(&password_hash)
        .fetch_one(&self.db)
        .await?;

        Ok(row.into())
    }

    /// Authenticate with email and password, recording the login time
    pub async fn login(&self, email: &str, password: &str) -> AppResult<UserRecord> {
        let credentials = sqlx::query_as::<_, CredentialRow>(
            "SELECT id, password_hash FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

        let valid = verify(password, &credentials.password_hash)
            .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))?;

        if !valid {
            return Err(AppError::InvalidCredentials);
        }

        let row = sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users
            SET last_login_at = NOW()
            WHERE id = $1
            RETURNING id, email, role, last_login_at, created_at
            "#,
        )
        .bind(credentials.id)
        .fetch_one(&self.db)
        .await?;

        Ok(row.into())
    }
}
