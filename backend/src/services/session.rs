//! Session management: opaque cookie tokens backed by database rows
//!
//! The cookie carries 32 random bytes, URL-safe base64 encoded. Only the
//! SHA-256 digest is stored, so a leaked table cannot be replayed.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{Duration, Utc};
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use uuid::Uuid;

use crate::config::Config;
use crate::error::AppResult;
use crate::middleware::AuthUser;
use shared::types::Role;

/// Session service
#[derive(Clone)]
pub struct SessionService {
    db: PgPool,
    ttl_seconds: i64,
}

impl SessionService {
    /// Create a new SessionService instance
    pub fn new(db: PgPool, config: &Config) -> Self {
        Self {
            db,
            ttl_seconds: config.session.ttl_seconds,
        }
    }

    /// Issue a new session and return the raw cookie token
    pub async fn create(&self, user_id: Uuid) -> AppResult<String> {
        let token = Self::generate_token();
        let token_hash = Self::hash_token(&token);
        let expires_at = Utc::now() + Duration::seconds(self.ttl_seconds);

        sqlx::query(
            r#"
            INSERT INTO sessions (user_id, token_hash, expires_at)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(user_id)
        .bind(&token_hash)
        .bind(expires_at)
        .execute(&self.db)
        .await?;

        Ok(token)
    }

    /// Resolve a cookie token to its user. Expired and revoked sessions
    /// count as absent.
    pub async fn authenticate(&self, token: &str) -> AppResult<Option<AuthUser>> {
        let token_hash = Self::hash_token(token);

        let row = sqlx::query_as::<_, (Uuid, String, String)>(
            r#"
            SELECT u.id, u.email, u.role
            FROM sessions s
            JOIN users u ON u.id = s.user_id
            WHERE s.token_hash = $1
              AND s.expires_at > NOW()
              AND s.revoked_at IS NULL
            "#,
        )
        .bind(&token_hash)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(|(user_id, email, role)| AuthUser {
            user_id,
            email,
            role: role.parse().unwrap_or(Role::User),
        }))
    }

    /// Revoke the session behind a cookie token
    pub async fn revoke(&self, token: &str) -> AppResult<()> {
        let token_hash = Self::hash_token(token);

        sqlx::query(
            "UPDATE sessions SET revoked_at = NOW() WHERE token_hash = $1 AND revoked_at IS NULL",
        )
        .bind(&token_hash)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    /// Generate an opaque session token
    fn generate_token() -> String {
        let bytes: [u8; 32] = rand::random();
        URL_SAFE_NO_PAD.encode(bytes)
    }

    /// Hash a token for storage
    fn hash_token(token: &str) -> String {
        format!("{:x}", Sha256::digest(token.as_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_url_safe_and_unpadded() {
        let token = SessionService::generate_token();
        // 32 bytes -> 43 base64url characters without padding
        assert_eq!(token.len(), 43);
        assert!(token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn tokens_are_unique() {
        let a = SessionService::generate_token();
        let b = SessionService::generate_token();
        assert_ne!(a, b);
    }

    #[test]
    fn token_hash_is_stable_hex() {
        let digest = SessionService::hash_token("fixed-token");
        assert_eq!(digest, SessionService::hash_token("fixed-token"));
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn different_tokens_hash_differently() {
        assert_ne!(
            SessionService::hash_token("token-a"),
            SessionService::hash_token("token-b")
        );
    }
}
