//! HTTP middleware

pub mod auth;

pub use auth::{require_admin, session_auth, AuthUser, CurrentUser};
