//! Admin handlers: user management
//!
//! All of these sit behind the admin role gate.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use shared::types::Role;
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::user::{CreateUserInput, UpdateUserInput, UserRecord};
use crate::services::UserService;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
    pub role: Option<Role>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub role: Option<Role>,
    pub password: Option<String>,
}

/// List all users, oldest first
pub async fn list_users(State(state): State<AppState>) -> AppResult<Json<Vec<UserRecord>>> {
    let users = UserService::new(state.db.clone()).list().await?;
    Ok(Json(users))
}

/// Create a user with an explicit role
pub async fn create_user(
    State(state): State<AppState>,
    Json(body): Json<CreateUserRequest>,
) -> AppResult<Response> {
    let user = UserService::new(state.db.clone())
        .create(CreateUserInput {
            email: body.email,
            password: body.password,
            role: body.role.unwrap_or_default(),
        })
        .await?;

    tracing::info!(email = %user.email, role = %user.role, "user created by admin");
    Ok((StatusCode::CREATED, Json(user)).into_response())
}

/// Change a user's role and/or password
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateUserRequest>,
) -> AppResult<Json<UserRecord>> {
    let user = UserService::new(state.db.clone())
        .update(
            id,
            UpdateUserInput {
                role: body.role,
                password: body.password,
            },
        )
        .await?;

    Ok(Json(user))
}

/// Remove a user; their sessions die with the row
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    UserService::new(state.db.clone()).delete(id).await?;
    Ok(Json(serde_json::json!({ "message": "User deleted" })))
}
