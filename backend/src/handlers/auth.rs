//! Authentication handlers
//!
//! Registration and login serve both the HTML forms and JSON clients; the
//! session rides an HttpOnly cookie holding an opaque token.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::handlers::{redirect_found, Payload};
use crate::middleware::CurrentUser;
use crate::services::{AuthService, SessionService};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Register a new account. Self-registration always gets the `user` role.
pub async fn register(
    State(state): State<AppState>,
    payload: Payload<RegisterRequest>,
) -> AppResult<Response> {
    let is_form = payload.is_form();
    let body = payload.into_inner();

    let auth = AuthService::new(state.db.clone());
    match auth.register(&body.email, &body.password).await {
        Ok(user) if is_form => {
            tracing::info!(email = %user.email, "user registered");
            Ok(redirect_found("/login"))
        }
        Ok(user) => {
            tracing::info!(email = %user.email, "user registered");
            Ok((StatusCode::CREATED, Json(user)).into_response())
        }
        Err(err) if is_form => Ok(registration_form_error(err)),
        Err(err) => Err(err),
    }
}

/// Log in and start a session. Forms land on the dashboard; JSON clients
/// get the user back.
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Payload<LoginRequest>,
) -> AppResult<Response> {
    let is_form = payload.is_form();
    let body = payload.into_inner();

    let auth = AuthService::new(state.db.clone());
    let user = auth.login(&body.email, &body.password).await?;

    let sessions = SessionService::new(state.db.clone(), &state.config);
    let token = sessions.create(user.id).await?;

    let cookie = Cookie::build((state.config.session.cookie_name.clone(), token))
        .path("/")
        .http_only(true)
        .secure(state.config.session.secure)
        .same_site(SameSite::Lax)
        .build();
    let jar = jar.add(cookie);

    tracing::info!(email = %user.email, "user logged in");

    if is_form {
        Ok((jar, redirect_found("/dashboard")).into_response())
    } else {
        Ok((jar, Json(serde_json::json!({ "user": user }))).into_response())
    }
}

/// End the session and clear the cookie
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> AppResult<Response> {
    let token = jar
        .get(&state.config.session.cookie_name)
        .map(|cookie| cookie.value().to_string());

    if let Some(token) = token {
        let sessions = SessionService::new(state.db.clone(), &state.config);
        sessions.revoke(&token).await?;
    }

    let mut removal = Cookie::from(state.config.session.cookie_name.clone());
    removal.set_path("/");
    let jar = jar.remove(removal);

    Ok((jar, redirect_found("/login")).into_response())
}

/// Who am I, according to the session cookie
pub async fn me(CurrentUser(user): CurrentUser) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "email": user.email,
        "role": user.role,
    }))
}

/// Form-flavored registration failures answer 400 with plain text
fn registration_form_error(err: AppError) -> Response {
    let message = match &err {
        AppError::DuplicateEntry(field) => format!("A record with this {} already exists", field),
        AppError::Validation { message, .. } => message.clone(),
        AppError::ValidationError(message) => message.clone(),
        _ => return err.into_response(),
    };
    (StatusCode::BAD_REQUEST, message).into_response()
}
