//! Authentication middleware
//!
//! Session-cookie authentication and role gating. Browser page requests
//! without a session are bounced to the login form; JSON clients get
//! structured 401/403 bodies.

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use shared::types::Role;

use crate::error::ErrorResponse;
use crate::services::SessionService;
use crate::AppState;

/// Authenticated user information resolved from the session cookie
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: uuid::Uuid,
    pub email: String,
    pub role: Role,
}

/// Authentication middleware that validates the session cookie.
///
/// A valid session puts an [`AuthUser`] into the request extensions.
/// Without one, requests that look like API traffic get a 401 and page
/// requests are redirected to `/login`.
pub async fn session_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let jar = CookieJar::from_headers(request.headers());
    let token = jar
        .get(&state.config.session.cookie_name)
        .map(|cookie| cookie.value().to_string());

    let user = match token {
        Some(token) => {
            let sessions = SessionService::new(state.db.clone(), &state.config);
            match sessions.authenticate(&token).await {
                Ok(user) => user,
                Err(err) => return err.into_response(),
            }
        }
        None => None,
    };

    match user {
        Some(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        None if wants_json(&request) => unauthorized_response("Authentication required"),
        None => login_redirect(),
    }
}

/// Role gate for admin-only routes. Must run inside [`session_auth`].
pub async fn require_admin(request: Request, next: Next) -> Response {
    match request.extensions().get::<AuthUser>() {
        Some(user) if user.role.is_admin() => next.run(request).await,
        Some(_) => forbidden_response("Admin role required"),
        None => unauthorized_response("Authentication required"),
    }
}

/// JSON clients get status codes; browsers get redirects. Data endpoints
/// count as JSON traffic regardless of headers.
fn wants_json(request: &Request) -> bool {
    let header_contains = |name: header::HeaderName| {
        request
            .headers()
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.contains("application/json"))
            .unwrap_or(false)
    };

    header_contains(header::CONTENT_TYPE)
        || header_contains(header::ACCEPT)
        || request.uri().path().contains("/data")
}

/// Redirect an unauthenticated page request to the login form
fn login_redirect() -> Response {
    (StatusCode::FOUND, [(header::LOCATION, "/login")]).into_response()
}

/// Create unauthorized response
fn unauthorized_response(message: &str) -> Response {
    let error = ErrorResponse {
        error: crate::error::ErrorDetail {
            code: "UNAUTHORIZED".to_string(),
            message: message.to_string(),
            field: None,
        },
    };

    (StatusCode::UNAUTHORIZED, Json(error)).into_response()
}

/// Create forbidden response
fn forbidden_response(message: &str) -> Response {
    let error = ErrorResponse {
        error: crate::error::ErrorDetail {
            code: "FORBIDDEN".to_string(),
            message: message.to_string(),
            field: None,
        },
    };

    (StatusCode::FORBIDDEN, Json(error)).into_response()
}

/// Extractor for authenticated user
/// Use this in handlers to get the current user
#[derive(Clone, Debug)]
pub struct CurrentUser(pub AuthUser);

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .map(CurrentUser)
            .ok_or_else(|| {
                let error = ErrorResponse {
                    error: crate::error::ErrorDetail {
                        code: "UNAUTHORIZED".to_string(),
                        message: "Authentication required".to_string(),
                        field: None,
                    },
                };
                (StatusCode::UNAUTHORIZED, Json(error))
            })
    }
}
