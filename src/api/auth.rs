use axum::{
    Extension, Json,
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use serde::Deserialize;
use std::sync::Arc;

use super::{ApiError, AppState, AuthResponseDto, UserDto};
use crate::api::validation::{validate_email, validate_password, validate_username};
use crate::models::user::User;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// The acting user, attached to the request by [`require_auth`].
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

// ============================================================================
// Middleware
// ============================================================================

/// Requires `Authorization: Bearer <token>`; resolves the token to the acting
/// user and attaches it to the request for the handlers downstream.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(request.headers())
        .ok_or_else(|| ApiError::Unauthorized("Not authenticated".to_string()))?;

    let user = state
        .auth()
        .authenticate(&token)
        .await
        .map_err(|_| ApiError::Unauthorized("Invalid or expired token".to_string()))?;

    tracing::Span::current().record("user_id", user.id);
    request.extensions_mut().insert(CurrentUser(user));

    Ok(next.run(request).await)
}

/// Rejects non-admin users; must run inside [`require_auth`].
pub async fn require_admin(request: Request, next: Next) -> Result<Response, ApiError> {
    match request.extensions().get::<CurrentUser>() {
        None => Err(ApiError::Unauthorized("Not authenticated".to_string())),
        Some(current) if !current.0.is_admin => {
            Err(ApiError::forbidden("Admin access required"))
        }
        Some(_) => Ok(next.run(request).await),
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    if let Some(auth_header) = headers.get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
    {
        return Some(token.trim().to_string());
    }

    None
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/auth/register
/// Create an account; responds with the user and a fresh bearer token.
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponseDto>), ApiError> {
    let username = validate_username(&payload.username)?;
    let email = validate_email(&payload.email)?;
    validate_password(&payload.password)?;

    let authed = state
        .auth()
        .register(username, &email, &payload.password)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponseDto {
            token: authed.token,
            user: authed.user.into(),
        }),
    ))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponseDto>, ApiError> {
    if payload.email.is_empty() {
        return Err(ApiError::validation("Email is required"));
    }
    if payload.password.is_empty() {
        return Err(ApiError::validation("Password is required"));
    }

    let authed = state.auth().login(&payload.email, &payload.password).await?;

    Ok(Json(AuthResponseDto {
        token: authed.token,
        user: authed.user.into(),
    }))
}

/// GET /api/auth/me
pub async fn me(Extension(CurrentUser(user)): Extension<CurrentUser>) -> Json<UserDto> {
    Json(user.into())
}
