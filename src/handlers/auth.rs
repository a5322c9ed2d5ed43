//! Account and session HTTP handlers.
//!
//! - POST /api/v1/auth/register - Create an artist or creator account
//! - POST /api/v1/auth/login - Exchange credentials for a session token
//! - POST /api/v1/auth/logout - End the current session
//! - GET /api/v1/me - Current user
//! - PUT /api/v1/me - Update display name or PayPal email
//! - GET /api/v1/csrf-token - Issue a CSRF token for mutating requests

use axum::{Extension, Json, extract::State, http::StatusCode};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use validator::Validate;

use crate::{
    error::AppError,
    middleware::{auth::AuthContext, csrf},
    models::user::{AuthResponse, LoginRequest, RegisterRequest, Role, UpdateProfileRequest, UserResponse},
    services::auth_service,
    state::AppState,
};

/// Register a new account.
///
/// # Request Body
///
/// ```json
/// {
///   "email": "dj@example.com",
///   "password": "correct-horse",
///   "display_name": "DJ Example",
///   "role": "ARTIST"
/// }
/// ```
///
/// # Response (201)
///
/// Same shape as login. Self-registration as `ADMIN` is rejected with 403.
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    request.validate()?;

    if request.role == Role::Admin {
        return Err(AppError::Forbidden(
            "Admin accounts cannot be self-registered".to_string(),
        ));
    }

    let user = auth_service::create_user(
        &state.pool,
        &request.email,
        &request.password,
        &request.display_name,
        request.role,
        request.paypal_email,
    )
    .await?;

    tracing::info!(user_id = %user.id, role = user.role.as_str(), "user registered");

    let response =
        auth_service::start_session(&state.pool, user, state.config.session_ttl_hours).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Log in with email and password.
///
/// # Response (200)
///
/// ```json
/// {
///   "token": "5f2c...e1",
///   "expires_at": "2025-12-27T10:00:00Z",
///   "user": { "id": "...", "email": "dj@example.com", "role": "ARTIST" }
/// }
/// ```
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let response = auth_service::login(
        &state.pool,
        &request.email,
        &request.password,
        state.config.session_ttl_hours,
    )
    .await?;

    Ok(Json(response))
}

/// Delete the session that authenticated this request.
pub async fn logout(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<StatusCode, AppError> {
    auth_service::logout(&state.pool, auth.session_id).await?;
    tracing::info!(user_id = %auth.user_id, "user logged out");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<UserResponse>, AppError> {
    let user = auth_service::get_user(&state.pool, auth.user_id).await?;
    Ok(Json(user.into()))
}

pub async fn update_me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<UserResponse>, AppError> {
    request.validate()?;
    let user = auth_service::update_profile(&state.pool, auth.user_id, request).await?;
    Ok(Json(user.into()))
}

/// CSRF token for the current user.
#[derive(Debug, Serialize)]
pub struct CsrfTokenResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Issue a CSRF token.
///
/// Send it back in the `X-CSRF-Token` header on every POST, PUT, PATCH
/// and DELETE request.
pub async fn csrf_token(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Json<CsrfTokenResponse> {
    let now = Utc::now();
    let token = csrf::issue_token(&state.config.csrf_secret, auth.user_id, now);

    Json(CsrfTokenResponse {
        token,
        expires_at: now + Duration::seconds(state.config.csrf_ttl_secs),
    })
}
