//! Session token authentication middleware.
//!
//! This middleware intercepts every protected request to:
//! 1. Extract the session token from the Authorization header
//! 2. Hash it and look up an unexpired session in the database
//! 3. Inject authentication context into the request
//! 4. Reject unauthorized requests with HTTP 401

use crate::{
    error::AppError, models::user::{Role, SessionUser}, services::auth_service::hash_token,
    state::AppState,
};
use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

/// Authentication context attached to authenticated requests.
///
/// Inserted into the request's extension map; handlers take it with
/// `Extension<AuthContext>` or through one of the role extractors below.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: Uuid,

    /// Session that authenticated this request (used by logout)
    pub session_id: Uuid,

    pub role: Role,
}

impl AuthContext {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Session authentication middleware function.
///
/// # Flow
///
/// 1. Extract `Authorization: Bearer <token>` header from request
/// 2. Hash the `<token>` using SHA-256
/// 3. Query `sessions` joined with `users` for a matching, unexpired hash
/// 4. If found: inject `AuthContext` into request, call next handler
/// 5. If not found: return 401 Unauthorized error
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or(AppError::Unauthorized)?;

    let session = sqlx::query_as::<_, SessionUser>(
        r#"
        SELECT s.id AS session_id, s.user_id, u.role
        FROM sessions s
        JOIN users u ON u.id = s.user_id
        WHERE s.token_hash = $1 AND s.expires_at > NOW()
        "#,
    )
    .bind(hash_token(token))
    .fetch_optional(&state.pool)
    .await?
    .ok_or(AppError::Unauthorized)?;

    request.extensions_mut().insert(AuthContext {
        user_id: session.user_id,
        session_id: session.session_id,
        role: session.role,
    });

    Ok(next.run(request).await)
}

fn context_from_parts(parts: &Parts) -> Result<AuthContext, AppError> {
    parts
        .extensions
        .get::<AuthContext>()
        .cloned()
        .ok_or(AppError::Unauthorized)
}

/// Requires the `ADMIN` role. Rejects with 403 Forbidden otherwise.
pub struct RequireAdmin(pub AuthContext);

impl<S: Send + Sync> FromRequestParts<S> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let auth = context_from_parts(parts)?;
        if auth.role != Role::Admin {
            return Err(AppError::Forbidden("Admin role required".into()));
        }
        Ok(RequireAdmin(auth))
    }
}

/// Requires `ARTIST` or `ADMIN`. Rejects with 403 Forbidden otherwise.
pub struct RequireArtist(pub AuthContext);

impl<S: Send + Sync> FromRequestParts<S> for RequireArtist {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let auth = context_from_parts(parts)?;
        if auth.role != Role::Artist && auth.role != Role::Admin {
            return Err(AppError::Forbidden("Artist role required".into()));
        }
        Ok(RequireArtist(auth))
    }
}

/// Requires the `CREATOR` role. Rejects with 403 Forbidden otherwise.
pub struct RequireCreator(pub AuthContext);

impl<S: Send + Sync> FromRequestParts<S> for RequireCreator {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let auth = context_from_parts(parts)?;
        if auth.role != Role::Creator {
            return Err(AppError::Forbidden("Creator role required".into()));
        }
        Ok(RequireCreator(auth))
    }
}
