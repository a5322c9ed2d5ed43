//! User and session models with auth request/response types.
//!
//! Passwords are stored as Argon2id PHC strings. Session tokens are never
//! stored in plaintext: only their SHA-256 hash lives in the `sessions` table.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Marketplace role of a user.
///
/// Maps to the Postgres enum `user_role`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Funds campaigns and reviews submissions against them.
    Artist,
    /// Applies to campaigns and submits TikTok content.
    Creator,
    /// Reviews applications and submissions, settles payouts.
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Artist => "ARTIST",
            Role::Creator => "CREATOR",
            Role::Admin => "ADMIN",
        }
    }
}

/// Represents a user record from the database.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,

    /// Always stored lowercase
    pub email: String,

    /// Argon2id PHC string
    pub password_hash: String,

    pub display_name: String,
    pub role: Role,

    /// Where creators want to receive payouts
    pub paypal_email: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request body for `POST /api/v1/auth/register`.
///
/// # JSON Example
///
/// ```json
/// {
///   "email": "dj@example.com",
///   "password": "correct-horse",
///   "display_name": "DJ Example",
///   "role": "ARTIST"
/// }
/// ```
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Email address is invalid"))]
    pub email: String,

    #[validate(length(min = 8, max = 128, message = "Password must be 8 to 128 characters"))]
    pub password: String,

    #[validate(length(min = 1, max = 100, message = "Display name must be 1 to 100 characters"))]
    pub display_name: String,

    pub role: Role,

    #[validate(email(message = "PayPal email is invalid"))]
    pub paypal_email: Option<String>,
}

/// Request body for `POST /api/v1/auth/login`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Request body for `PUT /api/v1/me`. Absent fields are left unchanged.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 100, message = "Display name must be 1 to 100 characters"))]
    pub display_name: Option<String>,

    #[validate(email(message = "PayPal email is invalid"))]
    pub paypal_email: Option<String>,
}

/// Public view of a user (no password hash).
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
    pub role: Role,
    pub paypal_email: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            display_name: user.display_name,
            role: user.role,
            paypal_email: user.paypal_email,
            created_at: user.created_at,
        }
    }
}

/// Returned by register and login. The token is shown exactly once.
///
/// ```json
/// {
///   "token": "5f2c...e1",
///   "expires_at": "2025-12-27T10:00:00Z",
///   "user": { "id": "...", "email": "dj@example.com", "role": "ARTIST", ... }
/// }
/// ```
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: UserResponse,
}

/// Session row joined with its user, as loaded by the auth middleware.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SessionUser {
    pub session_id: Uuid,
    pub user_id: Uuid,
    pub role: Role,
}
