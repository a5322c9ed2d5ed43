//! Accounts, passwords, and sessions.
//!
//! Passwords are hashed with Argon2id. Session tokens are 32 random bytes,
//! hex encoded, and only their SHA-256 hash is stored.

use std::sync::Arc;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{Duration, Utc};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::{
    db::DbPool,
    email::{self, EmailTemplate, Mailer},
    error::AppError,
    models::user::{AuthResponse, Role, UpdateProfileRequest, User},
};

const USER_COLUMNS: &str =
    "id, email, password_hash, display_name, role, paypal_email, created_at, updated_at";

/// Hash a plaintext password into a PHC string.
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("password hashing failed: {e}")))
}

/// Check a plaintext password against a stored PHC string.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| AppError::Internal(format!("stored password hash is invalid: {e}")))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AppError::Internal(format!("password verification failed: {e}"))),
    }
}

/// Generate a new opaque session token (64 hex characters).
pub fn generate_token() -> String {
    let bytes: [u8; 32] = rand::random();
    hex::encode(bytes)
}

/// SHA-256 hex digest of a session token, as stored in `sessions.token_hash`.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Insert a user with an already chosen role.
///
/// Duplicate emails surface as `Conflict`.
pub async fn create_user(
    pool: &DbPool,
    email: &str,
    password: &str,
    display_name: &str,
    role: Role,
    paypal_email: Option<String>,
) -> Result<User, AppError> {
    let password_hash = hash_password(password)?;

    let result = sqlx::query_as::<_, User>(&format!(
        r#"
        INSERT INTO users (email, password_hash, display_name, role, paypal_email)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(normalize_email(email))
    .bind(password_hash)
    .bind(display_name.trim())
    .bind(role)
    .bind(paypal_email)
    .fetch_one(pool)
    .await;

    match result {
        Ok(user) => Ok(user),
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => Err(
            AppError::Conflict("An account with this email already exists".to_string()),
        ),
        Err(e) => Err(e.into()),
    }
}

/// Create a session for `user` and build the auth response.
pub async fn start_session(
    pool: &DbPool,
    user: User,
    ttl_hours: i64,
) -> Result<AuthResponse, AppError> {
    let token = generate_token();
    let expires_at = Utc::now() + Duration::hours(ttl_hours);

    sqlx::query("INSERT INTO sessions (user_id, token_hash, expires_at) VALUES ($1, $2, $3)")
        .bind(user.id)
        .bind(hash_token(&token))
        .bind(expires_at)
        .execute(pool)
        .await?;

    Ok(AuthResponse {
        token,
        expires_at,
        user: user.into(),
    })
}

/// Verify credentials and open a session.
///
/// Unknown emails and wrong passwords produce the same error.
pub async fn login(
    pool: &DbPool,
    email: &str,
    password: &str,
    ttl_hours: i64,
) -> Result<AuthResponse, AppError> {
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
    ))
    .bind(normalize_email(email))
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::InvalidCredentials)?;

    if !verify_password(password, &user.password_hash)? {
        tracing::info!(user_id = %user.id, "failed login attempt");
        return Err(AppError::InvalidCredentials);
    }

    // Opportunistic cleanup of this user's dead sessions
    sqlx::query("DELETE FROM sessions WHERE user_id = $1 AND expires_at <= NOW()")
        .bind(user.id)
        .execute(pool)
        .await?;

    start_session(pool, user, ttl_hours).await
}

/// Delete one session.
pub async fn logout(pool: &DbPool, session_id: Uuid) -> Result<(), AppError> {
    sqlx::query("DELETE FROM sessions WHERE id = $1")
        .bind(session_id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn get_user(pool: &DbPool, user_id: Uuid) -> Result<User, AppError> {
    sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound("User"))
}

/// Email address and display name for notifications.
async fn contact(pool: &DbPool, user_id: Uuid) -> Result<(String, String), AppError> {
    sqlx::query_as::<_, (String, String)>("SELECT email, display_name FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound("User"))
}

/// Email `user_id` in the background, naming them in `template_for`.
///
/// Runs after the triggering change is committed, so a failed recipient
/// lookup is logged and the email skipped.
pub async fn notify_user<F>(
    pool: &DbPool,
    mailer: Option<Arc<Mailer>>,
    user_id: Uuid,
    template_for: F,
) where
    F: FnOnce(String) -> EmailTemplate,
{
    if mailer.is_none() {
        tracing::debug!(%user_id, "SMTP not configured, notification skipped");
        return;
    }

    match contact(pool, user_id).await {
        Ok((to, display_name)) => email::notify(mailer, to, template_for(display_name)),
        Err(e) => tracing::warn!(%user_id, error = %e, "recipient lookup failed, notification skipped"),
    }
}

/// Apply a partial profile update.
pub async fn update_profile(
    pool: &DbPool,
    user_id: Uuid,
    request: UpdateProfileRequest,
) -> Result<User, AppError> {
    sqlx::query_as::<_, User>(&format!(
        r#"
        UPDATE users
        SET display_name = COALESCE($2, display_name),
            paypal_email = COALESCE($3, paypal_email),
            updated_at = NOW()
        WHERE id = $1
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(user_id)
    .bind(request.display_name.map(|n| n.trim().to_string()))
    .bind(request.paypal_email)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("User"))
}

/// Create the bootstrap admin unless an account with that email exists.
pub async fn ensure_admin(pool: &DbPool, email: &str, password: &str) -> Result<(), AppError> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
        .bind(normalize_email(email))
        .fetch_one(pool)
        .await?;

    if exists {
        tracing::debug!("bootstrap admin already present");
        return Ok(());
    }

    let admin = create_user(pool, email, password, "Administrator", Role::Admin, None).await?;
    tracing::info!(user_id = %admin.id, "bootstrap admin created");
    Ok(())
}
