//! CSRF token issuance and enforcement.
//!
//! Tokens are stateless: `<nonce_hex>.<issued_unix>.<signature_hex>` where the
//! signature is HMAC-SHA256 over `<user_id>:<nonce_hex>:<issued_unix>`. A
//! token is therefore only valid for the user it was issued to, and only for
//! `CSRF_TTL_SECS` after issuance.

use axum::{
    Extension,
    extract::{Request, State},
    http::Method,
    middleware::Next,
    response::Response,
};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use uuid::Uuid;

use crate::{error::AppError, middleware::auth::AuthContext, state::AppState};

type HmacSha256 = Hmac<Sha256>;

/// Header mutating requests must carry.
pub const CSRF_HEADER: &str = "X-CSRF-Token";

/// Tolerated clock skew for tokens that claim to come from the future.
const MAX_FUTURE_SKEW_SECS: i64 = 60;

/// Issue a token for `user_id` at `issued_at`.
pub fn issue_token(secret: &str, user_id: Uuid, issued_at: DateTime<Utc>) -> String {
    let nonce: [u8; 16] = rand::random();
    let nonce_hex = hex::encode(nonce);
    let issued = issued_at.timestamp();
    let signature = sign(secret, user_id, &nonce_hex, issued);

    format!("{nonce_hex}.{issued}.{signature}")
}

/// Verify a token for `user_id` at time `now`.
pub fn verify_token(
    secret: &str,
    user_id: Uuid,
    token: &str,
    ttl_secs: i64,
    now: DateTime<Utc>,
) -> Result<(), AppError> {
    let mut parts = token.split('.');
    let (Some(nonce_hex), Some(issued), Some(signature_hex), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(AppError::CsrfRejected);
    };

    let issued: i64 = issued.parse().map_err(|_| AppError::CsrfRejected)?;
    let signature = hex::decode(signature_hex).map_err(|_| AppError::CsrfRejected)?;

    let mut mac = new_mac(secret);
    mac.update(message(user_id, nonce_hex, issued).as_bytes());
    // Constant-time comparison
    mac.verify_slice(&signature)
        .map_err(|_| AppError::CsrfRejected)?;

    let age = now.timestamp() - issued;
    if age > ttl_secs || age < -MAX_FUTURE_SKEW_SECS {
        return Err(AppError::CsrfRejected);
    }

    Ok(())
}

fn new_mac(secret: &str) -> HmacSha256 {
    HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC key length is valid")
}

fn message(user_id: Uuid, nonce_hex: &str, issued: i64) -> String {
    format!("{user_id}:{nonce_hex}:{issued}")
}

fn sign(secret: &str, user_id: Uuid, nonce_hex: &str, issued: i64) -> String {
    let mut mac = new_mac(secret);
    mac.update(message(user_id, nonce_hex, issued).as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Reject state-changing requests without a valid CSRF token.
///
/// Must run after [`auth_middleware`](super::auth::auth_middleware), which
/// supplies the `AuthContext` the token is bound to.
pub async fn csrf_middleware(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let safe = matches!(
        *request.method(),
        Method::GET | Method::HEAD | Method::OPTIONS
    );

    if !safe {
        let token = request
            .headers()
            .get(CSRF_HEADER)
            .and_then(|h| h.to_str().ok())
            .ok_or(AppError::CsrfRejected)?;

        if let Err(e) = verify_token(
            &state.config.csrf_secret,
            auth.user_id,
            token,
            state.config.csrf_ttl_secs,
            Utc::now(),
        ) {
            tracing::warn!(user_id = %auth.user_id, method = %request.method(), "CSRF token rejected");
            return Err(e);
        }
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    const SECRET: &str = "csrf-test-secret";

    #[test]
    fn fresh_token_verifies_for_its_user() {
        let user = Uuid::new_v4();
        let now = Utc::now();
        let token = issue_token(SECRET, user, now);

        assert!(verify_token(SECRET, user, &token, 3600, now).is_ok());
        assert!(verify_token(SECRET, user, &token, 3600, now + Duration::seconds(3599)).is_ok());
    }

    #[test]
    fn token_is_bound_to_user_and_secret() {
        let user = Uuid::new_v4();
        let now = Utc::now();
        let token = issue_token(SECRET, user, now);

        assert!(verify_token(SECRET, Uuid::new_v4(), &token, 3600, now).is_err());
        assert!(verify_token("other-secret", user, &token, 3600, now).is_err());
    }

    #[test]
    fn expired_and_future_tokens_are_rejected() {
        let user = Uuid::new_v4();
        let now = Utc::now();

        let old = issue_token(SECRET, user, now - Duration::seconds(3601));
        assert!(verify_token(SECRET, user, &old, 3600, now).is_err());

        let future = issue_token(SECRET, user, now + Duration::seconds(600));
        assert!(verify_token(SECRET, user, &future, 3600, now).is_err());
    }

    #[test]
    fn tampered_tokens_are_rejected() {
        let user = Uuid::new_v4();
        let now = Utc::now();
        let token = issue_token(SECRET, user, now);

        // Push the issue time forward to extend the lifetime
        let mut parts: Vec<&str> = token.split('.').collect();
        let later = (now.timestamp() + 100).to_string();
        parts[1] = &later;
        let forged = parts.join(".");
        assert!(verify_token(SECRET, user, &forged, 3600, now).is_err());

        let extra = format!("{token}.extra");
        for garbage in ["", "abc", "a.b.c", "a.1.zz", extra.as_str()] {
            assert!(verify_token(SECRET, user, garbage, 3600, now).is_err(), "{garbage}");
        }
    }
}
