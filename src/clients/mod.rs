//! Outbound API clients for PayPal checkout and Spotify metadata.
//!
//! Both services authenticate with the OAuth2 client-credentials grant, so
//! the token request and its in-memory cache live here and are shared.

pub mod paypal;
pub mod spotify;

use std::future::Future;
use std::time::{Duration, Instant};

use serde::Deserialize;
use tokio::sync::Mutex;

use crate::error::AppError;

/// Refresh tokens this long before the provider says they expire.
const EXPIRY_MARGIN_SECS: u64 = 60;

/// Timeout applied to every outbound request.
pub(crate) const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Client-facing message for provider failures.
const UPSTREAM_FAILED: &str = "Upstream provider request failed";

/// Errors raised by the outbound clients.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Connection, timeout, or body decoding failure.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider answered with a non-success status.
    #[error("provider returned {status}: {body}")]
    Api { status: u16, body: String },

    /// Provider answered 404 for the requested resource.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Caller input could not be turned into a provider request.
    #[error("{0}")]
    InvalidInput(String),
}

impl From<ClientError> for AppError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::NotFound(what) => AppError::NotFound(what),
            ClientError::InvalidInput(msg) => AppError::InvalidRequest(msg),
            // Provider status and body go to the log only
            other => {
                tracing::warn!(error = %other, "external API call failed");
                AppError::ExternalService(UPSTREAM_FAILED.to_string())
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug)]
struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

/// Access token cache for one client.
///
/// The lock is held while refreshing so concurrent requests wait for a
/// single token fetch instead of racing.
#[derive(Debug, Default)]
pub(crate) struct TokenCache {
    inner: Mutex<Option<CachedToken>>,
}

impl TokenCache {
    pub(crate) async fn get_or_fetch<F, Fut>(&self, fetch: F) -> Result<String, ClientError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(String, u64), ClientError>>,
    {
        let mut guard = self.inner.lock().await;

        if let Some(cached) = guard.as_ref() {
            if cached.expires_at > Instant::now() {
                return Ok(cached.access_token.clone());
            }
        }

        let (access_token, expires_in) = fetch().await?;
        let lifetime = Duration::from_secs(expires_in.saturating_sub(EXPIRY_MARGIN_SECS));
        *guard = Some(CachedToken {
            access_token: access_token.clone(),
            expires_at: Instant::now() + lifetime,
        });

        Ok(access_token)
    }
}

/// Run the client-credentials grant against `token_url`.
///
/// Returns the access token and its lifetime in seconds.
pub(crate) async fn fetch_client_credentials(
    http: &reqwest::Client,
    token_url: &str,
    client_id: &str,
    client_secret: &str,
) -> Result<(String, u64), ClientError> {
    let response = http
        .post(token_url)
        .basic_auth(client_id, Some(client_secret))
        .form(&[("grant_type", "client_credentials")])
        .timeout(REQUEST_TIMEOUT)
        .send()
        .await?;

    let response = error_for_status(response).await?;
    let token: TokenResponse = response.json().await?;

    Ok((token.access_token, token.expires_in))
}

/// Turn a non-success response into [`ClientError::Api`], keeping the body for logs.
pub(crate) async fn error_for_status(
    response: reqwest::Response,
) -> Result<reqwest::Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(ClientError::Api {
        status: status.as_u16(),
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn token_is_reused_until_expiry() {
        let cache = TokenCache::default();
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let token = cache
                .get_or_fetch(|| async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(("abc".to_string(), 3600))
                })
                .await
                .unwrap();
            assert_eq!(token, "abc");
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn short_lived_tokens_are_refetched() {
        let cache = TokenCache::default();
        let calls = AtomicUsize::new(0);

        // Lifetime shorter than the safety margin expires immediately
        for _ in 0..2 {
            cache
                .get_or_fetch(|| async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(("short".to_string(), 30))
                })
                .await
                .unwrap();
        }

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn client_errors_map_to_app_errors() {
        let err: AppError = ClientError::NotFound("Track").into();
        assert!(matches!(err, AppError::NotFound("Track")));

        let err: AppError = ClientError::Api {
            status: 500,
            body: "oops".into(),
        }
        .into();
        assert!(matches!(err, AppError::ExternalService(_)));
    }

    #[test]
    fn provider_bodies_stay_out_of_app_errors() {
        let err: AppError = ClientError::Api {
            status: 500,
            body: r#"{"debug_id":"f1c2-internal"}"#.into(),
        }
        .into();

        let message = err.to_string();
        assert!(!message.contains("f1c2-internal"), "leaked: {message}");
        assert!(!message.contains("500"), "leaked: {message}");
        assert!(message.contains(UPSTREAM_FAILED));
    }
}
