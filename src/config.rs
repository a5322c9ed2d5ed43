//! Application configuration management.
//!
//! This module handles loading configuration from environment variables.
//! It uses the `envy` crate to deserialize environment variables into a type-safe struct.

use serde::Deserialize;

/// Application configuration loaded from environment variables.
///
/// # Environment Variables
///
/// - `DATABASE_URL` (required): PostgreSQL connection string
/// - `CSRF_SECRET` (required): key used to sign CSRF tokens
/// - `SERVER_PORT` (optional): HTTP server port, defaults to 3000
/// - `PAYPAL_*`, `SPOTIFY_*`, `SMTP_*` (optional): external integrations.
///   Each integration is disabled when its credentials are absent.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,

    #[serde(default = "default_port")]
    pub server_port: u16,

    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,

    #[serde(default = "default_session_ttl_hours")]
    pub session_ttl_hours: i64,

    pub csrf_secret: String,

    #[serde(default = "default_csrf_ttl_secs")]
    pub csrf_ttl_secs: i64,

    pub paypal_client_id: Option<String>,
    pub paypal_client_secret: Option<String>,
    #[serde(default = "default_paypal_api_base")]
    pub paypal_api_base: String,
    #[serde(default = "default_currency")]
    pub paypal_currency: String,

    pub spotify_client_id: Option<String>,
    pub spotify_client_secret: Option<String>,
    #[serde(default = "default_spotify_api_base")]
    pub spotify_api_base: String,
    #[serde(default = "default_spotify_accounts_base")]
    pub spotify_accounts_base: String,

    pub smtp_host: Option<String>,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    #[serde(default = "default_smtp_from")]
    pub smtp_from: String,
    pub smtp_user: Option<String>,
    pub smtp_password: Option<String>,

    /// Public URL of the web app, used for links in notification emails.
    #[serde(default = "default_app_base_url")]
    pub app_base_url: String,

    pub bootstrap_admin_email: Option<String>,
    pub bootstrap_admin_password: Option<String>,
}

fn default_port() -> u16 {
    3000
}

fn default_cors_origin() -> String {
    "http://localhost:5173".to_string()
}

fn default_session_ttl_hours() -> i64 {
    24 * 7
}

fn default_csrf_ttl_secs() -> i64 {
    3600
}

fn default_paypal_api_base() -> String {
    "https://api-m.sandbox.paypal.com".to_string()
}

fn default_currency() -> String {
    "USD".to_string()
}

fn default_spotify_api_base() -> String {
    "https://api.spotify.com".to_string()
}

fn default_spotify_accounts_base() -> String {
    "https://accounts.spotify.com".to_string()
}

fn default_smtp_port() -> u16 {
    587
}

fn default_smtp_from() -> String {
    "CreatorAmp <noreply@creatoramp.local>".to_string()
}

fn default_app_base_url() -> String {
    "http://localhost:3000".to_string()
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// This method first attempts to load a `.env` file (which is optional),
    /// then reads environment variables and deserializes them into a Config struct.
    ///
    /// # Errors
    ///
    /// Returns an error if required variables are missing or a value
    /// cannot be parsed into its expected type.
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();

        // Field names are converted automatically: database_url -> DATABASE_URL
        envy::from_env::<Config>()
    }

    /// PayPal credentials, present only when both halves are configured.
    pub fn paypal_credentials(&self) -> Option<(String, String)> {
        match (&self.paypal_client_id, &self.paypal_client_secret) {
            (Some(id), Some(secret)) if !id.is_empty() && !secret.is_empty() => {
                Some((id.clone(), secret.clone()))
            }
            _ => None,
        }
    }

    /// Spotify credentials, present only when both halves are configured.
    pub fn spotify_credentials(&self) -> Option<(String, String)> {
        match (&self.spotify_client_id, &self.spotify_client_secret) {
            (Some(id), Some(secret)) if !id.is_empty() && !secret.is_empty() => {
                Some((id.clone(), secret.clone()))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_pairs(pairs: &[(&str, &str)]) -> Config {
        let vars = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()));
        envy::from_iter::<_, Config>(vars).expect("config should parse")
    }

    #[test]
    fn defaults_apply_when_optional_vars_missing() {
        let config = from_pairs(&[
            ("DATABASE_URL", "postgres://localhost/creatoramp"),
            ("CSRF_SECRET", "secret"),
        ]);

        assert_eq!(config.server_port, 3000);
        assert_eq!(config.session_ttl_hours, 168);
        assert_eq!(config.paypal_currency, "USD");
        assert!(config.paypal_credentials().is_none());
        assert!(config.spotify_credentials().is_none());
        assert!(config.smtp_host.is_none());
    }

    #[test]
    fn missing_csrf_secret_is_an_error() {
        let vars = vec![(
            "DATABASE_URL".to_string(),
            "postgres://localhost/creatoramp".to_string(),
        )];
        assert!(envy::from_iter::<_, Config>(vars).is_err());
    }

    #[test]
    fn half_configured_paypal_is_disabled() {
        let config = from_pairs(&[
            ("DATABASE_URL", "postgres://localhost/creatoramp"),
            ("CSRF_SECRET", "secret"),
            ("PAYPAL_CLIENT_ID", "client"),
        ]);
        assert!(config.paypal_credentials().is_none());
    }
}
