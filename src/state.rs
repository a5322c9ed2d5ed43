//! Shared application state.

use std::sync::Arc;

use crate::{
    clients::{paypal::PayPalClient, spotify::SpotifyClient},
    config::Config,
    db::DbPool,
    email::Mailer,
    error::AppError,
};

/// State available to every handler via `State<AppState>`.
///
/// Cheap to clone: everything is a pool handle or behind `Arc`.
/// Optional integrations are `None` when their credentials are not configured.
#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub config: Arc<Config>,
    pub paypal: Option<Arc<PayPalClient>>,
    pub spotify: Option<Arc<SpotifyClient>>,
    pub mailer: Option<Arc<Mailer>>,
}

impl AppState {
    /// Build state from config, constructing whichever clients are configured.
    pub fn new(pool: DbPool, config: Config, mailer: Option<Mailer>) -> Self {
        let paypal = config.paypal_credentials().map(|(id, secret)| {
            Arc::new(PayPalClient::new(config.paypal_api_base.clone(), id, secret))
        });

        let spotify = config.spotify_credentials().map(|(id, secret)| {
            Arc::new(SpotifyClient::new(
                config.spotify_api_base.clone(),
                config.spotify_accounts_base.clone(),
                id,
                secret,
            ))
        });

        Self {
            pool,
            config: Arc::new(config),
            paypal,
            spotify,
            mailer: mailer.map(Arc::new),
        }
    }

    pub fn paypal(&self) -> Result<&PayPalClient, AppError> {
        self.paypal.as_deref().ok_or(AppError::NotConfigured("PayPal"))
    }

    pub fn spotify(&self) -> Result<&SpotifyClient, AppError> {
        self.spotify.as_deref().ok_or(AppError::NotConfigured("Spotify"))
    }
}
