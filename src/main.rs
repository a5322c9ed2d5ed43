//! CreatorAmp API server entry point.
//!
//! # Startup Flow
//!
//! 1. Load configuration from environment variables
//! 2. Create database connection pool and run migrations
//! 3. Seed the bootstrap admin, if configured
//! 4. Build external clients and the HTTP router
//! 5. Start server on configured port

use creatoramp::{config::Config, db, email::Mailer, router, services::auth_service, state::AppState};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG controls verbosity, defaulting to "info"
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env()?;
    tracing::info!("Configuration loaded");

    let pool = db::create_pool(&config.database_url).await?;
    tracing::info!("Database pool created");

    db::run_migrations(&pool).await?;
    tracing::info!("Database migrations complete");

    if let (Some(email), Some(password)) = (
        config.bootstrap_admin_email.as_deref(),
        config.bootstrap_admin_password.as_deref(),
    ) {
        auth_service::ensure_admin(&pool, email, password).await?;
    }

    let mailer = Mailer::from_config(&config)?;
    if mailer.is_none() {
        tracing::warn!("SMTP_HOST not set, email notifications are disabled");
    }

    let addr = format!("0.0.0.0:{}", config.server_port);
    let state = AppState::new(pool, config, mailer);
    if state.paypal.is_none() {
        tracing::warn!("PayPal credentials not set, campaign funding is disabled");
    }
    if state.spotify.is_none() {
        tracing::warn!("Spotify credentials not set, track lookup is disabled");
    }

    let app = router::build_router(state)?;

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
