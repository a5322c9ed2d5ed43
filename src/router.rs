//! Route table and middleware stack.

use std::time::Duration;

use anyhow::Context;
use axum::{
    Router,
    http::{
        HeaderName, HeaderValue, Method,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    middleware as axum_middleware,
    routing::{get, post, put},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{applications, auth, campaigns, health, payments, payouts, spotify, submissions},
    middleware::{
        auth::auth_middleware,
        csrf::{CSRF_HEADER, csrf_middleware},
    },
    state::AppState,
};

/// Build the full application router.
///
/// Fails if `CORS_ORIGIN` contains an invalid origin.
pub fn build_router(state: AppState) -> anyhow::Result<Router> {
    let cors = build_cors_layer(&state.config.cors_origin)?;

    // Everything here requires a session; mutating requests also need a CSRF token
    let authenticated_routes = Router::new()
        .route("/api/v1/auth/logout", post(auth::logout))
        .route("/api/v1/me", get(auth::me).put(auth::update_me))
        .route("/api/v1/csrf-token", get(auth::csrf_token))
        // Campaigns
        .route(
            "/api/v1/campaigns",
            post(campaigns::create_campaign).get(campaigns::list_active),
        )
        .route("/api/v1/campaigns/mine", get(campaigns::list_mine))
        .route("/api/v1/campaigns/{id}", get(campaigns::get_campaign))
        .route("/api/v1/campaigns/{id}/cancel", post(campaigns::cancel_campaign))
        .route(
            "/api/v1/campaigns/{id}/submissions",
            get(submissions::list_for_campaign),
        )
        .route(
            "/api/v1/campaigns/{id}/payments",
            get(payments::list_for_campaign),
        )
        // Applications
        .route("/api/v1/applications", post(applications::create_application))
        .route("/api/v1/applications/mine", get(applications::list_mine))
        .route(
            "/api/v1/admin/applications",
            get(applications::list_for_review),
        )
        .route(
            "/api/v1/admin/applications/{id}/review",
            post(applications::review_application),
        )
        // Submissions
        .route("/api/v1/submissions", post(submissions::create_submission))
        .route("/api/v1/submissions/mine", get(submissions::list_mine))
        .route(
            "/api/v1/submissions/{id}",
            put(submissions::revise_submission),
        )
        .route(
            "/api/v1/submissions/{id}/review",
            post(submissions::review_submission),
        )
        // Payouts
        .route("/api/v1/payouts/mine", get(payouts::list_mine))
        .route("/api/v1/admin/payouts", get(payouts::list_all))
        .route(
            "/api/v1/admin/payouts/{id}/mark-paid",
            post(payouts::mark_paid),
        )
        .route("/api/v1/admin/stats", get(payouts::admin_stats))
        // Payments
        .route("/api/v1/payments/orders", post(payments::create_order))
        .route(
            "/api/v1/payments/orders/{order_id}/capture",
            post(payments::capture_order),
        )
        // Spotify
        .route("/api/v1/spotify/track", get(spotify::get_track))
        // The last route_layer runs first: auth, then CSRF
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            csrf_middleware,
        ))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let app = Router::new()
        // Public routes
        .route("/health", get(health::health_check))
        .route("/api/v1/auth/register", post(auth::register))
        .route("/api/v1/auth/login", post(auth::login))
        .merge(authenticated_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state);

    Ok(app)
}

/// CORS for the web frontend. `origins` is a comma-separated list.
fn build_cors_layer(origins: &str) -> anyhow::Result<CorsLayer> {
    let origins = origins
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(|o| {
            o.parse::<HeaderValue>()
                .with_context(|| format!("invalid CORS origin '{o}'"))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    let csrf_header = HeaderName::from_bytes(CSRF_HEADER.as_bytes())?;

    Ok(CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::PATCH,
        ])
        .allow_headers([
            CONTENT_TYPE,
            AUTHORIZATION,
            csrf_header,
        ])
        .max_age(Duration::from_secs(3600)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cors_accepts_origin_lists() {
        assert!(build_cors_layer("http://localhost:5173, https://app.creatoramp.com").is_ok());
        assert!(build_cors_layer("bad\norigin").is_err());
    }
}
