//! Campaign HTTP handlers.
//!
//! - POST /api/v1/campaigns - Create a DRAFT campaign
//! - GET /api/v1/campaigns - Browse ACTIVE campaigns
//! - GET /api/v1/campaigns/mine - The artist's own campaigns
//! - GET /api/v1/campaigns/{id} - Campaign details
//! - POST /api/v1/campaigns/{id}/cancel - Cancel a DRAFT or ACTIVE campaign

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::AppError,
    middleware::auth::{AuthContext, RequireArtist},
    models::campaign::{Campaign, CreateCampaignRequest},
    services::campaign_service,
    state::AppState,
};

/// Create a campaign.
///
/// # Request Body
///
/// ```json
/// {
///   "title": "Summer single launch",
///   "description": "Use the chorus in a dance video",
///   "spotify_url": "https://open.spotify.com/track/4cOdK2wGLETKBW3PvgPWqT",
///   "budget_cents": 50000,
///   "payout_per_submission_cents": 2500
/// }
/// ```
///
/// # Response (201)
///
/// The campaign in `DRAFT` with `remaining_budget_cents = 0`. It becomes
/// `ACTIVE` once its PayPal order is captured.
pub async fn create_campaign(
    State(state): State<AppState>,
    RequireArtist(auth): RequireArtist,
    Json(request): Json<CreateCampaignRequest>,
) -> Result<(StatusCode, Json<Campaign>), AppError> {
    request.validate()?;

    let track = match request.spotify_url.as_deref().map(str::trim) {
        Some(link) if !link.is_empty() => Some(state.spotify()?.lookup(link).await?),
        _ => None,
    };

    let campaign = campaign_service::create_campaign(
        &state.pool,
        auth.user_id,
        request,
        track,
        &state.config.paypal_currency,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(campaign)))
}

pub async fn list_active(
    State(state): State<AppState>,
) -> Result<Json<Vec<Campaign>>, AppError> {
    Ok(Json(campaign_service::list_active(&state.pool).await?))
}

pub async fn list_mine(
    State(state): State<AppState>,
    RequireArtist(auth): RequireArtist,
) -> Result<Json<Vec<Campaign>>, AppError> {
    Ok(Json(
        campaign_service::list_for_artist(&state.pool, auth.user_id).await?,
    ))
}

/// Get a campaign by ID.
///
/// # Security
///
/// Non-ACTIVE campaigns return 404 unless the caller owns them or is an admin.
pub async fn get_campaign(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(campaign_id): Path<Uuid>,
) -> Result<Json<Campaign>, AppError> {
    let campaign = campaign_service::get_visible_campaign(&state.pool, &auth, campaign_id).await?;
    Ok(Json(campaign))
}

pub async fn cancel_campaign(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(campaign_id): Path<Uuid>,
) -> Result<Json<Campaign>, AppError> {
    let campaign = campaign_service::cancel_campaign(&state.pool, &auth, campaign_id).await?;
    Ok(Json(campaign))
}
