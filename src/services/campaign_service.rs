//! Campaign creation, visibility, and cancellation.

use uuid::Uuid;

use crate::{
    clients::spotify::TrackMetadata,
    db::DbPool,
    error::AppError,
    middleware::auth::AuthContext,
    models::campaign::{Campaign, CampaignStatus, CreateCampaignRequest},
};

pub(crate) const CAMPAIGN_COLUMNS: &str = "id, artist_id, title, description, spotify_track_id, \
     track_name, track_artists, track_image_url, budget_cents, payout_per_submission_cents, \
     remaining_budget_cents, currency, status, created_at, updated_at";

/// Insert a DRAFT campaign.
///
/// `track` carries Spotify metadata already resolved by the caller.
pub async fn create_campaign(
    pool: &DbPool,
    artist_id: Uuid,
    request: CreateCampaignRequest,
    track: Option<TrackMetadata>,
    currency: &str,
) -> Result<Campaign, AppError> {
    if request.payout_per_submission_cents > request.budget_cents {
        return Err(AppError::InvalidRequest(
            "Payout per submission cannot exceed the budget".to_string(),
        ));
    }

    let (track_id, track_name, track_artists, track_image) = match track {
        Some(t) => (Some(t.id), Some(t.name), Some(t.artists.join(", ")), t.image_url),
        None => (None, None, None, None),
    };

    let campaign = sqlx::query_as::<_, Campaign>(&format!(
        r#"
        INSERT INTO campaigns (
            artist_id, title, description, spotify_track_id, track_name, track_artists,
            track_image_url, budget_cents, payout_per_submission_cents, currency
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING {CAMPAIGN_COLUMNS}
        "#
    ))
    .bind(artist_id)
    .bind(request.title.trim())
    .bind(request.description.trim())
    .bind(track_id)
    .bind(track_name)
    .bind(track_artists)
    .bind(track_image)
    .bind(request.budget_cents)
    .bind(request.payout_per_submission_cents)
    .bind(currency)
    .fetch_one(pool)
    .await?;

    tracing::info!(campaign_id = %campaign.id, %artist_id, "campaign created");
    Ok(campaign)
}

pub async fn find_campaign(pool: &DbPool, campaign_id: Uuid) -> Result<Option<Campaign>, AppError> {
    let campaign = sqlx::query_as::<_, Campaign>(&format!(
        "SELECT {CAMPAIGN_COLUMNS} FROM campaigns WHERE id = $1"
    ))
    .bind(campaign_id)
    .fetch_optional(pool)
    .await?;

    Ok(campaign)
}

/// Whether `auth` may manage the campaign (owner or admin).
pub fn can_manage(auth: &AuthContext, campaign: &Campaign) -> bool {
    auth.is_admin() || campaign.artist_id == auth.user_id
}

/// Load a campaign the caller may manage.
///
/// Returns 404 rather than 403 for other artists' campaigns so their
/// existence is not leaked.
pub async fn get_managed_campaign(
    pool: &DbPool,
    auth: &AuthContext,
    campaign_id: Uuid,
) -> Result<Campaign, AppError> {
    find_campaign(pool, campaign_id)
        .await?
        .filter(|c| can_manage(auth, c))
        .ok_or(AppError::NotFound("Campaign"))
}

/// Load a campaign visible to the caller.
///
/// ACTIVE campaigns are public to signed-in users; everything else is
/// visible to the owner and admins only.
pub async fn get_visible_campaign(
    pool: &DbPool,
    auth: &AuthContext,
    campaign_id: Uuid,
) -> Result<Campaign, AppError> {
    find_campaign(pool, campaign_id)
        .await?
        .filter(|c| c.status == CampaignStatus::Active || can_manage(auth, c))
        .ok_or(AppError::NotFound("Campaign"))
}

/// ACTIVE campaigns, newest first.
pub async fn list_active(pool: &DbPool) -> Result<Vec<Campaign>, AppError> {
    let campaigns = sqlx::query_as::<_, Campaign>(&format!(
        "SELECT {CAMPAIGN_COLUMNS} FROM campaigns WHERE status = $1 ORDER BY created_at DESC"
    ))
    .bind(CampaignStatus::Active)
    .fetch_all(pool)
    .await?;

    Ok(campaigns)
}

/// All campaigns owned by an artist, newest first.
pub async fn list_for_artist(pool: &DbPool, artist_id: Uuid) -> Result<Vec<Campaign>, AppError> {
    let campaigns = sqlx::query_as::<_, Campaign>(&format!(
        "SELECT {CAMPAIGN_COLUMNS} FROM campaigns WHERE artist_id = $1 ORDER BY created_at DESC"
    ))
    .bind(artist_id)
    .fetch_all(pool)
    .await?;

    Ok(campaigns)
}

/// Cancel a DRAFT or ACTIVE campaign.
///
/// Payouts already created stay owed; only the unspent budget is released.
pub async fn cancel_campaign(
    pool: &DbPool,
    auth: &AuthContext,
    campaign_id: Uuid,
) -> Result<Campaign, AppError> {
    let campaign = get_managed_campaign(pool, auth, campaign_id).await?;

    if !campaign.status.can_cancel() {
        return Err(AppError::InvalidTransition {
            from: campaign.status.as_str().to_string(),
            to: CampaignStatus::Cancelled.as_str().to_string(),
        });
    }

    // Guard on status in SQL too, in case of a concurrent change
    let cancelled = sqlx::query_as::<_, Campaign>(&format!(
        r#"
        UPDATE campaigns
        SET status = 'CANCELLED', updated_at = NOW()
        WHERE id = $1 AND status IN ('DRAFT', 'ACTIVE')
        RETURNING {CAMPAIGN_COLUMNS}
        "#
    ))
    .bind(campaign.id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::Conflict("Campaign status changed, retry".to_string()))?;

    tracing::info!(campaign_id = %cancelled.id, user_id = %auth.user_id, "campaign cancelled");
    Ok(cancelled)
}
