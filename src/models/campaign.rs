//! Campaign data models and API request/response types.
//!
//! Amounts are stored as `i64` cents, never floats.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Lifecycle of a campaign.
///
/// - `Draft`: created, waiting for the PayPal payment to be captured
/// - `Active`: funded, open to applications and submissions
/// - `Completed`: remaining budget can no longer cover a payout
/// - `Cancelled`: withdrawn by the artist or an admin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "campaign_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CampaignStatus {
    Draft,
    Active,
    Completed,
    Cancelled,
}

impl CampaignStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CampaignStatus::Draft => "DRAFT",
            CampaignStatus::Active => "ACTIVE",
            CampaignStatus::Completed => "COMPLETED",
            CampaignStatus::Cancelled => "CANCELLED",
        }
    }

    /// Only unfinished campaigns can be cancelled.
    pub fn can_cancel(&self) -> bool {
        matches!(self, CampaignStatus::Draft | CampaignStatus::Active)
    }
}

/// Represents a campaign record from the database.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Campaign {
    pub id: Uuid,

    /// Artist who owns and funds the campaign
    pub artist_id: Uuid,

    pub title: String,
    pub description: String,

    /// Spotify metadata captured at creation time
    pub spotify_track_id: Option<String>,
    pub track_name: Option<String>,
    pub track_artists: Option<String>,
    pub track_image_url: Option<String>,

    /// Total funded amount in cents
    pub budget_cents: i64,

    /// Amount paid to a creator per approved submission
    pub payout_per_submission_cents: i64,

    /// Budget not yet committed to payouts. Zero until funded.
    pub remaining_budget_cents: i64,

    pub currency: String,
    pub status: CampaignStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Campaign {
    /// Whether the remaining budget still covers one more payout.
    pub fn can_fund_payout(&self) -> bool {
        self.remaining_budget_cents >= self.payout_per_submission_cents
    }
}

/// Request body for `POST /api/v1/campaigns`.
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
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCampaignRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1 to 200 characters"))]
    pub title: String,

    #[serde(default)]
    #[validate(length(max = 5000, message = "Description must be at most 5000 characters"))]
    pub description: String,

    pub spotify_url: Option<String>,

    #[validate(range(min = 1, message = "Budget must be positive"))]
    pub budget_cents: i64,

    #[validate(range(min = 1, message = "Payout per submission must be positive"))]
    pub payout_per_submission_cents: i64,
}
