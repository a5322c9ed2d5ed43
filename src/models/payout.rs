//! Creator payout models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payout_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PayoutStatus {
    Pending,
    Paid,
    Cancelled,
}

impl PayoutStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PayoutStatus::Pending => "PENDING",
            PayoutStatus::Paid => "PAID",
            PayoutStatus::Cancelled => "CANCELLED",
        }
    }
}

/// Money owed to a creator for one approved submission.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Payout {
    pub id: Uuid,
    pub creator_id: Uuid,
    pub campaign_id: Uuid,
    pub submission_id: Uuid,
    pub amount_cents: i64,
    pub currency: String,
    pub status: PayoutStatus,

    /// PayPal transaction or batch id recorded by the admin who paid it
    pub paypal_reference: Option<String>,

    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Request body for `POST /api/v1/admin/payouts/{id}/mark-paid`.
#[derive(Debug, Deserialize, Validate)]
pub struct MarkPaidRequest {
    #[validate(length(min = 1, max = 255, message = "PayPal reference is required"))]
    pub paypal_reference: String,
}

#[derive(Debug, Deserialize)]
pub struct PayoutFilter {
    pub status: Option<PayoutStatus>,
}

/// Admin dashboard counters.
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct AdminStats {
    pub pending_applications: i64,
    pub pending_submissions: i64,
    pub active_campaigns: i64,
    pub pending_payout_cents: i64,
}
