//! Campaign funding payments made through PayPal checkout.
//!
//! # Payment Flow
//!
//! 1. Artist requests an order for a DRAFT campaign
//! 2. Frontend redirects the artist to PayPal's `approve_url`
//! 3. Artist approves, frontend calls capture with the order id
//! 4. On a COMPLETED capture the campaign becomes ACTIVE

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Created,
    Completed,
    Failed,
}

/// Represents a payment record from the database.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Payment {
    pub id: Uuid,
    pub campaign_id: Uuid,
    pub paypal_order_id: String,
    pub amount_cents: i64,
    pub currency: String,
    pub status: PaymentStatus,
    pub capture_id: Option<String>,
    /// PayPal checkout link, reused while the order is still open.
    #[serde(skip_serializing)]
    pub approve_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request body for `POST /api/v1/payments/orders`.
#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub campaign_id: Uuid,
}

/// Response for order creation. A DRAFT campaign with an open order gets
/// that order back instead of a new one.
///
/// ```json
/// {
///   "payment": { "id": "...", "paypal_order_id": "5O190127TN364715T", "status": "CREATED", ... },
///   "approve_url": "https://www.sandbox.paypal.com/checkoutnow?token=5O190127TN364715T"
/// }
/// ```
#[derive(Debug, Serialize)]
pub struct CreateOrderResponse {
    pub payment: Payment,
    pub approve_url: Option<String>,
}
