//! Campaign funding HTTP handlers.
//!
//! - POST /api/v1/payments/orders - Open a PayPal order for a DRAFT campaign
//! - POST /api/v1/payments/orders/{order_id}/capture - Capture and activate
//! - GET /api/v1/campaigns/{id}/payments - Payment history of a campaign

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::{
    error::AppError,
    middleware::auth::{AuthContext, RequireArtist},
    models::payment::{CreateOrderRequest, CreateOrderResponse, Payment},
    services::payment_service,
    state::AppState,
};

/// Create a PayPal order for the campaign's full budget.
///
/// # Request Body
///
/// ```json
/// { "campaign_id": "550e8400-..." }
/// ```
///
/// # Response (201)
///
/// The stored payment plus the PayPal URL the artist must visit to approve it.
/// An order that is still open for the campaign is returned again.
pub async fn create_order(
    State(state): State<AppState>,
    RequireArtist(auth): RequireArtist,
    Json(request): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<CreateOrderResponse>), AppError> {
    let paypal = state.paypal()?;
    let response =
        payment_service::create_order(&state.pool, paypal, &auth, request.campaign_id).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Capture an approved order.
///
/// Idempotent: capturing a COMPLETED payment returns it unchanged. A
/// capture PayPal does not report as COMPLETED marks the payment FAILED
/// and returns 502. Orders of a campaign that left DRAFT answer 422.
pub async fn capture_order(
    State(state): State<AppState>,
    RequireArtist(auth): RequireArtist,
    Path(order_id): Path<String>,
) -> Result<Json<Payment>, AppError> {
    let paypal = state.paypal()?;
    let payment = payment_service::capture_order(
        &state.pool,
        paypal,
        state.mailer.clone(),
        &auth,
        &order_id,
    )
    .await?;
    Ok(Json(payment))
}

pub async fn list_for_campaign(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(campaign_id): Path<Uuid>,
) -> Result<Json<Vec<Payment>>, AppError> {
    Ok(Json(
        payment_service::list_for_campaign(&state.pool, &auth, campaign_id).await?,
    ))
}
