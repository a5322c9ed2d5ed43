//! Payout and admin dashboard HTTP handlers.
//!
//! - GET /api/v1/payouts/mine - The creator's payouts
//! - GET /api/v1/admin/payouts - All payouts, filterable by status (admin)
//! - POST /api/v1/admin/payouts/{id}/mark-paid - Record a PayPal payout (admin)
//! - GET /api/v1/admin/stats - Dashboard counters (admin)

use axum::{
    Json,
    extract::{Path, Query, State},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::AppError,
    middleware::auth::{RequireAdmin, RequireCreator},
    models::payout::{AdminStats, MarkPaidRequest, Payout, PayoutFilter},
    services::payout_service,
    state::AppState,
};

pub async fn list_mine(
    State(state): State<AppState>,
    RequireCreator(auth): RequireCreator,
) -> Result<Json<Vec<Payout>>, AppError> {
    Ok(Json(
        payout_service::list_for_creator(&state.pool, auth.user_id).await?,
    ))
}

pub async fn list_all(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Query(filter): Query<PayoutFilter>,
) -> Result<Json<Vec<Payout>>, AppError> {
    Ok(Json(payout_service::list_all(&state.pool, filter.status).await?))
}

/// Mark a PENDING payout as paid.
///
/// # Request Body
///
/// ```json
/// { "paypal_reference": "5TY05013RG002845M" }
/// ```
///
/// Returns 422 if the payout is not PENDING.
pub async fn mark_paid(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(payout_id): Path<Uuid>,
    Json(request): Json<MarkPaidRequest>,
) -> Result<Json<Payout>, AppError> {
    request.validate()?;
    let payout =
        payout_service::mark_paid(&state.pool, state.mailer.clone(), payout_id, request).await?;
    Ok(Json(payout))
}

/// Admin dashboard counters.
///
/// # Response (200)
///
/// ```json
/// {
///   "pending_applications": 3,
///   "pending_submissions": 7,
///   "active_campaigns": 2,
///   "pending_payout_cents": 15000
/// }
/// ```
pub async fn admin_stats(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
) -> Result<Json<AdminStats>, AppError> {
    Ok(Json(payout_service::admin_stats(&state.pool).await?))
}
