//! Creator application HTTP handlers.
//!
//! - POST /api/v1/applications - Apply to the platform or a campaign
//! - GET /api/v1/applications/mine - The creator's applications
//! - GET /api/v1/admin/applications - Review queue (admin)
//! - POST /api/v1/admin/applications/{id}/review - Approve or reject (admin)

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::AppError,
    middleware::auth::{RequireAdmin, RequireCreator},
    models::application::{
        Application, ApplicationFilter, CreateApplicationRequest, ReviewApplicationRequest,
    },
    services::application_service,
    state::AppState,
};

/// Submit an application.
///
/// # Request Body
///
/// ```json
/// {
///   "campaign_id": "550e8400-...",
///   "tiktok_handle": "@dancer",
///   "follower_count": 12000,
///   "message": "I make choreo videos"
/// }
/// ```
///
/// Omit `campaign_id` to apply to the platform itself. Applying twice to
/// the same target returns 409.
pub async fn create_application(
    State(state): State<AppState>,
    RequireCreator(auth): RequireCreator,
    Json(request): Json<CreateApplicationRequest>,
) -> Result<(StatusCode, Json<Application>), AppError> {
    request.validate()?;
    let application =
        application_service::create_application(&state.pool, auth.user_id, request).await?;
    Ok((StatusCode::CREATED, Json(application)))
}

pub async fn list_mine(
    State(state): State<AppState>,
    RequireCreator(auth): RequireCreator,
) -> Result<Json<Vec<Application>>, AppError> {
    Ok(Json(
        application_service::list_for_creator(&state.pool, auth.user_id).await?,
    ))
}

/// Admin review queue, filterable with `?status=PENDING`.
pub async fn list_for_review(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Query(filter): Query<ApplicationFilter>,
) -> Result<Json<Vec<Application>>, AppError> {
    Ok(Json(
        application_service::list_for_review(&state.pool, filter.status).await?,
    ))
}

/// Approve or reject a PENDING application.
///
/// # Request Body
///
/// ```json
/// { "decision": "APPROVED", "notes": "Welcome aboard" }
/// ```
pub async fn review_application(
    State(state): State<AppState>,
    RequireAdmin(auth): RequireAdmin,
    Path(application_id): Path<Uuid>,
    Json(request): Json<ReviewApplicationRequest>,
) -> Result<Json<Application>, AppError> {
    request.validate()?;
    let application = application_service::review_application(
        &state.pool,
        state.mailer.clone(),
        auth.user_id,
        application_id,
        request,
    )
    .await?;
    Ok(Json(application))
}
