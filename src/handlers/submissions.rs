//! Submission HTTP handlers.
//!
//! - POST /api/v1/submissions - Submit TikTok content to a campaign
//! - PUT /api/v1/submissions/{id} - Revise a NEEDS_REVISION submission
//! - GET /api/v1/submissions/mine - The creator's submissions
//! - GET /api/v1/campaigns/{id}/submissions - Submissions for a managed campaign
//! - POST /api/v1/submissions/{id}/review - Review as campaign owner or admin

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::AppError,
    middleware::auth::{AuthContext, RequireCreator},
    models::submission::{
        CreateSubmissionRequest, ReviseSubmissionRequest, ReviewSubmissionRequest, Submission,
    },
    services::submission_service::{self, ReviewOutcome},
    state::AppState,
};

/// Submit content.
///
/// # Request Body
///
/// ```json
/// {
///   "campaign_id": "550e8400-...",
///   "content_url": "https://www.tiktok.com/@dancer/video/7234567890123456789",
///   "caption": "New choreo"
/// }
/// ```
///
/// # Validation
///
/// - Campaign must be ACTIVE
/// - Creator must hold an APPROVED application for the campaign
/// - `content_url` must be an https TikTok link
pub async fn create_submission(
    State(state): State<AppState>,
    RequireCreator(auth): RequireCreator,
    Json(request): Json<CreateSubmissionRequest>,
) -> Result<(StatusCode, Json<Submission>), AppError> {
    request.validate()?;
    let submission =
        submission_service::create_submission(&state.pool, auth.user_id, request).await?;
    Ok((StatusCode::CREATED, Json(submission)))
}

pub async fn revise_submission(
    State(state): State<AppState>,
    RequireCreator(auth): RequireCreator,
    Path(submission_id): Path<Uuid>,
    Json(request): Json<ReviseSubmissionRequest>,
) -> Result<Json<Submission>, AppError> {
    request.validate()?;
    let submission =
        submission_service::revise_submission(&state.pool, auth.user_id, submission_id, request)
            .await?;
    Ok(Json(submission))
}

pub async fn list_mine(
    State(state): State<AppState>,
    RequireCreator(auth): RequireCreator,
) -> Result<Json<Vec<Submission>>, AppError> {
    Ok(Json(
        submission_service::list_for_creator(&state.pool, auth.user_id).await?,
    ))
}

pub async fn list_for_campaign(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(campaign_id): Path<Uuid>,
) -> Result<Json<Vec<Submission>>, AppError> {
    Ok(Json(
        submission_service::list_for_campaign(&state.pool, &auth, campaign_id).await?,
    ))
}

/// Review a submission.
///
/// # Request Body
///
/// ```json
/// { "status": "APPROVED", "feedback": "Great energy" }
/// ```
///
/// # Response (200)
///
/// ```json
/// {
///   "submission": { "id": "...", "status": "APPROVED", ... },
///   "payout": { "id": "...", "amount_cents": 2500, "status": "PENDING", ... }
/// }
/// ```
///
/// `payout` is null unless the review approved the submission. Approval
/// fails with 422 `insufficient_budget` when the campaign cannot cover it.
pub async fn review_submission(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(submission_id): Path<Uuid>,
    Json(request): Json<ReviewSubmissionRequest>,
) -> Result<Json<ReviewOutcome>, AppError> {
    request.validate()?;
    let outcome = submission_service::review_submission(
        &state.pool,
        state.mailer.clone(),
        &auth,
        submission_id,
        request,
    )
    .await?;
    Ok(Json(outcome))
}
