//! Submission service - content submissions and their review.
//!
//! Approving a submission commits budget, so it runs inside one PostgreSQL
//! transaction:
//!
//! 1. Lock the submission and its campaign (`FOR UPDATE`)
//! 2. Validate the status transition
//! 3. Check and decrement the campaign's remaining budget
//! 4. Insert the creator's payout
//! 5. Commit (or roll back on any error)

use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::{
    db::DbPool,
    email::{EmailTemplate, Mailer},
    error::AppError,
    middleware::auth::AuthContext,
    models::{
        campaign::{Campaign, CampaignStatus},
        payout::Payout,
        submission::{
            CreateSubmissionRequest, ReviseSubmissionRequest, ReviewSubmissionRequest, Submission,
            SubmissionStatus, validate_content_url,
        },
    },
    services::{
        application_service, auth_service,
        campaign_service::{self, CAMPAIGN_COLUMNS, can_manage},
        payout_service::PAYOUT_COLUMNS,
    },
};

const SUBMISSION_COLUMNS: &str = "id, campaign_id, creator_id, content_url, caption, status, \
     feedback, reviewed_by, reviewed_at, created_at, updated_at";

/// Result of a review. `payout` is set when the review approved the submission.
#[derive(Debug, Serialize)]
pub struct ReviewOutcome {
    pub submission: Submission,
    pub payout: Option<Payout>,
}

/// Submit content to an ACTIVE campaign the creator was approved for.
pub async fn create_submission(
    pool: &DbPool,
    creator_id: Uuid,
    request: CreateSubmissionRequest,
) -> Result<Submission, AppError> {
    let content_url = validate_content_url(&request.content_url)?;

    let campaign = campaign_service::find_campaign(pool, request.campaign_id)
        .await?
        .filter(|c| c.status == CampaignStatus::Active)
        .ok_or(AppError::NotFound("Campaign"))?;

    if !application_service::has_approved_application(pool, creator_id, campaign.id).await? {
        return Err(AppError::Forbidden(
            "An approved application for this campaign is required".to_string(),
        ));
    }

    let submission = sqlx::query_as::<_, Submission>(&format!(
        r#"
        INSERT INTO submissions (campaign_id, creator_id, content_url, caption)
        VALUES ($1, $2, $3, $4)
        RETURNING {SUBMISSION_COLUMNS}
        "#
    ))
    .bind(campaign.id)
    .bind(creator_id)
    .bind(content_url.as_str())
    .bind(request.caption)
    .fetch_one(pool)
    .await?;

    tracing::info!(submission_id = %submission.id, campaign_id = %campaign.id, %creator_id, "submission created");
    Ok(submission)
}

/// Replace the content of a NEEDS_REVISION submission and send it back to review.
pub async fn revise_submission(
    pool: &DbPool,
    creator_id: Uuid,
    submission_id: Uuid,
    request: ReviseSubmissionRequest,
) -> Result<Submission, AppError> {
    let content_url = validate_content_url(&request.content_url)?;

    let current = find_submission(pool, submission_id)
        .await?
        .filter(|s| s.creator_id == creator_id)
        .ok_or(AppError::NotFound("Submission"))?;

    if current.status != SubmissionStatus::NeedsRevision {
        return Err(AppError::InvalidTransition {
            from: current.status.as_str().to_string(),
            to: SubmissionStatus::Pending.as_str().to_string(),
        });
    }

    let revised = sqlx::query_as::<_, Submission>(&format!(
        r#"
        UPDATE submissions
        SET content_url = $2, caption = $3, status = 'PENDING', feedback = NULL, updated_at = NOW()
        WHERE id = $1 AND status = 'NEEDS_REVISION'
        RETURNING {SUBMISSION_COLUMNS}
        "#
    ))
    .bind(submission_id)
    .bind(content_url.as_str())
    .bind(request.caption)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::Conflict("Submission status changed, retry".to_string()))?;

    tracing::info!(submission_id = %revised.id, "submission revised");
    Ok(revised)
}

pub async fn find_submission(
    pool: &DbPool,
    submission_id: Uuid,
) -> Result<Option<Submission>, AppError> {
    let submission = sqlx::query_as::<_, Submission>(&format!(
        "SELECT {SUBMISSION_COLUMNS} FROM submissions WHERE id = $1"
    ))
    .bind(submission_id)
    .fetch_optional(pool)
    .await?;

    Ok(submission)
}

pub async fn list_for_creator(pool: &DbPool, creator_id: Uuid) -> Result<Vec<Submission>, AppError> {
    let submissions = sqlx::query_as::<_, Submission>(&format!(
        "SELECT {SUBMISSION_COLUMNS} FROM submissions WHERE creator_id = $1 ORDER BY created_at DESC"
    ))
    .bind(creator_id)
    .fetch_all(pool)
    .await?;

    Ok(submissions)
}

/// Submissions for a campaign the caller manages, oldest first.
pub async fn list_for_campaign(
    pool: &DbPool,
    auth: &AuthContext,
    campaign_id: Uuid,
) -> Result<Vec<Submission>, AppError> {
    let campaign = campaign_service::get_managed_campaign(pool, auth, campaign_id).await?;

    let submissions = sqlx::query_as::<_, Submission>(&format!(
        "SELECT {SUBMISSION_COLUMNS} FROM submissions WHERE campaign_id = $1 ORDER BY created_at ASC"
    ))
    .bind(campaign.id)
    .fetch_all(pool)
    .await?;

    Ok(submissions)
}

/// Review a submission as the campaign owner or an admin.
pub async fn review_submission(
    pool: &DbPool,
    mailer: Option<Arc<Mailer>>,
    auth: &AuthContext,
    submission_id: Uuid,
    request: ReviewSubmissionRequest,
) -> Result<ReviewOutcome, AppError> {
    let mut tx = pool.begin().await?;

    let submission = sqlx::query_as::<_, Submission>(&format!(
        "SELECT {SUBMISSION_COLUMNS} FROM submissions WHERE id = $1 FOR UPDATE"
    ))
    .bind(submission_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(AppError::NotFound("Submission"))?;

    let campaign = sqlx::query_as::<_, Campaign>(&format!(
        "SELECT {CAMPAIGN_COLUMNS} FROM campaigns WHERE id = $1 FOR UPDATE"
    ))
    .bind(submission.campaign_id)
    .fetch_one(&mut *tx)
    .await?;

    if !can_manage(auth, &campaign) {
        return Err(AppError::NotFound("Submission"));
    }

    let next = submission.status.review(request.status)?;

    let mut payout = None;
    if next == SubmissionStatus::Approved {
        if campaign.status != CampaignStatus::Active {
            return Err(AppError::InvalidRequest(
                "Submissions can only be approved on active campaigns".to_string(),
            ));
        }

        if !campaign.can_fund_payout() {
            tx.rollback().await?;
            return Err(AppError::InsufficientBudget);
        }

        // Completes the campaign once it cannot fund another payout
        sqlx::query(
            r#"
            UPDATE campaigns
            SET remaining_budget_cents = remaining_budget_cents - payout_per_submission_cents,
                status = CASE
                    WHEN remaining_budget_cents - payout_per_submission_cents < payout_per_submission_cents
                    THEN 'COMPLETED'::campaign_status
                    ELSE status
                END,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(campaign.id)
        .execute(&mut *tx)
        .await?;

        let created = sqlx::query_as::<_, Payout>(&format!(
            r#"
            INSERT INTO payouts (creator_id, campaign_id, submission_id, amount_cents, currency)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {PAYOUT_COLUMNS}
            "#
        ))
        .bind(submission.creator_id)
        .bind(campaign.id)
        .bind(submission.id)
        .bind(campaign.payout_per_submission_cents)
        .bind(&campaign.currency)
        .fetch_one(&mut *tx)
        .await?;

        payout = Some(created);
    }

    let reviewed = sqlx::query_as::<_, Submission>(&format!(
        r#"
        UPDATE submissions
        SET status = $2, feedback = $3, reviewed_by = $4, reviewed_at = NOW(), updated_at = NOW()
        WHERE id = $1
        RETURNING {SUBMISSION_COLUMNS}
        "#
    ))
    .bind(submission.id)
    .bind(next)
    .bind(request.feedback)
    .bind(auth.user_id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!(
        submission_id = %reviewed.id,
        reviewer_id = %auth.user_id,
        status = next.as_str(),
        payout_id = ?payout.as_ref().map(|p| p.id),
        "submission reviewed"
    );

    let feedback = reviewed.feedback.clone();
    auth_service::notify_user(pool, mailer, reviewed.creator_id, |display_name| {
        EmailTemplate::SubmissionReviewed {
            display_name,
            campaign_title: campaign.title,
            status: next,
            feedback,
        }
    })
    .await;

    Ok(ReviewOutcome {
        submission: reviewed,
        payout,
    })
}
