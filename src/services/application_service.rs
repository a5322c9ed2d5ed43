//! Creator applications and their admin review.

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    db::DbPool,
    email::{EmailTemplate, Mailer},
    error::AppError,
    models::{
        application::{
            Application, ApplicationStatus, CreateApplicationRequest, ReviewApplicationRequest,
        },
        campaign::CampaignStatus,
    },
    services::{auth_service, campaign_service},
};

const APPLICATION_COLUMNS: &str = "id, creator_id, campaign_id, tiktok_handle, follower_count, \
     message, status, reviewer_id, review_notes, reviewed_at, created_at";

/// Allowed TikTok handle length once a leading `@` is removed.
const HANDLE_LENGTH: std::ops::RangeInclusive<usize> = 2..=50;

/// Submit an application to the platform or to an ACTIVE campaign.
pub async fn create_application(
    pool: &DbPool,
    creator_id: Uuid,
    request: CreateApplicationRequest,
) -> Result<Application, AppError> {
    if let Some(campaign_id) = request.campaign_id {
        let campaign = campaign_service::find_campaign(pool, campaign_id)
            .await?
            .ok_or(AppError::NotFound("Campaign"))?;

        if campaign.status != CampaignStatus::Active {
            return Err(AppError::InvalidRequest(
                "Campaign is not accepting applications".to_string(),
            ));
        }
    }

    let handle = request.tiktok_handle.trim().trim_start_matches('@').to_string();
    if !HANDLE_LENGTH.contains(&handle.chars().count()) {
        return Err(AppError::InvalidRequest(
            "TikTok handle must be 2 to 50 characters, not counting '@'".to_string(),
        ));
    }

    let result = sqlx::query_as::<_, Application>(&format!(
        r#"
        INSERT INTO applications (creator_id, campaign_id, tiktok_handle, follower_count, message)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {APPLICATION_COLUMNS}
        "#
    ))
    .bind(creator_id)
    .bind(request.campaign_id)
    .bind(handle)
    .bind(request.follower_count)
    .bind(request.message)
    .fetch_one(pool)
    .await;

    match result {
        Ok(application) => {
            tracing::info!(application_id = %application.id, %creator_id, "application submitted");
            Ok(application)
        }
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => Err(
            AppError::Conflict("You have already applied".to_string()),
        ),
        Err(e) => Err(e.into()),
    }
}

pub async fn list_for_creator(pool: &DbPool, creator_id: Uuid) -> Result<Vec<Application>, AppError> {
    let applications = sqlx::query_as::<_, Application>(&format!(
        "SELECT {APPLICATION_COLUMNS} FROM applications WHERE creator_id = $1 ORDER BY created_at DESC"
    ))
    .bind(creator_id)
    .fetch_all(pool)
    .await?;

    Ok(applications)
}

/// Admin queue, oldest first. `status = None` lists everything.
pub async fn list_for_review(
    pool: &DbPool,
    status: Option<ApplicationStatus>,
) -> Result<Vec<Application>, AppError> {
    let applications = sqlx::query_as::<_, Application>(&format!(
        r#"
        SELECT {APPLICATION_COLUMNS} FROM applications
        WHERE ($1::application_status IS NULL OR status = $1)
        ORDER BY created_at ASC
        "#
    ))
    .bind(status)
    .fetch_all(pool)
    .await?;

    Ok(applications)
}

/// Whether the creator may submit to this campaign.
pub async fn has_approved_application(
    pool: &DbPool,
    creator_id: Uuid,
    campaign_id: Uuid,
) -> Result<bool, AppError> {
    let approved: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM applications
            WHERE creator_id = $1 AND campaign_id = $2 AND status = 'APPROVED'
        )
        "#,
    )
    .bind(creator_id)
    .bind(campaign_id)
    .fetch_one(pool)
    .await?;

    Ok(approved)
}

/// Decide a PENDING application and notify the creator.
pub async fn review_application(
    pool: &DbPool,
    mailer: Option<Arc<Mailer>>,
    reviewer_id: Uuid,
    application_id: Uuid,
    request: ReviewApplicationRequest,
) -> Result<Application, AppError> {
    let current = sqlx::query_as::<_, Application>(&format!(
        "SELECT {APPLICATION_COLUMNS} FROM applications WHERE id = $1"
    ))
    .bind(application_id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("Application"))?;

    let decision = current.status.review(request.decision)?;

    let reviewed = sqlx::query_as::<_, Application>(&format!(
        r#"
        UPDATE applications
        SET status = $2, reviewer_id = $3, review_notes = $4, reviewed_at = NOW()
        WHERE id = $1 AND status = 'PENDING'
        RETURNING {APPLICATION_COLUMNS}
        "#
    ))
    .bind(application_id)
    .bind(decision)
    .bind(reviewer_id)
    .bind(request.notes)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::Conflict("Application was reviewed concurrently".to_string()))?;

    tracing::info!(
        application_id = %reviewed.id,
        %reviewer_id,
        decision = decision.as_str(),
        "application reviewed"
    );

    // The title only decorates the email; a failed lookup drops it
    let campaign_title = match reviewed.campaign_id {
        Some(id) => campaign_service::find_campaign(pool, id)
            .await
            .ok()
            .flatten()
            .map(|c| c.title),
        None => None,
    };

    let approved = decision == ApplicationStatus::Approved;
    let notes = reviewed.review_notes.clone();
    auth_service::notify_user(pool, mailer, reviewed.creator_id, |display_name| {
        EmailTemplate::ApplicationReviewed {
            display_name,
            campaign_title,
            approved,
            notes,
        }
    })
    .await;

    Ok(reviewed)
}
