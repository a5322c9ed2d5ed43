//! Creator application models.
//!
//! An application with no `campaign_id` is a request to join the platform;
//! otherwise it targets a single campaign.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "application_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApplicationStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "PENDING",
            ApplicationStatus::Approved => "APPROVED",
            ApplicationStatus::Rejected => "REJECTED",
        }
    }

    /// Validate a review decision against the current status.
    ///
    /// Reviews are one-shot: only `Pending` applications can be decided,
    /// and the decision must be `Approved` or `Rejected`.
    pub fn review(self, decision: ApplicationStatus) -> Result<ApplicationStatus, AppError> {
        match (self, decision) {
            (ApplicationStatus::Pending, ApplicationStatus::Approved)
            | (ApplicationStatus::Pending, ApplicationStatus::Rejected) => Ok(decision),
            _ => Err(AppError::InvalidTransition {
                from: self.as_str().to_string(),
                to: decision.as_str().to_string(),
            }),
        }
    }
}

/// Represents an application record from the database.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Application {
    pub id: Uuid,
    pub creator_id: Uuid,
    pub campaign_id: Option<Uuid>,

    /// TikTok handle without the leading `@`
    pub tiktok_handle: String,

    pub follower_count: i64,
    pub message: Option<String>,
    pub status: ApplicationStatus,
    pub reviewer_id: Option<Uuid>,
    pub review_notes: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Request body for `POST /api/v1/applications`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateApplicationRequest {
    pub campaign_id: Option<Uuid>,

    /// Length is checked once a leading `@` is stripped
    pub tiktok_handle: String,

    #[serde(default)]
    #[validate(range(min = 0, message = "Follower count cannot be negative"))]
    pub follower_count: i64,

    #[validate(length(max = 2000, message = "Message must be at most 2000 characters"))]
    pub message: Option<String>,
}

/// Request body for `POST /api/v1/admin/applications/{id}/review`.
#[derive(Debug, Deserialize, Validate)]
pub struct ReviewApplicationRequest {
    pub decision: ApplicationStatus,

    #[validate(length(max = 2000, message = "Notes must be at most 2000 characters"))]
    pub notes: Option<String>,
}

/// Query string for admin listings, e.g. `?status=PENDING`.
#[derive(Debug, Deserialize)]
pub struct ApplicationFilter {
    pub status: Option<ApplicationStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_can_be_approved_or_rejected() {
        assert_eq!(
            ApplicationStatus::Pending
                .review(ApplicationStatus::Approved)
                .unwrap(),
            ApplicationStatus::Approved
        );
        assert_eq!(
            ApplicationStatus::Pending
                .review(ApplicationStatus::Rejected)
                .unwrap(),
            ApplicationStatus::Rejected
        );
    }

    #[test]
    fn decided_applications_cannot_be_reviewed_again() {
        let err = ApplicationStatus::Rejected
            .review(ApplicationStatus::Approved)
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition { .. }));
    }

    #[test]
    fn pending_is_not_a_decision() {
        assert!(
            ApplicationStatus::Pending
                .review(ApplicationStatus::Pending)
                .is_err()
        );
    }
}
