//! Submission models and the review state machine.
//!
//! # Review transitions
//!
//! ```text
//! PENDING ──► APPROVED ──► PUBLISHED
//!    │
//!    ├──► REJECTED
//!    └──► NEEDS_REVISION ──(creator revises)──► PENDING
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;
use validator::Validate;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "submission_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubmissionStatus {
    Pending,
    Approved,
    Rejected,
    NeedsRevision,
    Published,
}

impl SubmissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionStatus::Pending => "PENDING",
            SubmissionStatus::Approved => "APPROVED",
            SubmissionStatus::Rejected => "REJECTED",
            SubmissionStatus::NeedsRevision => "NEEDS_REVISION",
            SubmissionStatus::Published => "PUBLISHED",
        }
    }

    /// Whether a reviewer may move a submission from `self` to `next`.
    pub fn can_review_to(self, next: SubmissionStatus) -> bool {
        use SubmissionStatus::*;
        matches!(
            (self, next),
            (Pending, Approved) | (Pending, Rejected) | (Pending, NeedsRevision) | (Approved, Published)
        )
    }

    /// Checked variant of [`can_review_to`](Self::can_review_to).
    pub fn review(self, next: SubmissionStatus) -> Result<SubmissionStatus, AppError> {
        if self.can_review_to(next) {
            Ok(next)
        } else {
            Err(AppError::InvalidTransition {
                from: self.as_str().to_string(),
                to: next.as_str().to_string(),
            })
        }
    }
}

/// Represents a submission record from the database.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Submission {
    pub id: Uuid,
    pub campaign_id: Uuid,
    pub creator_id: Uuid,

    /// Link to the TikTok video
    pub content_url: String,

    pub caption: Option<String>,
    pub status: SubmissionStatus,

    /// Reviewer feedback, cleared when the creator revises
    pub feedback: Option<String>,

    pub reviewed_by: Option<Uuid>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request body for `POST /api/v1/submissions`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateSubmissionRequest {
    pub campaign_id: Uuid,

    #[validate(length(min = 1, max = 2048, message = "Content URL must be 1 to 2048 characters"))]
    pub content_url: String,

    #[validate(length(max = 2200, message = "Caption must be at most 2200 characters"))]
    pub caption: Option<String>,
}

/// Request body for `PUT /api/v1/submissions/{id}` (revision).
#[derive(Debug, Deserialize, Validate)]
pub struct ReviseSubmissionRequest {
    #[validate(length(min = 1, max = 2048, message = "Content URL must be 1 to 2048 characters"))]
    pub content_url: String,

    #[validate(length(max = 2200, message = "Caption must be at most 2200 characters"))]
    pub caption: Option<String>,
}

/// Request body for `POST /api/v1/submissions/{id}/review`.
#[derive(Debug, Deserialize, Validate)]
pub struct ReviewSubmissionRequest {
    pub status: SubmissionStatus,

    #[validate(length(max = 2000, message = "Feedback must be at most 2000 characters"))]
    pub feedback: Option<String>,
}

/// Validate that a content link points at TikTok over HTTPS.
///
/// Accepts `tiktok.com` and any subdomain (`www.`, `vm.`, `m.`).
pub fn validate_content_url(raw: &str) -> Result<Url, AppError> {
    let parsed = Url::parse(raw.trim())
        .map_err(|_| AppError::InvalidRequest("Content URL is not a valid URL".to_string()))?;

    if parsed.scheme() != "https" {
        return Err(AppError::InvalidRequest(
            "Content URL must use HTTPS".to_string(),
        ));
    }

    let host = parsed.host_str().unwrap_or_default().to_ascii_lowercase();
    if host == "tiktok.com" || host.ends_with(".tiktok.com") {
        Ok(parsed)
    } else {
        Err(AppError::InvalidRequest(
            "Content URL must be a TikTok link".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use SubmissionStatus::*;

    #[test]
    fn review_transition_table() {
        let all = [Pending, Approved, Rejected, NeedsRevision, Published];
        let allowed = [
            (Pending, Approved),
            (Pending, Rejected),
            (Pending, NeedsRevision),
            (Approved, Published),
        ];

        for from in all {
            for to in all {
                assert_eq!(
                    from.can_review_to(to),
                    allowed.contains(&(from, to)),
                    "{} -> {}",
                    from.as_str(),
                    to.as_str()
                );
            }
        }
    }

    #[test]
    fn rejected_submission_cannot_be_published() {
        let err = Rejected.review(Published).unwrap_err();
        assert_eq!(err.to_string(), "Cannot change status from REJECTED to PUBLISHED");
    }

    #[test]
    fn tiktok_urls_are_accepted() {
        assert!(validate_content_url("https://www.tiktok.com/@dj/video/7251234567890123456").is_ok());
        assert!(validate_content_url("https://vm.tiktok.com/ZMabc123/").is_ok());
        assert!(validate_content_url(" https://tiktok.com/@dj ").is_ok());
    }

    #[test]
    fn non_tiktok_urls_are_rejected() {
        assert!(validate_content_url("http://www.tiktok.com/@dj").is_err());
        assert!(validate_content_url("https://eviltiktok.com/@dj").is_err());
        assert!(validate_content_url("https://youtube.com/watch?v=1").is_err());
        assert!(validate_content_url("not a url").is_err());
    }
}
