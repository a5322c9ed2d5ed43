//! Creator payouts and admin settlement.

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    db::DbPool,
    email::{EmailTemplate, Mailer},
    error::AppError,
    models::payout::{AdminStats, MarkPaidRequest, Payout, PayoutStatus},
    services::auth_service,
};

pub(crate) const PAYOUT_COLUMNS: &str = "id, creator_id, campaign_id, submission_id, amount_cents, \
     currency, status, paypal_reference, paid_at, created_at";

pub async fn list_for_creator(pool: &DbPool, creator_id: Uuid) -> Result<Vec<Payout>, AppError> {
    let payouts = sqlx::query_as::<_, Payout>(&format!(
        "SELECT {PAYOUT_COLUMNS} FROM payouts WHERE creator_id = $1 ORDER BY created_at DESC"
    ))
    .bind(creator_id)
    .fetch_all(pool)
    .await?;

    Ok(payouts)
}

pub async fn list_all(pool: &DbPool, status: Option<PayoutStatus>) -> Result<Vec<Payout>, AppError> {
    let payouts = sqlx::query_as::<_, Payout>(&format!(
        r#"
        SELECT {PAYOUT_COLUMNS} FROM payouts
        WHERE ($1::payout_status IS NULL OR status = $1)
        ORDER BY created_at ASC
        "#
    ))
    .bind(status)
    .fetch_all(pool)
    .await?;

    Ok(payouts)
}

/// Record that a PENDING payout was sent through PayPal.
pub async fn mark_paid(
    pool: &DbPool,
    mailer: Option<Arc<Mailer>>,
    payout_id: Uuid,
    request: MarkPaidRequest,
) -> Result<Payout, AppError> {
    let reference = request.paypal_reference.trim().to_string();

    let updated = sqlx::query_as::<_, Payout>(&format!(
        r#"
        UPDATE payouts
        SET status = 'PAID', paypal_reference = $2, paid_at = NOW()
        WHERE id = $1 AND status = 'PENDING'
        RETURNING {PAYOUT_COLUMNS}
        "#
    ))
    .bind(payout_id)
    .bind(&reference)
    .fetch_optional(pool)
    .await?;

    let payout = match updated {
        Some(payout) => payout,
        None => {
            // Distinguish a missing payout from one that is no longer pending
            let status: PayoutStatus =
                sqlx::query_scalar("SELECT status FROM payouts WHERE id = $1")
                    .bind(payout_id)
                    .fetch_optional(pool)
                    .await?
                    .ok_or(AppError::NotFound("Payout"))?;

            return Err(AppError::InvalidTransition {
                from: status.as_str().to_string(),
                to: PayoutStatus::Paid.as_str().to_string(),
            });
        }
    };

    tracing::info!(payout_id = %payout.id, creator_id = %payout.creator_id, amount_cents = payout.amount_cents, "payout marked paid");

    let amount_cents = payout.amount_cents;
    let currency = payout.currency.clone();
    auth_service::notify_user(pool, mailer, payout.creator_id, |display_name| {
        EmailTemplate::PayoutPaid {
            display_name,
            amount_cents,
            currency,
            paypal_reference: reference,
        }
    })
    .await;

    Ok(payout)
}

/// Counters for the admin dashboard.
pub async fn admin_stats(pool: &DbPool) -> Result<AdminStats, AppError> {
    let stats = sqlx::query_as::<_, AdminStats>(
        r#"
        SELECT
            (SELECT COUNT(*) FROM applications WHERE status = 'PENDING') AS pending_applications,
            (SELECT COUNT(*) FROM submissions WHERE status = 'PENDING') AS pending_submissions,
            (SELECT COUNT(*) FROM campaigns WHERE status = 'ACTIVE') AS active_campaigns,
            (SELECT COALESCE(SUM(amount_cents), 0)::BIGINT FROM payouts WHERE status = 'PENDING')
                AS pending_payout_cents
        "#,
    )
    .fetch_one(pool)
    .await?;

    Ok(stats)
}
