//! Campaign funding through PayPal checkout.
//!
//! Capturing an order is the only way a campaign leaves DRAFT. The payment
//! row and the campaign are updated in the same transaction so a campaign
//! is never ACTIVE without a COMPLETED payment behind it.

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    clients::paypal::PayPalClient,
    db::DbPool,
    email::{EmailTemplate, Mailer},
    error::AppError,
    middleware::auth::AuthContext,
    models::{
        campaign::{Campaign, CampaignStatus},
        payment::{CreateOrderResponse, Payment, PaymentStatus},
    },
    services::{
        auth_service,
        campaign_service::{self, CAMPAIGN_COLUMNS},
    },
};

const PAYMENT_COLUMNS: &str = "id, campaign_id, paypal_order_id, amount_cents, currency, status, \
     capture_id, approve_url, created_at, updated_at";

/// PayPal order status that means the funds were captured.
const CAPTURE_COMPLETED: &str = "COMPLETED";

type PgTransaction = sqlx::Transaction<'static, sqlx::Postgres>;

/// Lock the campaign row for the rest of `tx`.
///
/// Order creation and capture both hold this lock across their PayPal call,
/// so a campaign is funded at most once and never after it was cancelled.
async fn lock_campaign(tx: &mut PgTransaction, campaign_id: Uuid) -> Result<Campaign, AppError> {
    sqlx::query_as::<_, Campaign>(&format!(
        "SELECT {CAMPAIGN_COLUMNS} FROM campaigns WHERE id = $1 FOR UPDATE"
    ))
    .bind(campaign_id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or(AppError::NotFound("Campaign"))
}

/// Open a PayPal order for the full budget of a DRAFT campaign.
///
/// While an order for the campaign is still open it is returned again
/// instead of creating a second one.
pub async fn create_order(
    pool: &DbPool,
    paypal: &PayPalClient,
    auth: &AuthContext,
    campaign_id: Uuid,
) -> Result<CreateOrderResponse, AppError> {
    campaign_service::get_managed_campaign(pool, auth, campaign_id).await?;

    let mut tx = pool.begin().await?;
    let campaign = lock_campaign(&mut tx, campaign_id).await?;

    if campaign.status != CampaignStatus::Draft {
        tx.rollback().await?;
        return Err(AppError::InvalidRequest(
            "Only draft campaigns can be funded".to_string(),
        ));
    }

    let open = sqlx::query_as::<_, Payment>(&format!(
        "SELECT {PAYMENT_COLUMNS} FROM payments WHERE campaign_id = $1 AND status = 'CREATED'"
    ))
    .bind(campaign.id)
    .fetch_optional(&mut *tx)
    .await?;

    if let Some(payment) = open {
        tx.rollback().await?;
        tracing::debug!(payment_id = %payment.id, campaign_id = %campaign.id, "reusing open funding order");
        let approve_url = payment.approve_url.clone();
        return Ok(CreateOrderResponse {
            payment,
            approve_url,
        });
    }

    let order = paypal
        .create_order(
            campaign.budget_cents,
            &campaign.currency,
            &campaign.id.to_string(),
        )
        .await?;

    let payment = sqlx::query_as::<_, Payment>(&format!(
        r#"
        INSERT INTO payments (campaign_id, paypal_order_id, amount_cents, currency, approve_url)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {PAYMENT_COLUMNS}
        "#
    ))
    .bind(campaign.id)
    .bind(&order.id)
    .bind(campaign.budget_cents)
    .bind(&campaign.currency)
    .bind(&order.approve_url)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!(
        payment_id = %payment.id,
        campaign_id = %campaign.id,
        order_id = %order.id,
        "funding order created"
    );

    Ok(CreateOrderResponse {
        payment,
        approve_url: order.approve_url,
    })
}

async fn find_by_order_id(pool: &DbPool, order_id: &str) -> Result<Option<Payment>, AppError> {
    let payment = sqlx::query_as::<_, Payment>(&format!(
        "SELECT {PAYMENT_COLUMNS} FROM payments WHERE paypal_order_id = $1"
    ))
    .bind(order_id)
    .fetch_optional(pool)
    .await?;

    Ok(payment)
}

/// Capture an approved order and activate its campaign.
///
/// Capturing an already completed payment returns it unchanged. Orders of a
/// campaign that is no longer a DRAFT are refused before PayPal is called.
pub async fn capture_order(
    pool: &DbPool,
    paypal: &PayPalClient,
    mailer: Option<Arc<Mailer>>,
    auth: &AuthContext,
    order_id: &str,
) -> Result<Payment, AppError> {
    let payment = find_by_order_id(pool, order_id)
        .await?
        .ok_or(AppError::NotFound("Payment"))?;

    // Ownership check; other artists' orders look missing
    campaign_service::find_campaign(pool, payment.campaign_id)
        .await?
        .filter(|c| campaign_service::can_manage(auth, c))
        .ok_or(AppError::NotFound("Payment"))?;

    if payment.status == PaymentStatus::Completed {
        tracing::debug!(payment_id = %payment.id, "payment already captured");
        return Ok(payment);
    }

    let mut tx = pool.begin().await?;
    let campaign = lock_campaign(&mut tx, payment.campaign_id).await?;

    // Re-read under the lock, a concurrent capture may have finished first
    let payment = sqlx::query_as::<_, Payment>(&format!(
        "SELECT {PAYMENT_COLUMNS} FROM payments WHERE id = $1 FOR UPDATE"
    ))
    .bind(payment.id)
    .fetch_one(&mut *tx)
    .await?;

    if payment.status == PaymentStatus::Completed {
        tx.rollback().await?;
        return Ok(payment);
    }

    if campaign.status != CampaignStatus::Draft {
        tx.rollback().await?;
        tracing::warn!(payment_id = %payment.id, campaign_id = %campaign.id, status = campaign.status.as_str(), "refusing capture for a campaign that is no longer a draft");
        return Err(AppError::InvalidTransition {
            from: campaign.status.as_str().to_string(),
            to: CampaignStatus::Active.as_str().to_string(),
        });
    }

    let capture = paypal.capture_order(order_id).await?;

    if capture.status != CAPTURE_COMPLETED {
        sqlx::query("UPDATE payments SET status = 'FAILED', updated_at = NOW() WHERE id = $1")
            .bind(payment.id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        tracing::warn!(payment_id = %payment.id, paypal_status = %capture.status, "PayPal capture not completed");
        return Err(AppError::ExternalService(format!(
            "PayPal capture finished with status {}",
            capture.status
        )));
    }

    let completed = sqlx::query_as::<_, Payment>(&format!(
        r#"
        UPDATE payments
        SET status = 'COMPLETED', capture_id = $2, updated_at = NOW()
        WHERE id = $1
        RETURNING {PAYMENT_COLUMNS}
        "#
    ))
    .bind(payment.id)
    .bind(&capture.capture_id)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        UPDATE campaigns
        SET status = 'ACTIVE', remaining_budget_cents = budget_cents, updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(campaign.id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!(campaign_id = %campaign.id, payment_id = %completed.id, "campaign funded and activated");

    let amount_cents = completed.amount_cents;
    let currency = completed.currency.clone();
    auth_service::notify_user(pool, mailer, campaign.artist_id, |display_name| {
        EmailTemplate::CampaignFunded {
            display_name,
            campaign_title: campaign.title,
            amount_cents,
            currency,
        }
    })
    .await;

    Ok(completed)
}

/// Payments recorded for a campaign the caller manages, newest first.
pub async fn list_for_campaign(
    pool: &DbPool,
    auth: &AuthContext,
    campaign_id: Uuid,
) -> Result<Vec<Payment>, AppError> {
    let campaign = campaign_service::get_managed_campaign(pool, auth, campaign_id).await?;

    let payments = sqlx::query_as::<_, Payment>(&format!(
        "SELECT {PAYMENT_COLUMNS} FROM payments WHERE campaign_id = $1 ORDER BY created_at DESC"
    ))
    .bind(campaign.id)
    .fetch_all(pool)
    .await?;

    Ok(payments)
}
