//! PayPal Orders v2 client.
//!
//! API: <https://developer.paypal.com/docs/api/orders/v2/>
//!
//! Only the two calls checkout needs are implemented: create an order with
//! `intent = CAPTURE`, and capture it once the buyer has approved.

use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{ClientError, REQUEST_TIMEOUT, TokenCache, error_for_status, fetch_client_credentials};

/// Order as returned by PayPal after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayPalOrder {
    pub id: String,
    pub status: String,
    /// Where the buyer approves the payment
    pub approve_url: Option<String>,
}

/// Result of capturing an approved order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayPalCapture {
    pub order_id: String,
    /// Order status; `COMPLETED` means the money moved
    pub status: String,
    pub capture_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OrderResponse {
    id: String,
    status: String,
    #[serde(default)]
    links: Vec<LinkDescription>,
    #[serde(default)]
    purchase_units: Vec<PurchaseUnit>,
}

#[derive(Debug, Deserialize)]
struct LinkDescription {
    href: String,
    rel: String,
}

#[derive(Debug, Deserialize)]
struct PurchaseUnit {
    payments: Option<UnitPayments>,
}

#[derive(Debug, Deserialize)]
struct UnitPayments {
    #[serde(default)]
    captures: Vec<CaptureResponse>,
}

#[derive(Debug, Deserialize)]
struct CaptureResponse {
    id: String,
}

#[derive(Debug, Serialize)]
struct Amount<'a> {
    currency_code: &'a str,
    value: String,
}

/// PayPal REST client with a cached OAuth2 access token.
pub struct PayPalClient {
    http: reqwest::Client,
    base_url: String,
    client_id: String,
    client_secret: String,
    token: TokenCache,
}

impl PayPalClient {
    pub fn new(base_url: impl Into<String>, client_id: String, client_secret: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client_id,
            client_secret,
            token: TokenCache::default(),
        }
    }

    async fn access_token(&self) -> Result<String, ClientError> {
        let token_url = format!("{}/v1/oauth2/token", self.base_url);
        self.token
            .get_or_fetch(|| {
                fetch_client_credentials(&self.http, &token_url, &self.client_id, &self.client_secret)
            })
            .await
    }

    /// Create a checkout order for `amount_cents`.
    ///
    /// `reference_id` ties the purchase unit back to our campaign.
    pub async fn create_order(
        &self,
        amount_cents: i64,
        currency: &str,
        reference_id: &str,
    ) -> Result<PayPalOrder, ClientError> {
        if amount_cents <= 0 {
            return Err(ClientError::InvalidInput(
                "Order amount must be positive".to_string(),
            ));
        }

        let token = self.access_token().await?;
        let body = json!({
            "intent": "CAPTURE",
            "purchase_units": [{
                "reference_id": reference_id,
                "amount": Amount {
                    currency_code: currency,
                    value: format_amount(amount_cents),
                },
            }],
        });

        let response = self
            .http
            .post(format!("{}/v2/checkout/orders", self.base_url))
            .bearer_auth(token)
            .json(&body)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        let order: OrderResponse = error_for_status(response).await?.json().await?;
        let approve_url = order
            .links
            .iter()
            .find(|l| l.rel == "approve" || l.rel == "payer-action")
            .map(|l| l.href.clone());

        tracing::info!(order_id = %order.id, amount_cents, "PayPal order created");

        Ok(PayPalOrder {
            id: order.id,
            status: order.status,
            approve_url,
        })
    }

    /// Capture an approved order.
    pub async fn capture_order(&self, order_id: &str) -> Result<PayPalCapture, ClientError> {
        let token = self.access_token().await?;

        let response = self
            .http
            .post(format!(
                "{}/v2/checkout/orders/{}/capture",
                self.base_url, order_id
            ))
            .bearer_auth(token)
            .header("Content-Type", "application/json")
            .body("{}")
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound("PayPal order"));
        }

        let order: OrderResponse = error_for_status(response).await?.json().await?;
        let capture_id = order
            .purchase_units
            .iter()
            .filter_map(|u| u.payments.as_ref())
            .flat_map(|p| p.captures.iter())
            .map(|c| c.id.clone())
            .next();

        tracing::info!(order_id = %order.id, status = %order.status, "PayPal order captured");

        Ok(PayPalCapture {
            order_id: order.id,
            status: order.status,
            capture_id,
        })
    }
}

/// Format cents as PayPal's decimal string, e.g. `12345` -> `"123.45"`.
pub fn format_amount(amount_cents: i64) -> String {
    format!("{}.{:02}", amount_cents / 100, amount_cents % 100)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amounts_are_formatted_with_two_decimals() {
        assert_eq!(format_amount(12345), "123.45");
        assert_eq!(format_amount(100), "1.00");
        assert_eq!(format_amount(7), "0.07");
        assert_eq!(format_amount(50000), "500.00");
    }

    #[test]
    fn capture_response_extracts_first_capture_id() {
        let raw = r#"{
            "id": "5O190127TN364715T",
            "status": "COMPLETED",
            "purchase_units": [{
                "reference_id": "c1",
                "payments": { "captures": [{ "id": "3C679366HH908993F", "status": "COMPLETED" }] }
            }]
        }"#;
        let order: OrderResponse = serde_json::from_str(raw).unwrap();
        let capture_id = order
            .purchase_units
            .iter()
            .filter_map(|u| u.payments.as_ref())
            .flat_map(|p| p.captures.iter())
            .map(|c| c.id.clone())
            .next();
        assert_eq!(capture_id.as_deref(), Some("3C679366HH908993F"));
    }
}
