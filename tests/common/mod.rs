//! Shared helpers for the HTTP integration tests.
//!
//! The app is built with the same `build_router` production uses and
//! driven with `tower::ServiceExt::oneshot`. PayPal and Spotify are
//! replaced by small axum servers bound to an ephemeral local port.

#![allow(dead_code)]

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};

use axum::{
    Json, Router,
    body::Body,
    extract::{Path, State},
    http::{HeaderMap, Method, Request, StatusCode},
    response::IntoResponse,
    routing::{get, post},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use sqlx::PgPool;
use tower::ServiceExt;

use creatoramp::{
    config::Config, router::build_router, services::auth_service, state::AppState,
};

pub const CSRF_SECRET: &str = "integration-test-csrf-secret";
pub const PASSWORD: &str = "correct-horse-battery";

pub const ADMIN_EMAIL: &str = "admin@creatoramp.test";

/// Track id the fake Spotify server knows about.
pub const KNOWN_TRACK_ID: &str = "4cOdK2wGLETKBW3PvgPWqT";

/// Config pointing the external clients at `paypal_base` / `spotify_base`.
pub fn test_config(paypal_base: Option<&str>, spotify_base: Option<&str>) -> Config {
    Config {
        database_url: "postgres://unused".to_string(),
        server_port: 0,
        cors_origin: "http://localhost:5173".to_string(),
        session_ttl_hours: 24,
        csrf_secret: CSRF_SECRET.to_string(),
        csrf_ttl_secs: 3600,
        paypal_client_id: paypal_base.map(|_| "paypal-id".to_string()),
        paypal_client_secret: paypal_base.map(|_| "paypal-secret".to_string()),
        paypal_api_base: paypal_base.unwrap_or("http://127.0.0.1:9").to_string(),
        paypal_currency: "USD".to_string(),
        spotify_client_id: spotify_base.map(|_| "spotify-id".to_string()),
        spotify_client_secret: spotify_base.map(|_| "spotify-secret".to_string()),
        spotify_api_base: spotify_base.unwrap_or("http://127.0.0.1:9").to_string(),
        spotify_accounts_base: spotify_base.unwrap_or("http://127.0.0.1:9").to_string(),
        smtp_host: None,
        smtp_port: 587,
        smtp_from: "CreatorAmp <noreply@creatoramp.test>".to_string(),
        smtp_user: None,
        smtp_password: None,
        app_base_url: "http://localhost:3000".to_string(),
        bootstrap_admin_email: None,
        bootstrap_admin_password: None,
    }
}

/// The application under test plus its database.
pub struct TestApp {
    pub router: Router,
    pub pool: PgPool,
}

impl TestApp {
    pub fn new(pool: PgPool, config: Config) -> Self {
        let state = AppState::new(pool.clone(), config, None);
        let router = build_router(state).unwrap();
        Self { router, pool }
    }

    /// App with no external integrations configured.
    pub fn offline(pool: PgPool) -> Self {
        Self::new(pool, test_config(None, None))
    }

    /// Send one request and return the status and parsed JSON body
    /// (`Value::Null` for empty bodies).
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        csrf: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {token}"));
        }
        if let Some(csrf) = csrf {
            builder = builder.header("X-CSRF-Token", csrf);
        }

        let request = match body {
            Some(body) => builder
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };

        (status, json)
    }

    /// Register through the API and fetch a CSRF token.
    pub async fn register(&self, email: &str, role: &str) -> Session {
        let (status, body) = self
            .send(
                Method::POST,
                "/api/v1/auth/register",
                None,
                None,
                Some(json!({
                    "email": email,
                    "password": PASSWORD,
                    "display_name": format!("{role} user"),
                    "role": role,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {body}");

        self.session_from(body).await
    }

    pub async fn login(&self, email: &str, password: &str) -> (StatusCode, Value) {
        self.send(
            Method::POST,
            "/api/v1/auth/login",
            None,
            None,
            Some(json!({ "email": email, "password": password })),
        )
        .await
    }

    /// Seed the bootstrap admin and log in as it.
    pub async fn admin(&self) -> Session {
        auth_service::ensure_admin(&self.pool, ADMIN_EMAIL, PASSWORD)
            .await
            .unwrap();
        let (status, body) = self.login(ADMIN_EMAIL, PASSWORD).await;
        assert_eq!(status, StatusCode::OK, "admin login failed: {body}");

        self.session_from(body).await
    }

    async fn session_from(&self, auth: Value) -> Session {
        let token = auth["token"].as_str().unwrap().to_string();
        let user_id = auth["user"]["id"].as_str().unwrap().to_string();

        let (status, body) = self
            .send(Method::GET, "/api/v1/csrf-token", Some(&token), None, None)
            .await;
        assert_eq!(status, StatusCode::OK);
        let csrf = body["token"].as_str().unwrap().to_string();

        Session {
            token,
            csrf,
            user_id,
        }
    }

    pub async fn get(&self, session: &Session, uri: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, Some(&session.token), None, None)
            .await
    }

    pub async fn post(&self, session: &Session, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(
            Method::POST,
            uri,
            Some(&session.token),
            Some(&session.csrf),
            Some(body),
        )
        .await
    }

    pub async fn put(&self, session: &Session, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(
            Method::PUT,
            uri,
            Some(&session.token),
            Some(&session.csrf),
            Some(body),
        )
        .await
    }
}

/// A signed-in user.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub csrf: String,
    pub user_id: String,
}

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn token_response(token: &str) -> Json<Value> {
    Json(json!({
        "access_token": token,
        "token_type": "Bearer",
        "expires_in": 32400,
    }))
}

// ---------------------------------------------------------------------------
// Fake PayPal
// ---------------------------------------------------------------------------

/// Handle to a running fake PayPal Orders API.
#[derive(Clone)]
pub struct FakePayPal {
    pub base_url: String,
    state: PayPalState,
}

#[derive(Clone, Default)]
struct PayPalState {
    token_requests: Arc<AtomicUsize>,
    orders: Arc<AtomicUsize>,
    order_failure: Arc<Mutex<Option<String>>>,
    captures: Arc<AtomicUsize>,
    capture_status: Arc<Mutex<String>>,
    last_order: Arc<Mutex<Option<Value>>>,
}

impl FakePayPal {
    pub async fn start() -> Self {
        let state = PayPalState::default();
        *state.capture_status.lock().unwrap() = "COMPLETED".to_string();

        let app = Router::new()
            .route("/v1/oauth2/token", post(paypal_token))
            .route("/v2/checkout/orders", post(paypal_create_order))
            .route("/v2/checkout/orders/{id}/capture", post(paypal_capture))
            .with_state(state.clone());

        let base_url = serve(app).await;
        Self { base_url, state }
    }

    /// Order status future captures report.
    pub fn set_capture_status(&self, status: &str) {
        *self.state.capture_status.lock().unwrap() = status.to_string();
    }

    /// Make order creation answer 500 with `debug_id` in the body.
    pub fn fail_orders_with(&self, debug_id: &str) {
        *self.state.order_failure.lock().unwrap() = Some(debug_id.to_string());
    }

    pub fn orders(&self) -> usize {
        self.state.orders.load(Ordering::SeqCst)
    }

    pub fn captures(&self) -> usize {
        self.state.captures.load(Ordering::SeqCst)
    }

    pub fn token_requests(&self) -> usize {
        self.state.token_requests.load(Ordering::SeqCst)
    }

    /// Body of the most recent create-order call.
    pub fn last_order(&self) -> Option<Value> {
        self.state.last_order.lock().unwrap().clone()
    }
}

async fn paypal_token(State(state): State<PayPalState>) -> Json<Value> {
    state.token_requests.fetch_add(1, Ordering::SeqCst);
    token_response("fake-paypal-token")
}

async fn paypal_create_order(
    State(state): State<PayPalState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    if headers.get("authorization").and_then(|h| h.to_str().ok())
        != Some("Bearer fake-paypal-token")
    {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "error": "invalid_token" })));
    }

    if let Some(debug_id) = state.order_failure.lock().unwrap().clone() {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "name": "INTERNAL_SERVICE_ERROR", "debug_id": debug_id })),
        );
    }

    state.orders.fetch_add(1, Ordering::SeqCst);
    *state.last_order.lock().unwrap() = Some(body);
    let id = format!("ORDER-{}", uuid::Uuid::new_v4().simple());

    (
        StatusCode::CREATED,
        Json(json!({
            "id": id,
            "status": "CREATED",
            "links": [
                { "href": format!("https://api.paypal.test/v2/checkout/orders/{id}"), "rel": "self", "method": "GET" },
                { "href": format!("https://www.paypal.test/checkoutnow?token={id}"), "rel": "approve", "method": "GET" },
            ],
        })),
    )
}

async fn paypal_capture(
    State(state): State<PayPalState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    if id == "ORDER-MISSING" {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "name": "RESOURCE_NOT_FOUND" })),
        );
    }

    state.captures.fetch_add(1, Ordering::SeqCst);
    let status = state.capture_status.lock().unwrap().clone();

    (
        StatusCode::CREATED,
        Json(json!({
            "id": id,
            "status": status,
            "purchase_units": [{
                "reference_id": "default",
                "payments": { "captures": [{ "id": "CAPTURE-1", "status": status }] },
            }],
        })),
    )
}

// ---------------------------------------------------------------------------
// Fake Spotify
// ---------------------------------------------------------------------------

/// Handle to a running fake Spotify accounts + Web API server.
#[derive(Clone)]
pub struct FakeSpotify {
    pub base_url: String,
    token_requests: Arc<AtomicUsize>,
}

impl FakeSpotify {
    pub async fn start() -> Self {
        let token_requests = Arc::new(AtomicUsize::new(0));

        let app = Router::new()
            .route("/api/token", post(spotify_token))
            .route("/v1/tracks/{id}", get(spotify_track))
            .with_state(token_requests.clone());

        let base_url = serve(app).await;
        Self {
            base_url,
            token_requests,
        }
    }

    pub fn token_requests(&self) -> usize {
        self.token_requests.load(Ordering::SeqCst)
    }
}

async fn spotify_token(State(counter): State<Arc<AtomicUsize>>) -> Json<Value> {
    counter.fetch_add(1, Ordering::SeqCst);
    token_response("fake-spotify-token")
}

async fn spotify_track(headers: HeaderMap, Path(id): Path<String>) -> impl IntoResponse {
    if headers.get("authorization").and_then(|h| h.to_str().ok())
        != Some("Bearer fake-spotify-token")
    {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": { "status": 401, "message": "Invalid access token" } })),
        );
    }

    if id != KNOWN_TRACK_ID {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": { "status": 404, "message": "Not found." } })),
        );
    }

    (
        StatusCode::OK,
        Json(json!({
            "id": KNOWN_TRACK_ID,
            "name": "Never Gonna Give You Up",
            "artists": [{ "name": "Rick Astley" }],
            "album": {
                "name": "Whenever You Need Somebody",
                "images": [
                    { "url": "https://i.scdn.test/large.jpg", "width": 640, "height": 640 },
                    { "url": "https://i.scdn.test/small.jpg", "width": 64, "height": 64 },
                ],
            },
            "preview_url": null,
            "duration_ms": 213573,
            "external_urls": { "spotify": format!("https://open.spotify.com/track/{KNOWN_TRACK_ID}") },
        })),
    )
}
