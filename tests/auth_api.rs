//! Registration, login, sessions, and CSRF enforcement over HTTP.

mod common;

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use axum::http::{Method, StatusCode};
use common::{PASSWORD, TestApp, test_config};
use creatoramp::{
    email::{EmailTemplate, Mailer},
    services::auth_service,
};
use serde_json::json;
use sqlx::PgPool;

#[sqlx::test(migrations = "./migrations")]
async fn health_reports_connected_database(pool: PgPool) {
    let app = TestApp::offline(pool);

    let (status, body) = app.send(Method::GET, "/health", None, None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "connected");
}

#[sqlx::test(migrations = "./migrations")]
async fn register_returns_session_and_normalized_user(pool: PgPool) {
    let app = TestApp::offline(pool);

    let (status, body) = app
        .send(
            Method::POST,
            "/api/v1/auth/register",
            None,
            None,
            Some(json!({
                "email": "DJ@Example.COM",
                "password": PASSWORD,
                "display_name": "DJ Example",
                "role": "ARTIST",
            })),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["token"].as_str().unwrap().len(), 64);
    assert_eq!(body["user"]["email"], "dj@example.com");
    assert_eq!(body["user"]["role"], "ARTIST");
    assert!(body["user"].get("password_hash").is_none());
}

#[sqlx::test(migrations = "./migrations")]
async fn duplicate_email_is_a_conflict(pool: PgPool) {
    let app = TestApp::offline(pool);
    app.register("dup@example.com", "CREATOR").await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/v1/auth/register",
            None,
            None,
            Some(json!({
                "email": "DUP@example.com",
                "password": PASSWORD,
                "display_name": "Again",
                "role": "ARTIST",
            })),
        )
        .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "conflict");
}

#[sqlx::test(migrations = "./migrations")]
async fn admin_cannot_self_register(pool: PgPool) {
    let app = TestApp::offline(pool);

    let (status, body) = app
        .send(
            Method::POST,
            "/api/v1/auth/register",
            None,
            None,
            Some(json!({
                "email": "sneaky@example.com",
                "password": PASSWORD,
                "display_name": "Sneaky",
                "role": "ADMIN",
            })),
        )
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "forbidden");
}

#[sqlx::test(migrations = "./migrations")]
async fn invalid_registration_is_a_validation_error(pool: PgPool) {
    let app = TestApp::offline(pool);

    let (status, body) = app
        .send(
            Method::POST,
            "/api/v1/auth/register",
            None,
            None,
            Some(json!({
                "email": "not-an-email",
                "password": "short",
                "display_name": "X",
                "role": "CREATOR",
            })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "validation_error");
}

#[sqlx::test(migrations = "./migrations")]
async fn login_checks_password(pool: PgPool) {
    let app = TestApp::offline(pool);
    app.register("creator@example.com", "CREATOR").await;

    let (status, body) = app.login("Creator@Example.com", PASSWORD).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["email"], "creator@example.com");

    let (status, body) = app.login("creator@example.com", "wrong-password").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "invalid_credentials");

    let (status, body) = app.login("nobody@example.com", PASSWORD).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "invalid_credentials");
}

#[sqlx::test(migrations = "./migrations")]
async fn me_requires_a_valid_session(pool: PgPool) {
    let app = TestApp::offline(pool);
    let artist = app.register("artist@example.com", "ARTIST").await;

    let (status, _) = app.send(Method::GET, "/api/v1/me", None, None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .send(Method::GET, "/api/v1/me", Some("not-a-real-token"), None, None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app.get(&artist, "/api/v1/me").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], artist.user_id.as_str());
}

#[sqlx::test(migrations = "./migrations")]
async fn expired_sessions_are_rejected(pool: PgPool) {
    let app = TestApp::offline(pool);
    let artist = app.register("artist@example.com", "ARTIST").await;

    sqlx::query("UPDATE sessions SET expires_at = NOW() - INTERVAL '1 minute'")
        .execute(&app.pool)
        .await
        .unwrap();

    let (status, _) = app.get(&artist, "/api/v1/me").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "./migrations")]
async fn mutations_require_csrf_token(pool: PgPool) {
    let app = TestApp::offline(pool);
    let creator = app.register("creator@example.com", "CREATOR").await;
    let update = json!({ "display_name": "Renamed", "paypal_email": "pay@example.com" });

    let (status, body) = app
        .send(
            Method::PUT,
            "/api/v1/me",
            Some(&creator.token),
            None,
            Some(update.clone()),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "csrf_rejected");

    let (status, body) = app
        .send(
            Method::PUT,
            "/api/v1/me",
            Some(&creator.token),
            Some("garbage.token.value"),
            Some(update.clone()),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "csrf_rejected");

    let (status, body) = app.put(&creator, "/api/v1/me", update).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["display_name"], "Renamed");
    assert_eq!(body["paypal_email"], "pay@example.com");
}

#[sqlx::test(migrations = "./migrations")]
async fn csrf_token_is_bound_to_its_user(pool: PgPool) {
    let app = TestApp::offline(pool);
    let alice = app.register("alice@example.com", "CREATOR").await;
    let bob = app.register("bob@example.com", "CREATOR").await;

    let (status, body) = app
        .send(
            Method::PUT,
            "/api/v1/me",
            Some(&alice.token),
            Some(&bob.csrf),
            Some(json!({ "display_name": "Hijacked" })),
        )
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "csrf_rejected");
}

#[sqlx::test(migrations = "./migrations")]
async fn logout_ends_the_session(pool: PgPool) {
    let app = TestApp::offline(pool);
    let artist = app.register("artist@example.com", "ARTIST").await;

    let (status, body) = app.post(&artist, "/api/v1/auth/logout", json!({})).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_null());

    let (status, _) = app.get(&artist, "/api/v1/me").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "./migrations")]
async fn role_extractors_reject_wrong_roles(pool: PgPool) {
    let app = TestApp::offline(pool);
    let creator = app.register("creator@example.com", "CREATOR").await;
    let artist = app.register("artist@example.com", "ARTIST").await;

    let (status, _) = app
        .post(
            &creator,
            "/api/v1/campaigns",
            json!({ "title": "Nope", "budget_cents": 1000, "payout_per_submission_cents": 100 }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .post(
            &artist,
            "/api/v1/applications",
            json!({ "tiktok_handle": "artist", "follower_count": 10 }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.get(&artist, "/api/v1/admin/stats").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "./migrations")]
async fn bootstrap_admin_is_idempotent(pool: PgPool) {
    let app = TestApp::offline(pool);
    let admin = app.admin().await;
    // Second seeding must not fail or duplicate
    app.admin().await;

    let (status, body) = app.get(&admin, "/api/v1/me").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "ADMIN");

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = 'ADMIN'")
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn notification_to_unknown_user_is_skipped(pool: PgPool) {
    let mut config = test_config(None, None);
    config.smtp_host = Some("localhost".to_string());
    let mailer = Mailer::from_config(&config).unwrap().map(Arc::new);
    assert!(mailer.is_some());

    // Returns without an error and never renders the template
    let rendered = AtomicBool::new(false);
    auth_service::notify_user(&pool, mailer, uuid::Uuid::new_v4(), |display_name| {
        rendered.store(true, Ordering::SeqCst);
        EmailTemplate::PayoutPaid {
            display_name,
            amount_cents: 2500,
            currency: "USD".to_string(),
            paypal_reference: "5TY05013RG002845M".to_string(),
        }
    })
    .await;

    assert!(!rendered.load(Ordering::SeqCst));
}
