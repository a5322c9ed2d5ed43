//! CreatorAmp backend.
//!
//! A REST API connecting music artists, who fund promotion campaigns, with
//! TikTok creators, who apply to campaigns and submit content. Artists fund
//! campaigns through PayPal checkout, approved submissions become creator
//! payouts, and admins review applications and settle payouts.
//!
//! # Architecture
//!
//! - **Web Framework**: Axum (async HTTP server)
//! - **Database**: PostgreSQL with sqlx (async queries, embedded migrations)
//! - **Authentication**: opaque session tokens stored as SHA-256 hashes, plus
//!   HMAC-signed CSRF tokens on mutating requests
//! - **Integrations**: PayPal Orders v2, Spotify Web API, SMTP email

pub mod clients;
pub mod config;
pub mod db;
pub mod email;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod router;
pub mod services;
pub mod state;
