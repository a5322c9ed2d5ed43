//! HTTP request handlers (route handlers).
//!
//! Handlers extract request data, check the caller's role, call into
//! `services`, and shape the JSON response. They hold no SQL.

pub mod applications;
pub mod auth;
pub mod campaigns;
pub mod health;
pub mod payments;
pub mod payouts;
pub mod spotify;
pub mod submissions;
