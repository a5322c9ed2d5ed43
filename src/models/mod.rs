//! Data models representing database entities.
//!
//! This module contains all data structures that map to database tables,
//! plus the request/response bodies that travel with them.

/// Creator applications to the platform or a campaign
pub mod application;
/// Artist campaigns
pub mod campaign;
/// PayPal funding payments
pub mod payment;
/// Creator payouts
pub mod payout;
/// Creator content submissions
pub mod submission;
/// Users and sessions
pub mod user;
