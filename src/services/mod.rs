//! Business logic services.
//!
//! Services hold the marketplace rules and all SQL, separated from HTTP
//! handlers. Multi-step changes that move money run in one transaction.

pub mod application_service;
pub mod auth_service;
pub mod campaign_service;
pub mod payment_service;
pub mod payout_service;
pub mod submission_service;
