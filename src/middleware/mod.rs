//! HTTP middleware components.
//!
//! Middleware run before route handlers. They authenticate requests,
//! enforce CSRF protection, and short-circuit anything unauthorized.

/// Session authentication middleware and role extractors
pub mod auth;
/// CSRF token signing and enforcement
pub mod csrf;
