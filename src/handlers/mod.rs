//! HTTP request handlers (route handlers).
//!
//! Each handler is an async function that:
//! 1. Receives HTTP request data (JSON body, form, query, URL params)
//! 2. Delegates to a service
//! 3. Returns HTTP response (JSON, status code)

/// Exchange rate endpoints
pub mod exchange;
/// Speech generation endpoints
pub mod generations;
/// Service health
pub mod health;
/// Transaction endpoints
pub mod transactions;
/// Registration, login and profile endpoints
pub mod users;
