//! Business logic services.
//!
//! Services contain core business logic separated from HTTP handlers.
//! They validate input, talk to the store and log what happened.

pub mod auth_service;
pub mod exchange_service;
pub mod generation_service;
pub mod transaction_service;
pub mod user_service;
