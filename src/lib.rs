//! Speech synthesis service: users, token balances, transactions and queued
//! audio generation behind a REST API.

pub mod app;
pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod ledger;
pub mod middleware;
pub mod models;
pub mod runner;
pub mod services;
pub mod store;
pub mod worker;
