//! ML Rewards HTTP API Service.
//!
//! This crate provides the HTTP API for the reward and progression
//! engine, including:
//!
//! - Exercise submission settlement
//! - ML Coin balance, ledger, and spending
//! - Rank progression and promotions
//! - Daily/weekly missions and claims
//! - Achievements
//!
//! # Authentication
//!
//! The service supports three authentication methods:
//!
//! 1. **JWT tokens** - For learner requests (app, dashboard)
//! 2. **Service API keys** - For service-to-service requests (exercise
//!    runner, content platform)
//! 3. **Admin API keys** - For privileged endpoints (manual grants)

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Allow some pedantic lints that are noisy for Axum handler functions
#![allow(clippy::missing_errors_doc)] // Axum handlers all return Result
#![allow(clippy::unused_async)] // Handlers need async for routing consistency

pub mod auth;
pub mod config;
pub mod engine;
pub mod error;
pub mod handlers;
pub mod notify;
pub mod routes;
pub mod state;

pub use config::ServiceConfig;
pub use error::ApiError;
pub use notify::{LogNotifier, Notify, OutboundEvent, WebhookNotifier};
pub use routes::create_router;
pub use state::AppState;
