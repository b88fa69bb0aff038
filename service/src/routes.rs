//! Router configuration.

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{achievements, coins, health, missions, ranks, submissions};
use crate::state::AppState;

/// Maximum concurrent requests for the submission endpoint, which takes
/// the store's write lock per settle.
const SUBMIT_MAX_CONCURRENT_REQUESTS: usize = 100;

/// Maximum concurrent requests for general API endpoints.
const API_MAX_CONCURRENT_REQUESTS: usize = 50;

/// Create the service router with all routes and middleware.
///
/// # Routes
///
/// ## Public
/// - `GET /health` - Health check
///
/// ## Submissions (Service API Key auth)
/// - `POST /v1/exercises/:exercise_id/submit` - Settle a submission
///
/// ## Coins (JWT auth)
/// - `GET /v1/coins/balance` - Balance and progression summary
/// - `GET /v1/coins/transactions` - Ledger history
/// - `POST /v1/coins/spend` - Spend coins
/// - `POST /v1/coins/earn` - Admin grant (admin key)
///
/// ## Ranks
/// - `GET /v1/ranks/me` - Current rank and promotion progress (JWT)
/// - `GET /v1/ranks/user/:user_id` - Any learner's rank (service key)
/// - `POST /v1/ranks/promote` - Promote one rank up (JWT)
///
/// ## Missions
/// - `GET /v1/missions/:mission_type` - Period missions, lazily generated (JWT)
/// - `POST /v1/missions/:mission_id/claim` - Claim rewards (JWT)
/// - `POST /v1/missions/check` - Report an external action (service key)
///
/// ## Achievements
/// - `GET /v1/achievements` - Catalog with unlock state (JWT)
/// - `POST /v1/achievements/unlock` - Grant directly (service key)
pub fn create_router(state: AppState) -> Router {
    let cors_origins = state.config.cors_origins.clone();
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout_seconds = state.config.request_timeout_seconds;

    let cors = build_cors_layer(&cors_origins);

    let state = Arc::new(state);

    let submit_routes = Router::new()
        .route("/exercises/:exercise_id/submit", post(submissions::submit))
        .layer(ConcurrencyLimitLayer::new(SUBMIT_MAX_CONCURRENT_REQUESTS));

    let api_routes = Router::new()
        // Coins
        .route("/coins/balance", get(coins::get_balance))
        .route("/coins/transactions", get(coins::list_transactions))
        .route("/coins/spend", post(coins::spend))
        .route("/coins/earn", post(coins::grant))
        // Ranks
        .route("/ranks/me", get(ranks::get_my_rank))
        .route("/ranks/user/:user_id", get(ranks::get_user_rank))
        .route("/ranks/promote", post(ranks::promote))
        // Missions
        .route("/missions/check", post(missions::report_action))
        .route("/missions/:mission_type", get(missions::list_missions))
        .route("/missions/:mission_id/claim", post(missions::claim))
        // Achievements
        .route("/achievements", get(achievements::list_achievements))
        .route("/achievements/unlock", post(achievements::unlock))
        .layer(ConcurrencyLimitLayer::new(API_MAX_CONCURRENT_REQUESTS));

    Router::new()
        .route("/health", get(health::health))
        .nest("/v1", api_routes.merge(submit_routes))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(
            request_timeout_seconds,
        )))
        .with_state(state)
}

/// Build the CORS layer from configured origins.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
