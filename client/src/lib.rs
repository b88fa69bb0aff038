//! ML Rewards Client SDK.
//!
//! This crate provides a client library for platform services to interact
//! with the rewards API: submitting graded exercises, reporting learner
//! actions, and granting achievements.
//!
//! # Example
//!
//! ```no_run
//! use ml_rewards_client::{ActionReport, ClientOptions, MlRewardsClient};
//! use ml_rewards_core::{ActionType, UserId};
//!
//! # async fn example() -> Result<(), ml_rewards_client::ClientError> {
//! let client = MlRewardsClient::with_options(
//!     "http://ml-rewards.learning.svc:8080",
//!     "your-service-api-key",
//!     ClientOptions::with_service_name("course-runner"),
//! );
//!
//! // Report that a learner finished a course module.
//! let response = client
//!     .report_action(ActionReport {
//!         user_id: UserId::generate(),
//!         action_type: ActionType::CompleteModules,
//!         amount: 1,
//!     })
//!     .await?;
//!
//! println!("completed missions: {:?}", response.completed_missions);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod client;
mod error;
mod types;

pub use client::{ClientOptions, MlRewardsClient};
pub use error::ClientError;
pub use types::*;
