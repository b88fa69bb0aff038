//! The reward engine: everything between an HTTP handler and the store.
//!
//! Handlers stay thin; the engine owns the submission pipeline, mission
//! generation, rank checks, achievement evaluation, and the scheduled
//! background jobs. Side effects past the atomic settle (mission
//! progress, achievements, promotions, notifications) are isolated from
//! each other: one failing never rolls back the settle or blocks the
//! others.

pub mod achievements;
pub mod events;
pub mod jobs;
pub mod orchestrator;
pub mod quests;
pub mod ranks;
