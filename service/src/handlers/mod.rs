//! HTTP request handlers.

#![allow(clippy::cast_precision_loss)]

pub mod achievements;
pub mod coins;
pub mod health;
pub mod missions;
pub mod ranks;
pub mod submissions;
