//! # Api Adapters
//!
//! Inbound adapters of Rusty-Gallery: the axum web surface (`web-axum`) and
//! the metrics it exposes.

pub mod metrics;
#[cfg(feature = "web-axum")]
pub mod web;

pub use metrics::Metrics;
#[cfg(feature = "web-axum")]
pub use web::{router, AppState};
