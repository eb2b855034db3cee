//! Common test utilities and helpers
//!
//! - snapshot and event fixtures
//! - a one-shot HTTP responder for exercising the reqwest clients

pub mod fixtures;
pub mod http;
