//! HTTP request handlers.

pub mod health;

pub use health::{Readiness, health_check, readiness};
