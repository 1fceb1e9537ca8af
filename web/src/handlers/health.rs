//! Health check endpoints.
//!
//! Used by load balancers and monitoring. The cache is fail-open, so an
//! unreachable cache reports `degraded` but still answers 200.

use axum::{Json, extract::State, http::StatusCode};
use hydra_booking::HydraApp;
use hydra_cache::KeyValueStore;
use hydra_core::{BookingRepository, CustomerRepository, VenueRepository};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Liveness probe. Does not touch any backend.
///
/// ```text
/// GET /health
/// ```
#[allow(clippy::unused_async)]
pub async fn health_check() -> (StatusCode, &'static str) {
    (StatusCode::OK, "ok")
}

/// Readiness report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Readiness {
    /// `ok` or `degraded`
    pub status: String,
    /// Whether the cache backend answered a ping
    pub cache: bool,
}

/// Readiness probe: pings the cache backend.
///
/// ```text
/// GET /health/ready
/// ```
pub async fn readiness<R, S>(State(app): State<Arc<HydraApp<R, S>>>) -> (StatusCode, Json<Readiness>)
where
    R: VenueRepository + CustomerRepository + BookingRepository + Clone,
    S: KeyValueStore + Clone,
{
    let cache = app.cache_healthy().await;
    if !cache {
        tracing::warn!("Cache backend unreachable, serving from storage");
    }

    let status = if cache { "ok" } else { "degraded" };
    (
        StatusCode::OK,
        Json(Readiness {
            status: status.to_string(),
            cache,
        }),
    )
}
