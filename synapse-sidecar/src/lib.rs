//! HTTP surface for the rate limiter / circuit breaker sidecar (C7), grounded
//! on `privstack-relay`'s `build_router`/`State` split: a plain router
//! constructor the binary wires up, testable without a running server.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};

use synapse_core::config::ResilienceConfig;
use synapse_core::SynapseError;
use synapse_observability::{HealthChecker, HealthReport, HealthSnapshot, MetricsCollector};
use synapse_resilience::{RateLimiter, ResourceStats};

/// Shared state behind every route: the limiter itself plus the config it
/// was last built from, so `/config` can report what's live and rebuild the
/// limiter from an overlay.
pub struct AppState {
    limiter: RwLock<RateLimiter>,
    config: RwLock<ResilienceConfig>,
    metrics: Arc<MetricsCollector>,
}

impl AppState {
    pub fn new(config: ResilienceConfig, metrics: Arc<MetricsCollector>) -> Self {
        Self {
            limiter: RwLock::new(RateLimiter::new(config.clone())),
            config: RwLock::new(config),
            metrics,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CheckRequest {
    pub resource: String,
    pub client_id: String,
}

#[derive(Debug, Serialize)]
pub struct CheckResponse {
    pub allowed: bool,
    pub stats: Option<ResourceStats>,
    pub retry_after_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct RecordRequest {
    pub resource: String,
    pub success: bool,
}

#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    pub resource: String,
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/check", post(check))
        .route("/record", post(record))
        .route("/stats", get(stats))
        .route("/config", post(update_config))
        .route("/healthz", get(healthz))
        .with_state(state)
}

#[instrument(skip(state))]
async fn check(State(state): State<Arc<AppState>>, Json(req): Json<CheckRequest>) -> (StatusCode, Json<CheckResponse>) {
    let limiter = state.limiter.read();
    match limiter.check(&req.resource, &req.client_id) {
        Ok(()) => (
            StatusCode::OK,
            Json(CheckResponse { allowed: true, stats: limiter.stats(&req.resource), retry_after_ms: None }),
        ),
        Err(SynapseError::RateLimited { retry_after, .. }) => (
            StatusCode::TOO_MANY_REQUESTS,
            Json(CheckResponse {
                allowed: false,
                stats: limiter.stats(&req.resource),
                retry_after_ms: Some(retry_after.as_millis() as u64),
            }),
        ),
        Err(err) => {
            warn!(error = %err, "unexpected error from rate limiter check");
            (StatusCode::INTERNAL_SERVER_ERROR, Json(CheckResponse { allowed: false, stats: None, retry_after_ms: None }))
        }
    }
}

#[instrument(skip(state))]
async fn record(State(state): State<Arc<AppState>>, Json(req): Json<RecordRequest>) -> StatusCode {
    state.limiter.read().record(&req.resource, req.success);
    StatusCode::NO_CONTENT
}

#[instrument(skip(state))]
async fn stats(State(state): State<Arc<AppState>>, Query(query): Query<StatsQuery>) -> (StatusCode, Json<Option<ResourceStats>>) {
    match state.limiter.read().stats(&query.resource) {
        Some(stats) => (StatusCode::OK, Json(Some(stats))),
        None => (StatusCode::NOT_FOUND, Json(None)),
    }
}

/// Replaces the live `ResilienceConfig` wholesale, rebuilding the limiter
/// from it — every resource's token bucket/window/breaker starts fresh.
/// Missing fields in the request body fall back to `ResilienceConfig`'s
/// defaults, not the previously live values, since the config type is
/// `#[serde(default)]`.
#[instrument(skip(state))]
async fn update_config(State(state): State<Arc<AppState>>, Json(new_config): Json<ResilienceConfig>) -> (StatusCode, Json<ResilienceConfig>) {
    *state.limiter.write() = RateLimiter::new(new_config.clone());
    *state.config.write() = new_config.clone();
    (StatusCode::OK, Json(new_config))
}

async fn healthz(State(state): State<Arc<AppState>>) -> Json<HealthReport> {
    let snapshot = HealthSnapshot { backend_connected: true, ..Default::default() };
    let _ = &state.metrics;
    Json(HealthReport::build(&HealthChecker::new(), &snapshot))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> Arc<AppState> {
        Arc::new(AppState::new(
            ResilienceConfig { burst_size: 1, requests_per_second: 1.0, ..ResilienceConfig::default() },
            Arc::new(MetricsCollector::new()),
        ))
    }

    #[tokio::test]
    async fn check_allows_then_denies_once_bucket_is_exhausted() {
        let state = state();
        let req = CheckRequest { resource: "gossip".to_string(), client_id: "c1".to_string() };
        let (status, _) = check(State(state.clone()), Json(req)).await;
        assert_eq!(status, StatusCode::OK);

        let req = CheckRequest { resource: "gossip".to_string(), client_id: "c1".to_string() };
        let (status, body) = check(State(state), Json(req)).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert!(!body.0.allowed);
    }

    #[tokio::test]
    async fn stats_for_unseen_resource_is_not_found() {
        let state = state();
        let (status, _) = stats(State(state), Query(StatsQuery { resource: "unknown".to_string() })).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn record_then_breaker_opens_after_failure_threshold() {
        let state = Arc::new(AppState::new(
            ResilienceConfig { failure_threshold: 2, ..ResilienceConfig::default() },
            Arc::new(MetricsCollector::new()),
        ));
        for _ in 0..2 {
            record(State(state.clone()), Json(RecordRequest { resource: "backend".to_string(), success: false })).await;
        }
        let (status, body) = check(
            State(state),
            Json(CheckRequest { resource: "backend".to_string(), client_id: "c1".to_string() }),
        )
        .await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body.0.stats.as_ref().unwrap().breaker_state, "open");
    }

    #[tokio::test]
    async fn config_replaces_live_limiter() {
        let state = state();
        let (status, _) =
            update_config(State(state.clone()), Json(ResilienceConfig { burst_size: 99, ..ResilienceConfig::default() })).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(state.config.read().burst_size, 99);
    }
}
