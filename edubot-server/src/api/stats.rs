//! Monitoring handlers: service stats, caller quota, credential pool

use axum::{extract::State, http::HeaderMap, response::Json};
use chrono::{DateTime, Utc};
use serde::Serialize;

use edubot_types::{GateStats, QuotaOverview, QuotaStatus};

use super::identity;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub api_status: &'static str,
    pub gate: GateStats,
    pub quota: QuotaOverview,
    pub total_keys: usize,
    pub models: Vec<String>,
    pub interactions_buffered: usize,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    pub in_flight: usize,
    pub capacity: usize,
}

#[derive(Debug, Serialize)]
pub struct KeysStatusResponse {
    pub total_keys: usize,
    pub available_keys: usize,
    pub available_key_endings: Vec<String>,
    pub current_models: Vec<String>,
    pub max_attempts: u32,
}

pub async fn get_stats(State(state): State<AppState>) -> Json<StatsResponse> {
    let pool = state.dispatcher().pool_status();
    Json(StatsResponse {
        api_status: "active",
        gate: state.dispatcher().gate().stats(),
        quota: state.quota().overview(),
        total_keys: pool.total_keys,
        models: pool.models,
        interactions_buffered: state.monitor().len().await,
    })
}

pub async fn get_health(State(state): State<AppState>) -> Json<HealthResponse> {
    let gate = state.dispatcher().gate();
    Json(HealthResponse {
        status: "healthy",
        timestamp: Utc::now(),
        in_flight: gate.in_flight(),
        capacity: gate.capacity(),
    })
}

/// Admission gate counters.
pub async fn get_queue_stats(State(state): State<AppState>) -> Json<GateStats> {
    Json(state.dispatcher().gate().stats())
}

/// The caller's own quota.
pub async fn get_quota(State(state): State<AppState>, headers: HeaderMap) -> Json<QuotaStatus> {
    Json(state.quota().status(&identity(&headers)))
}

/// Credential pool overview. Only key tails are exposed.
pub async fn get_keys_status(State(state): State<AppState>) -> Json<KeysStatusResponse> {
    let pool = state.dispatcher().pool_status();
    Json(KeysStatusResponse {
        total_keys: pool.total_keys,
        available_keys: pool.total_keys,
        available_key_endings: pool.key_endings.iter().map(|tail| format!("...{tail}")).collect(),
        current_models: pool.models,
        max_attempts: pool.max_attempts,
    })
}
