//! Health check handlers

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use core_kernel::{AdapterHealth, HealthCheckResult, HealthCheckable};

use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: AdapterHealth,
    pub version: String,
    pub components: Vec<HealthCheckResult>,
}

/// Worst status across components
fn overall(components: &[HealthCheckResult]) -> AdapterHealth {
    components
        .iter()
        .map(|c| c.status)
        .fold(AdapterHealth::Healthy, |acc, status| match (acc, status) {
            (AdapterHealth::Unhealthy, _) | (_, AdapterHealth::Unhealthy) => AdapterHealth::Unhealthy,
            (AdapterHealth::Degraded, _) | (_, AdapterHealth::Degraded) => AdapterHealth::Degraded,
            _ => AdapterHealth::Healthy,
        })
}

/// Health check endpoint
///
/// A degraded service (fallback schema in use) still answers 200.
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let components = vec![
        state.records.health_check().await,
        state.codec.schemas().health_check().await,
    ];
    let status = overall(&components);
    let code = if status == AdapterHealth::Unhealthy {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };

    (
        code,
        Json(HealthResponse {
            status,
            version: env!("CARGO_PKG_VERSION").to_string(),
            components,
        }),
    )
}
