//! HTTP API Layer
//!
//! This crate exposes the TISS codec over HTTP using Axum.
//!
//! # Architecture
//!
//! - **Handlers**: document generation, download, validation, schema info, health
//! - **Middleware**: request ids, tracing, audit logging
//! - **DTOs**: Response data transfer objects
//! - **Error Handling**: Consistent error responses
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::{create_router, AppState};
//!
//! let app = create_router(AppState::new(codec, records));
//! axum::serve(listener, app).await?;
//! ```

pub mod config;
pub mod error;
pub mod middleware;
pub mod handlers;
pub mod dto;

use std::sync::Arc;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use domain_claims::ClaimRecordsPort;
use domain_tiss::TissCodec;

use crate::handlers::{health, tiss};
use crate::middleware::audit_middleware;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub codec: Arc<TissCodec>,
    pub records: Arc<dyn ClaimRecordsPort>,
}

impl AppState {
    pub fn new(codec: TissCodec, records: Arc<dyn ClaimRecordsPort>) -> Self {
        Self {
            codec: Arc::new(codec),
            records,
        }
    }
}

/// Creates the main API router
pub fn create_router(state: AppState) -> Router {
    let public_routes = Router::new().route("/health", get(health::health_check));

    let api_routes = Router::new()
        .route("/claims/:id/tiss", get(tiss::generate))
        .route("/claims/:id/tiss/download", get(tiss::download))
        .route("/tiss/validate", post(tiss::validate))
        .route("/tiss/schema", get(tiss::schema_info))
        .layer(axum_middleware::from_fn(audit_middleware));

    Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
