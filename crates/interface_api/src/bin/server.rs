//! TISS Codec - API Server Binary
//!
//! # Usage
//!
//! ```bash
//! # Run with default configuration
//! cargo run --bin tiss-api
//!
//! # Seed claim records and point the schema cache elsewhere
//! TISS_RECORDS_PATH=records.json TISS_SCHEMA_CACHE_DIR=/var/cache/tiss cargo run --bin tiss-api
//! ```
//!
//! # Environment Variables
//!
//! * `TISS_HOST` / `TISS_PORT` - Bind address (default: 0.0.0.0:8080)
//! * `TISS_LOG_LEVEL` - Log level when `RUST_LOG` is unset (default: info)
//! * `TISS_RECORDS_PATH` - JSON snapshot of claims, patients, providers and plans
//! * `TISS_OPERATOR_CODE` / `TISS_OPERATOR_ANS_REGISTRATION` - Operator identity
//! * `TISS_SCHEMA_URL` - Official schema location; empty disables downloads
//! * `TISS_VALIDATE_WITH_FALLBACK` - Enforce the fallback schema too

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use domain_claims::{ClaimBundleAssembler, ClaimRecordsPort, InMemoryClaimRecords};
use domain_tiss::{DocumentValidator, SchemaProvider, TissCodec, TissEncoder};
use infra_schema::SchemaProvisioner;
use interface_api::{config::ApiConfig, create_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (useful for local development)
    dotenvy::dotenv().ok();

    let config = ApiConfig::from_env().context("invalid TISS_* configuration")?;

    init_tracing(&config.log_level);

    tracing::info!(
        host = %config.host,
        port = %config.port,
        "Starting TISS API Server"
    );

    let records = load_records(&config).await?;

    let provisioner = Arc::new(
        SchemaProvisioner::new(config.provisioner_config())
            .context("failed to build schema HTTP client")?,
    );
    warm_up_schema(Arc::clone(&provisioner));

    let assembler = ClaimBundleAssembler::new(Arc::clone(&records), config.operator());
    let codec = TissCodec::new(assembler, provisioner)
        .with_encoder(TissEncoder::new(config.encoder_options()))
        .with_validator(DocumentValidator::new(config.validation_options()));

    let app = create_router(AppState::new(codec, records));

    let addr: SocketAddr = config
        .server_addr()
        .parse()
        .with_context(|| format!("invalid bind address {}", config.server_addr()))?;

    tracing::info!(%addr, "Server listening");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Initializes the tracing subscriber; `RUST_LOG` wins over the configured level
fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

async fn load_records(config: &ApiConfig) -> anyhow::Result<Arc<dyn ClaimRecordsPort>> {
    let records = match &config.records_path {
        Some(path) => InMemoryClaimRecords::from_json_file(path)
            .with_context(|| format!("failed to load records from {}", path.display()))?,
        None => {
            tracing::warn!("TISS_RECORDS_PATH not set, starting with an empty record store");
            InMemoryClaimRecords::new()
        }
    };
    tracing::info!(claims = records.claim_count().await, "Claim records loaded");
    Ok(Arc::new(records))
}

/// Acquires the schema in the background so the first request does not pay for it
fn warm_up_schema(provisioner: Arc<SchemaProvisioner>) {
    tokio::spawn(async move {
        let handle = provisioner.get_schema().await;
        tracing::info!(
            source_kind = %handle.source_kind,
            version = %handle.version,
            "Schema ready"
        );
    });
}

/// Waits for Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
