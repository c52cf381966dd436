//! Schema Provisioner
//!
//! Process-wide source of the current [`SchemaHandle`]. The handle is
//! immutable and replaced wholesale through an atomic pointer swap, so readers
//! never block and never see a partially built handle.
//!
//! Re-acquisition is single-flight: callers that find the cache stale queue on
//! a gate, and whoever gets through first does the work while the rest pick up
//! its result.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use arc_swap::ArcSwapOption;
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};

use core_kernel::{AdapterHealth, DomainPort, HealthCheckResult, HealthCheckable};
use domain_tiss::{render_fallback_xsd, SchemaHandle, SchemaProvider};

use crate::cache;
use crate::config::SchemaProvisionerConfig;
use crate::error::ProvisionerError;
use crate::fetch::SchemaFetcher;

#[derive(Debug, Clone)]
struct CachedHandle {
    handle: Arc<SchemaHandle>,
    loaded_at: Instant,
}

impl CachedHandle {
    fn is_fresh(&self, config: &SchemaProvisionerConfig) -> bool {
        let ttl = if self.handle.is_official() {
            config.ttl
        } else {
            config.fallback_ttl
        };
        self.loaded_at.elapsed() < ttl
    }
}

/// Where an acquisition may look for the official schema
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CachePolicy {
    /// A fresh cache file is used without touching the network
    PreferDisk,
    /// Always try the network first
    ForceRemote,
}

#[derive(Debug)]
pub struct SchemaProvisioner {
    config: SchemaProvisionerConfig,
    fetcher: SchemaFetcher,
    current: ArcSwapOption<CachedHandle>,
    refresh_gate: Mutex<()>,
}

impl SchemaProvisioner {
    pub fn new(config: SchemaProvisionerConfig) -> Result<Self, ProvisionerError> {
        let fetcher = SchemaFetcher::new(&config)?;
        Ok(Self {
            config,
            fetcher,
            current: ArcSwapOption::empty(),
            refresh_gate: Mutex::new(()),
        })
    }

    pub fn config(&self) -> &SchemaProvisionerConfig {
        &self.config
    }

    /// Handle currently cached, fresh or not, without triggering acquisition
    pub fn current(&self) -> Option<Arc<SchemaHandle>> {
        self.current
            .load_full()
            .map(|cached| Arc::clone(&cached.handle))
    }

    fn fresh(&self) -> Option<Arc<SchemaHandle>> {
        self.current
            .load_full()
            .filter(|cached| cached.is_fresh(&self.config))
            .map(|cached| Arc::clone(&cached.handle))
    }

    /// Forces a new acquisition from the remote source and replaces the handle
    pub async fn refresh(&self) -> Arc<SchemaHandle> {
        let _gate = self.refresh_gate.lock().await;
        self.acquire_and_store(CachePolicy::ForceRemote).await
    }

    async fn acquire_and_store(&self, policy: CachePolicy) -> Arc<SchemaHandle> {
        let handle = Arc::new(self.acquire(policy).await);
        self.current.store(Some(Arc::new(CachedHandle {
            handle: Arc::clone(&handle),
            loaded_at: Instant::now(),
        })));
        handle
    }

    #[instrument(skip(self), fields(url = %self.fetcher.url(), version = %self.config.version))]
    async fn acquire(&self, policy: CachePolicy) -> SchemaHandle {
        let started = Instant::now();
        let cache_path = self.config.official_cache_path();
        let cached = cache::read(&cache_path).await;

        if policy == CachePolicy::PreferDisk {
            if let Some(cached) = cached.as_ref().filter(|c| c.is_fresh(self.config.ttl)) {
                let location = Some(cache_path.clone());
                if let Some(handle) = self.official_from_text(&cached.text, location, "cache") {
                    info!(source_kind = "official", origin = "cache", "Schema loaded");
                    return handle;
                }
            }
        }

        match self.fetcher.fetch().await {
            Ok(text) => {
                if let Some(mut handle) = self.official_from_text(&text, None, "remote") {
                    if cache::write(&cache_path, &text).await {
                        handle.location = Some(cache_path);
                    }
                    info!(
                        source_kind = "official",
                        origin = "remote",
                        duration_ms = started.elapsed().as_millis() as u64,
                        "Schema loaded"
                    );
                    return handle;
                }
            }
            Err(e) => warn!(error = %e, "Official schema unavailable"),
        }

        if let Some(cached) = cached {
            let location = Some(cache_path);
            if let Some(handle) = self.official_from_text(&cached.text, location, "stale cache") {
                warn!(age_secs = cached.age.as_secs(), "Serving stale cached schema");
                return handle;
            }
        }

        self.fallback().await
    }

    fn official_from_text(
        &self,
        text: &str,
        location: Option<PathBuf>,
        origin: &'static str,
    ) -> Option<SchemaHandle> {
        match SchemaHandle::official(self.config.version.clone(), text, location, Utc::now()) {
            Ok(handle) => Some(handle),
            Err(e) => {
                warn!(origin, error = %e, "Schema text does not compile");
                None
            }
        }
    }

    async fn fallback(&self) -> SchemaHandle {
        let path = self.config.fallback_cache_path();
        let written = cache::write(&path, &render_fallback_xsd()).await;
        let handle = SchemaHandle::fallback(written.then_some(path), Utc::now());
        warn!(
            source_kind = "fallback",
            version = %handle.version,
            "Using synthesized fallback schema"
        );
        handle
    }
}

impl DomainPort for SchemaProvisioner {}

#[async_trait]
impl HealthCheckable for SchemaProvisioner {
    async fn health_check(&self) -> HealthCheckResult {
        let (status, message) = match self.current() {
            Some(handle) if handle.is_official() => (
                AdapterHealth::Healthy,
                format!("official schema {}", handle.version),
            ),
            Some(handle) => (
                AdapterHealth::Degraded,
                format!("fallback schema {} in use", handle.version),
            ),
            None => (AdapterHealth::Healthy, "schema not loaded yet".to_string()),
        };
        HealthCheckResult {
            adapter_id: "schema-provisioner".to_string(),
            status,
            message: Some(message),
            checked_at: Utc::now(),
        }
    }
}

#[async_trait]
impl SchemaProvider for SchemaProvisioner {
    async fn get_schema(&self) -> Arc<SchemaHandle> {
        if let Some(handle) = self.fresh() {
            return handle;
        }
        let _gate = self.refresh_gate.lock().await;
        // another caller may have refreshed while this one waited
        if let Some(handle) = self.fresh() {
            return handle;
        }
        self.acquire_and_store(CachePolicy::PreferDisk).await
    }
}
