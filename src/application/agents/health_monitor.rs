//! Health Monitor: freshness and integrity of every worker's output plus
//! exchange reachability, folded into one aggregate status.

use crate::application::runner::RunOutcome;
use crate::config::Config;
use crate::config::storage_config::{HEALTH_REPORT_FILE, HEALTH_STATE_FILE};
use crate::domain::health::{HealthState, HealthStatus, ModuleSpec, build_report, classify_module};
use crate::domain::ports::ExchangeClient;
use crate::infrastructure::binance::BinanceMarketDataService;
use crate::infrastructure::persistence::JsonFileStore;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

pub const WORKER: &str = "health_monitor";
pub const STALE_LOCK_AFTER: Duration = Duration::from_secs(10 * 60);

pub struct HealthMonitor {
    exchange: Arc<dyn ExchangeClient>,
    store: JsonFileStore,
    modules: Vec<ModuleSpec>,
}

impl HealthMonitor {
    pub fn new(exchange: Arc<dyn ExchangeClient>, store: JsonFileStore, modules: Vec<ModuleSpec>) -> Self {
        Self {
            exchange,
            store,
            modules,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let exchange = BinanceMarketDataService::builder()
            .base_url(config.upstream.binance.base_url.clone())
            .ping_timeout(config.upstream.binance.ping_timeout)
            .build();
        Self::new(
            Arc::new(exchange),
            JsonFileStore::new(config.storage.state_dir()),
            config.health.modules.clone(),
        )
    }

    pub async fn run(&self) -> Result<RunOutcome> {
        self.run_at(Utc::now()).await
    }

    pub async fn run_at(&self, now: DateTime<Utc>) -> Result<RunOutcome> {
        let mut state: HealthState = self.store.load_or_default(HEALTH_STATE_FILE);

        let modules: BTreeMap<String, _> = self
            .modules
            .iter()
            .map(|spec| {
                let probe = self.store.probe(&spec.file_name);
                (spec.name.clone(), classify_module(spec, &probe, now))
            })
            .collect();

        let ping_ok = match self.exchange.ping().await {
            Ok(()) => true,
            Err(e) => {
                debug!("Health: exchange ping failed: {:#}", e);
                false
            }
        };
        state.record_ping(ping_ok);

        let report = build_report(now, modules, &state, ping_ok);
        self.store
            .save(HEALTH_STATE_FILE, &state)
            .context("Failed to write health state")?;
        self.store
            .save(HEALTH_REPORT_FILE, &report)
            .context("Failed to write health report")?;

        if report.status != HealthStatus::Healthy {
            warn!(
                "Pipeline {:?}: {}",
                report.status,
                report.alerts.join("; ")
            );
        }

        Ok(RunOutcome::completed(format!(
            "{:?}, {} unhealthy module(s)",
            report.status, report.stale_count
        )))
    }
}
