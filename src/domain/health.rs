//! Freshness/integrity classification of worker snapshots and the
//! aggregate pipeline status derived from it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const CRITICAL_API_FAILURES: u32 = 3;
pub const CRITICAL_UNHEALTHY_MODULES: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleStatus {
    Ok,
    Missing,
    Corrupt,
    Stale,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleHealth {
    pub status: ModuleStatus,
    pub last_run: Option<DateTime<Utc>>,
    pub age_minutes: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiStatus {
    Ok,
    Down,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    pub binance: ApiStatus,
    pub consecutive_failures: u32,
}

/// Health monitor output written to `health.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub timestamp: DateTime<Utc>,
    pub status: HealthStatus,
    pub modules: BTreeMap<String, ModuleHealth>,
    pub api: ApiHealth,
    pub stale_count: usize,
    pub alerts: Vec<String>,
}

/// Persisted between health runs in `health-state.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HealthState {
    pub consecutive_failures: u32,
}

impl HealthState {
    pub fn record_ping(&mut self, ok: bool) {
        if ok {
            self.consecutive_failures = 0;
        } else {
            self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        }
    }
}

/// A monitored worker output.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleSpec {
    pub name: String,
    pub file_name: String,
    pub max_age_minutes: i64,
    /// The file only exists when the worker had something to report.
    pub alert_only: bool,
}

/// What the health monitor found when it looked at a snapshot file.
#[derive(Debug, Clone, PartialEq)]
pub enum SnapshotProbe {
    Absent,
    Corrupt(String),
    Readable { last_run: Option<DateTime<Utc>> },
}

/// Cascading check: absent -> corrupt -> stale -> ok.
pub fn classify_module(spec: &ModuleSpec, probe: &SnapshotProbe, now: DateTime<Utc>) -> ModuleHealth {
    match probe {
        SnapshotProbe::Absent if spec.alert_only => ModuleHealth {
            status: ModuleStatus::Ok,
            last_run: None,
            age_minutes: None,
            note: Some("no alerts written".to_string()),
        },
        SnapshotProbe::Absent => ModuleHealth {
            status: ModuleStatus::Missing,
            last_run: None,
            age_minutes: None,
            note: None,
        },
        SnapshotProbe::Corrupt(reason) => ModuleHealth {
            status: ModuleStatus::Corrupt,
            last_run: None,
            age_minutes: None,
            note: Some(reason.clone()),
        },
        SnapshotProbe::Readable { last_run } => {
            let age_minutes = last_run.map(|t| (now - t).num_minutes());
            let stale = age_minutes.is_none_or(|age| age > spec.max_age_minutes);
            let (status, note) = match (stale, spec.alert_only) {
                (false, _) => (ModuleStatus::Ok, None),
                (true, true) => (ModuleStatus::Ok, Some("no recent alerts".to_string())),
                (true, false) => (
                    ModuleStatus::Stale,
                    Some(format!("older than {}m", spec.max_age_minutes)),
                ),
            };
            ModuleHealth {
                status,
                last_run: *last_run,
                age_minutes,
                note,
            }
        }
    }
}

/// Aggregate status from module health and the exchange failure counter.
pub fn aggregate_status(unhealthy_modules: usize, consecutive_failures: u32) -> HealthStatus {
    if consecutive_failures >= CRITICAL_API_FAILURES || unhealthy_modules > CRITICAL_UNHEALTHY_MODULES {
        HealthStatus::Critical
    } else if unhealthy_modules > 0 || consecutive_failures > 0 {
        HealthStatus::Degraded
    } else {
        HealthStatus::Healthy
    }
}

/// Builds the full report, including human-readable alert lines.
pub fn build_report(
    now: DateTime<Utc>,
    modules: BTreeMap<String, ModuleHealth>,
    state: &HealthState,
    ping_ok: bool,
) -> HealthReport {
    let mut alerts = Vec::new();
    for (name, health) in &modules {
        if health.status != ModuleStatus::Ok {
            let age = health
                .age_minutes
                .map(|a| format!(" ({}m old)", a))
                .unwrap_or_default();
            alerts.push(format!("{}: {:?}{}", name, health.status, age).to_lowercase());
        }
    }

    let stale_count = modules.values().filter(|m| m.status != ModuleStatus::Ok).count();
    if state.consecutive_failures > 0 {
        alerts.push(format!(
            "binance api unreachable ({} consecutive failures)",
            state.consecutive_failures
        ));
    }

    HealthReport {
        timestamp: now,
        status: aggregate_status(stale_count, state.consecutive_failures),
        modules,
        api: ApiHealth {
            binance: if ping_ok { ApiStatus::Ok } else { ApiStatus::Down },
            consecutive_failures: state.consecutive_failures,
        },
        stale_count,
        alerts,
    }
}
