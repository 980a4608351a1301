//! Process-level metrics reported by the health endpoint

use serde::{Deserialize, Serialize};

/// Environment variable naming the deployment mode (`development`, `production`, ...).
pub const ENVIRONMENT_VAR: &str = "RUST_ENV";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CpuUsage {
    pub usage_percent: f32,
    pub run_time_seconds: u64,
    pub cores: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryUsage {
    pub rss_bytes: u64,
    pub virtual_bytes: u64,
    pub system_total_bytes: u64,
    pub system_used_bytes: u64,
}

/// Read-only view of the ambient process state.
///
/// The health handler only ever talks to this trait, so tests can swap in a
/// provider with fixed values instead of the live [`SystemMonitor`].
///
/// [`SystemMonitor`]: crate::monitoring::SystemMonitor
pub trait ProcessMetrics: Send + Sync {
    /// Whole seconds since the provider was created at startup.
    fn uptime_seconds(&self) -> u64;

    fn cpu(&self) -> CpuUsage;

    fn memory(&self) -> MemoryUsage;

    /// Deployment mode indicator, `None` when unset.
    fn environment(&self) -> Option<String> {
        self.env_var(ENVIRONMENT_VAR)
    }

    /// Reads a variable at call time. Missing or non-unicode values are `None`.
    fn env_var(&self, name: &str) -> Option<String>;
}
