use crate::monitoring::{CpuUsage, MemoryUsage};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Body returned by the health endpoint. Check results are flattened into
/// the top level under their check names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    pub host: String,
    pub env: Option<String>,
    pub uptime: u64,
    pub cpu: CpuUsage,
    pub memory: MemoryUsage,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub envs: Option<BTreeMap<String, Option<String>>>,
    #[serde(flatten)]
    pub checks: Map<String, Value>,
}

impl HealthReport {
    pub fn check(&self, name: &str) -> Option<&Value> {
        self.checks.get(name)
    }
}
