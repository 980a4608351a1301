//! System resource monitoring backed by sysinfo

use crate::error::Result;
use crate::methods::{MethodError, MethodRegistry};
use crate::monitoring::process::{CpuUsage, MemoryUsage, ProcessMetrics};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use sysinfo::{Disks, Pid, System};
use tracing::debug;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadAverage {
    pub one: f64,
    pub five: f64,
    pub fifteen: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiskUsage {
    pub name: String,
    pub mount_point: String,
    pub total_bytes: u64,
    pub available_bytes: u64,
    pub used_bytes: u64,
    pub usage_percent: f64,
    pub file_system: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemInfo {
    pub hostname: Option<String>,
    pub kernel_version: Option<String>,
    pub os_version: Option<String>,
    pub architecture: String,
    pub cpu_count: usize,
    pub cpu_brand: String,
}

pub struct SystemMonitor {
    system: Mutex<System>,
    start_time: Instant,
    pid: Option<Pid>,
}

impl SystemMonitor {
    pub fn new() -> Self {
        let mut system = System::new();
        system.refresh_memory();
        system.refresh_cpu();

        let pid = sysinfo::get_current_pid().ok();
        if let Some(pid) = pid {
            system.refresh_process(pid);
        }

        Self {
            system: Mutex::new(system),
            start_time: Instant::now(),
            pid,
        }
    }

    pub fn load_average(&self) -> LoadAverage {
        let load = System::load_average();
        LoadAverage {
            one: load.one,
            five: load.five,
            fifteen: load.fifteen,
        }
    }

    pub fn disk_usage(&self) -> Vec<DiskUsage> {
        let disks = Disks::new_with_refreshed_list();
        disks
            .iter()
            .map(|disk| {
                let total_bytes = disk.total_space();
                let available_bytes = disk.available_space();
                let used_bytes = total_bytes.saturating_sub(available_bytes);
                let usage_percent = if total_bytes > 0 {
                    (used_bytes as f64 / total_bytes as f64) * 100.0
                } else {
                    0.0
                };

                DiskUsage {
                    name: disk.name().to_string_lossy().to_string(),
                    mount_point: disk.mount_point().to_string_lossy().to_string(),
                    total_bytes,
                    available_bytes,
                    used_bytes,
                    usage_percent,
                    file_system: disk.file_system().to_string_lossy().to_string(),
                }
            })
            .collect()
    }

    pub fn system_info(&self) -> SystemInfo {
        let system = self.system.lock();
        let cpu_brand = system
            .cpus()
            .first()
            .map(|cpu| cpu.brand().to_string())
            .unwrap_or_else(|| "Unknown".to_string());

        SystemInfo {
            hostname: System::host_name(),
            kernel_version: System::kernel_version(),
            os_version: System::long_os_version(),
            architecture: std::env::consts::ARCH.to_string(),
            cpu_count: system.cpus().len(),
            cpu_brand,
        }
    }
}

impl Default for SystemMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessMetrics for SystemMonitor {
    fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    fn cpu(&self) -> CpuUsage {
        let mut system = self.system.lock();
        let cores = system.cpus().len();

        let Some(pid) = self.pid else {
            return CpuUsage {
                cores,
                ..CpuUsage::default()
            };
        };

        system.refresh_process(pid);
        let usage = system
            .process(pid)
            .map(|process| CpuUsage {
                usage_percent: process.cpu_usage(),
                run_time_seconds: process.run_time(),
                cores,
            })
            .unwrap_or_else(|| CpuUsage {
                cores,
                ..CpuUsage::default()
            });

        debug!("Sampled process CPU usage: {:.1}%", usage.usage_percent);
        usage
    }

    fn memory(&self) -> MemoryUsage {
        let mut system = self.system.lock();
        system.refresh_memory();

        let (rss_bytes, virtual_bytes) = match self.pid {
            Some(pid) => {
                system.refresh_process(pid);
                system
                    .process(pid)
                    .map(|process| (process.memory(), process.virtual_memory()))
                    .unwrap_or((0, 0))
            }
            None => (0, 0),
        };

        MemoryUsage {
            rss_bytes,
            virtual_bytes,
            system_total_bytes: system.total_memory(),
            system_used_bytes: system.used_memory(),
        }
    }

    fn env_var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

/// Registers `system.load`, `system.disks` and `system.info` so they can be
/// used as health checks.
pub fn register_builtin_methods(registry: &MethodRegistry, monitor: Arc<SystemMonitor>) -> Result<()> {
    let load_monitor = monitor.clone();
    registry.register_sync("system.load", move |_ctx| Ok(load_monitor.load_average()))?;

    let disk_monitor = monitor.clone();
    registry.register("system.disks", move |ctx| {
        let monitor = disk_monitor.clone();
        async move {
            let threshold = ctx
                .option("max_usage_percent")
                .and_then(|value| value.as_f64());

            match tokio::task::spawn_blocking(move || check_disks(&monitor, threshold)).await {
                Ok(result) => result,
                Err(e) => Err(MethodError::new(format!("Disk scan failed: {}", e))),
            }
        }
    })?;

    registry.register_sync("system.info", move |_ctx| Ok(monitor.system_info()))?;

    Ok(())
}

fn check_disks(
    monitor: &SystemMonitor,
    threshold: Option<f64>,
) -> std::result::Result<Vec<DiskUsage>, MethodError> {
    let disks = monitor.disk_usage();

    if let Some(threshold) = threshold {
        if let Some(full) = disks.iter().find(|disk| disk.usage_percent > threshold) {
            return Err(MethodError::unavailable(format!(
                "Disk {} is {:.1}% full",
                full.mount_point, full.usage_percent
            )));
        }
    }

    Ok(disks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::methods::{MethodContext, RequestInfo};
    use serde_json::json;

    #[test]
    fn test_system_monitor_metrics() {
        let monitor = SystemMonitor::new();

        let memory = monitor.memory();
        assert!(memory.system_total_bytes > 0);
        assert!(memory.rss_bytes > 0);

        let cpu = monitor.cpu();
        assert!(cpu.usage_percent >= 0.0);
        assert!(cpu.cores > 0);
    }

    #[test]
    fn test_uptime_is_monotonic() {
        let monitor = SystemMonitor::new();
        let first = monitor.uptime_seconds();
        let second = monitor.uptime_seconds();
        assert!(second >= first);
    }

    #[test]
    fn test_env_var_lookup() {
        let monitor = SystemMonitor::new();
        std::env::set_var("HEALTHCHECK_MONITOR_TEST", "present");
        assert_eq!(
            monitor.env_var("HEALTHCHECK_MONITOR_TEST").as_deref(),
            Some("present")
        );
        assert!(monitor.env_var("HEALTHCHECK_MONITOR_TEST_MISSING").is_none());
    }

    #[tokio::test]
    async fn test_builtin_methods_registered() {
        let registry = MethodRegistry::new();
        register_builtin_methods(&registry, Arc::new(SystemMonitor::new())).unwrap();

        assert_eq!(
            registry.names(),
            vec!["system.disks", "system.info", "system.load"]
        );

        let info = registry
            .resolve("system.info")
            .unwrap()
            .call(MethodContext::new(RequestInfo::default(), None))
            .await
            .unwrap();
        assert_eq!(info["architecture"], json!(std::env::consts::ARCH));
    }

    #[tokio::test]
    async fn test_disk_threshold() {
        let registry = MethodRegistry::new();
        register_builtin_methods(&registry, Arc::new(SystemMonitor::new())).unwrap();
        let disks = registry.resolve("system.disks").unwrap();

        let listed = disks
            .call(MethodContext::new(RequestInfo::default(), None))
            .await
            .unwrap();
        assert!(listed.is_array());

        let monitor = SystemMonitor::new();
        if !monitor.disk_usage().is_empty() {
            let err = check_disks(&monitor, Some(-1.0)).unwrap_err();
            assert_eq!(err.status(), axum::http::StatusCode::SERVICE_UNAVAILABLE);
        }
    }
}
