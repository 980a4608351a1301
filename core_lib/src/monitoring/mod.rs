pub mod process;
pub mod system;

pub use process::{CpuUsage, MemoryUsage, ProcessMetrics, ENVIRONMENT_VAR};
pub use system::{register_builtin_methods, DiskUsage, LoadAverage, SystemInfo, SystemMonitor};
