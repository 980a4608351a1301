pub mod handler;
pub mod plugin;
pub mod report;
pub mod settings;


pub use handler::{health_route, HealthHandler, TOKEN_PARAM};
pub use plugin::{register, HealthPlugin};
pub use report::HealthReport;
pub use settings::{AuthMode, AuthOption, CheckConfig, HealthOptions, HealthSettings, DEFAULT_ENDPOINT};
