pub mod settings;

pub use settings::{AppConfig, AuthConfig, ServerConfig, JWT_STRATEGY, QUERY_STRATEGY};
