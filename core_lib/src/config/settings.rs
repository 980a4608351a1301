use crate::auth::jwt::MIN_SECRET_LENGTH;
use crate::health::{AuthMode, HealthOptions};
use crate::server::validate_route_path;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const JWT_STRATEGY: &str = "jwt";
pub const QUERY_STRATEGY: &str = "query";

const ENV_PREFIX: &str = "APP";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub health: HealthOptions,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Strategies the server binary registers. A strategy exists only when its
/// setting is present.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: Option<String>,
    pub query_param: Option<String>,
    pub default_strategy: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

impl AuthConfig {
    pub fn configured_strategies(&self) -> Vec<&'static str> {
        let mut strategies = Vec::new();
        if self.jwt_secret.is_some() {
            strategies.push(JWT_STRATEGY);
        }
        if self.query_param.is_some() {
            strategies.push(QUERY_STRATEGY);
        }
        strategies
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config.toml")
    }

    /// Defaults, then `path` if it exists, then `APP_*` environment variables
    /// (`APP_SERVER__PORT`, `APP_HEALTH__TOKEN`, `APP_HEALTH__ENVS=A,B`).
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::load_with_prefix(path, ENV_PREFIX)
    }

    /// Environment values are kept as strings; typed fields are converted
    /// on deserialisation, so tokens and secrets such as `007` stay intact.
    fn load_with_prefix(path: impl AsRef<Path>, prefix: &str) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let mut builder = Config::builder().add_source(Config::try_from(&AppConfig::default())?);

        if path.exists() {
            builder = builder.add_source(File::from(path));
        }

        builder = builder.add_source(
            Environment::with_prefix(prefix)
                .prefix_separator("_")
                .separator("__"),
        );

        let config = builder.build()?;
        let app_config: AppConfig = config.try_deserialize()?;

        app_config.validate()?;

        Ok(app_config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Message("Server port cannot be 0".to_string()));
        }

        if self.server.host.is_empty() {
            return Err(ConfigError::Message("Server host cannot be empty".to_string()));
        }

        if let Some(secret) = &self.auth.jwt_secret {
            if secret.len() < MIN_SECRET_LENGTH {
                return Err(ConfigError::Message(format!(
                    "JWT secret must be at least {} characters long",
                    MIN_SECRET_LENGTH
                )));
            }
        }

        let strategies = self.auth.configured_strategies();

        if let Some(default) = &self.auth.default_strategy {
            if !strategies.contains(&default.as_str()) {
                return Err(ConfigError::Message(format!(
                    "Default auth strategy '{}' is not configured",
                    default
                )));
            }
        }

        if let Some(endpoint) = &self.health.endpoint {
            validate_route_path(endpoint).map_err(|e| ConfigError::Message(e.to_string()))?;
        }

        let health_auth = AuthMode::resolve(self.health.auth.as_ref())
            .map_err(|e| ConfigError::Message(e.to_string()))?;
        if let AuthMode::Strategy(name) = health_auth {
            if !strategies.contains(&name.as_str()) {
                return Err(ConfigError::Message(format!(
                    "Health auth strategy '{}' is not configured",
                    name
                )));
            }
        }

        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::AuthOption;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert!(config.health.endpoint.is_none());
        assert!(config.auth.configured_strategies().is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = AppConfig::default();
        config.server.port = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.auth.jwt_secret = Some("too-short".to_string());
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.auth.default_strategy = Some(JWT_STRATEGY.to_string());
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.health.endpoint = Some("health".to_string());
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.health.auth = Some(AuthOption::Enabled(true));
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.health.auth = Some(AuthOption::Strategy(QUERY_STRATEGY.to_string()));
        assert!(config.validate().is_err());
        config.auth.query_param = Some("authorization".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_bind_address() {
        let mut config = AppConfig::default();
        assert_eq!(config.bind_address(), "127.0.0.1:3000");

        config.server.host = "0.0.0.0".to_string();
        config.server.port = 8080;
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
    }

    #[test]
    fn test_load_without_file_uses_defaults() {
        let config = AppConfig::load_from("does-not-exist.toml").expect("Should load defaults");
        assert!(config.server.port > 0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[server]
host = "0.0.0.0"
port = 8000

[auth]
query_param = "authorization"

[health]
auth = "query"
token = "1234"
endpoint = "/status"
envs = ["PATH", "HOME"]

[[health.checks]]
name = "disks"
method = "system.disks"
options = {{ max_usage_percent = 99.5 }}

[[health.checks]]
name = "load"
method = "system.load"
"#
        )
        .unwrap();

        let config = AppConfig::load_from(file.path()).unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.health.auth, Some(AuthOption::Strategy("query".to_string())));
        assert_eq!(config.health.token.as_deref(), Some("1234"));
        assert_eq!(config.health.endpoint.as_deref(), Some("/status"));
        assert_eq!(
            config.health.envs,
            Some(vec!["PATH".to_string(), "HOME".to_string()])
        );

        let checks = config.health.checks.unwrap();
        assert_eq!(checks.len(), 2);
        assert_eq!(checks[0].name.as_deref(), Some("disks"));
        assert_eq!(checks[0].method.as_deref(), Some("system.disks"));
        assert_eq!(
            checks[0].options,
            Some(serde_json::json!({ "max_usage_percent": 99.5 }))
        );
        assert!(checks[1].options.is_none());
    }

    #[test]
    fn test_env_values_are_kept_verbatim() {
        std::env::set_var("HCVERBATIM_HEALTH__TOKEN", "007");
        std::env::set_var("HCVERBATIM_AUTH__JWT_SECRET", "0000000000000000000000000000000000000001");
        std::env::set_var("HCVERBATIM_SERVER__PORT", "8081");

        let config = AppConfig::load_with_prefix("does-not-exist.toml", "HCVERBATIM").unwrap();
        assert_eq!(config.health.token.as_deref(), Some("007"));
        assert_eq!(
            config.auth.jwt_secret.as_deref(),
            Some("0000000000000000000000000000000000000001")
        );
        assert_eq!(config.server.port, 8081);
    }

    #[test]
    fn test_env_lists_and_auth_flag() {
        std::env::set_var("HCLISTS_HEALTH__ENVS", "PATH,HOME");
        std::env::set_var("HCLISTS_HEALTH__AUTH", "false");

        let config = AppConfig::load_with_prefix("does-not-exist.toml", "HCLISTS").unwrap();
        assert_eq!(
            config.health.envs,
            Some(vec!["PATH".to_string(), "HOME".to_string()])
        );
        assert_eq!(
            AuthMode::resolve(config.health.auth.as_ref()).unwrap(),
            AuthMode::Disabled
        );
    }

    #[test]
    fn test_env_auth_true_rejected() {
        std::env::set_var("HCAUTHTRUE_HEALTH__AUTH", "true");
        assert!(AppConfig::load_with_prefix("does-not-exist.toml", "HCAUTHTRUE").is_err());
    }

    #[test]
    fn test_parameterised_endpoint_rejected() {
        let mut config = AppConfig::default();
        config.health.endpoint = Some("/health/*".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_auth_disabled_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[health]\nauth = false").unwrap();

        let config = AppConfig::load_from(file.path()).unwrap();
        assert_eq!(config.health.auth, Some(AuthOption::Enabled(false)));
    }
}
