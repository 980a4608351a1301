//! Health endpoint options and the settings they resolve to

use crate::error::{AppError, Result};
use crate::server::{validate_route_path, RouteAuth};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

pub const DEFAULT_ENDPOINT: &str = "/health";

/// Report keys a check name is not allowed to overwrite.
pub const RESERVED_KEYS: [&str; 7] = ["host", "env", "uptime", "cpu", "memory", "version", "envs"];

/// Route auth as written by the caller: `false` or a strategy name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AuthOption {
    Enabled(bool),
    Strategy(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthMode {
    Disabled,
    Strategy(String),
}

impl AuthMode {
    /// Unset, `false` and `""` all disable auth. An unset value must not fall
    /// back to the server's default strategy. Environment variables only
    /// carry strings, so `"false"` and `"true"` are read as booleans.
    pub fn resolve(option: Option<&AuthOption>) -> Result<Self> {
        match option {
            None | Some(AuthOption::Enabled(false)) => Ok(AuthMode::Disabled),
            Some(AuthOption::Strategy(name)) if name.is_empty() || name.eq_ignore_ascii_case("false") => {
                Ok(AuthMode::Disabled)
            }
            Some(AuthOption::Enabled(true)) => Err(enabled_without_strategy()),
            Some(AuthOption::Strategy(name)) if name.eq_ignore_ascii_case("true") => {
                Err(enabled_without_strategy())
            }
            Some(AuthOption::Strategy(name)) => Ok(AuthMode::Strategy(name.clone())),
        }
    }

    pub fn route_auth(&self) -> RouteAuth {
        match self {
            AuthMode::Disabled => RouteAuth::Disabled,
            AuthMode::Strategy(name) => RouteAuth::Strategy(name.clone()),
        }
    }
}

fn enabled_without_strategy() -> AppError {
    AppError::Config("health auth must be false or the name of a strategy".to_string())
}

/// A configured check. Both `name` and `method` are required, but a check
/// missing either is only rejected when the endpoint is requested.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckConfig {
    pub name: Option<String>,
    pub method: Option<String>,
    pub options: Option<Value>,
}

impl CheckConfig {
    pub fn new(name: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            method: Some(method.into()),
            options: None,
        }
    }

    pub fn with_options(mut self, options: Value) -> Self {
        self.options = Some(options);
        self
    }

    /// `(name, method)` when both are present and non-empty.
    pub fn parts(&self) -> Option<(&str, &str)> {
        match (self.name.as_deref(), self.method.as_deref()) {
            (Some(name), Some(method)) if !name.is_empty() && !method.is_empty() => Some((name, method)),
            _ => None,
        }
    }
}

/// Caller overrides; every unset field keeps its default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthOptions {
    pub auth: Option<AuthOption>,
    pub token: Option<String>,
    pub endpoint: Option<String>,
    pub checks: Option<Vec<CheckConfig>>,
    #[serde(default, deserialize_with = "deserialize_env_names")]
    pub envs: Option<Vec<String>>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum EnvNames {
    List(Vec<String>),
    Csv(String),
}

/// Accepts a list or a comma separated string (`A,B`), the form an
/// environment variable can carry.
fn deserialize_env_names<'de, D>(deserializer: D) -> std::result::Result<Option<Vec<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let names = Option::<EnvNames>::deserialize(deserializer)?.map(|names| match names {
        EnvNames::List(list) => list,
        EnvNames::Csv(csv) => csv
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect(),
    });
    Ok(names)
}

impl HealthOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn auth(mut self, auth: AuthOption) -> Self {
        self.auth = Some(auth);
        self
    }

    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn check(mut self, check: CheckConfig) -> Self {
        self.checks.get_or_insert_with(Vec::new).push(check);
        self
    }

    pub fn envs<I, S>(mut self, envs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.envs = Some(envs.into_iter().map(Into::into).collect());
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HealthSettings {
    pub auth: AuthMode,
    pub token: Option<String>,
    pub endpoint: String,
    pub checks: Vec<CheckConfig>,
    pub envs: Vec<String>,
}

impl Default for HealthSettings {
    fn default() -> Self {
        Self {
            auth: AuthMode::Disabled,
            token: None,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            checks: Vec::new(),
            envs: Vec::new(),
        }
    }
}

impl HealthSettings {
    pub fn from_options(options: HealthOptions) -> Result<Self> {
        let defaults = Self::default();

        let endpoint = options.endpoint.unwrap_or(defaults.endpoint);
        validate_route_path(&endpoint)?;

        let checks = options.checks.unwrap_or(defaults.checks);
        validate_check_names(&checks)?;

        Ok(Self {
            auth: AuthMode::resolve(options.auth.as_ref())?,
            token: options.token.filter(|token| !token.is_empty()),
            endpoint,
            checks,
            envs: options.envs.unwrap_or(defaults.envs),
        })
    }
}

fn validate_check_names(checks: &[CheckConfig]) -> Result<()> {
    let mut seen = HashSet::new();

    for name in checks.iter().filter_map(|check| check.name.as_deref()) {
        if RESERVED_KEYS.contains(&name) {
            return Err(AppError::ReservedCheckName(name.to_string()));
        }
        if !name.is_empty() && !seen.insert(name) {
            return Err(AppError::DuplicateCheck(name.to_string()));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let settings = HealthSettings::from_options(HealthOptions::default()).unwrap();
        assert_eq!(settings, HealthSettings::default());
        assert_eq!(settings.endpoint, "/health");
        assert_eq!(settings.auth, AuthMode::Disabled);
        assert!(settings.token.is_none());
        assert!(settings.checks.is_empty());
        assert!(settings.envs.is_empty());
    }

    #[test]
    fn test_overrides_are_merged() {
        let options = HealthOptions::new()
            .token("1234")
            .endpoint("/status")
            .envs(["PATH"])
            .check(CheckConfig::new("db", "db.ping").with_options(json!({ "timeout": 5 })));

        let settings = HealthSettings::from_options(options).unwrap();
        assert_eq!(settings.token.as_deref(), Some("1234"));
        assert_eq!(settings.endpoint, "/status");
        assert_eq!(settings.envs, vec!["PATH".to_string()]);
        assert_eq!(settings.checks.len(), 1);
        assert_eq!(settings.auth, AuthMode::Disabled);
    }

    #[test]
    fn test_empty_token_disables_gate() {
        let settings = HealthSettings::from_options(HealthOptions::new().token("")).unwrap();
        assert!(settings.token.is_none());
    }

    #[test]
    fn test_auth_resolution() {
        assert_eq!(AuthMode::resolve(None).unwrap(), AuthMode::Disabled);
        assert_eq!(
            AuthMode::resolve(Some(&AuthOption::Enabled(false))).unwrap(),
            AuthMode::Disabled
        );
        assert_eq!(
            AuthMode::resolve(Some(&AuthOption::Strategy(String::new()))).unwrap(),
            AuthMode::Disabled
        );
        assert_eq!(
            AuthMode::resolve(Some(&AuthOption::Strategy("default".to_string()))).unwrap(),
            AuthMode::Strategy("default".to_string())
        );
        assert!(AuthMode::resolve(Some(&AuthOption::Enabled(true))).is_err());
        assert_eq!(
            AuthMode::resolve(Some(&AuthOption::Strategy("false".to_string()))).unwrap(),
            AuthMode::Disabled
        );
        assert!(AuthMode::resolve(Some(&AuthOption::Strategy("true".to_string()))).is_err());

        assert_eq!(AuthMode::Disabled.route_auth(), RouteAuth::Disabled);
        assert_eq!(
            AuthMode::Strategy("default".to_string()).route_auth(),
            RouteAuth::Strategy("default".to_string())
        );
    }

    #[test]
    fn test_auth_option_deserialization() {
        let disabled: HealthOptions = serde_json::from_value(json!({ "auth": false })).unwrap();
        assert_eq!(disabled.auth, Some(AuthOption::Enabled(false)));

        let strategy: HealthOptions = serde_json::from_value(json!({ "auth": "default" })).unwrap();
        assert_eq!(strategy.auth, Some(AuthOption::Strategy("default".to_string())));

        let unset: HealthOptions = serde_json::from_value(json!({})).unwrap();
        assert!(unset.auth.is_none());
        assert!(unset.envs.is_none());
    }

    #[test]
    fn test_envs_accept_list_or_comma_separated_string() {
        let list: HealthOptions = serde_json::from_value(json!({ "envs": ["A", "B"] })).unwrap();
        assert_eq!(list.envs, Some(vec!["A".to_string(), "B".to_string()]));

        let csv: HealthOptions = serde_json::from_value(json!({ "envs": "A, B," })).unwrap();
        assert_eq!(csv.envs, Some(vec!["A".to_string(), "B".to_string()]));

        let null: HealthOptions = serde_json::from_value(json!({ "envs": null })).unwrap();
        assert!(null.envs.is_none());
    }

    #[test]
    fn test_duplicate_check_names_rejected() {
        let options = HealthOptions::new()
            .check(CheckConfig::new("db", "db.ping"))
            .check(CheckConfig::new("db", "db.stats"));

        assert!(matches!(
            HealthSettings::from_options(options),
            Err(AppError::DuplicateCheck(name)) if name == "db"
        ));
    }

    #[test]
    fn test_reserved_check_names_rejected() {
        let options = HealthOptions::new().check(CheckConfig::new("uptime", "get.uptime"));

        assert!(matches!(
            HealthSettings::from_options(options),
            Err(AppError::ReservedCheckName(name)) if name == "uptime"
        ));
    }

    #[test]
    fn test_incomplete_checks_are_kept_until_request_time() {
        let options = HealthOptions::new().check(CheckConfig {
            name: None,
            method: Some("get.test".to_string()),
            options: None,
        });

        let settings = HealthSettings::from_options(options).unwrap();
        assert_eq!(settings.checks.len(), 1);
        assert!(settings.checks[0].parts().is_none());
    }

    #[test]
    fn test_relative_endpoint_rejected() {
        assert!(HealthSettings::from_options(HealthOptions::new().endpoint("health")).is_err());
    }

    #[test]
    fn test_parameterised_endpoint_rejected() {
        for endpoint in ["/health/*", "/health/:probe", "/*rest"] {
            assert!(matches!(
                HealthSettings::from_options(HealthOptions::new().endpoint(endpoint)),
                Err(AppError::InvalidRoute { .. })
            ));
        }
    }
}
