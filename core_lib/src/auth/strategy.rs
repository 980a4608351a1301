//! Named authentication strategies that routes can require

use crate::error::{AppError, Result};
use async_trait::async_trait;
use axum::http::request::Parts;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Identity established by a strategy, stored in request extensions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credentials {
    pub strategy: String,
    pub subject: String,
}

#[async_trait]
pub trait AuthStrategy: Send + Sync {
    /// Short scheme name used in logs, e.g. `jwt`.
    fn scheme(&self) -> &str;

    async fn authenticate(&self, parts: &Parts) -> Result<Credentials>;
}

/// Accepts requests carrying a non-empty query parameter.
pub struct QueryParamStrategy {
    param: String,
    expected: Option<String>,
}

impl QueryParamStrategy {
    pub fn new(param: impl Into<String>) -> Self {
        Self {
            param: param.into(),
            expected: None,
        }
    }

    /// Only accept the given value instead of any non-empty one.
    pub fn expecting(mut self, value: impl Into<String>) -> Self {
        self.expected = Some(value.into());
        self
    }
}

#[async_trait]
impl AuthStrategy for QueryParamStrategy {
    fn scheme(&self) -> &str {
        "query"
    }

    async fn authenticate(&self, parts: &Parts) -> Result<Credentials> {
        let query = axum::extract::Query::<HashMap<String, String>>::try_from_uri(&parts.uri)
            .map(|q| q.0)
            .unwrap_or_default();

        let value = query
            .get(&self.param)
            .filter(|value| !value.is_empty())
            .ok_or(AppError::Unauthorized)?;

        if let Some(expected) = &self.expected {
            if value != expected {
                return Err(AppError::Unauthorized);
            }
        }

        Ok(Credentials {
            strategy: self.scheme().to_string(),
            subject: value.clone(),
        })
    }
}

/// Strategies known to the server, plus the optional server-wide default.
#[derive(Clone, Default)]
pub struct AuthRegistry {
    strategies: HashMap<String, Arc<dyn AuthStrategy>>,
    default: Option<String>,
}

impl AuthRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn strategy<S: AuthStrategy + 'static>(&mut self, name: impl Into<String>, strategy: S) {
        let name = name.into();
        tracing::debug!("Registered auth strategy '{}' ({})", name, strategy.scheme());
        self.strategies.insert(name, Arc::new(strategy));
    }

    pub fn set_default(&mut self, name: impl Into<String>) -> Result<()> {
        let name = name.into();
        if !self.strategies.contains_key(&name) {
            return Err(AppError::Config(format!("Unknown auth strategy '{}'", name)));
        }
        self.default = Some(name);
        Ok(())
    }

    pub fn default_strategy(&self) -> Option<&str> {
        self.default.as_deref()
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn AuthStrategy>> {
        self.strategies.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.strategies.contains_key(name)
    }
}
