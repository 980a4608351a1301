//! The host server: routes, auth strategies, methods and plugins

use crate::auth::AuthRegistry;
use crate::error::{AppError, Result};
use crate::methods::MethodRegistry;
use crate::middleware::auth::{require_strategy, StrategyGuard};
use crate::middleware::logging::logging_layer;
use crate::monitoring::{ProcessMetrics, SystemMonitor};
use axum::{middleware as axum_middleware, routing::MethodRouter, Router};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerInfo {
    pub host: String,
    pub port: u16,
    /// Version of the application being served, fixed at startup.
    pub version: String,
}

impl ServerInfo {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }
}

/// Auth requirement of a single route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteAuth {
    /// Use the server's default strategy, if one is set.
    Inherit,
    Disabled,
    Strategy(String),
}

/// Something that adds routes or methods to a [`Server`].
pub trait Plugin {
    type Options;

    fn name(&self) -> &'static str;

    /// Plugins returning `true` ignore every registration after the first.
    fn once(&self) -> bool {
        false
    }

    fn register(&self, server: &mut Server, options: Self::Options) -> Result<()>;
}

/// Routes are registered as literal paths. Captures (`:name`) and
/// wildcards (`*rest`) are rejected here instead of panicking inside the
/// router later.
pub fn validate_route_path(path: &str) -> Result<()> {
    let invalid = |reason: &str| AppError::InvalidRoute {
        path: path.to_string(),
        reason: reason.to_string(),
    };

    if !path.starts_with('/') {
        return Err(invalid("must start with '/'"));
    }
    if path.contains(':') || path.contains('*') {
        return Err(invalid("path parameters and wildcards are not supported"));
    }
    if path.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(invalid("contains whitespace or control characters"));
    }

    Ok(())
}

struct RouteEntry {
    path: String,
    router: MethodRouter,
    auth: RouteAuth,
}

pub struct Server {
    info: ServerInfo,
    auth: AuthRegistry,
    methods: MethodRegistry,
    metrics: Arc<dyn ProcessMetrics>,
    routes: Vec<RouteEntry>,
    plugins: HashSet<&'static str>,
}

impl Server {
    pub fn new(info: ServerInfo) -> Self {
        Self {
            info,
            auth: AuthRegistry::new(),
            methods: MethodRegistry::new(),
            metrics: Arc::new(SystemMonitor::new()),
            routes: Vec::new(),
            plugins: HashSet::new(),
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<dyn ProcessMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn info(&self) -> &ServerInfo {
        &self.info
    }

    pub fn auth(&self) -> &AuthRegistry {
        &self.auth
    }

    pub fn auth_mut(&mut self) -> &mut AuthRegistry {
        &mut self.auth
    }

    pub fn methods(&self) -> &MethodRegistry {
        &self.methods
    }

    pub fn metrics(&self) -> Arc<dyn ProcessMetrics> {
        self.metrics.clone()
    }

    pub fn route(&mut self, path: &str, router: MethodRouter, auth: RouteAuth) -> Result<()> {
        validate_route_path(path)?;
        if self.routes.iter().any(|entry| entry.path == path) {
            return Err(AppError::Config(format!("Route already registered: {}", path)));
        }

        self.routes.push(RouteEntry {
            path: path.to_string(),
            router,
            auth,
        });
        Ok(())
    }

    pub fn route_auth(&self, path: &str) -> Option<&RouteAuth> {
        self.routes
            .iter()
            .find(|entry| entry.path == path)
            .map(|entry| &entry.auth)
    }

    pub fn register<P: Plugin>(&mut self, plugin: P, options: P::Options) -> Result<()> {
        let name = plugin.name();
        if plugin.once() && self.plugins.contains(name) {
            info!("Plugin '{}' already registered, skipping", name);
            return Ok(());
        }

        plugin.register(self, options)?;
        self.plugins.insert(name);
        info!("Registered plugin '{}'", name);
        Ok(())
    }

    /// Resolves every route's auth requirement and builds the router.
    pub fn into_router(self) -> Result<Router> {
        let mut router = Router::new();

        for entry in self.routes {
            let strategy = match &entry.auth {
                RouteAuth::Disabled => None,
                RouteAuth::Inherit => self.auth.default_strategy().map(str::to_string),
                RouteAuth::Strategy(name) => Some(name.clone()),
            };

            let mut method_router = entry.router;
            if let Some(name) = strategy {
                let resolved = self.auth.get(&name).ok_or_else(|| {
                    AppError::Config(format!(
                        "Route {} requires unknown auth strategy '{}'",
                        entry.path, name
                    ))
                })?;
                info!("Route {} requires auth strategy '{}'", entry.path, name);
                method_router = method_router.route_layer(axum_middleware::from_fn_with_state(
                    StrategyGuard::new(name, resolved),
                    require_strategy,
                ));
            }

            router = router.route(&entry.path, method_router);
        }

        Ok(router.layer(logging_layer()))
    }
}
