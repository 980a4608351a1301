//! Main entry point for the health-check server binary

use anyhow::Result;
use healthcheck_core::config::{JWT_STRATEGY, QUERY_STRATEGY};
use healthcheck_core::{
    health, register_builtin_methods, run_server, AppConfig, JwtStrategy, QueryParamStrategy,
    Server, ServerInfo, SystemMonitor,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = AppConfig::load()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    info!("Configuration loaded successfully");
    info!("Server will bind to: {}", config.bind_address());

    let addr: SocketAddr = config.bind_address().parse()
        .map_err(|e| anyhow::anyhow!("Invalid bind address: {}", e))?;

    let info = ServerInfo::new(config.server.host.clone(), config.server.port)
        .with_version(env!("CARGO_PKG_VERSION"));
    info!("Initializing health-check server v{}", info.version);

    let monitor = Arc::new(SystemMonitor::new());
    let mut server = Server::new(info).with_metrics(monitor.clone());

    register_builtin_methods(server.methods(), monitor)?;
    info!("Registered methods: {}", server.methods().names().join(", "));

    if let Some(secret) = &config.auth.jwt_secret {
        server.auth_mut().strategy(JWT_STRATEGY, JwtStrategy::new(secret)?);
        info!("JWT auth strategy enabled");
    }

    if let Some(param) = &config.auth.query_param {
        server
            .auth_mut()
            .strategy(QUERY_STRATEGY, QueryParamStrategy::new(param.clone()));
        info!("Query parameter auth strategy enabled on '{}'", param);
    }

    if let Some(default) = &config.auth.default_strategy {
        server.auth_mut().set_default(default.clone())?;
        info!("Default auth strategy: {}", default);
    }

    health::register(&mut server, config.health)?;

    let app = server.into_router()?;

    run_server(app, addr).await?;

    info!("Server shutdown complete");
    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| {
            let default_level = if cfg!(debug_assertions) {
                "debug"
            } else {
                "info"
            };

            format!(
                "{}={},healthcheck_core={},tower_http=debug,axum=debug",
                env!("CARGO_CRATE_NAME").replace('-', "_"),
                default_level,
                default_level
            ).into()
        });

    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    let is_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    if is_json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer.json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer.pretty())
            .init();
    }
}
