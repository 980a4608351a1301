//! Health-check endpoint plugin for an axum host server.
//!
//! A [`Server`] collects routes, auth strategies and named methods; the
//! [`HealthPlugin`] registers a `GET` route on it that reports process
//! status and runs user-configured checks against the method registry.

pub mod auth;
pub mod config;
pub mod error;
pub mod health;
pub mod methods;
pub mod middleware;
pub mod monitoring;
pub mod server;

pub use auth::{AuthRegistry, AuthStrategy, Credentials, JwtStrategy, QueryParamStrategy};
pub use config::AppConfig;
pub use error::{AppError, Result};
pub use health::{AuthOption, CheckConfig, HealthOptions, HealthPlugin, HealthReport, HealthSettings};
pub use methods::{MethodContext, MethodError, MethodRegistry, RequestInfo};
pub use monitoring::{register_builtin_methods, CpuUsage, MemoryUsage, ProcessMetrics, SystemMonitor};
pub use server::{Plugin, RouteAuth, Server, ServerInfo};

use axum::Router;
use std::net::SocketAddr;
use tokio::signal;
use tracing::info;

pub async fn run_server(app: Router, addr: SocketAddr) -> Result<()> {
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
