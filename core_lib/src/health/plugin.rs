use crate::error::Result;
use crate::health::handler::{health_route, HealthHandler};
use crate::health::settings::{HealthOptions, HealthSettings};
use crate::server::{Plugin, Server};
use axum::routing::get;
use std::sync::Arc;
use tracing::info;

/// Adds the health endpoint to a [`Server`].
pub struct HealthPlugin;

impl Plugin for HealthPlugin {
    type Options = HealthOptions;

    fn name(&self) -> &'static str {
        "healthcheck"
    }

    fn once(&self) -> bool {
        true
    }

    fn register(&self, server: &mut Server, options: HealthOptions) -> Result<()> {
        let settings = HealthSettings::from_options(options)?;
        let endpoint = settings.endpoint.clone();
        let route_auth = settings.auth.route_auth();

        info!(
            endpoint = %endpoint,
            auth = ?settings.auth,
            token = settings.token.is_some(),
            checks = settings.checks.len(),
            envs = settings.envs.len(),
            "Registering health endpoint"
        );

        let handler = Arc::new(HealthHandler::new(
            settings,
            server.info().clone(),
            server.metrics(),
            server.methods().clone(),
        ));

        server.route(&endpoint, get(health_route).with_state(handler), route_auth)
    }
}

pub fn register(server: &mut Server, options: HealthOptions) -> Result<()> {
    server.register(HealthPlugin, options)
}
