//! Request handling for the health endpoint

use crate::error::{AppError, Result};
use crate::health::report::HealthReport;
use crate::health::settings::HealthSettings;
use crate::methods::{MethodContext, MethodRegistry, RequestInfo};
use crate::monitoring::ProcessMetrics;
use crate::server::ServerInfo;
use axum::{
    extract::State,
    http::{HeaderMap, Method, Uri},
    Json,
};
use futures_util::future::try_join_all;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

pub const TOKEN_PARAM: &str = "token";

pub struct HealthHandler {
    settings: HealthSettings,
    info: ServerInfo,
    metrics: Arc<dyn ProcessMetrics>,
    methods: MethodRegistry,
}

impl HealthHandler {
    pub fn new(
        settings: HealthSettings,
        info: ServerInfo,
        metrics: Arc<dyn ProcessMetrics>,
        methods: MethodRegistry,
    ) -> Self {
        Self {
            settings,
            info,
            metrics,
            methods,
        }
    }

    pub fn settings(&self) -> &HealthSettings {
        &self.settings
    }

    pub async fn handle(&self, request: RequestInfo) -> Result<HealthReport> {
        self.authorize(&request.query_values(TOKEN_PARAM))?;

        let metrics = self.metrics.clone();
        let (cpu, memory) = tokio::task::spawn_blocking(move || (metrics.cpu(), metrics.memory()))
            .await
            .map_err(|e| anyhow::anyhow!("Process metrics sampling failed: {}", e))?;

        let mut report = HealthReport {
            host: self.info.host.clone(),
            env: self.metrics.environment(),
            uptime: self.metrics.uptime_seconds(),
            cpu,
            memory,
            version: self.info.version.clone(),
            envs: None,
            checks: Default::default(),
        };

        if !self.settings.envs.is_empty() {
            let envs: BTreeMap<String, Option<String>> = self
                .settings
                .envs
                .iter()
                .map(|name| (name.clone(), self.metrics.env_var(name)))
                .collect();
            report.envs = Some(envs);
        }

        for (name, value) in self.run_checks(&request).await? {
            report.checks.insert(name, value);
        }

        Ok(report)
    }

    /// The token must be supplied exactly once and match exactly.
    fn authorize(&self, supplied: &[&str]) -> Result<()> {
        let Some(expected) = &self.settings.token else {
            return Ok(());
        };

        match supplied {
            [token] if constant_time_eq(token, expected) => Ok(()),
            _ => {
                warn!(
                    endpoint = %self.settings.endpoint,
                    supplied = supplied.len(),
                    "Rejected health request with missing or invalid token"
                );
                Err(AppError::Unauthorized)
            }
        }
    }

    /// Every check is validated and resolved before any of them is started.
    /// The checks then run concurrently on this task; the first failure drops
    /// the rest.
    async fn run_checks(&self, request: &RequestInfo) -> Result<Vec<(String, serde_json::Value)>> {
        let mut calls = Vec::with_capacity(self.settings.checks.len());
        for check in &self.settings.checks {
            let (name, method) = check.parts().ok_or(AppError::InvalidCheck)?;
            let resolved = self.methods.resolve(method)?;
            calls.push((name, resolved, check.options.clone()));
        }

        let futures = calls.into_iter().map(|(name, resolved, options)| {
            let context = MethodContext::new(request.clone(), options);
            async move {
                debug!(check = %name, method = %resolved.reference, "Running health check");
                let started = Instant::now();

                let value = resolved.call(context).await.map_err(|source| AppError::CheckFailed {
                    check: name.to_string(),
                    source,
                })?;

                debug!(
                    check = %name,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Health check finished"
                );
                Ok::<_, AppError>((name.to_string(), value))
            }
        });

        try_join_all(futures).await
    }
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    a.bytes()
        .zip(b.bytes())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}

pub async fn health_route(
    State(handler): State<Arc<HealthHandler>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Result<Json<HealthReport>> {
    let request = RequestInfo::new(&method, &uri, &headers);
    let report = handler.handle(request).await?;
    Ok(Json(report))
}
