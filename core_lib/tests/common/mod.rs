#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use healthcheck_core::{CpuUsage, MemoryUsage, ProcessMetrics, QueryParamStrategy, Server, ServerInfo};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tower::ServiceExt;

pub const HOST: &str = "localhost";
pub const VERSION: &str = "3.1.4";

pub struct FixedMetrics {
    uptime: AtomicU64,
    vars: HashMap<String, String>,
}

impl FixedMetrics {
    pub fn new(vars: &[(&str, &str)]) -> Self {
        Self {
            uptime: AtomicU64::new(100),
            vars: vars
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}

impl ProcessMetrics for FixedMetrics {
    fn uptime_seconds(&self) -> u64 {
        self.uptime.fetch_add(1, Ordering::SeqCst)
    }

    fn cpu(&self) -> CpuUsage {
        CpuUsage {
            usage_percent: 2.5,
            run_time_seconds: 100,
            cores: 8,
        }
    }

    fn memory(&self) -> MemoryUsage {
        MemoryUsage {
            rss_bytes: 2048,
            virtual_bytes: 8192,
            system_total_bytes: 1 << 32,
            system_used_bytes: 1 << 31,
        }
    }

    fn env_var(&self, name: &str) -> Option<String> {
        self.vars.get(name).cloned()
    }
}

pub fn server_with_env(vars: &[(&str, &str)]) -> Server {
    Server::new(ServerInfo::new(HOST, 8000).with_version(VERSION))
        .with_metrics(Arc::new(FixedMetrics::new(vars)))
}

pub fn server() -> Server {
    server_with_env(&[("RUST_ENV", "test")])
}

/// A server with a `default` strategy that accepts any non-empty
/// `authorization` query parameter.
pub fn server_with_strategy() -> Server {
    let mut server = server();
    server
        .auth_mut()
        .strategy("default", QueryParamStrategy::new("authorization"));
    server
}

pub async fn get(router: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };

    (status, json)
}

pub fn assert_base_report(body: &Value) {
    assert!(body.is_object());
    assert_eq!(body["host"], HOST);
    assert_eq!(body["env"], "test");
    assert!(body["uptime"].is_u64());
    assert!(body["cpu"].is_object());
    assert!(body["memory"].is_object());
    assert_eq!(body["version"], VERSION);
}
