use crate::auth::AuthStrategy;
use crate::error::AppError;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// A strategy bound to one route.
#[derive(Clone)]
pub struct StrategyGuard {
    pub name: String,
    pub strategy: Arc<dyn AuthStrategy>,
}

impl StrategyGuard {
    pub fn new(name: impl Into<String>, strategy: Arc<dyn AuthStrategy>) -> Self {
        Self {
            name: name.into(),
            strategy,
        }
    }
}

/// Runs the route's strategy before the handler and stores the resulting
/// [`Credentials`](crate::auth::Credentials) in the request extensions.
pub async fn require_strategy(
    State(guard): State<StrategyGuard>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let (mut parts, body) = request.into_parts();

    let credentials = guard.strategy.authenticate(&parts).await.map_err(|e| {
        tracing::warn!(
            strategy = %guard.name,
            path = %parts.uri.path(),
            "Authentication rejected: {}",
            e
        );
        e
    })?;

    tracing::debug!(strategy = %guard.name, subject = %credentials.subject, "Authenticated request");
    parts.extensions.insert(credentials);

    Ok(next.run(Request::from_parts(parts, body)).await)
}
