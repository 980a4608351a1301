//! Named, invocable server methods that checks resolve against

use crate::error::{AppError, Result};
use crate::methods::identifier::MethodRef;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use futures_util::future::{self, BoxFuture};
use futures_util::FutureExt;
use parking_lot::RwLock;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Error raised by an invoked method. Carries the HTTP status the client sees.
#[derive(Error, Debug, Clone)]
#[error("{message}")]
pub struct MethodError {
    status: StatusCode,
    message: String,
}

impl MethodError {
    pub fn new(message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn with_status(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::SERVICE_UNAVAILABLE, message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<serde_json::Error> for MethodError {
    fn from(err: serde_json::Error) -> Self {
        MethodError::new(format!("Failed to serialize method result: {}", err))
    }
}

/// Owned snapshot of the request that triggered a check.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RequestInfo {
    pub method: String,
    pub path: String,
    pub query: HashMap<String, String>,
    pub headers: HashMap<String, String>,
    /// Every query pair in order, repeated keys included.
    #[serde(skip)]
    query_pairs: Vec<(String, String)>,
}

impl RequestInfo {
    pub fn new(method: &Method, uri: &Uri, headers: &HeaderMap) -> Self {
        let query_pairs = axum::extract::Query::<Vec<(String, String)>>::try_from_uri(uri)
            .map(|q| q.0)
            .unwrap_or_default();
        let query = query_pairs.iter().cloned().collect();

        let headers = headers
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();

        Self {
            method: method.to_string(),
            path: uri.path().to_string(),
            query,
            headers,
            query_pairs,
        }
    }

    /// All values supplied for `key`. `query` only keeps the last one.
    pub fn query_values(&self, key: &str) -> Vec<&str> {
        self.query_pairs
            .iter()
            .filter(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct MethodContext {
    pub request: RequestInfo,
    pub options: Value,
}

impl MethodContext {
    pub fn new(request: RequestInfo, options: Option<Value>) -> Self {
        Self {
            request,
            options: options.unwrap_or_else(|| Value::Object(Default::default())),
        }
    }

    pub fn option(&self, key: &str) -> Option<&Value> {
        self.options.get(key)
    }
}

type BoxedMethod =
    Arc<dyn Fn(MethodContext) -> BoxFuture<'static, std::result::Result<Value, MethodError>> + Send + Sync>;

/// A method looked up from the registry, ready to be called.
#[derive(Clone)]
pub struct ResolvedMethod {
    pub reference: MethodRef,
    method: BoxedMethod,
}

impl ResolvedMethod {
    pub fn call(&self, context: MethodContext) -> BoxFuture<'static, std::result::Result<Value, MethodError>> {
        (self.method)(context)
    }
}

impl std::fmt::Debug for ResolvedMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedMethod")
            .field("reference", &self.reference)
            .finish()
    }
}

#[derive(Clone, Default)]
pub struct MethodRegistry {
    methods: Arc<RwLock<HashMap<String, BoxedMethod>>>,
}

impl MethodRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F, Fut, T>(&self, name: impl Into<String>, method: F) -> Result<()>
    where
        F: Fn(MethodContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<T, MethodError>> + Send + 'static,
        T: Serialize + Send + 'static,
    {
        let name = name.into();
        let parsed = MethodRef::parse(&name)?;
        if !parsed.args.is_empty() {
            return Err(AppError::InvalidMethod(format!(
                "method names cannot carry arguments: {}",
                name
            )));
        }

        let boxed: BoxedMethod = Arc::new(move |context| {
            let fut = method(context);
            async move {
                let value = fut.await?;
                serde_json::to_value(value).map_err(MethodError::from)
            }
            .boxed()
        });

        if self.methods.write().insert(name.clone(), boxed).is_some() {
            warn!("Method '{}' was already registered and has been replaced", name);
        } else {
            debug!("Registered method '{}'", name);
        }

        Ok(())
    }

    pub fn register_sync<F, T>(&self, name: impl Into<String>, method: F) -> Result<()>
    where
        F: Fn(&MethodContext) -> std::result::Result<T, MethodError> + Send + Sync + 'static,
        T: Serialize + Send + 'static,
    {
        self.register(name, move |context| future::ready(method(&context)))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.methods.read().contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.methods.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn resolve(&self, identifier: &str) -> Result<ResolvedMethod> {
        let reference = MethodRef::parse(identifier)?;
        let method = self
            .methods
            .read()
            .get(&reference.name)
            .cloned()
            .ok_or_else(|| AppError::MethodNotFound(reference.name.clone()))?;

        Ok(ResolvedMethod { reference, method })
    }
}
