//! Middleware components for the HTTP server

pub mod auth;
pub mod logging;
