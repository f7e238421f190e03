//! HTTP surface modules (router, handlers, middleware).

/// Shared constants and header names for HTTP surfaces.
pub mod constants;
/// Problem response helpers and error types.
pub mod errors;
/// Health and diagnostics endpoints.
pub mod health;
/// Topology summary and per-line views.
pub mod lines;
/// Reload trigger.
pub mod reload;
/// Router construction and server host.
pub mod router;
/// Server-sent events filters and streaming utilities.
pub mod sse;
/// Metrics middleware for HTTP requests.
pub mod telemetry;
/// Topology replacement handlers.
pub mod topology;
