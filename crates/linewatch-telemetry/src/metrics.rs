//! Prometheus-backed metrics registry and snapshot helpers.
//!
//! # Design
//! - Encapsulates collector registration to keep the public API small.
//! - Exposes the counters/gauges of the ingest, dispatch and HTTP paths.

use std::convert::TryFrom;
use std::sync::Arc;
use std::time::Duration;

use prometheus::core::Collector;
use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use serde::Serialize;

use crate::error::{Result, TelemetryError};

/// Outcome label values for received broker messages.
pub mod received {
    /// Payload decoded into a CFX message.
    pub const DECODED: &str = "decoded";
    /// Payload was not a valid CFX message.
    pub const INVALID: &str = "invalid";
}

/// Outcome label values for dispatched messages.
pub mod dispatched {
    /// Message was routed and recorded.
    pub const APPLIED: &str = "applied";
    /// Message id had already been processed.
    pub const DUPLICATE: &str = "duplicate";
    /// Message source matched no configured machine.
    pub const UNROUTABLE: &str = "unroutable";
}

/// Prometheus-backed metrics registry shared across services.
#[derive(Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

struct MetricsInner {
    registry: Registry,
    http_requests_total: IntCounterVec,
    cfx_messages_received_total: IntCounterVec,
    dispatch_messages_total: IntCounterVec,
    alerts_raised_total: IntCounter,
    batches_applied_total: IntCounter,
    stale_batches_total: IntCounter,
    reload_failures_total: IntCounter,
    buffered_messages: IntGauge,
    tracked_lines: IntGauge,
    reload_latency_ms: IntGauge,
}

/// Snapshot of selected gauges and counters for health reporting.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Messages currently held in the ingest buffer.
    pub buffered_messages: i64,
    /// Lines in the active topology.
    pub tracked_lines: i64,
    /// Batches dispatched into the monitor.
    pub batches_applied_total: u64,
    /// Batches discarded because the topology or session changed mid-fetch.
    pub stale_batches_total: u64,
    /// Reloads that failed to fetch a batch.
    pub reload_failures_total: u64,
    /// Alerts appended across all lines.
    pub alerts_raised_total: u64,
    /// Duration of the latest reload (ms).
    pub reload_latency_ms: i64,
}

impl Metrics {
    /// Construct a new metrics registry with the standard collectors registered.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the Prometheus collectors cannot be built or
    /// registered.
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let http_requests_total = counter_vec(
            &registry,
            "http_requests_total",
            "HTTP requests by route template, method and status code",
            &["route", "method", "code"],
        )?;
        let cfx_messages_received_total = counter_vec(
            &registry,
            "cfx_messages_received_total",
            "CFX payloads received from the broker by decode outcome",
            &["outcome"],
        )?;
        let dispatch_messages_total = counter_vec(
            &registry,
            "dispatch_messages_total",
            "Messages handled by the dispatcher by outcome",
            &["outcome"],
        )?;
        let alerts_raised_total = register(
            &registry,
            "alerts_raised_total",
            IntCounter::with_opts(Opts::new(
                "alerts_raised_total",
                "Alerts appended to line feeds",
            )),
        )?;
        let batches_applied_total = register(
            &registry,
            "batches_applied_total",
            IntCounter::with_opts(Opts::new(
                "batches_applied_total",
                "Batches dispatched into the monitor",
            )),
        )?;
        let stale_batches_total = register(
            &registry,
            "stale_batches_total",
            IntCounter::with_opts(Opts::new(
                "stale_batches_total",
                "Fetched batches discarded because the monitor generation changed",
            )),
        )?;
        let reload_failures_total = register(
            &registry,
            "reload_failures_total",
            IntCounter::with_opts(Opts::new(
                "reload_failures_total",
                "Reloads whose batch fetch failed or timed out",
            )),
        )?;
        let buffered_messages = register(
            &registry,
            "buffered_messages",
            IntGauge::with_opts(Opts::new(
                "buffered_messages",
                "CFX messages held in the ingest buffer",
            )),
        )?;
        let tracked_lines = register(
            &registry,
            "tracked_lines",
            IntGauge::with_opts(Opts::new("tracked_lines", "Lines in the active topology")),
        )?;
        let reload_latency_ms = register(
            &registry,
            "reload_latency_ms",
            IntGauge::with_opts(Opts::new(
                "reload_latency_ms",
                "Duration of the latest fetch and dispatch (ms)",
            )),
        )?;

        Ok(Self {
            inner: Arc::new(MetricsInner {
                registry,
                http_requests_total,
                cfx_messages_received_total,
                dispatch_messages_total,
                alerts_raised_total,
                batches_applied_total,
                stale_batches_total,
                reload_failures_total,
                buffered_messages,
                tracked_lines,
                reload_latency_ms,
            }),
        })
    }

    /// Increment the HTTP request counter for a route template, method and status code.
    pub fn inc_http_request(&self, route: &str, method: &str, status: u16) {
        self.inner
            .http_requests_total
            .with_label_values(&[route, method, &status.to_string()])
            .inc();
    }

    /// Count a broker payload by decode outcome (see [`received`]).
    pub fn inc_cfx_received(&self, outcome: &str) {
        self.inner
            .cfx_messages_received_total
            .with_label_values(&[outcome])
            .inc();
    }

    /// Add `count` dispatched messages under an outcome (see [`dispatched`]).
    pub fn add_dispatched(&self, outcome: &str, count: usize) {
        self.inner
            .dispatch_messages_total
            .with_label_values(&[outcome])
            .inc_by(Self::usize_to_u64(count));
    }

    /// Add raised alerts.
    pub fn add_alerts_raised(&self, count: usize) {
        self.inner
            .alerts_raised_total
            .inc_by(Self::usize_to_u64(count));
    }

    /// Increment the applied batch counter.
    pub fn inc_batch_applied(&self) {
        self.inner.batches_applied_total.inc();
    }

    /// Increment the stale batch counter.
    pub fn inc_stale_batch(&self) {
        self.inner.stale_batches_total.inc();
    }

    /// Increment the reload failure counter.
    pub fn inc_reload_failure(&self) {
        self.inner.reload_failures_total.inc();
    }

    /// Set the buffered message gauge.
    pub fn set_buffered_messages(&self, count: usize) {
        self.inner.buffered_messages.set(Self::usize_to_i64(count));
    }

    /// Set the tracked line gauge.
    pub fn set_tracked_lines(&self, count: usize) {
        self.inner.tracked_lines.set(Self::usize_to_i64(count));
    }

    /// Record how long the latest reload took.
    pub fn observe_reload_latency(&self, duration: Duration) {
        self.inner
            .reload_latency_ms
            .set(Self::duration_to_ms(duration));
    }

    /// Render the metrics registry using the Prometheus text exposition format.
    ///
    /// # Errors
    ///
    /// Returns an error if the metrics cannot be encoded or if the encoded
    /// buffer is not valid UTF-8.
    pub fn render(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.inner.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|source| TelemetryError::MetricsEncode { source })?;
        String::from_utf8(buffer).map_err(|source| TelemetryError::MetricsUtf8 { source })
    }

    /// Take a point-in-time snapshot of the most relevant gauges and counters.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            buffered_messages: self.inner.buffered_messages.get(),
            tracked_lines: self.inner.tracked_lines.get(),
            batches_applied_total: self.inner.batches_applied_total.get(),
            stale_batches_total: self.inner.stale_batches_total.get(),
            reload_failures_total: self.inner.reload_failures_total.get(),
            alerts_raised_total: self.inner.alerts_raised_total.get(),
            reload_latency_ms: self.inner.reload_latency_ms.get(),
        }
    }

    /// Convert a duration to milliseconds saturating at `i64::MAX`.
    pub(crate) fn duration_to_ms(duration: Duration) -> i64 {
        i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
    }

    fn usize_to_i64(value: usize) -> i64 {
        i64::try_from(value).unwrap_or(i64::MAX)
    }

    fn usize_to_u64(value: usize) -> u64 {
        u64::try_from(value).unwrap_or(u64::MAX)
    }
}

fn counter_vec(
    registry: &Registry,
    name: &'static str,
    help: &str,
    labels: &[&str],
) -> Result<IntCounterVec> {
    register(registry, name, IntCounterVec::new(Opts::new(name, help), labels))
}

fn register<C>(
    registry: &Registry,
    name: &'static str,
    collector: prometheus::Result<C>,
) -> Result<C>
where
    C: Collector + Clone + 'static,
{
    let collector =
        collector.map_err(|source| TelemetryError::MetricsCollector { name, source })?;
    registry
        .register(Box::new(collector.clone()))
        .map_err(|source| TelemetryError::MetricsRegister { name, source })?;
    Ok(collector)
}
