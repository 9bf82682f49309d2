//! Prometheus metrics for the gateway.
//!
//! # Metrics Exposed
//!
//! - `graphql_requests_total` - GraphQL requests by operation type
//! - `graphql_request_duration_seconds` - Request latency histogram
//! - `graphql_errors_total` - GraphQL errors by error code
//! - `wish_backend_requests_total` - Wish Service calls by method
//! - `wish_backend_duration_seconds` - Wish Service latency histogram
//! - `wish_backend_errors_total` - Wish Service failures by method and code

use once_cell::sync::Lazy;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, Encoder, HistogramVec, IntCounterVec,
    TextEncoder,
};
use std::time::Instant;

/// Default histogram buckets for latency measurements (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

/// Global metrics registry for the gateway
static METRICS: Lazy<GatewayMetrics> = Lazy::new(GatewayMetrics::new);

/// Gateway metrics registered in the default Prometheus registry.
#[derive(Clone)]
pub struct GatewayMetrics {
    /// Total GraphQL requests by operation type
    pub graphql_requests: IntCounterVec,
    /// GraphQL request duration in seconds
    pub graphql_duration: HistogramVec,
    /// Total GraphQL errors by code
    pub graphql_errors: IntCounterVec,
    /// Total Wish Service calls by method
    pub backend_requests: IntCounterVec,
    /// Wish Service call duration in seconds
    pub backend_duration: HistogramVec,
    /// Wish Service failures by method and code
    pub backend_errors: IntCounterVec,
}

impl GatewayMetrics {
    fn new() -> Self {
        Self {
            graphql_requests: register_int_counter_vec!(
                "graphql_requests_total",
                "Total number of GraphQL requests",
                &["operation"]
            )
            .expect("metric can be created"),

            graphql_duration: register_histogram_vec!(
                "graphql_request_duration_seconds",
                "GraphQL request duration in seconds",
                &["operation"],
                LATENCY_BUCKETS.to_vec()
            )
            .expect("metric can be created"),

            graphql_errors: register_int_counter_vec!(
                "graphql_errors_total",
                "Total number of GraphQL errors",
                &["code"]
            )
            .expect("metric can be created"),

            backend_requests: register_int_counter_vec!(
                "wish_backend_requests_total",
                "Total number of Wish Service calls",
                &["method"]
            )
            .expect("metric can be created"),

            backend_duration: register_histogram_vec!(
                "wish_backend_duration_seconds",
                "Wish Service call duration in seconds",
                &["method"],
                LATENCY_BUCKETS.to_vec()
            )
            .expect("metric can be created"),

            backend_errors: register_int_counter_vec!(
                "wish_backend_errors_total",
                "Total number of failed Wish Service calls",
                &["method", "code"]
            )
            .expect("metric can be created"),
        }
    }

    /// Get the global metrics instance
    pub fn global() -> &'static Self {
        &METRICS
    }

    /// Record a GraphQL error
    pub fn record_graphql_error(&self, code: &str) {
        self.graphql_errors.with_label_values(&[code]).inc();
    }

    /// Number of GraphQL requests seen for an operation type
    pub fn requests_total(&self, operation: &str) -> u64 {
        self.graphql_requests.with_label_values(&[operation]).get()
    }

    /// Render all metrics in Prometheus text format
    pub fn render(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = prometheus::gather();
        let mut buffer = Vec::new();
        if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
            tracing::warn!(error = %e, "failed to encode metrics");
        }
        String::from_utf8_lossy(&buffer).into_owned()
    }
}

/// A timer that records duration to a histogram when dropped
pub struct RequestTimer {
    start: Instant,
    operation: &'static str,
    metrics: &'static GatewayMetrics,
}

impl RequestTimer {
    /// Start a new request timer for the given operation type
    pub fn new(operation: &'static str) -> Self {
        let metrics = GatewayMetrics::global();
        metrics
            .graphql_requests
            .with_label_values(&[operation])
            .inc();
        Self {
            start: Instant::now(),
            operation,
            metrics,
        }
    }

    /// Record an error for this request
    pub fn record_error(&self, code: &str) {
        self.metrics.record_graphql_error(code);
    }
}

impl Drop for RequestTimer {
    fn drop(&mut self) {
        self.metrics
            .graphql_duration
            .with_label_values(&[self.operation])
            .observe(self.start.elapsed().as_secs_f64());
    }
}

/// Timer for Wish Service calls
pub struct BackendTimer {
    start: Instant,
    method: &'static str,
    metrics: &'static GatewayMetrics,
}

impl BackendTimer {
    /// Start a new backend call timer
    pub fn new(method: &'static str) -> Self {
        let metrics = GatewayMetrics::global();
        metrics.backend_requests.with_label_values(&[method]).inc();
        Self {
            start: Instant::now(),
            method,
            metrics,
        }
    }

    /// Record a failure for this call
    pub fn record_error(&self, code: &str) {
        self.metrics
            .backend_errors
            .with_label_values(&[self.method, code])
            .inc();
    }
}

impl Drop for BackendTimer {
    fn drop(&mut self) {
        self.metrics
            .backend_duration
            .with_label_values(&[self.method])
            .observe(self.start.elapsed().as_secs_f64());
    }
}
