//! Prometheus metrics for the model server
//!
//! Registered once into the process-global registry; [`ServerMetrics`] is
//! a cheap cloneable handle.

use prometheus::{
    register_gauge_vec, register_histogram, register_int_counter, register_int_counter_vec,
    register_int_gauge, GaugeVec, Histogram, IntCounter, IntCounterVec, IntGauge,
};
use std::sync::OnceLock;

/// Histogram buckets for request latencies (seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.0001, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0,
];

static GLOBAL_METRICS: OnceLock<ServerMetricsInner> = OnceLock::new();

struct ServerMetricsInner {
    predict_latency_seconds: Histogram,
    learn_latency_seconds: Histogram,
    predictions_total: IntCounter,
    learns_total: IntCounter,
    request_errors_total: IntCounterVec,
    pending_samples: IntGauge,
    model_info: GaugeVec,
}

impl ServerMetricsInner {
    fn new() -> Self {
        Self {
            predict_latency_seconds: register_histogram!(
                "model_server_predict_latency_seconds",
                "Time spent serving a predict request",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register predict_latency_seconds"),

            learn_latency_seconds: register_histogram!(
                "model_server_learn_latency_seconds",
                "Time spent serving a learn request",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register learn_latency_seconds"),

            predictions_total: register_int_counter!(
                "model_server_predictions_total",
                "Total number of predictions served"
            )
            .expect("Failed to register predictions_total"),

            learns_total: register_int_counter!(
                "model_server_learns_total",
                "Total number of learn calls applied"
            )
            .expect("Failed to register learns_total"),

            request_errors_total: register_int_counter_vec!(
                "model_server_request_errors_total",
                "Request errors by kind",
                &["kind"]
            )
            .expect("Failed to register request_errors_total"),

            pending_samples: register_int_gauge!(
                "model_server_pending_samples",
                "Number of cached samples awaiting ground truth"
            )
            .expect("Failed to register pending_samples"),

            model_info: register_gauge_vec!(
                "model_server_model_info",
                "Information about the currently active model",
                &["name", "flavor"]
            )
            .expect("Failed to register model_info"),
        }
    }
}

/// Handle to the global server metrics
///
/// A lightweight handle; clones share the same underlying metrics.
#[derive(Clone)]
pub struct ServerMetrics {
    _private: (),
}

impl Default for ServerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerMetrics {
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(ServerMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &ServerMetricsInner {
        GLOBAL_METRICS.get().expect("Metrics not initialized")
    }

    pub fn observe_predict_latency(&self, duration_secs: f64) {
        self.inner().predict_latency_seconds.observe(duration_secs);
    }

    pub fn observe_learn_latency(&self, duration_secs: f64) {
        self.inner().learn_latency_seconds.observe(duration_secs);
    }

    pub fn inc_predictions(&self) {
        self.inner().predictions_total.inc();
    }

    pub fn inc_learns(&self) {
        self.inner().learns_total.inc();
    }

    pub fn inc_request_error(&self, kind: &str) {
        self.inner().request_errors_total.with_label_values(&[kind]).inc();
    }

    pub fn set_pending_samples(&self, count: i64) {
        self.inner().pending_samples.set(count);
    }

    /// Replace the model info labels with the active model
    pub fn set_model_info(&self, name: &str, flavor: &str) {
        let info = &self.inner().model_info;
        info.reset();
        info.with_label_values(&[name, flavor]).set(1.0);
    }

    pub fn clear_model_info(&self) {
        self.inner().model_info.reset();
    }
}
