//! Metrics and observability utilities
//!
//! Provides Prometheus metrics with standardized naming conventions.

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram, Unit};
use std::time::Instant;

/// Metrics prefix for all CoachTree metrics
pub const METRICS_PREFIX: &str = "coachtree";

/// Histogram buckets for in-memory computations (in seconds)
pub const COMPUTE_BUCKETS: &[f64] = &[
    0.0001, // 100us
    0.0005, // 500us
    0.001,  // 1ms
    0.005,  // 5ms
    0.010,  // 10ms
    0.050,  // 50ms
    0.100,  // 100ms
    0.500,  // 500ms
    1.000,  // 1s
];

/// Register all metric descriptions
pub fn register_metrics() {
    // Request metrics
    describe_counter!(
        format!("{}_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total number of HTTP requests"
    );

    describe_histogram!(
        format!("{}_request_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "HTTP request latency in seconds"
    );

    // Scoring metrics
    describe_counter!(
        format!("{}_scoring_runs_total", METRICS_PREFIX),
        Unit::Count,
        "Total influence scoring runs"
    );

    describe_histogram!(
        format!("{}_scoring_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Influence scoring latency in seconds"
    );

    describe_gauge!(
        format!("{}_scored_population_size", METRICS_PREFIX),
        Unit::Count,
        "Number of coaches in the last scored population"
    );

    // Inference metrics
    describe_counter!(
        format!("{}_relationships_inferred_total", METRICS_PREFIX),
        Unit::Count,
        "Total mentor/disciple edges inferred from tenures"
    );

    // Projection metrics
    describe_histogram!(
        format!("{}_projection_nodes", METRICS_PREFIX),
        Unit::Count,
        "Nodes in a projected lineage tree"
    );

    // Loading metrics
    describe_counter!(
        format!("{}_records_rejected_total", METRICS_PREFIX),
        Unit::Count,
        "Coach records rejected at load time"
    );

    // Cache metrics
    describe_counter!(
        format!("{}_cache_hits_total", METRICS_PREFIX),
        Unit::Count,
        "Total cache hits"
    );

    describe_counter!(
        format!("{}_cache_misses_total", METRICS_PREFIX),
        Unit::Count,
        "Total cache misses"
    );

    tracing::info!("Metrics registered");
}

/// Helper to record request metrics
pub struct RequestMetrics {
    start: Instant,
    endpoint: String,
    method: String,
}

impl RequestMetrics {
    /// Start tracking a request
    pub fn start(method: &str, endpoint: &str) -> Self {
        Self {
            start: Instant::now(),
            endpoint: endpoint.to_string(),
            method: method.to_string(),
        }
    }

    /// Record request completion
    pub fn finish(self, status: u16) {
        let duration = self.start.elapsed().as_secs_f64();

        counter!(
            format!("{}_requests_total", METRICS_PREFIX),
            "method" => self.method.clone(),
            "endpoint" => self.endpoint.clone(),
            "status" => status.to_string()
        )
        .increment(1);

        histogram!(
            format!("{}_request_duration_seconds", METRICS_PREFIX),
            "method" => self.method,
            "endpoint" => self.endpoint
        )
        .record(duration);
    }
}

/// Helper to record scoring metrics
pub fn record_scoring(duration_secs: f64, population: &str, coach_count: usize) {
    counter!(
        format!("{}_scoring_runs_total", METRICS_PREFIX),
        "population" => population.to_string()
    )
    .increment(1);

    histogram!(
        format!("{}_scoring_duration_seconds", METRICS_PREFIX),
        "population" => population.to_string()
    )
    .record(duration_secs);

    gauge!(
        format!("{}_scored_population_size", METRICS_PREFIX),
        "population" => population.to_string()
    )
    .set(coach_count as f64);
}

/// Helper to record inference metrics
pub fn record_inference(edges_added: usize) {
    counter!(format!("{}_relationships_inferred_total", METRICS_PREFIX))
        .increment(edges_added as u64);
}

/// Helper to record projection metrics
pub fn record_projection(node_count: usize) {
    histogram!(format!("{}_projection_nodes", METRICS_PREFIX)).record(node_count as f64);
}

/// Helper to record load-time rejections
pub fn record_rejections(count: usize) {
    counter!(format!("{}_records_rejected_total", METRICS_PREFIX)).increment(count as u64);
}

/// Helper to record cache metrics
pub fn record_cache(hit: bool, cache_name: &str) {
    if hit {
        counter!(
            format!("{}_cache_hits_total", METRICS_PREFIX),
            "cache" => cache_name.to_string()
        )
        .increment(1);
    } else {
        counter!(
            format!("{}_cache_misses_total", METRICS_PREFIX),
            "cache" => cache_name.to_string()
        )
        .increment(1);
    }
}
