//! Metrics collection for observability

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec_with_registry, register_counter_with_registry,
    register_histogram_vec_with_registry, register_histogram_with_registry,
    register_int_gauge_with_registry, Counter, CounterVec, Histogram, HistogramOpts,
    HistogramVec, IntGauge, Opts, Registry,
};
use std::sync::Arc;
use std::time::Duration;

/// Global metrics registry
pub static METRICS: Lazy<Arc<Metrics>> =
    Lazy::new(|| Arc::new(Metrics::new().expect("Failed to initialize metrics")));

/// Metrics collector
pub struct Metrics {
    registry: Registry,

    // Compression metrics
    pub compression_passes: CounterVec,
    pub messages_removed: Counter,
    pub summaries_created: Counter,
    pub compression_ratio: Histogram,
    pub compression_duration: Histogram,

    // Session metrics
    pub active_sessions: IntGauge,
    pub chat_turns: CounterVec,

    // Tool metrics
    pub tool_executions: CounterVec,
    pub tool_duration: HistogramVec,
}

impl Metrics {
    /// Create a new metrics collector with its own registry
    pub fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let registry = Registry::new();

        let compression_passes = register_counter_vec_with_registry!(
            Opts::new("compression_passes_total", "Total compression passes"),
            &["outcome"],
            registry
        )?;

        let messages_removed = register_counter_with_registry!(
            Opts::new(
                "compression_messages_removed_total",
                "Total messages folded into summaries"
            ),
            registry
        )?;

        let summaries_created = register_counter_with_registry!(
            Opts::new(
                "compression_summaries_created_total",
                "Total summary messages synthesized"
            ),
            registry
        )?;

        let compression_ratio = register_histogram_with_registry!(
            HistogramOpts::new("compression_ratio", "Compressed over original message count")
                .buckets(vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9, 1.0]),
            registry
        )?;

        let compression_duration = register_histogram_with_registry!(
            HistogramOpts::new(
                "compression_duration_seconds",
                "Compression pass duration in seconds"
            )
            .buckets(vec![0.00001, 0.0001, 0.001, 0.01, 0.1]),
            registry
        )?;

        let active_sessions = register_int_gauge_with_registry!(
            Opts::new("sessions_active", "Sessions currently held by the store"),
            registry
        )?;

        let chat_turns = register_counter_vec_with_registry!(
            Opts::new("chat_turns_total", "Total chat turns"),
            &["status"],
            registry
        )?;

        let tool_executions = register_counter_vec_with_registry!(
            Opts::new("tool_executions_total", "Total tool executions"),
            &["tool", "status"],
            registry
        )?;

        let tool_duration = register_histogram_vec_with_registry!(
            "tool_duration_seconds",
            "Tool execution duration in seconds",
            &["tool"],
            registry
        )?;

        Ok(Self {
            registry,
            compression_passes,
            messages_removed,
            summaries_created,
            compression_ratio,
            compression_duration,
            active_sessions,
            chat_turns,
            tool_executions,
            tool_duration,
        })
    }

    /// Get the registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Record a compression pass below the trigger threshold
    pub fn record_noop(&self) {
        self.compression_passes.with_label_values(&["noop"]).inc();
    }

    /// Record a completed compression pass
    pub fn record_compression(
        &self,
        removed: usize,
        ratio: f64,
        summarized: bool,
        elapsed: Duration,
    ) {
        self.compression_passes.with_label_values(&["compressed"]).inc();
        self.messages_removed.inc_by(removed as f64);
        self.compression_ratio.observe(ratio);
        self.compression_duration.observe(elapsed.as_secs_f64());
        if summarized {
            self.summaries_created.inc();
        }
    }

    /// Record a chat turn outcome
    pub fn record_chat_turn(&self, success: bool) {
        let status = if success { "success" } else { "error" };
        self.chat_turns.with_label_values(&[status]).inc();
    }

    /// Record a tool execution
    pub fn record_tool(&self, tool: &str, success: bool, elapsed: Duration) {
        let status = if success { "success" } else { "error" };
        self.tool_executions.with_label_values(&[tool, status]).inc();
        self.tool_duration
            .with_label_values(&[tool])
            .observe(elapsed.as_secs_f64());
    }

    /// Export metrics in Prometheus text format
    pub fn export_prometheus(&self) -> String {
        use prometheus::Encoder;

        let encoder = prometheus::TextEncoder::new();
        let metric_families = self.registry.gather();

        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer).unwrap_or_default();

        String::from_utf8(buffer).unwrap_or_default()
    }
}
