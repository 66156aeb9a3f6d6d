//! Prometheus-backed metrics registry and snapshot helpers.
//!
//! # Design
//! - Encapsulates collector registration to keep the public API small.
//! - Exposes the counters/gauges relevant to the conversion pipeline.

use anyhow::{Context, Result};
use prometheus::{Encoder, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use serde::Serialize;

/// Prometheus-backed metrics registry shared across services.
#[derive(Clone)]
pub struct Metrics {
    inner: std::sync::Arc<MetricsInner>,
}

struct MetricsInner {
    registry: Registry,
    http_requests_total: IntCounterVec,
    pipeline_steps_total: IntCounterVec,
    operations_total: IntCounterVec,
    scratch_files: IntGauge,
}

/// Snapshot of selected gauges for health reporting.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    /// Temporary files currently materialised on scratch storage.
    pub scratch_files: i64,
}

impl Metrics {
    /// Construct a new metrics registry with the standard collectors registered.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the Prometheus collectors cannot be
    /// registered.
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let http_requests_total = IntCounterVec::new(
            Opts::new("http_requests_total", "Total HTTP requests received"),
            &["route", "code"],
        )?;
        let pipeline_steps_total = IntCounterVec::new(
            Opts::new(
                "pipeline_steps_total",
                "Conversion pipeline steps executed by status",
            ),
            &["step", "status"],
        )?;
        let operations_total = IntCounterVec::new(
            Opts::new(
                "operations_total",
                "Conversion operations completed by outcome",
            ),
            &["operation", "outcome"],
        )?;
        let scratch_files = IntGauge::with_opts(Opts::new(
            "scratch_files",
            "Temporary files currently on scratch storage",
        ))?;

        registry.register(Box::new(http_requests_total.clone()))?;
        registry.register(Box::new(pipeline_steps_total.clone()))?;
        registry.register(Box::new(operations_total.clone()))?;
        registry.register(Box::new(scratch_files.clone()))?;

        Ok(Self {
            inner: std::sync::Arc::new(MetricsInner {
                registry,
                http_requests_total,
                pipeline_steps_total,
                operations_total,
                scratch_files,
            }),
        })
    }

    /// Increment the HTTP request counter for the given route and status code.
    pub fn inc_http_request(&self, route: &str, status: u16) {
        self.inner
            .http_requests_total
            .with_label_values(&[route, &status.to_string()])
            .inc();
    }

    /// Increment the pipeline step counter.
    pub fn inc_pipeline_step(&self, step: &str, status: &str) {
        self.inner
            .pipeline_steps_total
            .with_label_values(&[step, status])
            .inc();
    }

    /// Increment the per-operation outcome counter.
    pub fn inc_operation(&self, operation: &str, outcome: &str) {
        self.inner
            .operations_total
            .with_label_values(&[operation, outcome])
            .inc();
    }

    /// Record a scratch file being materialised.
    pub fn inc_scratch_files(&self) {
        self.inner.scratch_files.inc();
    }

    /// Record a scratch file being released.
    pub fn dec_scratch_files(&self) {
        self.inner.scratch_files.dec();
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
            .context("failed to encode Prometheus metrics")?;
        String::from_utf8(buffer).context("metrics output was not valid UTF-8")
    }

    /// Take a point-in-time snapshot of the most relevant gauges.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            scratch_files: self.inner.scratch_files.get(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metrics_snapshot_reflects_updates() -> Result<()> {
        let metrics = Metrics::new()?;
        metrics.inc_http_request("/compress/compress-pdf", 200);
        metrics.inc_pipeline_step("ingest", "completed");
        metrics.inc_operation("compress", "success");
        metrics.inc_scratch_files();
        metrics.inc_scratch_files();
        metrics.dec_scratch_files();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.scratch_files, 1);

        let rendered = metrics.render()?;
        assert!(rendered.contains("http_requests_total"));
        assert!(rendered.contains("pipeline_steps_total"));
        assert!(rendered.contains("operations_total"));
        Ok(())
    }
}
