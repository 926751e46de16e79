// src/metrics/collector.rs
use crate::check::ExecutionOutcome;
use anyhow::Result;
use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::Arc;

pub struct MetricsRegistry {
    registry: Registry,
    collector: Arc<MetricsCollector>,
}

impl MetricsRegistry {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();
        let collector = Arc::new(MetricsCollector::new(&registry)?);

        Ok(Self {
            registry,
            collector,
        })
    }

    pub fn collector(&self) -> Arc<MetricsCollector> {
        self.collector.clone()
    }

    /// Encode every registered metric in the Prometheus text format.
    pub fn gather(&self) -> Result<Vec<u8>> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(buffer)
    }
}

pub struct MetricsCollector {
    pub requests_total: IntCounterVec,
    pub checks_total: IntCounterVec,
    pub check_duration_seconds: HistogramVec,
}

impl MetricsCollector {
    pub fn new(registry: &Registry) -> Result<Self> {
        let requests_total = IntCounterVec::new(
            Opts::new("script_monitor_requests_total", "Total number of requests"),
            &["status_code"],
        )?;
        registry.register(Box::new(requests_total.clone()))?;

        let checks_total = IntCounterVec::new(
            Opts::new("script_monitor_checks_total", "Total number of executed checks"),
            &["check", "result"],
        )?;
        registry.register(Box::new(checks_total.clone()))?;

        // Upper buckets cover groups that run several scripts back to back.
        let check_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "script_monitor_check_duration_seconds",
                "Check wall-clock duration in seconds",
            )
            .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 20.0, 60.0]),
            &["check"],
        )?;
        registry.register(Box::new(check_duration_seconds.clone()))?;

        Ok(Self {
            requests_total,
            checks_total,
            check_duration_seconds,
        })
    }

    pub fn record_request(&self, status_code: u16) {
        let status = status_code.to_string();
        self.requests_total
            .with_label_values(&[status.as_str()])
            .inc();
    }

    pub fn record_outcome(&self, check: &str, outcome: &ExecutionOutcome) {
        let result = if outcome.success {
            "passed"
        } else if outcome.is_timeout() {
            "timeout"
        } else {
            "failed"
        };
        self.checks_total.with_label_values(&[check, result]).inc();
        self.check_duration_seconds
            .with_label_values(&[check])
            .observe(outcome.elapsed.as_secs_f64());
    }

    pub fn record_error(&self, check: &str) {
        self.checks_total.with_label_values(&[check, "error"]).inc();
    }
}
