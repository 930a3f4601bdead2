//! Prometheus Metrics Registry
//!
//! Owns the registry exposed on `/metrics`: one [`MetricStore`] per extraction rule
//! plus a couple of gauges describing the exporter itself.
//!
//! # Metrics
//!
//! - `smart_reallocated_sectors_total{device}`
//! - `smart_grown_defect_list_total{device}`
//! - `smart_read_uncorrected_errors_total{device}`
//! - `smart_write_uncorrected_errors_total{device}`
//! - `smart_exporter_up` - 1 if the last device enumeration succeeded
//! - `smart_exporter_last_update_timestamp_seconds` - end of the last completed cycle
//!
//! Per-device series only appear once a value has been stored, and disappear when the
//! device stops being enumerated.

use crate::rules::{default_rules, ExtractionRule};
use crate::store::MetricStore;
use prometheus::{Encoder, Gauge, Opts, Registry, TextEncoder};
use std::sync::Arc;

/// Registry plus every metric the exporter publishes
#[derive(Clone)]
pub struct MetricsCollector {
    registry: Arc<Registry>,
    rules: Arc<[(ExtractionRule, MetricStore)]>,

    pub up: Arc<Gauge>,
    pub last_update_timestamp_seconds: Arc<Gauge>,
}

impl MetricsCollector {
    /// Builds the collector with the built-in rule table
    pub fn new() -> anyhow::Result<Self> {
        Self::with_rules(default_rules()?)
    }

    pub fn with_rules(rules: Vec<ExtractionRule>) -> anyhow::Result<Self> {
        let registry = Registry::new();

        let mut paired = Vec::with_capacity(rules.len());
        for rule in rules {
            let store = MetricStore::for_rule(&rule)?;
            registry.register(Box::new(store.clone()))?;
            paired.push((rule, store));
        }

        let up = Gauge::with_opts(Opts::new(
            "smart_exporter_up",
            "Whether the last block device enumeration succeeded (1=yes, 0=no)",
        ))?;

        let last_update_timestamp_seconds = Gauge::with_opts(Opts::new(
            "smart_exporter_last_update_timestamp_seconds",
            "Unix timestamp of the last completed update cycle",
        ))?;

        registry.register(Box::new(up.clone()))?;
        registry.register(Box::new(last_update_timestamp_seconds.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            rules: paired.into(),
            up: Arc::new(up),
            last_update_timestamp_seconds: Arc::new(last_update_timestamp_seconds),
        })
    }

    /// Rule/store pairs in rule declaration order
    pub fn rules(&self) -> Arc<[(ExtractionRule, MetricStore)]> {
        self.rules.clone()
    }

    pub fn stores(&self) -> impl Iterator<Item = &MetricStore> {
        self.rules.iter().map(|(_, store)| store)
    }

    /// Looks up a store by metric name
    pub fn store(&self, name: &str) -> Option<&MetricStore> {
        self.stores().find(|store| store.name() == name)
    }

    /// Render metrics in Prometheus text format
    pub fn render(&self) -> anyhow::Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}
