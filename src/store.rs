//! Per-Rule Metric Store
//!
//! Each extraction rule owns one [`MetricStore`]: a map from device identifier to the
//! last observed value, shared between the updater (sole writer) and scrape requests
//! (readers).
//!
//! # Consistency
//!
//! Every mutation takes the write lock for exactly one map operation, so a reader
//! never sees a half-written entry. A scrape that interleaves with an update cycle
//! may observe some devices with this cycle's values and others with the previous
//! cycle's values. Consistency is per entry, not per cycle, and never across stores.
//!
//! The store is registered directly with the Prometheus registry; on every gather it
//! renders one gauge series per stored device.

use crate::error::Result;
use crate::rules::{ExtractionRule, MetricDescriptor};
use prometheus::core::{Collector, Desc};
use prometheus::proto::MetricFamily;
use prometheus::{GaugeVec, Opts};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, error};

/// Concurrency-safe device → value map for a single metric
///
/// Cloning is cheap and yields another handle to the same underlying map.
#[derive(Clone)]
pub struct MetricStore {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    descriptor: MetricDescriptor,
    // Only used for its descriptor; series are built fresh per gather.
    template: GaugeVec,
    values: RwLock<HashMap<String, f64>>,
}

impl MetricStore {
    pub fn new(descriptor: MetricDescriptor) -> Result<Self> {
        let template = gauge_vec(&descriptor)?;

        Ok(Self {
            inner: Arc::new(StoreInner {
                descriptor,
                template,
                values: RwLock::new(HashMap::new()),
            }),
        })
    }

    pub fn for_rule(rule: &ExtractionRule) -> Result<Self> {
        Self::new(rule.descriptor().clone())
    }

    pub fn descriptor(&self) -> &MetricDescriptor {
        &self.inner.descriptor
    }

    pub fn name(&self) -> &str {
        &self.inner.descriptor.name
    }

    /// Inserts or overwrites the value for `device`
    pub fn set(&self, device: &str, value: f64) {
        let mut values = self.write();
        values.insert(device.to_string(), value);
    }

    /// Removes the entry for `device`; absent devices are a no-op
    pub fn delete(&self, device: &str) -> bool {
        self.write().remove(device).is_some()
    }

    pub fn get(&self, device: &str) -> Option<f64> {
        self.read().get(device).copied()
    }

    /// Read-locked view of the store, released when the snapshot is dropped
    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot { guard: self.read() }
    }

    pub fn devices(&self) -> Vec<String> {
        self.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Drops every entry whose device is not in `present`, returning the removed devices
    pub fn retain_devices(&self, present: &HashSet<String>) -> Vec<String> {
        let mut values = self.write();
        let stale: Vec<String> = values
            .keys()
            .filter(|device| !present.contains(*device))
            .cloned()
            .collect();

        for device in &stale {
            debug!(device = %device, metric = self.name(), "removing metric value");
            values.remove(device);
        }

        stale
    }

    // Store operations are total: a writer that panicked mid-insert cannot leave a
    // HashMap entry half-written, so a poisoned lock is safe to keep using.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, f64>> {
        self.inner.values.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, f64>> {
        self.inner.values.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for MetricStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricStore")
            .field("name", &self.name())
            .field("devices", &self.len())
            .finish()
    }
}

/// Point-in-time view of one store
pub struct Snapshot<'a> {
    guard: RwLockReadGuard<'a, HashMap<String, f64>>,
}

impl Snapshot<'_> {
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.guard.iter().map(|(device, value)| (device.as_str(), *value))
    }

    pub fn len(&self) -> usize {
        self.guard.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guard.is_empty()
    }

    /// Copies the view into an ordered map
    pub fn to_map(&self) -> BTreeMap<String, f64> {
        self.iter()
            .map(|(device, value)| (device.to_string(), value))
            .collect()
    }
}

impl Collector for MetricStore {
    fn desc(&self) -> Vec<&Desc> {
        self.inner.template.desc()
    }

    fn collect(&self) -> Vec<MetricFamily> {
        let snapshot = self.snapshot();
        if snapshot.is_empty() {
            return Vec::new();
        }

        let gauges = match gauge_vec(&self.inner.descriptor) {
            Ok(gauges) => gauges,
            Err(e) => {
                error!(metric = self.name(), "Failed to build gauge vector: {}", e);
                return Vec::new();
            }
        };

        for (device, value) in snapshot.iter() {
            gauges.with_label_values(&[device]).set(value);
        }
        drop(snapshot);

        gauges.collect()
    }
}

fn gauge_vec(descriptor: &MetricDescriptor) -> Result<GaugeVec> {
    let label_keys: Vec<&str> = descriptor.label_keys.iter().map(String::as_str).collect();
    let gauges = GaugeVec::new(
        Opts::new(descriptor.name.as_str(), descriptor.help.as_str()),
        &label_keys,
    )?;
    Ok(gauges)
}
