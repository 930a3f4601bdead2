//! Periodic SMART Update Loop
//!
//! One background task drives every cycle:
//!
//! 1. List block devices (abort the cycle on failure, so nothing is removed by mistake)
//! 2. Keep whole disks only
//! 3. Sample every disk concurrently, bounded by `max_concurrent_samples`
//! 4. Retire values for devices that are no longer listed
//!
//! The first cycle runs immediately on start; later cycles follow the configured
//! interval. Store locks are never held across a smartctl invocation, so a slow disk
//! cannot stall `/metrics`.

use crate::devices::{Device, DeviceSource};
use crate::metrics::MetricsCollector;
use crate::reconcile::reconcile;
use crate::sampler::{DeviceSampler, DiagnosticTool, SampleStatus};
use futures_util::stream::{self, StreamExt};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info};

/// Result of one [`Updater::update`] pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    Completed {
        /// Disks that answered smartctl
        sampled: usize,
        /// Disks skipped because smartctl failed
        failed: usize,
        /// Store entries removed for devices no longer present
        removed: usize,
    },
    /// Device enumeration failed; no sampling or reconciliation happened
    Aborted,
}

pub struct Updater {
    source: Arc<dyn DeviceSource>,
    sampler: DeviceSampler,
    metrics: MetricsCollector,
    interval: Duration,
    concurrency: Option<usize>,
}

impl Updater {
    pub fn new(
        source: Arc<dyn DeviceSource>,
        tool: Arc<dyn DiagnosticTool>,
        metrics: MetricsCollector,
        interval: Duration,
    ) -> Self {
        let sampler = DeviceSampler::new(tool, metrics.rules());
        Self {
            source,
            sampler,
            metrics,
            interval,
            concurrency: None,
        }
    }

    /// Caps simultaneous smartctl invocations per cycle; `None` is unbounded.
    ///
    /// `Some(0)` is raised to a limit of 1, not treated as unbounded. Map a
    /// configured 0 to `None` first (see `SmartConfig::concurrency_limit`).
    pub fn with_concurrency(mut self, limit: Option<usize>) -> Self {
        self.concurrency = limit.map(|n| n.max(1));
        self
    }

    /// Runs update cycles forever
    pub async fn run(&self) {
        // tokio panics on a zero period
        let mut ticker = interval(self.interval.max(Duration::from_millis(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            // The first tick completes immediately
            ticker.tick().await;
            self.update().await;
        }
    }

    pub async fn update(&self) -> CycleOutcome {
        info!("Updating SMART metrics");

        let devices = match self.source.list_devices().await {
            Ok(devices) => devices,
            Err(e) => {
                error!("Failed to list devices: {}", e);
                self.metrics.up.set(0.0);
                return CycleOutcome::Aborted;
            }
        };
        self.metrics.up.set(1.0);

        let disks: Vec<Device> = devices.into_iter().filter(Device::is_disk).collect();
        let names: Vec<String> = disks.iter().map(|disk| disk.name.clone()).collect();

        let failed = AtomicUsize::new(0);
        stream::iter(names)
            .for_each_concurrent(self.concurrency, |name| {
                let failed = &failed;
                async move {
                    if self.sampler.sample(&name).await == SampleStatus::Failed {
                        failed.fetch_add(1, Ordering::Relaxed);
                    }
                }
            })
            .await;
        let failed = failed.into_inner();

        let removed = reconcile(&disks, self.metrics.stores());

        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or_default();
        self.metrics.last_update_timestamp_seconds.set(now);

        info!(disks = disks.len(), failed, removed, "Updated SMART metrics");

        CycleOutcome::Completed {
            sampled: disks.len() - failed,
            failed,
            removed,
        }
    }
}
