//! Removal of stale per-device series
//!
//! A device that failed to answer smartctl is still present and keeps its last
//! values; only devices missing from the enumeration itself are retired.

use crate::devices::Device;
use crate::store::MetricStore;
use std::collections::HashSet;
use tracing::debug;

/// Deletes every stored entry whose device is not in `present`.
///
/// Returns the total number of entries removed across all stores.
pub fn reconcile<'a>(present: &[Device], stores: impl IntoIterator<Item = &'a MetricStore>) -> usize {
    let device_table: HashSet<String> = present.iter().map(|d| d.name.clone()).collect();

    stores
        .into_iter()
        .map(|store| {
            let removed = store.retain_devices(&device_table);
            if !removed.is_empty() {
                debug!(metric = store.name(), devices = ?removed, "removed ejected devices");
            }
            removed.len()
        })
        .sum()
}
