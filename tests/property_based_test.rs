//! Property-based tests using proptest
//!
//! Tests that verify store and reconciliation properties hold for arbitrary inputs.

mod common;

use common::*;
use proptest::prelude::*;
use smart_exporter::devices::Device;
use smart_exporter::reconcile::reconcile;
use std::collections::{BTreeMap, BTreeSet};

fn device_name() -> impl Strategy<Value = String> {
    "(sd[a-h]|nvme[0-3]n1)"
}

proptest! {
    #[test]
    fn test_reconcile_keeps_only_present_devices(
        prior in prop::collection::btree_map(device_name(), 0.0f64..1e6, 0..12),
        present in prop::collection::btree_set(device_name(), 0..12),
    ) {
        // Given: Every store seeded with the same arbitrary prior entries
        let metrics = create_test_metrics();
        for store in metrics.stores() {
            for (device, value) in &prior {
                store.set(device, *value);
            }
        }

        // When: Reconciling against an arbitrary present set
        let devices: Vec<Device> = present.iter().cloned().map(Device::disk).collect();
        let removed = reconcile(&devices, metrics.stores());

        // Then: Each store's keys are a subset of the present set
        // And: Surviving entries keep their prior values
        let expected: BTreeMap<String, f64> = prior
            .iter()
            .filter(|(device, _)| present.contains(*device))
            .map(|(d, v)| (d.clone(), *v))
            .collect();
        for store in metrics.stores() {
            let keys: BTreeSet<String> = store.devices().into_iter().collect();
            prop_assert!(keys.is_subset(&present));
            prop_assert_eq!(store.snapshot().to_map(), expected.clone());
        }

        let stale = prior.len() - expected.len();
        prop_assert_eq!(removed, stale * metrics.stores().count());
    }

    #[test]
    fn test_set_twice_equals_set_once(device in device_name(), value in -1e18f64..1e18) {
        let metrics = create_test_metrics();
        let store = metrics.store(REALLOCATED).unwrap();

        store.set(&device, value);
        let once = store.snapshot().to_map();
        store.set(&device, value);

        prop_assert_eq!(store.snapshot().to_map(), once);
    }

    #[test]
    fn test_any_reallocated_value_is_extracted(value in 0u64..u32::MAX as u64) {
        // Given: A reallocated sector line with an arbitrary raw value
        let metrics = create_test_metrics();
        let sampler = smart_exporter::sampler::DeviceSampler::new(FakeTool::new(), metrics.rules());

        // When: Applying it
        sampler.apply_output("sda", &reallocated_line(&value.to_string()));

        // Then: The exact value is stored
        prop_assert_eq!(metrics.store(REALLOCATED).unwrap().get("sda"), Some(value as f64));
    }

    #[test]
    fn test_arbitrary_output_never_panics(output in "\\PC*") {
        let metrics = create_test_metrics();
        let sampler = smart_exporter::sampler::DeviceSampler::new(FakeTool::new(), metrics.rules());

        sampler.apply_output("sda", &output);

        prop_assert!(metrics.render().is_ok());
    }

    #[test]
    fn test_any_device_name_renders_without_panic(device in "\\PC*") {
        let metrics = create_test_metrics();
        metrics.store(GROWN_DEFECTS).unwrap().set(&device, 1.0);

        prop_assert!(metrics.render().is_ok());
    }
}
