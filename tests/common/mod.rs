//! Scripted stand-ins for lsblk and smartctl shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use smart_exporter::devices::{Device, DeviceSource};
use smart_exporter::error::{ExporterError, Result};
use smart_exporter::metrics::MetricsCollector;
use smart_exporter::sampler::DiagnosticTool;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub const ATA_OUTPUT: &str = include_str!("../fixtures/ata.txt");
pub const SCSI_OUTPUT: &str = include_str!("../fixtures/scsi.txt");

pub const REALLOCATED: &str = "smart_reallocated_sectors_total";
pub const GROWN_DEFECTS: &str = "smart_grown_defect_list_total";
pub const READ_ERRORS: &str = "smart_read_uncorrected_errors_total";
pub const WRITE_ERRORS: &str = "smart_write_uncorrected_errors_total";

pub fn create_test_metrics() -> MetricsCollector {
    MetricsCollector::new().expect("Failed to create metrics")
}

/// Device list source whose answer can be changed between cycles
#[derive(Default)]
pub struct FakeSource {
    devices: Mutex<Option<Vec<Device>>>,
}

impl FakeSource {
    pub fn new(devices: Vec<Device>) -> Arc<Self> {
        let source = Arc::new(Self::default());
        source.set(devices);
        source
    }

    pub fn set(&self, devices: Vec<Device>) {
        *self.devices.lock().unwrap() = Some(devices);
    }

    /// Makes the next enumerations fail
    pub fn fail(&self) {
        *self.devices.lock().unwrap() = None;
    }
}

#[async_trait]
impl DeviceSource for FakeSource {
    async fn list_devices(&self) -> Result<Vec<Device>> {
        self.devices
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| ExporterError::Enumeration("lsblk unavailable".to_string()))
    }
}

/// smartctl stand-in: devices without a scripted report fail
#[derive(Default)]
pub struct FakeTool {
    outputs: Mutex<HashMap<String, String>>,
    calls: Mutex<Vec<String>>,
}

impl FakeTool {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, device: &str, output: &str) {
        self.outputs
            .lock()
            .unwrap()
            .insert(device.to_string(), output.to_string());
    }

    pub fn fail(&self, device: &str) {
        self.outputs.lock().unwrap().remove(device);
    }

    pub fn calls(&self) -> Vec<String> {
        let mut calls = self.calls.lock().unwrap().clone();
        calls.sort();
        calls
    }
}

#[async_trait]
impl DiagnosticTool for FakeTool {
    async fn diagnose(&self, device: &str) -> Result<String> {
        self.calls.lock().unwrap().push(device.to_string());
        self.outputs
            .lock()
            .unwrap()
            .get(device)
            .cloned()
            .ok_or_else(|| ExporterError::Diagnostic {
                device: device.to_string(),
                reason: "exit status: 2".to_string(),
            })
    }
}

/// Reallocated-sector line with the given raw value
pub fn reallocated_line(value: &str) -> String {
    format!(
        "  5 Reallocated_Sector_Ct   0x0033   200   200   140    Pre-fail  Always       -       {}\n",
        value
    )
}
