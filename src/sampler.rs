//! Per-Device SMART Sampling
//!
//! Runs `smartctl -i -A -l error` for one device and feeds every output line through
//! the extraction rules, updating the matching stores.
//!
//! # Error Handling
//!
//! - **smartctl failure** (spawn error, non-zero exit): the device is skipped for this
//!   cycle and none of its stored values are touched.
//! - **Parse failure** (trailing token not a number): only that line/rule pairing is
//!   skipped; the remaining lines and rules are still evaluated.

use crate::error::{ExporterError, Result};
use crate::rules::{last_field, ExtractionRule};
use crate::store::MetricStore;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::process::Command;
use tracing::{debug, warn};

/// Produces the diagnostic text report for one device
#[async_trait]
pub trait DiagnosticTool: Send + Sync {
    async fn diagnose(&self, device: &str) -> Result<String>;
}

/// [`DiagnosticTool`] backed by the `smartctl` binary
#[derive(Debug, Clone)]
pub struct Smartctl {
    program: String,
    device_dir: PathBuf,
}

impl Smartctl {
    pub fn new(program: impl Into<String>, device_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            device_dir: device_dir.into(),
        }
    }
}

impl Default for Smartctl {
    fn default() -> Self {
        Self::new("smartctl", "/dev")
    }
}

#[async_trait]
impl DiagnosticTool for Smartctl {
    async fn diagnose(&self, device: &str) -> Result<String> {
        let path = self.device_dir.join(device);
        let output = Command::new(&self.program)
            .args(["-i", "-A", "-l", "error"])
            .arg(&path)
            .output()
            .await
            .map_err(|e| ExporterError::Diagnostic {
                device: device.to_string(),
                reason: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(ExporterError::Diagnostic {
                device: device.to_string(),
                reason: format!(
                    "{} ({})",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Outcome of sampling one device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleStatus {
    /// smartctl answered; holds the number of store updates applied
    Updated(usize),
    /// smartctl failed; nothing was touched (already logged as warning)
    Failed,
}

/// Pairs each extraction rule with the store it writes to
#[derive(Clone)]
pub struct DeviceSampler {
    tool: Arc<dyn DiagnosticTool>,
    rules: Arc<[(ExtractionRule, MetricStore)]>,
}

impl DeviceSampler {
    pub fn new(tool: Arc<dyn DiagnosticTool>, rules: Arc<[(ExtractionRule, MetricStore)]>) -> Self {
        Self { tool, rules }
    }

    pub async fn sample(&self, device: &str) -> SampleStatus {
        debug!(device = %device, "gather metrics");

        match self.tool.diagnose(device).await {
            Ok(output) => SampleStatus::Updated(self.apply_output(device, &output)),
            Err(e) => {
                warn!(device = %device, "Skipping device this cycle: {}", e);
                SampleStatus::Failed
            }
        }
    }

    /// Matches every line against every rule in declaration order and stores the
    /// parsed values. Returns the number of store updates applied.
    pub fn apply_output(&self, device: &str, output: &str) -> usize {
        let mut updated = 0;

        for line in output.lines() {
            for (rule, store) in self.rules.iter() {
                if !rule.matches(line) {
                    continue;
                }

                match last_field(line) {
                    Ok(value) => {
                        debug!(device = %device, metric = rule.name(), value, "update metric value");
                        store.set(device, value);
                        updated += 1;
                    }
                    Err(e) => {
                        warn!(device = %device, metric = rule.name(), "Failed to parse metric: {}", e);
                    }
                }
            }
        }

        updated
    }
}
