//! Block Device Enumeration
//!
//! Lists top-level block devices with `lsblk --nodeps --json -o NAME,TYPE` and
//! classifies them. Only whole disks are sampled; partitions and everything else
//! (loop, rom, ...) are ignored.
//!
//! Expected output shape:
//!
//! ```text
//! {"blockdevices": [
//!    {"name": "sda", "type": "disk"},
//!    {"name": "sr0", "type": "rom"}
//! ]}
//! ```

use crate::error::{ExporterError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tracing::debug;

/// Kind tag reported for a block device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    Disk,
    #[serde(rename = "part")]
    Partition,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Device {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: DeviceKind,
}

impl Device {
    pub fn new(name: impl Into<String>, kind: DeviceKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    pub fn disk(name: impl Into<String>) -> Self {
        Self::new(name, DeviceKind::Disk)
    }

    pub fn is_disk(&self) -> bool {
        self.kind == DeviceKind::Disk
    }
}

#[derive(Debug, Deserialize)]
struct LsblkOutput {
    blockdevices: Vec<Device>,
}

/// Parses `lsblk --json` output into a flat device list
pub fn parse_lsblk(json: &str) -> Result<Vec<Device>> {
    let output: LsblkOutput = serde_json::from_str(json)?;
    Ok(output.blockdevices)
}

/// Source of the set of block devices currently present
#[async_trait]
pub trait DeviceSource: Send + Sync {
    async fn list_devices(&self) -> Result<Vec<Device>>;
}

/// [`DeviceSource`] backed by the `lsblk` binary
#[derive(Debug, Clone)]
pub struct Lsblk {
    program: String,
}

impl Lsblk {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for Lsblk {
    fn default() -> Self {
        Self::new("lsblk")
    }
}

#[async_trait]
impl DeviceSource for Lsblk {
    async fn list_devices(&self) -> Result<Vec<Device>> {
        let output = Command::new(&self.program)
            .args(["--nodeps", "--json", "--output", "NAME,TYPE"])
            .output()
            .await
            .map_err(|e| ExporterError::Enumeration(format!("failed to run {}: {}", self.program, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ExporterError::Enumeration(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        let devices = parse_lsblk(&String::from_utf8_lossy(&output.stdout))
            .map_err(|e| ExporterError::Enumeration(format!("unreadable lsblk output: {}", e)))?;
        debug!(count = devices.len(), "listed block devices");

        Ok(devices)
    }
}
