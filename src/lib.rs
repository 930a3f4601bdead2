//! SMART Prometheus Exporter
//!
//! Periodically samples disk health counters with `smartctl` and exposes them in
//! Prometheus format.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────┐  device list   ┌──────────┐   smartctl × N   ┌─────────────┐
//! │  lsblk  │ ─────────────► │ Updater  │ ───────────────► │  Sampler    │
//! └─────────┘                └──────────┘                  └─────────────┘
//!                                 │ reconcile                    │ set
//!                                 ▼                              ▼
//!                            ┌──────────────────────────────────────┐      HTTP      ┌────────────┐
//!                            │    MetricStore (one per rule)        │ ◄────────────► │ Prometheus │
//!                            └──────────────────────────────────────┘   /metrics     └────────────┘
//! ```
//!
//! # Modules
//!
//! - [`rules`] - Fixed table of smartctl line patterns and metric descriptors
//! - [`store`] - Concurrency-safe per-rule device → value maps
//! - [`devices`] - Block device enumeration via `lsblk`
//! - [`sampler`] - Per-device smartctl invocation and line extraction
//! - [`reconcile`] - Removal of values for devices that disappeared
//! - [`updater`] - Periodic update loop
//! - [`metrics`] - Prometheus registry and rendering
//! - [`server`] - HTTP server
//! - [`config`] - Configuration management
//! - [`error`] - Error types
//!
//! # Quick Start
//!
//! ```no_run
//! use smart_exporter::{config::Config, server};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config/Default.toml")?;
//!     server::start(config).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod devices;
pub mod error;
pub mod metrics;
pub mod reconcile;
pub mod rules;
pub mod sampler;
pub mod server;
pub mod store;
pub mod updater;
