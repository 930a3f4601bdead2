//! SMART Extraction Rules
//!
//! A fixed, declarative table mapping one class of `smartctl` output line to one
//! Prometheus gauge. Each rule carries a compiled line pattern and the descriptor
//! (name, help text, label keys) of the metric it feeds.
//!
//! # Rule Table
//!
//! | Line pattern                       | Metric                                 |
//! |------------------------------------|----------------------------------------|
//! | contains `Reallocated_Sector_Ct`   | `smart_reallocated_sectors_total`      |
//! | `^Elements in grown defect list:`  | `smart_grown_defect_list_total`        |
//! | `^read:`                           | `smart_read_uncorrected_errors_total`  |
//! | `^write:`                          | `smart_write_uncorrected_errors_total` |
//!
//! The value of a matching line is always its last whitespace-delimited token
//! (the `RAW_VALUE` column for ATA attributes, the "total uncorrected errors"
//! column of the SCSI error counter log).

use crate::error::{ExporterError, Result};
use regex::Regex;

/// Label key every SMART metric is partitioned by
pub const DEVICE_LABEL: &str = "device";

/// One row of the rule table: pattern, metric name, help text
struct RuleRow {
    pattern: &'static str,
    name: &'static str,
    help: &'static str,
}

const RULE_TABLE: &[RuleRow] = &[
    RuleRow {
        pattern: r"Reallocated_Sector_Ct",
        name: "smart_reallocated_sectors_total",
        help: "Number of reallocated sectors",
    },
    RuleRow {
        pattern: r"^Elements in grown defect list:",
        name: "smart_grown_defect_list_total",
        help: "Number of elements in grown defect list",
    },
    RuleRow {
        pattern: r"^read:",
        name: "smart_read_uncorrected_errors_total",
        help: "Number of uncorrected read errors",
    },
    RuleRow {
        pattern: r"^write:",
        name: "smart_write_uncorrected_errors_total",
        help: "Number of uncorrected write errors",
    },
];

/// Name, help text and label schema of a metric produced by a rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricDescriptor {
    pub name: String,
    pub help: String,
    pub label_keys: Vec<String>,
}

/// Compiled line pattern plus the descriptor of the metric it feeds
#[derive(Debug, Clone)]
pub struct ExtractionRule {
    pattern: Regex,
    descriptor: MetricDescriptor,
}

impl ExtractionRule {
    pub fn new(pattern: &str, name: &str, help: &str) -> Result<Self> {
        let pattern = Regex::new(pattern)
            .map_err(|e| ExporterError::Config(format!("invalid rule pattern {pattern:?}: {e}")))?;

        Ok(Self {
            pattern,
            descriptor: MetricDescriptor {
                name: name.to_string(),
                help: help.to_string(),
                label_keys: vec![DEVICE_LABEL.to_string()],
            },
        })
    }

    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    pub fn descriptor(&self) -> &MetricDescriptor {
        &self.descriptor
    }

    pub fn matches(&self, line: &str) -> bool {
        self.pattern.is_match(line)
    }
}

/// Compiles the built-in rule table, preserving declaration order
pub fn default_rules() -> Result<Vec<ExtractionRule>> {
    RULE_TABLE
        .iter()
        .map(|row| ExtractionRule::new(row.pattern, row.name, row.help))
        .collect()
}

/// Parses the last whitespace-delimited token of `line` as `f64`
pub fn last_field(line: &str) -> Result<f64> {
    let token = line.split_whitespace().last().ok_or_else(|| ExporterError::Parse {
        token: String::new(),
        reason: "line has no fields".to_string(),
    })?;

    token.parse::<f64>().map_err(|e| ExporterError::Parse {
        token: token.to_string(),
        reason: e.to_string(),
    })
}
