use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExporterError {
    #[error("Device enumeration failed: {0}")]
    Enumeration(String),

    #[error("smartctl failed for device {device}: {reason}")]
    Diagnostic { device: String, reason: String },

    #[error("Failed to parse value {token:?} as float64: {reason}")]
    Parse { token: String, reason: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Metrics registry error: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ExporterError>;
