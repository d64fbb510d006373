use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum CoreError {
    #[error("id cannot be empty")]
    EmptyId,
    #[error("invalid thresholds: min {min} must be lower than max {max}")]
    InvalidThresholds { min: f64, max: f64 },
    #[error("invalid value for {field}: {value}")]
    InvalidCell { field: &'static str, value: String },
    #[error("invalid timestamp")]
    InvalidTimestamp,
    #[error("invalid utc offset: {0}")]
    InvalidOffset(String),
    #[error("unknown call status: {0}")]
    UnknownCallStatus(String),
}
