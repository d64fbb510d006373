use crate::domain::ids::AlertId;
use crate::error::CoreError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    Info,
    Warning,
    Critical,
}

impl AlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::Info => "info",
            AlertKind::Warning => "warning",
            AlertKind::Critical => "critical",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "info" => Some(AlertKind::Info),
            "warning" => Some(AlertKind::Warning),
            "critical" => Some(AlertKind::Critical),
            _ => None,
        }
    }
}

/// Inclusive safe temperature range in degrees Celsius.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub min: f64,
    pub max: f64,
}

impl Thresholds {
    pub fn new(min: f64, max: f64) -> Result<Self, CoreError> {
        if !min.is_finite() || !max.is_finite() || min >= max {
            return Err(CoreError::InvalidThresholds { min, max });
        }
        Ok(Self { min, max })
    }

    pub fn contains(&self, value: f64) -> bool {
        !(value < self.min || value > self.max)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: AlertId,
    #[serde(rename = "type")]
    pub kind: AlertKind,
    pub message: String,
    pub timestamp: i64,
    pub location: Option<String>,
    pub read: bool,
    pub temperature: Option<f64>,
    pub threshold: Option<Thresholds>,
}

impl Alert {
    pub fn is_temperature_critical(&self) -> bool {
        self.kind == AlertKind::Critical && self.temperature.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::{AlertKind, Thresholds};

    #[test]
    fn thresholds_reject_inverted_range() {
        assert!(Thresholds::new(8.0, 2.0).is_err());
        assert!(Thresholds::new(2.0, 2.0).is_err());
        assert!(Thresholds::new(f64::NAN, 2.0).is_err());
    }

    #[test]
    fn thresholds_bounds_are_safe() {
        let range = Thresholds::new(2.0, 8.0).unwrap();
        assert!(range.contains(2.0));
        assert!(range.contains(8.0));
        assert!(!range.contains(1.99));
        assert!(!range.contains(8.01));
    }

    #[test]
    fn alert_kind_parses_case_insensitively() {
        assert_eq!(AlertKind::parse("Critical"), Some(AlertKind::Critical));
        assert_eq!(AlertKind::parse("nope"), None);
    }
}
