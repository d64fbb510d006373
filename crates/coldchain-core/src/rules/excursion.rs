use crate::domain::{Alert, AlertId, AlertKind, TemperatureReading, Thresholds};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Excursion {
    Below,
    Within,
    Above,
}

impl Excursion {
    pub fn classify(value: f64, thresholds: Thresholds) -> Self {
        if value < thresholds.min {
            Excursion::Below
        } else if value > thresholds.max {
            Excursion::Above
        } else {
            Excursion::Within
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExcursionState {
    #[default]
    Normal,
    Excursion,
}

/// Edge-triggered excursion alerting over a time-ordered reading stream.
///
/// Every out-of-range reading yields a critical alert; the first in-range
/// reading after a run of excursions yields a single recovery alert.
#[derive(Debug, Clone)]
pub struct ExcursionDetector {
    thresholds: Thresholds,
    state: ExcursionState,
}

impl ExcursionDetector {
    pub fn new(thresholds: Thresholds) -> Self {
        Self {
            thresholds,
            state: ExcursionState::Normal,
        }
    }

    pub fn state(&self) -> ExcursionState {
        self.state
    }

    pub fn observe(&mut self, reading: &TemperatureReading) -> Option<Alert> {
        let value = reading.value;
        let (kind, message) = match Excursion::classify(value, self.thresholds) {
            Excursion::Below => {
                self.state = ExcursionState::Excursion;
                (
                    AlertKind::Critical,
                    format!("Temperature below minimum threshold: {value}°C"),
                )
            }
            Excursion::Above => {
                self.state = ExcursionState::Excursion;
                (
                    AlertKind::Critical,
                    format!("Temperature above maximum threshold: {value}°C"),
                )
            }
            Excursion::Within => match self.state {
                ExcursionState::Normal => return None,
                ExcursionState::Excursion => {
                    self.state = ExcursionState::Normal;
                    (
                        AlertKind::Info,
                        format!("Temperature back to normal: {value}°C"),
                    )
                }
            },
        };

        Some(Alert {
            id: AlertId::new(),
            kind,
            message,
            timestamp: reading.timestamp,
            location: non_empty(&reading.location),
            read: false,
            temperature: Some(value),
            threshold: Some(self.thresholds),
        })
    }
}

/// Runs a fresh detector over readings already sorted by timestamp.
pub fn detect_excursions(readings: &[TemperatureReading], thresholds: Thresholds) -> Vec<Alert> {
    let mut detector = ExcursionDetector::new(thresholds);
    readings
        .iter()
        .filter_map(|reading| detector.observe(reading))
        .collect()
}

/// Re-evaluates the most recent reading against (possibly updated) thresholds.
/// The alert is stamped `now`, since it describes the present state.
pub fn evaluate_latest(
    readings: &[TemperatureReading],
    thresholds: Thresholds,
    now_utc: i64,
    fallback_location: &str,
) -> Option<Alert> {
    let latest = readings.iter().max_by_key(|reading| reading.timestamp)?;
    let value = latest.value;
    let direction = match Excursion::classify(value, thresholds) {
        Excursion::Within => return None,
        Excursion::Below => "below minimum",
        Excursion::Above => "above maximum",
    };
    let location = non_empty(&latest.location).or_else(|| non_empty(fallback_location));
    Some(Alert {
        id: AlertId::new(),
        kind: AlertKind::Critical,
        message: format!(
            "Temperature {direction} threshold: {value}°C (safe range: {}°C - {}°C)",
            thresholds.min, thresholds.max
        ),
        timestamp: now_utc,
        location,
        read: false,
        temperature: Some(value),
        threshold: Some(thresholds),
    })
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
