use crate::domain::alert::Alert;
use crate::domain::ids::{AlertId, ShipmentId};
use crate::domain::journey::{JourneyPoint, PointStatus};
use serde::{Deserialize, Serialize};

pub const UNKNOWN: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Place {
    pub city: String,
    pub country: String,
}

impl Place {
    pub fn new(city: Option<&str>, country: Option<&str>) -> Self {
        Self {
            city: non_blank(city).unwrap_or(UNKNOWN).to_string(),
            country: non_blank(country).unwrap_or(UNKNOWN).to_string(),
        }
    }

    pub fn from_city(city: &str) -> Self {
        Self::new(Some(city), None)
    }

    pub fn unknown() -> Self {
        Self::new(None, None)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ShipmentStatus {
    #[default]
    InTransit,
    Delivered,
    Delayed,
}

impl ShipmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShipmentStatus::InTransit => "in-transit",
            ShipmentStatus::Delivered => "delivered",
            ShipmentStatus::Delayed => "delayed",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_ascii_lowercase().replace([' ', '_'], "-");
        match normalized.as_str() {
            "in-transit" => Some(ShipmentStatus::InTransit),
            "delivered" => Some(ShipmentStatus::Delivered),
            "delayed" => Some(ShipmentStatus::Delayed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Contacts {
    pub sender_name: Option<String>,
    pub role: Option<String>,
    pub organization: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

impl Contacts {
    pub fn is_empty(&self) -> bool {
        self.sender_name.is_none()
            && self.role.is_none()
            && self.organization.is_none()
            && self.phone.is_none()
            && self.email.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemperatureReading {
    pub timestamp: i64,
    pub location: String,
    pub value: f64,
    pub value_f: f64,
    pub status: PointStatus,
}

impl TemperatureReading {
    pub fn celsius_to_fahrenheit(value: f64) -> f64 {
        value * 9.0 / 5.0 + 32.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipmentRecord {
    pub id: ShipmentId,
    pub owner: String,
    pub number: String,
    pub bill_of_lading: String,
    pub carrier: String,
    pub contents: String,
    pub status: ShipmentStatus,
    pub origin: Place,
    pub destination: Place,
    pub departure_time: i64,
    pub estimated_delivery: i64,
    pub current_temperature: Option<f64>,
    pub temperature_history: Vec<TemperatureReading>,
    pub journey: Vec<JourneyPoint>,
    pub alerts: Vec<Alert>,
    pub contacts: Option<Contacts>,
    pub source_file: Option<String>,
}

impl ShipmentRecord {
    pub fn latest_reading(&self) -> Option<&TemperatureReading> {
        self.temperature_history.iter().max_by_key(|r| r.timestamp)
    }

    pub fn unread_alert_count(&self) -> usize {
        self.alerts.iter().filter(|alert| !alert.read).count()
    }

    /// Flips `read` on the matching alert. Returns false when no alert matches.
    pub fn mark_alert_read(&mut self, alert_id: AlertId) -> bool {
        match self.alerts.iter_mut().find(|alert| alert.id == alert_id) {
            Some(alert) => {
                alert.read = true;
                true
            }
            None => false,
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::{Place, ShipmentStatus, TemperatureReading};

    #[test]
    fn bare_city_defaults_country() {
        let place = Place::from_city("Boston, MA");
        assert_eq!(place.city, "Boston, MA");
        assert_eq!(place.country, "Unknown");
        assert_eq!(Place::new(Some("  "), Some("USA")).city, "Unknown");
    }

    #[test]
    fn status_parse_is_lenient() {
        assert_eq!(
            ShipmentStatus::parse("In Transit"),
            Some(ShipmentStatus::InTransit)
        );
        assert_eq!(
            ShipmentStatus::parse("DELAYED"),
            Some(ShipmentStatus::Delayed)
        );
        assert_eq!(ShipmentStatus::parse("lost"), None);
    }

    #[test]
    fn fahrenheit_conversion() {
        assert_eq!(TemperatureReading::celsius_to_fahrenheit(5.0), 41.0);
        assert_eq!(TemperatureReading::celsius_to_fahrenheit(-40.0), -40.0);
    }
}
