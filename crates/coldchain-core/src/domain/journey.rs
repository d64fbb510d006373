use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointStatus {
    Completed,
    Current,
    Upcoming,
}

impl PointStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PointStatus::Completed => "completed",
            PointStatus::Current => "current",
            PointStatus::Upcoming => "upcoming",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "completed" => Some(PointStatus::Completed),
            "current" => Some(PointStatus::Current),
            "upcoming" => Some(PointStatus::Upcoming),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JourneyPoint {
    pub location: String,
    pub timestamp: i64,
    pub temperature: f64,
    pub status: PointStatus,
}
