use crate::domain::ids::{CallId, ShipmentId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CallStatus {
    Queued,
    Ringing,
    InProgress,
    Completed,
    Failed,
    Busy,
    NoAnswer,
    Canceled,
}

impl CallStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CallStatus::Completed
                | CallStatus::Failed
                | CallStatus::Busy
                | CallStatus::NoAnswer
                | CallStatus::Canceled
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CallStatus::Queued => "queued",
            CallStatus::Ringing => "ringing",
            CallStatus::InProgress => "in-progress",
            CallStatus::Completed => "completed",
            CallStatus::Failed => "failed",
            CallStatus::Busy => "busy",
            CallStatus::NoAnswer => "no-answer",
            CallStatus::Canceled => "canceled",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "queued" => Some(CallStatus::Queued),
            "ringing" => Some(CallStatus::Ringing),
            "in-progress" => Some(CallStatus::InProgress),
            "completed" => Some(CallStatus::Completed),
            "failed" => Some(CallStatus::Failed),
            "busy" => Some(CallStatus::Busy),
            "no-answer" => Some(CallStatus::NoAnswer),
            "canceled" | "cancelled" => Some(CallStatus::Canceled),
            _ => None,
        }
    }

    /// Maps a provider status string, including provider-specific aliases.
    /// Anything unrecognised is treated as a failed call.
    pub fn from_provider(raw: &str) -> Self {
        if let Some(status) = Self::parse(raw) {
            return status;
        }
        match raw.trim().to_ascii_lowercase().as_str() {
            "successful" | "success" | "answered" => CallStatus::Completed,
            "initiated" => CallStatus::Queued,
            _ => CallStatus::Failed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ShipmentDetails {
    pub shipment_id: Option<ShipmentId>,
    pub number: Option<String>,
    pub contents: Option<String>,
    pub temperature: Option<f64>,
    pub location: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallRecord {
    pub id: CallId,
    pub to: String,
    pub from: String,
    pub status: CallStatus,
    pub duration: u32,
    pub timestamp: i64,
    pub message: String,
    pub shipment_details: Option<ShipmentDetails>,
}

impl CallRecord {
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}
