use crate::error::TransportError;
use crate::transport::{CallRequest, CallStatusUpdate, CallTransport};
use chrono::{DateTime, Utc};
use coldchain_core::{CallId, CallRecord, CallStatus, ShipmentDetails, ShipmentId};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;
use url::Url;

const DEFAULT_USER_AGENT: &str = concat!("coldchain/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone)]
pub struct HttpCallTransport {
    client: Client,
    base: Url,
}

impl HttpCallTransport {
    pub fn new(
        base: Url,
        timeout: Duration,
        user_agent: Option<&str>,
    ) -> Result<Self, TransportError> {
        if base.cannot_be_a_base() {
            return Err(TransportError::InvalidUrl(base.to_string()));
        }
        let client = Client::builder()
            .user_agent(user_agent.unwrap_or(DEFAULT_USER_AGENT))
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(10)))
            .build()?;
        Ok(Self { client, base })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, TransportError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| TransportError::InvalidUrl(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

impl CallTransport for HttpCallTransport {
    fn place_call(&self, request: &CallRequest) -> Result<CallRecord, TransportError> {
        let url = self.endpoint(&["calls"])?;
        debug!(url = %url, to = %request.to, "placing call");
        let body = WireRequest {
            to: &request.to,
            message: &request.message,
            shipment_details: request.shipment_details.as_ref().map(WireDetails::from),
        };
        let value: Value = self
            .client
            .post(url)
            .json(&body)
            .send()?
            .error_for_status()?
            .json()?;
        let wire = decode_call(unwrap_field(value, "call"))?;
        wire.into_record(Some(request))
    }

    fn call_status(&self, id: &CallId) -> Result<CallStatusUpdate, TransportError> {
        let url = self.endpoint(&["calls", id.as_str(), "status"])?;
        let value: Value = self.client.get(url).send()?.error_for_status()?.json()?;
        let wire = decode_call(unwrap_field(value, "call"))?;
        let status = wire
            .status
            .as_deref()
            .map(CallStatus::from_provider)
            .ok_or_else(|| TransportError::Decode(format!("status for call {id} missing")))?;
        Ok(CallStatusUpdate {
            status,
            duration: wire.duration.as_ref().and_then(WireNumber::seconds),
        })
    }

    fn list_calls(&self) -> Result<Vec<CallRecord>, TransportError> {
        let url = self.endpoint(&["calls"])?;
        let value: Value = self.client.get(url).send()?.error_for_status()?.json()?;
        let Value::Array(items) = unwrap_field(value, "calls") else {
            return Err(TransportError::Decode("call list is not an array".to_string()));
        };
        let mut calls = Vec::with_capacity(items.len());
        for item in items {
            calls.push(decode_call(item)?.into_record(None)?);
        }
        calls.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(calls)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireRequest<'a> {
    to: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    shipment_details: Option<WireDetails>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    shipment_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    contents: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    location: Option<String>,
}

impl From<&ShipmentDetails> for WireDetails {
    fn from(details: &ShipmentDetails) -> Self {
        Self {
            shipment_id: details.shipment_id.as_ref().map(ToString::to_string),
            number: details.number.clone(),
            contents: details.contents.clone(),
            temperature: details.temperature,
            location: details.location.clone(),
        }
    }
}

impl WireDetails {
    fn into_details(self) -> ShipmentDetails {
        ShipmentDetails {
            shipment_id: self
                .shipment_id
                .as_deref()
                .and_then(|id| ShipmentId::new(id).ok()),
            number: self.number,
            contents: self.contents,
            temperature: self.temperature,
            location: self.location,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireText {
    Text(String),
    Number(i64),
}

impl WireText {
    fn into_string(self) -> String {
        match self {
            WireText::Text(text) => text,
            WireText::Number(number) => number.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireNumber {
    Int(u64),
    Float(f64),
    Text(String),
}

impl WireNumber {
    fn seconds(&self) -> Option<u32> {
        match self {
            WireNumber::Int(value) => u32::try_from(*value).ok(),
            WireNumber::Float(value) if value.is_finite() && *value >= 0.0 => {
                Some(value.round() as u32)
            }
            WireNumber::Float(_) => None,
            WireNumber::Text(text) => text.trim().parse::<u32>().ok(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireCall {
    #[serde(default)]
    id: Option<WireText>,
    #[serde(default)]
    sid: Option<WireText>,
    #[serde(default)]
    to: Option<String>,
    #[serde(default)]
    recipient: Option<String>,
    #[serde(default)]
    from: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    duration: Option<WireNumber>,
    #[serde(default)]
    timestamp: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    shipment_details: Option<WireDetails>,
}

impl WireCall {
    fn into_record(self, request: Option<&CallRequest>) -> Result<CallRecord, TransportError> {
        let raw_id = self
            .id
            .or(self.sid)
            .map(WireText::into_string)
            .unwrap_or_default();
        let id = CallId::new(&raw_id)
            .map_err(|_| TransportError::Decode("call without an id".to_string()))?;
        let to = self
            .recipient
            .or(self.to)
            .or_else(|| request.map(|r| r.to.clone()))
            .unwrap_or_default();
        let message = self
            .message
            .or_else(|| request.map(|r| r.message.clone()))
            .unwrap_or_default();
        let shipment_details = self
            .shipment_details
            .map(WireDetails::into_details)
            .or_else(|| request.and_then(|r| r.shipment_details.clone()));
        Ok(CallRecord {
            id,
            to,
            from: self.from.unwrap_or_default(),
            status: self
                .status
                .as_deref()
                .map(CallStatus::from_provider)
                .unwrap_or(CallStatus::Queued),
            duration: self
                .duration
                .as_ref()
                .and_then(WireNumber::seconds)
                .unwrap_or(0),
            timestamp: self
                .timestamp
                .as_deref()
                .and_then(parse_timestamp)
                .unwrap_or_else(|| Utc::now().timestamp()),
            message,
            shipment_details,
        })
    }
}

fn parse_timestamp(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(parsed.timestamp());
    }
    trimmed.parse::<i64>().ok()
}

/// Providers answer either with the payload itself or wrapped under `key`.
fn unwrap_field(value: Value, key: &str) -> Value {
    match value {
        Value::Object(mut map) if map.contains_key(key) => map.remove(key).unwrap_or(Value::Null),
        other => other,
    }
}

fn decode_call(value: Value) -> Result<WireCall, TransportError> {
    serde_json::from_value(value).map_err(|err| TransportError::Decode(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::{decode_call, unwrap_field, HttpCallTransport, WireNumber};
    use coldchain_core::{CallId, CallStatus};
    use serde_json::json;
    use std::time::Duration;
    use url::Url;

    #[test]
    fn endpoints_keep_the_base_path_and_escape_ids() {
        let transport = HttpCallTransport::new(
            Url::parse("http://127.0.0.1:5000/api/").unwrap(),
            Duration::from_secs(5),
            None,
        )
        .unwrap();
        let id = CallId::new("CA 1/2").unwrap();
        let url = transport
            .endpoint(&["calls", id.as_str(), "status"])
            .unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:5000/api/calls/CA%201%2F2/status");
    }

    #[test]
    fn wrapped_and_bare_calls_decode_the_same() {
        let bare = json!({"sid": "CA9", "recipient": "+15550001111", "status": "ringing"});
        let wrapped = json!({"call": bare.clone()});

        for value in [bare, wrapped] {
            let record = decode_call(unwrap_field(value, "call"))
                .unwrap()
                .into_record(None)
                .unwrap();
            assert_eq!(record.id.as_str(), "CA9");
            assert_eq!(record.to, "+15550001111");
            assert_eq!(record.status, CallStatus::Ringing);
        }
    }

    #[test]
    fn missing_id_is_a_decode_error() {
        let wire = decode_call(json!({"status": "queued"})).unwrap();
        assert!(wire.into_record(None).is_err());
    }

    #[test]
    fn durations_accept_numbers_and_strings() {
        assert_eq!(WireNumber::Int(42).seconds(), Some(42));
        assert_eq!(WireNumber::Float(12.6).seconds(), Some(13));
        assert_eq!(WireNumber::Text("7".to_string()).seconds(), Some(7));
        assert_eq!(WireNumber::Float(-1.0).seconds(), None);
    }
}
