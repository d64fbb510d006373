use crate::error::invalid_input;
use anyhow::Result;
use chrono::{DateTime, FixedOffset, Local, Offset, Utc};
use coldchain_config::AppConfig;
use coldchain_core::{AlertId, ShipmentId};
use coldchain_sync::IngestSettings;
use std::str::FromStr;

pub fn now_utc() -> i64 {
    Utc::now().timestamp()
}

pub fn format_timestamp_datetime(ts: i64) -> String {
    let dt = DateTime::<Utc>::from_timestamp(ts, 0)
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
        .with_timezone(&Local);
    dt.format("%Y-%m-%d %H:%M").to_string()
}

pub fn format_temperature(value: Option<f64>) -> String {
    match value {
        Some(value) => format!("{value:.1}°C"),
        None => "-".to_string(),
    }
}

pub fn parse_shipment_id(raw: &str) -> Result<ShipmentId> {
    ShipmentId::new(raw).map_err(|_| invalid_input("shipment id cannot be empty"))
}

pub fn parse_alert_id(raw: &str) -> Result<AlertId> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(invalid_input("alert id cannot be empty"));
    }
    AlertId::from_str(trimmed).map_err(|_| invalid_input("invalid alert id"))
}

pub fn ingest_settings(config: &AppConfig) -> IngestSettings {
    IngestSettings {
        owner: config.owner.clone(),
        thresholds: config.thresholds.resolved(),
        notification_target: config.notifications.phone.clone(),
        max_upload_bytes: config.import.max_upload_bytes,
        reporting_offset: FixedOffset::east_opt(config.import.reporting_offset_secs)
            .unwrap_or_else(|| Utc.fix()),
    }
}
