use chrono::FixedOffset;
use coldchain_core::domain::shipment::UNKNOWN;
use coldchain_core::{
    append_alert, derive_journey, derive_statuses, detect_excursions, waypoints_from_readings,
    Contacts, Place, PointStatus, RawRow, ReadingField, ShipmentField, ShipmentId,
    ShipmentRecord, ShipmentStatus, TemperatureReading, Thresholds,
};
use coldchain_core::time::SECONDS_PER_DAY;
use std::collections::HashSet;
use uuid::Uuid;

pub const DEFAULT_TEMPERATURE: f64 = 5.0;
pub const DEFAULT_TRANSIT_DAYS: i64 = 7;
pub const UNKNOWN_CARRIER: &str = "Unknown Carrier";
pub const UNKNOWN_CONTENTS: &str = "Unknown Contents";

/// Inputs shared by every shipment built from one upload.
#[derive(Debug, Clone)]
pub struct AssembleContext {
    pub owner: String,
    pub thresholds: Thresholds,
    pub offset: FixedOffset,
    pub now_utc: i64,
    pub source_file: Option<String>,
}

/// Builds a shipment aggregate from a metadata row and its readings.
///
/// When `synthesize_reading` is set and no readings are given, a single
/// reading at `now` in the origin city stands in for the history.
pub fn assemble_shipment(
    row: &RawRow<ShipmentField>,
    readings: Vec<TemperatureReading>,
    synthesize_reading: bool,
    ctx: &AssembleContext,
    label: &str,
    warnings: &mut Vec<String>,
) -> ShipmentRecord {
    let id_text = row.text(ShipmentField::Id);
    let number_text = row.text(ShipmentField::Number);
    let id = id_text
        .as_deref()
        .or(number_text.as_deref())
        .and_then(|raw| ShipmentId::new(raw).ok())
        .unwrap_or_else(ShipmentId::generate);
    let number = number_text
        .or(id_text)
        .unwrap_or_else(|| id.to_string());

    let status = match row.text(ShipmentField::Status) {
        None => ShipmentStatus::default(),
        Some(raw) => ShipmentStatus::parse(&raw).unwrap_or_else(|| {
            warnings.push(format!("{label}: unknown status '{raw}', using in-transit"));
            ShipmentStatus::default()
        }),
    };

    let origin = Place::new(
        row.text(ShipmentField::OriginCity).as_deref(),
        row.text(ShipmentField::OriginCountry).as_deref(),
    );
    let destination = Place::new(
        row.text(ShipmentField::DestinationCity).as_deref(),
        row.text(ShipmentField::DestinationCountry).as_deref(),
    );

    let departure_time = timestamp_or(row, ShipmentField::DepartureTime, ctx, label, warnings)
        .unwrap_or(ctx.now_utc);
    let estimated_delivery =
        timestamp_or(row, ShipmentField::EstimatedDelivery, ctx, label, warnings)
            .unwrap_or(ctx.now_utc + DEFAULT_TRANSIT_DAYS * SECONDS_PER_DAY);

    let cell_temperature = match row.number(ShipmentField::CurrentTemperature) {
        Ok(value) => value,
        Err(err) => {
            warnings.push(format!("{label}: {err}, ignored"));
            None
        }
    };

    let mut history = readings;
    if history.is_empty() && synthesize_reading {
        let value = cell_temperature.unwrap_or(DEFAULT_TEMPERATURE);
        history.push(TemperatureReading {
            timestamp: ctx.now_utc,
            location: origin.city.clone(),
            value,
            value_f: TemperatureReading::celsius_to_fahrenheit(value),
            status: PointStatus::Current,
        });
    }
    derive_statuses(&mut history, ctx.now_utc);

    let mut alerts = Vec::new();
    for alert in detect_excursions(&history, ctx.thresholds) {
        append_alert(&mut alerts, alert);
    }
    let journey = derive_journey(waypoints_from_readings(&history), ctx.now_utc);
    let current_temperature = history
        .last()
        .map(|reading| reading.value)
        .or(cell_temperature);

    let contacts = Contacts {
        sender_name: row.text(ShipmentField::SenderName),
        role: row.text(ShipmentField::SenderRole),
        organization: row.text(ShipmentField::Organization),
        phone: row.text(ShipmentField::Phone),
        email: row.text(ShipmentField::Email),
    };

    ShipmentRecord {
        id,
        owner: ctx.owner.clone(),
        number,
        bill_of_lading: row
            .text(ShipmentField::BillOfLading)
            .unwrap_or_else(placeholder_bill_of_lading),
        carrier: row
            .text(ShipmentField::Carrier)
            .unwrap_or_else(|| UNKNOWN_CARRIER.to_string()),
        contents: row
            .text(ShipmentField::Contents)
            .unwrap_or_else(|| UNKNOWN_CONTENTS.to_string()),
        status,
        origin,
        destination,
        departure_time,
        estimated_delivery,
        current_temperature,
        temperature_history: history,
        journey,
        alerts,
        contacts: (!contacts.is_empty()).then_some(contacts),
        source_file: ctx.source_file.clone(),
    }
}

/// Converts one reading-table row. Rows without a usable timestamp or
/// temperature are skipped with a warning.
pub fn reading_from_row(
    row: &RawRow<ReadingField>,
    offset: FixedOffset,
    fallback_location: &str,
    label: &str,
    warnings: &mut Vec<String>,
) -> Option<TemperatureReading> {
    let timestamp = match row.timestamp(ReadingField::Timestamp, offset) {
        Ok(Some(ts)) => ts,
        Ok(None) => {
            warnings.push(format!("{label}: missing timestamp, reading skipped"));
            return None;
        }
        Err(err) => {
            warnings.push(format!("{label}: {err}, reading skipped"));
            return None;
        }
    };

    let fahrenheit = match row.number(ReadingField::Fahrenheit) {
        Ok(value) => value,
        Err(err) => {
            warnings.push(format!("{label}: {err}, ignored"));
            None
        }
    };
    let celsius = match row.number(ReadingField::Celsius) {
        Ok(Some(value)) => value,
        Ok(None) => match fahrenheit {
            Some(f) => (f - 32.0) * 5.0 / 9.0,
            None => {
                warnings.push(format!("{label}: missing temperature, reading skipped"));
                return None;
            }
        },
        Err(err) => {
            warnings.push(format!("{label}: {err}, reading skipped"));
            return None;
        }
    };

    let location = row
        .text(ReadingField::Location)
        .unwrap_or_else(|| non_unknown(fallback_location));

    Some(TemperatureReading {
        timestamp,
        location,
        value: celsius,
        value_f: fahrenheit.unwrap_or_else(|| TemperatureReading::celsius_to_fahrenheit(celsius)),
        status: PointStatus::Upcoming,
    })
}

/// Renames repeated ids within one batch so the set can be stored as a whole.
pub fn dedupe_ids(shipments: &mut [ShipmentRecord], warnings: &mut Vec<String>) {
    let mut seen: HashSet<String> = HashSet::new();
    for shipment in shipments.iter_mut() {
        let original = shipment.id.to_string();
        if seen.insert(original.clone()) {
            continue;
        }
        let mut suffix = 2;
        let renamed = loop {
            let candidate = format!("{original}-{suffix}");
            if !seen.contains(&candidate) {
                break candidate;
            }
            suffix += 1;
        };
        warnings.push(format!(
            "duplicate shipment id '{original}' renamed to '{renamed}'"
        ));
        if let Ok(id) = ShipmentId::new(&renamed) {
            shipment.id = id;
        }
        seen.insert(renamed);
    }
}

fn timestamp_or(
    row: &RawRow<ShipmentField>,
    field: ShipmentField,
    ctx: &AssembleContext,
    label: &str,
    warnings: &mut Vec<String>,
) -> Option<i64> {
    match row.timestamp(field, ctx.offset) {
        Ok(value) => value,
        Err(err) => {
            warnings.push(format!("{label}: {err}, using default"));
            None
        }
    }
}

fn placeholder_bill_of_lading() -> String {
    let digits = Uuid::new_v4().as_u128() % 900_000 + 100_000;
    format!("BOL-{digits}")
}

fn non_unknown(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        UNKNOWN.to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::{
        assemble_shipment, dedupe_ids, reading_from_row, AssembleContext, DEFAULT_TEMPERATURE,
        UNKNOWN_CARRIER,
    };
    use chrono::FixedOffset;
    use coldchain_core::{
        AlertKind, CellValue, PointStatus, RawRow, ReadingField, ShipmentField, ShipmentStatus,
        Thresholds,
    };

    const NOW: i64 = 1_746_093_600;
    const HOUR: i64 = 3_600;

    fn ctx() -> AssembleContext {
        AssembleContext {
            owner: "ops".to_string(),
            thresholds: Thresholds::new(2.0, 8.0).unwrap(),
            offset: FixedOffset::east_opt(0).unwrap(),
            now_utc: NOW,
            source_file: Some("upload.csv".to_string()),
        }
    }

    fn reading_row(ts: &str, location: &str, celsius: f64) -> RawRow<ReadingField> {
        RawRow::from_pairs([
            ("Timestamp", CellValue::text(ts)),
            ("Location", CellValue::text(location)),
            ("Temperature (°C)", CellValue::Number(celsius)),
        ])
    }

    #[test]
    fn defaults_fill_missing_fields() {
        let row = RawRow::from_pairs([("origin", CellValue::text("Pune"))]);
        let mut warnings = Vec::new();
        let shipment = assemble_shipment(&row, Vec::new(), true, &ctx(), "row 1", &mut warnings);

        assert!(shipment.id.as_str().starts_with("import-"));
        assert_eq!(shipment.number, shipment.id.as_str());
        assert_eq!(shipment.status, ShipmentStatus::InTransit);
        assert_eq!(shipment.origin.city, "Pune");
        assert_eq!(shipment.origin.country, "Unknown");
        assert_eq!(shipment.destination.city, "Unknown");
        assert_eq!(shipment.carrier, UNKNOWN_CARRIER);
        assert!(shipment.bill_of_lading.starts_with("BOL-"));
        assert_eq!(shipment.departure_time, NOW);
        assert_eq!(shipment.estimated_delivery, NOW + 7 * 86_400);
        assert_eq!(shipment.current_temperature, Some(DEFAULT_TEMPERATURE));
        assert_eq!(shipment.temperature_history.len(), 1);
        assert_eq!(shipment.temperature_history[0].location, "Pune");
        assert!(shipment.alerts.is_empty());
        assert!(shipment.contacts.is_none());
        assert!(warnings.is_empty());
    }

    #[test]
    fn id_falls_back_to_number_and_bad_cells_warn() {
        let row = RawRow::from_pairs([
            ("shipment_number", CellValue::text("SH-9")),
            ("status", CellValue::text("lost at sea")),
            ("temperature", CellValue::text("cold")),
            ("eta", CellValue::text("soon")),
        ]);
        let mut warnings = Vec::new();
        let shipment = assemble_shipment(&row, Vec::new(), true, &ctx(), "row 3", &mut warnings);

        assert_eq!(shipment.id.as_str(), "SH-9");
        assert_eq!(shipment.number, "SH-9");
        assert_eq!(shipment.current_temperature, Some(DEFAULT_TEMPERATURE));
        assert_eq!(warnings.len(), 3);
        assert!(warnings.iter().all(|w| w.starts_with("row 3:")));
    }

    #[test]
    fn excursions_become_alerts_and_journey() {
        let row = RawRow::from_pairs([("id", CellValue::text("SH-1"))]);
        let mut warnings = Vec::new();
        let readings: Vec<_> = [
            reading_row("2025-05-01 06:00", "Mumbai", 5.0),
            reading_row("2025-05-01 08:00", "Pune", 9.0),
            reading_row("2025-05-01 10:00", "Nashik", 6.0),
            reading_row("2025-05-01 14:00", "Surat", 4.0),
        ]
        .iter()
        .filter_map(|r| reading_from_row(r, ctx().offset, "Mumbai", "r", &mut warnings))
        .collect();
        assert_eq!(readings.len(), 4);

        let shipment = assemble_shipment(&row, readings, true, &ctx(), "row 1", &mut warnings);
        let kinds: Vec<AlertKind> = shipment.alerts.iter().map(|a| a.kind).collect();
        assert_eq!(kinds, vec![AlertKind::Critical, AlertKind::Info]);
        assert_eq!(shipment.alerts[0].location.as_deref(), Some("Pune"));
        assert_eq!(shipment.current_temperature, Some(4.0));

        // NOW is 2025-05-01 10:00 UTC.
        let statuses: Vec<PointStatus> = shipment.journey.iter().map(|p| p.status).collect();
        assert_eq!(
            statuses,
            vec![
                PointStatus::Completed,
                PointStatus::Completed,
                PointStatus::Current,
                PointStatus::Upcoming
            ]
        );
    }

    #[test]
    fn repeated_criticals_within_an_hour_collapse() {
        let row = RawRow::from_pairs([("id", CellValue::text("SH-1"))]);
        let mut warnings = Vec::new();
        let readings: Vec<_> = [
            reading_row("2025-05-01 06:00", "A", 9.0),
            reading_row("2025-05-01 06:20", "B", 9.5),
            reading_row("2025-05-01 08:00", "C", 10.0),
        ]
        .iter()
        .filter_map(|r| reading_from_row(r, ctx().offset, "A", "r", &mut warnings))
        .collect();

        let shipment = assemble_shipment(&row, readings, false, &ctx(), "row 1", &mut warnings);
        let timestamps: Vec<i64> = shipment.alerts.iter().map(|a| a.timestamp).collect();
        assert_eq!(timestamps.len(), 2);
        assert_eq!(timestamps[1] - timestamps[0], 2 * HOUR);
    }

    #[test]
    fn reading_rows_convert_fahrenheit_and_skip_incomplete() {
        let mut warnings = Vec::new();
        let only_f = RawRow::from_pairs([
            ("timestamp", CellValue::text("2025-05-01T00:00:00Z")),
            ("temp_f", CellValue::Number(41.0)),
        ]);
        let reading = reading_from_row(&only_f, ctx().offset, "Origin", "r1", &mut warnings)
            .expect("reading");
        assert!((reading.value - 5.0).abs() < 1e-9);
        assert_eq!(reading.location, "Origin");

        let no_time = RawRow::from_pairs([("value", CellValue::Number(3.0))]);
        assert!(reading_from_row(&no_time, ctx().offset, "Origin", "r2", &mut warnings).is_none());
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn dedupe_ids_renames_repeats() {
        let row = RawRow::from_pairs([("id", CellValue::text("SH-1"))]);
        let mut warnings = Vec::new();
        let mut shipments: Vec<_> = (0..3)
            .map(|_| assemble_shipment(&row, Vec::new(), true, &ctx(), "row", &mut warnings))
            .collect();
        dedupe_ids(&mut shipments, &mut warnings);
        let ids: Vec<&str> = shipments.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["SH-1", "SH-1-2", "SH-1-3"]);
        assert_eq!(warnings.len(), 2);
    }
}
