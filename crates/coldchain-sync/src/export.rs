use crate::error::{IngestError, Result};
use coldchain_core::time::format_timestamp;
use coldchain_core::ShipmentRecord;

pub const CSV_HEADERS: [&str; 13] = [
    "id",
    "number",
    "status",
    "origin",
    "origin_country",
    "destination",
    "destination_country",
    "departure_time",
    "estimated_delivery",
    "carrier",
    "current_temperature",
    "contents",
    "bill_of_lading",
];

const TEMPLATE_ROW: [&str; 13] = [
    "SH001",
    "SH-12345",
    "in-transit",
    "New York, NY",
    "USA",
    "Los Angeles, CA",
    "USA",
    "2023-05-01T08:00:00Z",
    "2023-05-04T16:00:00Z",
    "ColdChain Express",
    "5.2",
    "Vaccine Shipment",
    "BOL-123456",
];

const TEMPLATE_NOTES: [&str; 2] = [
    "# Replace the example row above with your shipments, one per row.",
    "# Status is one of in-transit, delivered, delayed. Times are ISO 8601 in UTC.",
];

/// Writes shipments with the same headers the importer reads back.
pub fn shipments_to_csv(shipments: &[ShipmentRecord]) -> Result<String> {
    let rows = shipments.iter().map(|shipment| {
        vec![
            shipment.id.to_string(),
            shipment.number.clone(),
            shipment.status.as_str().to_string(),
            shipment.origin.city.clone(),
            shipment.origin.country.clone(),
            shipment.destination.city.clone(),
            shipment.destination.country.clone(),
            format_timestamp(shipment.departure_time),
            format_timestamp(shipment.estimated_delivery),
            shipment.carrier.clone(),
            shipment
                .current_temperature
                .map(|value| value.to_string())
                .unwrap_or_default(),
            shipment.contents.clone(),
            shipment.bill_of_lading.clone(),
        ]
    });
    write_rows(rows)
}

/// Header, one example row and usage notes as `#` comments.
pub fn csv_template() -> Result<String> {
    let mut out = write_rows(std::iter::once(
        TEMPLATE_ROW.iter().map(|cell| cell.to_string()).collect(),
    ))?;
    for note in TEMPLATE_NOTES {
        out.push_str(note);
        out.push('\n');
    }
    Ok(out)
}

fn write_rows<I>(rows: I) -> Result<String>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let mut buf = Vec::new();
    {
        let mut writer = csv::Writer::from_writer(&mut buf);
        writer
            .write_record(CSV_HEADERS)
            .map_err(|err| IngestError::Parse(err.to_string()))?;
        for row in rows {
            writer
                .write_record(&row)
                .map_err(|err| IngestError::Parse(err.to_string()))?;
        }
        writer.flush()?;
    }
    String::from_utf8(buf).map_err(|err| IngestError::Parse(err.to_string()))
}
