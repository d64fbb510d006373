use crate::error::{IngestError, Result};
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use coldchain_core::normalize::CanonicalField;
use coldchain_core::{CellValue, RawRow, ReadingField, ShipmentField};
use std::io::Cursor;

/// Sheet one holds `key | value` metadata rows for a single shipment, sheet
/// two (optional) a reading table with a header row.
#[derive(Debug, Clone)]
pub struct ParsedWorkbook {
    pub metadata: RawRow<ShipmentField>,
    pub readings: Vec<RawRow<ReadingField>>,
    pub warnings: Vec<String>,
}

pub fn parse_workbook(data: &[u8]) -> Result<ParsedWorkbook> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(data.to_vec()))
        .map_err(|err| IngestError::Parse(format!("invalid workbook: {err}")))?;
    let names = workbook.sheet_names();
    let Some(first) = names.first() else {
        return Err(IngestError::Parse("workbook has no sheets".to_string()));
    };

    let mut warnings = Vec::new();
    let range = workbook
        .worksheet_range(first)
        .map_err(|err| IngestError::Parse(format!("sheet '{first}': {err}")))?;
    let metadata = metadata_from_rows(range.rows().map(|row| row.iter().map(cell_value).collect()));
    for key in metadata.ignored_headers() {
        warnings.push(format!("ignored field '{key}' in sheet '{first}'"));
    }

    let mut readings = Vec::new();
    if let Some(second) = names.get(1) {
        let range = workbook
            .worksheet_range(second)
            .map_err(|err| IngestError::Parse(format!("sheet '{second}': {err}")))?;
        let (rows, ignored) =
            readings_from_rows(range.rows().map(|row| row.iter().map(cell_value).collect()));
        for header in ignored {
            warnings.push(format!("ignored column '{header}' in sheet '{second}'"));
        }
        readings = rows;
    }

    Ok(ParsedWorkbook {
        metadata,
        readings,
        warnings,
    })
}

fn metadata_from_rows<I>(rows: I) -> RawRow<ShipmentField>
where
    I: IntoIterator<Item = Vec<CellValue>>,
{
    let mut metadata = RawRow::new();
    for row in rows {
        let mut cells = row.into_iter();
        let Some(key) = cells.next().and_then(|cell| cell.as_text()) else {
            continue;
        };
        let value = cells.next().unwrap_or(CellValue::Empty);
        // Title and section rows carry no value.
        if value.is_empty() {
            continue;
        }
        metadata.insert(&key, value);
    }
    metadata
}

fn readings_from_rows<I>(rows: I) -> (Vec<RawRow<ReadingField>>, Vec<String>)
where
    I: IntoIterator<Item = Vec<CellValue>>,
{
    let mut rows = rows.into_iter().skip_while(|row| row.iter().all(CellValue::is_empty));
    let Some(header_row) = rows.next() else {
        return (Vec::new(), Vec::new());
    };
    let headers: Vec<String> = header_row
        .iter()
        .map(|cell| cell.as_text().unwrap_or_default())
        .collect();
    let ignored = headers
        .iter()
        .filter(|header| !header.is_empty() && ReadingField::from_header(header).is_none())
        .cloned()
        .collect();

    let mut readings = Vec::new();
    for row in rows {
        let mut reading = RawRow::new();
        for (header, value) in headers.iter().zip(row) {
            if ReadingField::from_header(header).is_some() {
                reading.insert(header, value);
            }
        }
        if !reading.is_empty() {
            readings.push(reading);
        }
    }
    (readings, ignored)
}

fn cell_value(cell: &Data) -> CellValue {
    match cell {
        Data::String(value) => CellValue::text(value),
        Data::Float(value) => CellValue::Number(*value),
        Data::Int(value) => CellValue::Number(*value as f64),
        Data::Bool(value) => CellValue::Text(value.to_string()),
        Data::DateTime(value) => CellValue::Number(value.as_f64()),
        Data::DateTimeIso(value) | Data::DurationIso(value) => CellValue::text(value),
        _ => CellValue::Empty,
    }
}
