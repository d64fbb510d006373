use crate::error::{IngestError, Result};
use coldchain_core::normalize::CanonicalField;
use coldchain_core::{CellValue, RawRow, ShipmentField};

#[derive(Debug, Clone)]
pub struct ParsedCsv {
    pub rows: Vec<RawRow<ShipmentField>>,
    pub warnings: Vec<String>,
}

/// Reads one shipment per data row. Lines starting with `#` are comments.
pub fn parse_csv(data: &[u8]) -> Result<ParsedCsv> {
    let mut reader = csv::ReaderBuilder::new()
        .comment(Some(b'#'))
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(data);

    let headers = reader
        .headers()
        .map_err(|err| IngestError::Parse(format!("invalid csv header: {err}")))?
        .clone();

    let mut warnings = Vec::new();
    for header in headers.iter() {
        if !header.is_empty() && ShipmentField::from_header(header).is_none() {
            warnings.push(format!("ignored column '{header}'"));
        }
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|err| IngestError::Parse(format!("invalid csv: {err}")))?;
        let line = record.position().map(|pos| pos.line()).unwrap_or_default();
        if record.len() > headers.len() {
            warnings.push(format!(
                "line {line}: {} extra value(s) without a header ignored",
                record.len() - headers.len()
            ));
        } else if record.len() < headers.len() && record.iter().any(|value| !value.is_empty()) {
            warnings.push(format!(
                "line {line}: {} missing value(s), treated as empty",
                headers.len() - record.len()
            ));
        }
        let mut row = RawRow::new();
        for (header, value) in headers.iter().zip(record.iter()) {
            row.insert(header, CellValue::text(value));
        }
        if !row.is_empty() {
            rows.push(row);
        }
    }

    Ok(ParsedCsv { rows, warnings })
}
