use crate::error::CoreError;
use crate::normalize::fields::CanonicalField;
use crate::normalize::serial::serial_to_timestamp;
use crate::time::parse_timestamp;
use chrono::FixedOffset;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
}

impl CellValue {
    pub fn text(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(trimmed.to_string())
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    pub fn as_text(&self) -> Option<String> {
        match self {
            CellValue::Empty => None,
            CellValue::Text(value) => Some(value.clone()),
            CellValue::Number(value) => Some(value.to_string()),
        }
    }
}

/// One spreadsheet row keyed by canonical field.
///
/// Empty cells never overwrite anything. When several synonyms of the same
/// field carry a value, the synonym listed first in the field table wins.
#[derive(Debug, Clone)]
pub struct RawRow<F> {
    cells: BTreeMap<F, (usize, CellValue)>,
    ignored: Vec<String>,
}

impl<F: CanonicalField> Default for RawRow<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: CanonicalField> RawRow<F> {
    pub fn new() -> Self {
        Self {
            cells: BTreeMap::new(),
            ignored: Vec::new(),
        }
    }

    pub fn from_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, CellValue)>,
    {
        let mut row = Self::new();
        for (header, value) in pairs {
            row.insert(header, value);
        }
        row
    }

    /// Records a cell under its canonical field. Returns the field the header
    /// resolved to, or `None` for unmapped headers.
    pub fn insert(&mut self, header: &str, value: CellValue) -> Option<F> {
        let Some((field, rank)) = F::resolve(header) else {
            let trimmed = header.trim();
            if !trimmed.is_empty() {
                self.ignored.push(trimmed.to_string());
            }
            return None;
        };
        if value.is_empty() {
            return Some(field);
        }
        match self.cells.get(&field) {
            Some((existing_rank, _)) if *existing_rank <= rank => {}
            _ => {
                self.cells.insert(field, (rank, value));
            }
        }
        Some(field)
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn get(&self, field: F) -> Option<&CellValue> {
        self.cells.get(&field).map(|(_, value)| value)
    }

    pub fn text(&self, field: F) -> Option<String> {
        self.get(field).and_then(CellValue::as_text)
    }

    pub fn number(&self, field: F) -> Result<Option<f64>, CoreError> {
        match self.get(field) {
            None | Some(CellValue::Empty) => Ok(None),
            Some(CellValue::Number(value)) => Ok(Some(*value)),
            Some(CellValue::Text(raw)) => parse_number(raw)
                .map(Some)
                .ok_or_else(|| CoreError::InvalidCell {
                    field: field.name(),
                    value: raw.clone(),
                }),
        }
    }

    /// Reads a timestamp cell. Numeric cells are spreadsheet date serials.
    pub fn timestamp(&self, field: F, offset: FixedOffset) -> Result<Option<i64>, CoreError> {
        match self.get(field) {
            None | Some(CellValue::Empty) => Ok(None),
            Some(CellValue::Number(serial)) => serial_to_timestamp(*serial, offset)
                .map(Some)
                .ok_or_else(|| CoreError::InvalidCell {
                    field: field.name(),
                    value: serial.to_string(),
                }),
            Some(CellValue::Text(raw)) => {
                parse_timestamp(raw)
                    .map(Some)
                    .map_err(|_| CoreError::InvalidCell {
                        field: field.name(),
                        value: raw.clone(),
                    })
            }
        }
    }

    pub fn ignored_headers(&self) -> &[String] {
        &self.ignored
    }
}

fn parse_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    let without_unit = trimmed
        .strip_suffix("°C")
        .or_else(|| trimmed.strip_suffix("°c"))
        .or_else(|| trimmed.strip_suffix('C'))
        .or_else(|| trimmed.strip_suffix('c'))
        .or_else(|| trimmed.strip_suffix('°'))
        .unwrap_or(trimmed)
        .trim_end();
    without_unit.parse::<f64>().ok().filter(|v| v.is_finite())
}
