use crate::error::{IngestError, Result};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Csv,
    Workbook,
}

/// Checks the file name and size before any bytes are parsed.
pub fn validate_upload(file_name: &str, size: u64, limit: u64) -> Result<UploadKind> {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());
    let kind = match extension.as_deref() {
        Some("csv") => UploadKind::Csv,
        Some("xlsx") | Some("xls") => UploadKind::Workbook,
        _ => return Err(IngestError::UnsupportedFile(file_name.to_string())),
    };
    if size > limit {
        return Err(IngestError::TooLarge { size, limit });
    }
    Ok(kind)
}

#[cfg(test)]
mod tests {
    use super::{validate_upload, UploadKind};
    use crate::error::IngestError;

    const LIMIT: u64 = 5 * 1024 * 1024;

    #[test]
    fn accepts_known_extensions_case_insensitively() {
        assert_eq!(validate_upload("a.csv", 10, LIMIT).unwrap(), UploadKind::Csv);
        assert_eq!(
            validate_upload("Report.XLSX", 10, LIMIT).unwrap(),
            UploadKind::Workbook
        );
        assert_eq!(
            validate_upload("legacy.xls", 10, LIMIT).unwrap(),
            UploadKind::Workbook
        );
    }

    #[test]
    fn rejects_other_extensions() {
        for name in ["notes.txt", "archive.csv.zip", "noext"] {
            assert!(matches!(
                validate_upload(name, 1, LIMIT),
                Err(IngestError::UnsupportedFile(_))
            ));
        }
    }

    #[test]
    fn enforces_size_limit_inclusively() {
        assert!(validate_upload("a.csv", LIMIT, LIMIT).is_ok());
        assert!(matches!(
            validate_upload("a.csv", LIMIT + 1, LIMIT),
            Err(IngestError::TooLarge { .. })
        ));
    }
}
