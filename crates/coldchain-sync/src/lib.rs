pub mod assemble;
pub mod csv_file;
pub mod error;
pub mod export;
pub mod ingest;
pub mod upload;
pub mod workbook;

pub use error::{IngestError, Result};
pub use export::{csv_template, shipments_to_csv};
pub use ingest::{ImportReport, IngestSettings, Ingestor, ThresholdAlert};
pub use upload::{validate_upload, UploadKind};
